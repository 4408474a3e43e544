//! The LikeC tree: declarations, compilation unit, and ownership root.
//!
//! The tree owns the type table, a declaration arena, and the root
//! compilation unit. Identifier expressions and label statements reference
//! declarations by [`DeclarationId`]; the arena entries own whatever the
//! declarations themselves carry (types, initial values, member lists).

use std::fmt;

use indexmap::IndexMap;
use likec_ir::Platform;

use crate::error::TreeError;
use crate::expr::Expression;
use crate::simplify::Simplifier;
use crate::stmt::Block;
use crate::types::{TypeId, TypeTable};

/// Stable declaration identifier. Indexes into [`Tree`]'s declaration arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeclarationId(pub u32);

impl fmt::Display for DeclarationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One declaration in the arena.
#[derive(Debug, Clone)]
pub enum Declaration {
    Variable(VariableDeclaration),
    Label(LabelDeclaration),
    Member(MemberDeclaration),
    StructType(StructTypeDeclaration),
    Function(FunctionDeclaration),
}

#[derive(Debug, Clone)]
pub struct VariableDeclaration {
    pub identifier: String,
    pub ty: TypeId,
    pub initial_value: Option<Expression>,
}

#[derive(Debug, Clone)]
pub struct LabelDeclaration {
    pub identifier: String,
    /// Number of label identifier expressions created for this label.
    pub reference_count: u32,
}

#[derive(Debug, Clone)]
pub struct MemberDeclaration {
    pub identifier: String,
    pub ty: TypeId,
}

#[derive(Debug, Clone)]
pub struct StructTypeDeclaration {
    /// The struct tag, used verbatim as the type name.
    pub identifier: String,
    pub ty: TypeId,
    /// Member declarations, in layout order.
    pub members: Vec<DeclarationId>,
}

#[derive(Debug, Clone)]
pub struct FunctionDeclaration {
    pub identifier: String,
    /// The function pointer type carrying the signature.
    pub ty: TypeId,
    /// Parameter variable declarations, in order.
    pub parameters: Vec<DeclarationId>,
}

/// Top of the tree: an ordered list of top-level declarations.
#[derive(Debug, Clone, Default)]
pub struct CompilationUnit {
    pub declarations: Vec<TopLevelDeclaration>,
}

/// One top-level item.
#[derive(Debug, Clone)]
pub enum TopLevelDeclaration {
    FunctionDeclaration(DeclarationId),
    FunctionDefinition(FunctionDefinition),
    StructTypeDeclaration(DeclarationId),
    VariableDeclaration(DeclarationId),
}

/// A function declaration together with its body and owned labels.
#[derive(Debug, Clone)]
pub struct FunctionDefinition {
    pub declaration: DeclarationId,
    pub body: Block,
    /// Labels declared inside this function.
    pub labels: Vec<DeclarationId>,
}

/// Abstract syntax tree of a high-level program in a C-like language.
#[derive(Debug)]
pub struct Tree {
    /// Types interned for this tree; not shared with any other tree.
    pub types: TypeTable,
    declarations: Vec<Declaration>,
    struct_tags: IndexMap<String, DeclarationId>,
    root: Option<CompilationUnit>,
}

impl Tree {
    pub fn new(platform: Platform) -> Self {
        Tree {
            types: TypeTable::new(platform),
            declarations: Vec::new(),
            struct_tags: IndexMap::new(),
            root: None,
        }
    }

    pub fn root(&self) -> Option<&CompilationUnit> {
        self.root.as_ref()
    }

    pub fn set_root(&mut self, root: CompilationUnit) {
        self.root = Some(root);
    }

    /// Rewrites the whole tree into canonical idiomatic form.
    pub fn simplify_root(&mut self) {
        if let Some(root) = self.root.take() {
            let root = Simplifier::new(self).simplify_compilation_unit(root);
            self.root = Some(root);
        }
    }

    // -----------------------------------------------------------------------
    // Declarations
    // -----------------------------------------------------------------------

    pub fn declaration(&self, id: DeclarationId) -> &Declaration {
        &self.declarations[id.0 as usize]
    }

    fn push_declaration(&mut self, declaration: Declaration) -> DeclarationId {
        let id = DeclarationId(self.declarations.len() as u32);
        self.declarations.push(declaration);
        id
    }

    /// The identifier of any declaration kind.
    pub fn identifier(&self, id: DeclarationId) -> &str {
        match self.declaration(id) {
            Declaration::Variable(d) => &d.identifier,
            Declaration::Label(d) => &d.identifier,
            Declaration::Member(d) => &d.identifier,
            Declaration::StructType(d) => &d.identifier,
            Declaration::Function(d) => &d.identifier,
        }
    }

    pub fn variable(&self, id: DeclarationId) -> Option<&VariableDeclaration> {
        match self.declaration(id) {
            Declaration::Variable(d) => Some(d),
            _ => None,
        }
    }

    pub fn label(&self, id: DeclarationId) -> Option<&LabelDeclaration> {
        match self.declaration(id) {
            Declaration::Label(d) => Some(d),
            _ => None,
        }
    }

    pub fn member(&self, id: DeclarationId) -> Option<&MemberDeclaration> {
        match self.declaration(id) {
            Declaration::Member(d) => Some(d),
            _ => None,
        }
    }

    pub fn struct_type(&self, id: DeclarationId) -> Option<&StructTypeDeclaration> {
        match self.declaration(id) {
            Declaration::StructType(d) => Some(d),
            _ => None,
        }
    }

    pub fn function(&self, id: DeclarationId) -> Option<&FunctionDeclaration> {
        match self.declaration(id) {
            Declaration::Function(d) => Some(d),
            _ => None,
        }
    }

    pub fn declare_variable(&mut self, identifier: impl Into<String>, ty: TypeId) -> DeclarationId {
        self.push_declaration(Declaration::Variable(VariableDeclaration {
            identifier: identifier.into(),
            ty,
            initial_value: None,
        }))
    }

    pub fn set_initial_value(&mut self, id: DeclarationId, value: Expression) {
        match &mut self.declarations[id.0 as usize] {
            Declaration::Variable(d) => d.initial_value = Some(value),
            _ => panic!("declaration {id} is not a variable"),
        }
    }

    pub fn declare_label(&mut self, identifier: impl Into<String>) -> DeclarationId {
        self.push_declaration(Declaration::Label(LabelDeclaration {
            identifier: identifier.into(),
            reference_count: 0,
        }))
    }

    /// Creates a label identifier expression and counts the reference. Label
    /// statements whose declaration ends up with zero references are removed
    /// by the simplifier.
    pub fn label_identifier(&mut self, id: DeclarationId) -> Expression {
        match &mut self.declarations[id.0 as usize] {
            Declaration::Label(d) => d.reference_count += 1,
            _ => panic!("declaration {id} is not a label"),
        }
        Expression::LabelIdentifier { declaration: id }
    }

    /// Declares a struct type. Tags are unique per tree.
    pub fn declare_struct(&mut self, tag: impl Into<String>) -> Result<DeclarationId, TreeError> {
        let tag = tag.into();
        if self.struct_tags.contains_key(&tag) {
            return Err(TreeError::DuplicateStructTag { tag });
        }
        let id = self.push_declaration(Declaration::StructType(StructTypeDeclaration {
            identifier: tag.clone(),
            ty: TypeId::ERRONEOUS,
            members: Vec::new(),
        }));
        let ty = self.types.make_struct_type(id);
        match &mut self.declarations[id.0 as usize] {
            Declaration::StructType(d) => d.ty = ty,
            _ => unreachable!(),
        }
        self.struct_tags.insert(tag, id);
        Ok(id)
    }

    /// Appends a member to a struct. Members are laid out packed, in
    /// declaration order.
    pub fn add_struct_member(
        &mut self,
        struct_id: DeclarationId,
        identifier: impl Into<String>,
        ty: TypeId,
    ) -> Result<DeclarationId, TreeError> {
        let struct_ty = match self.declaration(struct_id) {
            Declaration::StructType(d) => d.ty,
            _ => return Err(TreeError::NotAStructDeclaration { id: struct_id }),
        };
        let member = self.push_declaration(Declaration::Member(MemberDeclaration {
            identifier: identifier.into(),
            ty,
        }));
        match &mut self.declarations[struct_id.0 as usize] {
            Declaration::StructType(d) => d.members.push(member),
            _ => unreachable!(),
        }
        self.types.grow_struct(struct_ty, self.types.size_of(ty));
        Ok(member)
    }

    /// The member starting exactly at `bit_offset`, if any.
    pub fn struct_member_at_offset(
        &self,
        struct_id: DeclarationId,
        bit_offset: u64,
    ) -> Option<DeclarationId> {
        let declaration = self.struct_type(struct_id)?;
        if bit_offset >= u64::from(self.types.size(declaration.ty)) {
            return None;
        }

        let mut current = 0u64;
        for &member in &declaration.members {
            if current == bit_offset {
                return Some(member);
            }
            if current > bit_offset {
                break;
            }
            current += u64::from(self.types.size_of(self.member(member)?.ty));
        }
        None
    }

    pub fn struct_by_tag(&self, tag: &str) -> Option<DeclarationId> {
        self.struct_tags.get(tag).copied()
    }

    /// Declares a function with its signature; parameter declarations are
    /// created alongside.
    pub fn declare_function(
        &mut self,
        identifier: impl Into<String>,
        return_type: TypeId,
        parameters: Vec<(String, TypeId)>,
        variadic: bool,
    ) -> DeclarationId {
        let argument_types: Vec<TypeId> = parameters.iter().map(|(_, ty)| *ty).collect();
        let ty = self
            .types
            .make_function_pointer_type(return_type, argument_types, variadic);
        let parameters: Vec<DeclarationId> = parameters
            .into_iter()
            .map(|(name, ty)| self.declare_variable(name, ty))
            .collect();
        self.push_declaration(Declaration::Function(FunctionDeclaration {
            identifier: identifier.into(),
            ty,
            parameters,
        }))
    }
}
