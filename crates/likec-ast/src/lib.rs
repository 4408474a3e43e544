pub mod error;
pub mod expr;
pub mod printer;
pub mod ranges;
pub mod simplify;
pub mod stmt;
pub mod tree;
pub mod type_calc;
pub mod types;

// Re-export commonly used types
pub use error::TreeError;
pub use expr::{
    is_one, is_zero, BinaryOperatorKind, CastKind, Expression, MemberAccessKind, SizedValue,
    UnaryOperatorKind,
};
pub use printer::{PrintListener, PrintedNodeKind, Printer};
pub use ranges::{NodeTag, RangeNode, RangeTree, RangeTreeBuilder};
pub use simplify::Simplifier;
pub use stmt::{Block, Statement};
pub use tree::{
    CompilationUnit, Declaration, DeclarationId, FunctionDefinition, TopLevelDeclaration, Tree,
};
pub use type_calc::{binary_operator_type, expression_type};
pub use types::{LikecType, TypeId, TypeTable};
