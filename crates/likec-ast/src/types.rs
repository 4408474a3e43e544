//! The LikeC type system.
//!
//! Types are interned: requesting the 32-bit unsigned integer twice yields
//! the same [`TypeId`]. The table also carries the target platform's `int`,
//! pointer, and `ptrdiff_t` widths, and implements the C conversion rules
//! (integer promotion, usual arithmetic conversion).
//!
//! Arrays are a pointer subvariant, modelling C array-to-pointer decay: an
//! array is a pointer for typing purposes, but its `size_of` is
//! `element * length` and it is not a scalar.

use std::collections::HashMap;

use likec_ir::{BitSize, Platform};

use crate::tree::DeclarationId;

/// Unique identifier for a type interned in a [`TypeTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(pub u32);

impl TypeId {
    pub const VOID: TypeId = TypeId(0);
    pub const ERRONEOUS: TypeId = TypeId(1);
}

/// A LikeC type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LikecType {
    Void,
    /// Stands in for any type the calculator could not determine.
    Erroneous,
    Integer {
        size: BitSize,
        unsigned: bool,
    },
    Float {
        size: BitSize,
    },
    Pointer {
        size: BitSize,
        pointee: TypeId,
    },
    /// An array decays to a pointer; `size` is the pointer width it decays
    /// to, while `size_of` reports the storage size.
    Array {
        size: BitSize,
        element: TypeId,
        length: usize,
    },
    FunctionPointer {
        size: BitSize,
        return_type: TypeId,
        argument_types: Vec<TypeId>,
        variadic: bool,
    },
    /// Nominal struct type, tied to its declaration in the tree.
    Struct {
        declaration: DeclarationId,
        /// Accumulated size of the members, in bits.
        size: BitSize,
    },
}

/// Interned types plus platform facts, owned by one tree.
#[derive(Debug, Clone)]
pub struct TypeTable {
    platform: Platform,
    types: Vec<LikecType>,
    integers: HashMap<(BitSize, bool), TypeId>,
    floats: HashMap<BitSize, TypeId>,
    pointers: HashMap<(BitSize, TypeId), TypeId>,
    arrays: HashMap<(BitSize, TypeId, usize), TypeId>,
}

impl TypeTable {
    /// Creates a table with the void and erroneous singletons pre-registered.
    pub fn new(platform: Platform) -> Self {
        TypeTable {
            platform,
            types: vec![LikecType::Void, LikecType::Erroneous],
            integers: HashMap::new(),
            floats: HashMap::new(),
            pointers: HashMap::new(),
            arrays: HashMap::new(),
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn int_size(&self) -> BitSize {
        self.platform.int_size
    }

    pub fn pointer_size(&self) -> BitSize {
        self.platform.pointer_size
    }

    pub fn ptrdiff_size(&self) -> BitSize {
        self.platform.ptrdiff_size
    }

    pub fn get(&self, id: TypeId) -> &LikecType {
        &self.types[id.0 as usize]
    }

    fn push(&mut self, ty: LikecType) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(ty);
        id
    }

    // -----------------------------------------------------------------------
    // Interning constructors
    // -----------------------------------------------------------------------

    pub fn void_type(&self) -> TypeId {
        TypeId::VOID
    }

    pub fn erroneous_type(&self) -> TypeId {
        TypeId::ERRONEOUS
    }

    pub fn make_integer_type(&mut self, size: BitSize, unsigned: bool) -> TypeId {
        if let Some(&id) = self.integers.get(&(size, unsigned)) {
            return id;
        }
        let id = self.push(LikecType::Integer { size, unsigned });
        self.integers.insert((size, unsigned), id);
        id
    }

    pub fn make_float_type(&mut self, size: BitSize) -> TypeId {
        if let Some(&id) = self.floats.get(&size) {
            return id;
        }
        let id = self.push(LikecType::Float { size });
        self.floats.insert(size, id);
        id
    }

    pub fn make_pointer_type(&mut self, size: BitSize, pointee: TypeId) -> TypeId {
        if let Some(&id) = self.pointers.get(&(size, pointee)) {
            return id;
        }
        let id = self.push(LikecType::Pointer { size, pointee });
        self.pointers.insert((size, pointee), id);
        id
    }

    /// Pointer to `pointee` with the platform's usual pointer size.
    pub fn make_pointer_to(&mut self, pointee: TypeId) -> TypeId {
        self.make_pointer_type(self.platform.pointer_size, pointee)
    }

    pub fn make_array_type(&mut self, size: BitSize, element: TypeId, length: usize) -> TypeId {
        if let Some(&id) = self.arrays.get(&(size, element, length)) {
            return id;
        }
        let id = self.push(LikecType::Array {
            size,
            element,
            length,
        });
        self.arrays.insert((size, element, length), id);
        id
    }

    /// Array with size equal to the usual pointer size.
    pub fn make_array_of(&mut self, element: TypeId, length: usize) -> TypeId {
        self.make_array_type(self.platform.pointer_size, element, length)
    }

    /// Function pointer types are not deduplicated; each declaration gets its
    /// own.
    pub fn make_function_pointer_type(
        &mut self,
        return_type: TypeId,
        argument_types: Vec<TypeId>,
        variadic: bool,
    ) -> TypeId {
        self.push(LikecType::FunctionPointer {
            size: self.platform.pointer_size,
            return_type,
            argument_types,
            variadic,
        })
    }

    pub(crate) fn make_struct_type(&mut self, declaration: DeclarationId) -> TypeId {
        self.push(LikecType::Struct {
            declaration,
            size: 0,
        })
    }

    pub(crate) fn grow_struct(&mut self, id: TypeId, amount: BitSize) {
        match &mut self.types[id.0 as usize] {
            LikecType::Struct { size, .. } => *size += amount,
            _ => panic!("type is not a struct"),
        }
    }

    // -----------------------------------------------------------------------
    // Predicates and measures
    // -----------------------------------------------------------------------

    pub fn is_void(&self, id: TypeId) -> bool {
        matches!(self.get(id), LikecType::Void)
    }

    pub fn is_erroneous(&self, id: TypeId) -> bool {
        matches!(self.get(id), LikecType::Erroneous)
    }

    pub fn is_integer(&self, id: TypeId) -> bool {
        matches!(self.get(id), LikecType::Integer { .. })
    }

    pub fn is_unsigned(&self, id: TypeId) -> bool {
        matches!(self.get(id), LikecType::Integer { unsigned: true, .. })
    }

    pub fn is_float(&self, id: TypeId) -> bool {
        matches!(self.get(id), LikecType::Float { .. })
    }

    pub fn is_arithmetic(&self, id: TypeId) -> bool {
        self.is_integer(id) || self.is_float(id)
    }

    /// Pointers include arrays and function pointers.
    pub fn is_pointer(&self, id: TypeId) -> bool {
        matches!(
            self.get(id),
            LikecType::Pointer { .. } | LikecType::Array { .. } | LikecType::FunctionPointer { .. }
        )
    }

    pub fn is_array(&self, id: TypeId) -> bool {
        matches!(self.get(id), LikecType::Array { .. })
    }

    pub fn is_struct(&self, id: TypeId) -> bool {
        matches!(self.get(id), LikecType::Struct { .. })
    }

    /// Arithmetic types and pointers are scalar; arrays are not.
    pub fn is_scalar(&self, id: TypeId) -> bool {
        if self.is_array(id) {
            return false;
        }
        self.is_arithmetic(id) || self.is_pointer(id)
    }

    pub fn is_void_pointer(&self, id: TypeId) -> bool {
        self.pointee(id).is_some_and(|p| self.is_void(p))
    }

    pub fn is_structure_pointer(&self, id: TypeId) -> bool {
        self.pointee(id).is_some_and(|p| self.is_struct(p))
    }

    /// The pointee of a pointer, or the element of an array.
    pub fn pointee(&self, id: TypeId) -> Option<TypeId> {
        match self.get(id) {
            LikecType::Pointer { pointee, .. } => Some(*pointee),
            LikecType::Array { element, .. } => Some(*element),
            _ => None,
        }
    }

    /// The declared width of a value of this type, in bits. For an array this
    /// is the pointer width it decays to; see [`size_of`](Self::size_of).
    pub fn size(&self, id: TypeId) -> BitSize {
        match self.get(id) {
            LikecType::Void | LikecType::Erroneous => 0,
            LikecType::Integer { size, .. }
            | LikecType::Float { size }
            | LikecType::Pointer { size, .. }
            | LikecType::Array { size, .. }
            | LikecType::FunctionPointer { size, .. }
            | LikecType::Struct { size, .. } => *size,
        }
    }

    /// The storage size, in bits: `element * length` for arrays, the declared
    /// size for everything else.
    pub fn size_of(&self, id: TypeId) -> BitSize {
        match self.get(id) {
            LikecType::Array {
                element, length, ..
            } => self.size_of(*element) * (*length as BitSize),
            _ => self.size(id),
        }
    }

    // -----------------------------------------------------------------------
    // Conversions
    // -----------------------------------------------------------------------

    /// Integers narrower than `int` widen to `int`, preserving signedness.
    /// Non-integers pass through.
    pub fn integer_promotion(&mut self, id: TypeId) -> TypeId {
        match *self.get(id) {
            LikecType::Integer { size, unsigned } if size < self.platform.int_size => {
                self.make_integer_type(self.platform.int_size, unsigned)
            }
            _ => id,
        }
    }

    /// The C usual arithmetic conversion: promote both, floats beat
    /// integers, the wider wins, and equal-width mixes prefer unsigned.
    pub fn usual_arithmetic_conversion(&mut self, left: TypeId, right: TypeId) -> TypeId {
        let left = self.integer_promotion(left);
        let right = self.integer_promotion(right);

        match (self.get(left).clone(), self.get(right).clone()) {
            (LikecType::Float { size: l }, LikecType::Float { size: r }) => {
                self.make_float_type(l.max(r))
            }
            (LikecType::Float { .. }, LikecType::Integer { .. }) => left,
            (LikecType::Integer { .. }, LikecType::Float { .. }) => right,
            (
                LikecType::Integer {
                    size: l,
                    unsigned: lu,
                },
                LikecType::Integer {
                    size: r,
                    unsigned: ru,
                },
            ) => {
                if l < r {
                    right
                } else if l > r {
                    left
                } else {
                    self.make_integer_type(l, lu || ru)
                }
            }
            _ => self.erroneous_type(),
        }
    }
}
