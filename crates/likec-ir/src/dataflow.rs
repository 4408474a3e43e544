//! The dataflow oracle interface.
//!
//! Dataflow analysis happens upstream of this back-end; the results are
//! consulted read-only through [`DataflowProvider`]. The structural analyzer
//! uses the pattern helpers (`recognize_array_access`,
//! `recognize_bounds_check`, `first_copy`) for switch recovery; the tree
//! builder uses the rest for typing.
//!
//! Every query is optional in spirit: a provider that knows nothing (see
//! [`NoDataflow`]) simply makes the dependent reductions skip.

use serde::{Deserialize, Serialize};

use crate::id::BasicBlockId;
use crate::statement::Jump;
use crate::term::{BitSize, MemoryLocation, Term};

/// Bit-level knowledge about a term's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbstractValue {
    /// Mask of bits known to be zero.
    pub zero_bits: u64,
    /// Mask of bits known to be one.
    pub one_bits: u64,
    /// Stack offset, when the value is a known displacement off the frame.
    pub stack_offset: Option<i64>,
    /// Whether the value is known to be a product.
    pub is_product: bool,
    /// Whether the value is a return address.
    pub is_return_address: bool,
}

impl AbstractValue {
    /// The concrete value, if every bit within `size` is known.
    pub fn concrete_value(&self, size: BitSize) -> Option<u64> {
        let mask = if size >= 64 {
            u64::MAX
        } else {
            (1u64 << size) - 1
        };
        if (self.zero_bits | self.one_bits) & mask == mask {
            Some(self.one_bits & mask)
        } else {
            None
        }
    }
}

/// Definitions reaching one use, chunked by the memory location pieces they
/// cover.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReachingDefinitions {
    pub chunks: Vec<(MemoryLocation, Vec<StatementRef>)>,
}

impl ReachingDefinitions {
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// Position of a statement inside a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatementRef {
    pub block: BasicBlockId,
    pub index: usize,
}

/// Result of recognizing `base + index * element_size` in an address term.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayAccess {
    /// The index term.
    pub index: Term,
    /// Element stride in bytes.
    pub element_size: u64,
}

/// Result of recognizing a jump that excludes too-large indices.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundsCheck {
    /// The index term being bounded.
    pub index: Term,
    /// Largest index value that passes the check.
    pub max_value: u64,
}

/// Read-only access to upstream dataflow results.
pub trait DataflowProvider {
    /// Bit-level knowledge about a term, if any.
    fn abstract_value(&self, term: &Term) -> Option<AbstractValue>;

    /// The memory location a term reads or writes, if known.
    fn memory_location(&self, term: &Term) -> Option<MemoryLocation>;

    /// The definitions reaching this use.
    fn reaching_definitions(&self, term: &Term) -> ReachingDefinitions;

    /// Recognizes `base + index * element` in a jump address.
    fn recognize_array_access(&self, address: &Term) -> Option<ArrayAccess>;

    /// Recognizes a conditional jump that lets control reach `passing_target`
    /// only for index values up to some maximum.
    fn recognize_bounds_check(
        &self,
        jump: &Jump,
        passing_target: BasicBlockId,
    ) -> Option<BoundsCheck>;

    /// Canonicalizes a term through copy definitions. Two terms denote the
    /// same value when their first copies compare equal.
    fn first_copy(&self, term: &Term) -> Term;
}

/// A provider that knows nothing. Reductions requiring dataflow skip.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDataflow;

impl DataflowProvider for NoDataflow {
    fn abstract_value(&self, _term: &Term) -> Option<AbstractValue> {
        None
    }

    fn memory_location(&self, _term: &Term) -> Option<MemoryLocation> {
        None
    }

    fn reaching_definitions(&self, _term: &Term) -> ReachingDefinitions {
        ReachingDefinitions::default()
    }

    fn recognize_array_access(&self, _address: &Term) -> Option<ArrayAccess> {
        None
    }

    fn recognize_bounds_check(
        &self,
        _jump: &Jump,
        _passing_target: BasicBlockId,
    ) -> Option<BoundsCheck> {
        None
    }

    fn first_copy(&self, term: &Term) -> Term {
        term.clone()
    }
}
