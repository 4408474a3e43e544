//! Stable ID newtypes for IR entities.
//!
//! IDs are distinct newtype wrappers over `u32`, so a basic block reference
//! cannot be confused with any other index at the type level.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable basic block identifier. Indexes into [`Function`](crate::Function)'s
/// block table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BasicBlockId(pub u32);

impl BasicBlockId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for BasicBlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_block_id_display() {
        assert_eq!(format!("{}", BasicBlockId(7)), "7");
    }

    #[test]
    fn serde_roundtrip() {
        let id = BasicBlockId(42);
        let json = serde_json::to_string(&id).unwrap();
        let back: BasicBlockId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
