//! Target platform facts.

use serde::{Deserialize, Serialize};

use crate::term::BitSize;

/// Bit widths of the target platform's `int`, `void *`, and `ptrdiff_t`.
///
/// Consumed by the LikeC type table for integer promotion and pointer
/// arithmetic typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    pub int_size: BitSize,
    pub pointer_size: BitSize,
    pub ptrdiff_size: BitSize,
}

impl Platform {
    /// The common LP64 configuration: 32-bit int, 64-bit pointers.
    pub fn lp64() -> Self {
        Platform {
            int_size: 32,
            pointer_size: 64,
            ptrdiff_size: 64,
        }
    }

    /// The ILP32 configuration: everything 32 bits.
    pub fn ilp32() -> Self {
        Platform {
            int_size: 32,
            pointer_size: 32,
            ptrdiff_size: 32,
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::lp64()
    }
}
