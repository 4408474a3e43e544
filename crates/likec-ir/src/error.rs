//! Error types for the IR crate.
//!
//! Uses `thiserror` for structured, matchable variants. These errors only
//! arise from construction-time misuse of the builder APIs; once a function
//! is built, the back-end treats it as immutable and never fails on it.

use crate::id::BasicBlockId;
use thiserror::Error;

/// Errors produced while building IR.
#[derive(Debug, Error)]
pub enum IrError {
    /// A basic block ID was not found in the function.
    #[error("basic block not found: BasicBlockId({id})", id = id.0)]
    BlockNotFound { id: BasicBlockId },

    /// A jump references a block that does not exist in the function.
    #[error("jump target not found: BasicBlockId({id})", id = id.0)]
    JumpTargetNotFound { id: BasicBlockId },

    /// A statement was appended after the block's trailing jump.
    #[error("basic block {id} already ends with a jump", id = block.0)]
    StatementAfterJump { block: BasicBlockId },
}
