//! Error types for LikeC tree construction.
//!
//! The tree APIs only fail on construction-time misuse; type calculation and
//! simplification never error, they degrade to the erroneous type or leave
//! the node alone.

use crate::tree::DeclarationId;
use thiserror::Error;

/// Errors produced while building a LikeC tree.
#[derive(Debug, Error)]
pub enum TreeError {
    /// A struct tag is already declared in this tree.
    #[error("duplicate struct tag: '{tag}'")]
    DuplicateStructTag { tag: String },

    /// A declaration was used where a struct type declaration was expected.
    #[error("declaration {id} is not a struct type declaration", id = id.0)]
    NotAStructDeclaration { id: DeclarationId },
}
