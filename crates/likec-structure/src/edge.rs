//! Structural graph edges.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::node::NodeId;

/// Stable edge identifier. Indexes into the graph's edge arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(pub u32);

impl EdgeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A directed edge between structural nodes.
///
/// Both endpoints are mutable and may be `None`: an edge with a null endpoint
/// has been logically deleted and appears in no node's edge lists. Endpoint
/// mutation goes through [`StructuralGraph`](crate::StructuralGraph) so those
/// lists stay in sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub(crate) tail: Option<NodeId>,
    pub(crate) head: Option<NodeId>,
}

impl Edge {
    pub fn tail(&self) -> Option<NodeId> {
        self.tail
    }

    pub fn head(&self) -> Option<NodeId> {
        self.head
    }

    /// `true` once both endpoints have been nulled.
    pub fn is_deleted(&self) -> bool {
        self.tail.is_none() && self.head.is_none()
    }
}
