pub mod analyzer;
pub mod builder;
pub mod cancel;
pub mod dfs;
pub mod edge;
pub mod graph;
pub mod loops;
pub mod node;

// Re-export commonly used types
pub use analyzer::{StructureAnalyzer, EXIT_BRANCH_JOIN_DEGREE};
pub use cancel::CancellationToken;
pub use dfs::{Dfs, EdgeType};
pub use edge::{Edge, EdgeId};
pub use graph::StructuralGraph;
pub use loops::LoopExplorer;
pub use node::{BasicNode, Node, NodeId, NodeKind, Region, RegionKind, SwitchData};
