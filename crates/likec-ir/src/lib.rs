pub mod cfg;
pub mod dataflow;
pub mod error;
pub mod function;
pub mod id;
pub mod platform;
pub mod statement;
pub mod term;

// Re-export commonly used types
pub use cfg::Cfg;
pub use dataflow::{
    AbstractValue, ArrayAccess, BoundsCheck, DataflowProvider, NoDataflow, ReachingDefinitions,
    StatementRef,
};
pub use error::IrError;
pub use function::{BasicBlock, Function};
pub use id::BasicBlockId;
pub use platform::Platform;
pub use statement::{AccessKind, Jump, JumpTable, JumpTarget, Statement, StatementKind};
pub use term::{
    AddressSpace, BinaryTermOp, BitSize, IntrinsicKind, LocationDomain, MemoryLocation, Term,
    TermKind, UnaryTermOp,
};
