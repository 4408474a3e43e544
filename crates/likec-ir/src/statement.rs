//! IR statements and jumps.
//!
//! A statement is one step of a basic block: an assignment, a (possibly
//! conditional) jump, a call, a touch marking a term as read or written,
//! verbatim inline assembly, or an opaque callback hook left by the lifter.
//! Every statement carries the address of the machine instruction it came
//! from, when known.

use serde::{Deserialize, Serialize};

use crate::id::BasicBlockId;
use crate::term::Term;

/// One IR statement plus its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub kind: StatementKind,
    /// Address of the originating machine instruction, if recorded.
    pub instruction: Option<u64>,
}

impl Statement {
    pub fn new(kind: StatementKind) -> Self {
        Statement {
            kind,
            instruction: None,
        }
    }

    pub fn at(kind: StatementKind, instruction: u64) -> Self {
        Statement {
            kind,
            instruction: Some(instruction),
        }
    }

    /// Returns the jump if this statement is one.
    pub fn as_jump(&self) -> Option<&Jump> {
        match &self.kind {
            StatementKind::Jump(jump) => Some(jump),
            _ => None,
        }
    }
}

/// The different kinds of statements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StatementKind {
    /// `left := right`. The left term is a write, the right term a read.
    Assignment { left: Term, right: Term },

    /// Transfer of control. Only valid as the last statement of a block.
    Jump(Jump),

    /// Call through the target term.
    Call { target: Term },

    /// Marks a term as accessed without modelling the effect.
    Touch { term: Term, access: AccessKind },

    /// Verbatim assembly the lifter could not translate.
    InlineAssembly(String),

    /// Hook point for the upstream generator; carried through untouched.
    Callback,
}

/// Whether a touched term is read or written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessKind {
    Read,
    Write,
}

/// A (possibly conditional) transfer of control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Jump {
    /// Taken-branch condition; `None` makes the jump unconditional.
    pub condition: Option<Term>,
    pub then_target: JumpTarget,
    /// Fall-through target of a conditional jump.
    pub else_target: Option<JumpTarget>,
}

impl Jump {
    /// Unconditional jump to a single target.
    pub fn unconditional(target: JumpTarget) -> Self {
        Jump {
            condition: None,
            then_target: target,
            else_target: None,
        }
    }

    /// Conditional two-way jump.
    pub fn conditional(condition: Term, then_target: JumpTarget, else_target: JumpTarget) -> Self {
        Jump {
            condition: Some(condition),
            then_target,
            else_target: Some(else_target),
        }
    }

    pub fn is_conditional(&self) -> bool {
        self.condition.is_some()
    }

    pub fn is_unconditional(&self) -> bool {
        self.condition.is_none()
    }
}

/// Where a jump transfers control to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JumpTarget {
    /// Direct reference to a basic block.
    Block(BasicBlockId),
    /// Indirect jump through a table of known successors.
    Table(JumpTable),
}

impl JumpTarget {
    /// The directly referenced block, if this target is direct.
    pub fn basic_block(&self) -> Option<BasicBlockId> {
        match self {
            JumpTarget::Block(id) => Some(*id),
            JumpTarget::Table(_) => None,
        }
    }

    /// The jump table, if this target goes through one.
    pub fn table(&self) -> Option<&JumpTable> {
        match self {
            JumpTarget::Table(table) => Some(table),
            JumpTarget::Block(_) => None,
        }
    }
}

/// A jump table: the address term being jumped through, and the successor
/// blocks the table can lead to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JumpTable {
    /// The computed jump address.
    pub address: Term,
    /// Successor blocks, in table order.
    pub blocks: Vec<BasicBlockId>,
}

impl JumpTable {
    pub fn size(&self) -> usize {
        self.blocks.len()
    }
}
