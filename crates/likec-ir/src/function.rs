//! Basic blocks and functions.
//!
//! A [`Function`] owns its basic blocks, indexed by [`BasicBlockId`]. Blocks
//! are created first and filled with statements afterwards, so jumps can
//! reference blocks in any order; the filling API validates every referenced
//! block eagerly.

use serde::{Deserialize, Serialize};

use crate::error::IrError;
use crate::id::BasicBlockId;
use crate::statement::{Jump, JumpTarget, Statement, StatementKind};

/// A maximal straight-line sequence of statements with a single entry and a
/// single (possibly conditional) exit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicBlock {
    /// Address of the first instruction, if the block maps to the image.
    pub address: Option<u64>,
    statements: Vec<Statement>,
}

impl BasicBlock {
    fn new(address: Option<u64>) -> Self {
        BasicBlock {
            address,
            statements: Vec::new(),
        }
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Returns the trailing jump, if the block ends with one.
    pub fn jump(&self) -> Option<&Jump> {
        self.statements.last().and_then(Statement::as_jump)
    }
}

/// One lifted function: a table of basic blocks plus an entry block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    blocks: Vec<BasicBlock>,
    entry: Option<BasicBlockId>,
}

impl Function {
    /// Creates an empty function with no blocks and no entry.
    pub fn new() -> Self {
        Function {
            blocks: Vec::new(),
            entry: None,
        }
    }

    /// Adds an empty basic block and returns its ID.
    pub fn add_block(&mut self, address: Option<u64>) -> BasicBlockId {
        let id = BasicBlockId(self.blocks.len() as u32);
        self.blocks.push(BasicBlock::new(address));
        id
    }

    /// Sets the entry block.
    pub fn set_entry(&mut self, id: BasicBlockId) -> Result<(), IrError> {
        if self.block(id).is_none() {
            return Err(IrError::BlockNotFound { id });
        }
        self.entry = Some(id);
        Ok(())
    }

    pub fn entry(&self) -> Option<BasicBlockId> {
        self.entry
    }

    /// Looks up a basic block by ID.
    pub fn block(&self, id: BasicBlockId) -> Option<&BasicBlock> {
        self.blocks.get(id.index())
    }

    /// Returns all block IDs in creation order.
    pub fn block_ids(&self) -> impl Iterator<Item = BasicBlockId> + '_ {
        (0..self.blocks.len() as u32).map(BasicBlockId)
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Appends a statement to a block.
    ///
    /// Validates that the block exists, that it does not already end with a
    /// jump, and that every block a jump statement references exists.
    pub fn push_statement(
        &mut self,
        id: BasicBlockId,
        statement: Statement,
    ) -> Result<(), IrError> {
        if self.block(id).is_none() {
            return Err(IrError::BlockNotFound { id });
        }
        if self.blocks[id.index()].jump().is_some() {
            return Err(IrError::StatementAfterJump { block: id });
        }
        if let StatementKind::Jump(jump) = &statement.kind {
            self.check_target(&jump.then_target)?;
            if let Some(else_target) = &jump.else_target {
                self.check_target(else_target)?;
            }
        }
        self.blocks[id.index()].statements.push(statement);
        Ok(())
    }

    fn check_target(&self, target: &JumpTarget) -> Result<(), IrError> {
        match target {
            JumpTarget::Block(id) => {
                if self.block(*id).is_none() {
                    return Err(IrError::JumpTargetNotFound { id: *id });
                }
            }
            JumpTarget::Table(table) => {
                for &id in &table.blocks {
                    if self.block(id).is_none() {
                        return Err(IrError::JumpTargetNotFound { id });
                    }
                }
            }
        }
        Ok(())
    }
}

impl Default for Function {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::{Jump, JumpTarget, StatementKind};
    use crate::term::Term;

    fn jump_to(id: BasicBlockId) -> Statement {
        Statement::new(StatementKind::Jump(Jump::unconditional(JumpTarget::Block(
            id,
        ))))
    }

    #[test]
    fn build_two_block_function() {
        let mut function = Function::new();
        let a = function.add_block(Some(0x1000));
        let b = function.add_block(None);
        function.set_entry(a).unwrap();

        function.push_statement(a, jump_to(b)).unwrap();

        assert_eq!(function.entry(), Some(a));
        assert_eq!(function.block_count(), 2);
        assert!(function.block(a).unwrap().jump().is_some());
        assert!(function.block(b).unwrap().jump().is_none());
        assert_eq!(function.block(a).unwrap().address, Some(0x1000));
    }

    #[test]
    fn set_entry_unknown_block_errors() {
        let mut function = Function::new();
        let result = function.set_entry(BasicBlockId(3));
        assert!(matches!(result, Err(IrError::BlockNotFound { .. })));
    }

    #[test]
    fn jump_to_unknown_block_errors() {
        let mut function = Function::new();
        let a = function.add_block(None);
        let result = function.push_statement(a, jump_to(BasicBlockId(9)));
        assert!(matches!(result, Err(IrError::JumpTargetNotFound { .. })));
    }

    #[test]
    fn statement_after_jump_errors() {
        let mut function = Function::new();
        let a = function.add_block(None);
        let b = function.add_block(None);
        function.push_statement(a, jump_to(b)).unwrap();

        let result = function.push_statement(
            a,
            Statement::new(StatementKind::Call {
                target: Term::int_const(0, 64),
            }),
        );
        assert!(matches!(result, Err(IrError::StatementAfterJump { .. })));
    }
}
