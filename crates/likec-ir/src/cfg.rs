//! Immutable control flow graph view over a function.
//!
//! [`Cfg`] is built once per decompile run and answers successor and
//! predecessor queries. It never mutates the function; structural analysis
//! operates on its own graph built from this view.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::function::Function;
use crate::id::BasicBlockId;
use crate::statement::JumpTarget;

/// Read-only predecessor/successor oracle over a function's basic blocks.
#[derive(Debug)]
pub struct Cfg {
    graph: DiGraph<BasicBlockId, (), u32>,
    /// NodeIndex for each block, indexed by `BasicBlockId`.
    indices: Vec<NodeIndex<u32>>,
}

impl Cfg {
    /// Builds the CFG of a function.
    ///
    /// A conditional jump contributes both targets; a table jump contributes
    /// every table entry. Duplicate successors collapse into one edge.
    pub fn new(function: &Function) -> Self {
        let mut graph = DiGraph::with_capacity(function.block_count(), function.block_count());
        let indices: Vec<_> = function.block_ids().map(|id| graph.add_node(id)).collect();

        for id in function.block_ids() {
            let block = function.block(id).unwrap();
            let Some(jump) = block.jump() else {
                continue;
            };

            let mut successors: Vec<BasicBlockId> = Vec::new();
            let push_target = |target: &JumpTarget, successors: &mut Vec<BasicBlockId>| {
                match target {
                    JumpTarget::Block(head) => {
                        if !successors.contains(head) {
                            successors.push(*head);
                        }
                    }
                    JumpTarget::Table(table) => {
                        for head in &table.blocks {
                            if !successors.contains(head) {
                                successors.push(*head);
                            }
                        }
                    }
                }
            };

            push_target(&jump.then_target, &mut successors);
            if let Some(else_target) = &jump.else_target {
                push_target(else_target, &mut successors);
            }

            for head in successors {
                graph.add_edge(indices[id.index()], indices[head.index()], ());
            }
        }

        Cfg { graph, indices }
    }

    /// Successor blocks of `block`, in jump order.
    pub fn successors(&self, block: BasicBlockId) -> impl Iterator<Item = BasicBlockId> + '_ {
        // petgraph iterates neighbors most-recently-added first; reverse to
        // recover insertion order.
        let mut out: Vec<BasicBlockId> = self
            .graph
            .neighbors_directed(self.indices[block.index()], Direction::Outgoing)
            .map(|idx| self.graph[idx])
            .collect();
        out.reverse();
        out.into_iter()
    }

    /// Predecessor blocks of `block`.
    pub fn predecessors(&self, block: BasicBlockId) -> impl Iterator<Item = BasicBlockId> + '_ {
        let mut out: Vec<BasicBlockId> = self
            .graph
            .neighbors_directed(self.indices[block.index()], Direction::Incoming)
            .map(|idx| self.graph[idx])
            .collect();
        out.reverse();
        out.into_iter()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}
