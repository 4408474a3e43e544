//! Construction of the initial structural graph from a function's CFG.

use likec_ir::{Cfg, Function};

use crate::graph::StructuralGraph;
use crate::node::NodeId;

impl StructuralGraph {
    /// Builds the initial graph: one leaf node per basic block and one edge
    /// per CFG edge, all children of the root region.
    pub fn build(function: &Function, cfg: &Cfg) -> StructuralGraph {
        let mut graph = StructuralGraph::new();
        let root = graph.root();

        let mut block_nodes: Vec<NodeId> = Vec::with_capacity(function.block_count());
        for id in function.block_ids() {
            let block = function.block(id).expect("block ids are dense");
            let is_condition = block.jump().is_some_and(|jump| {
                jump.is_conditional()
                    && jump.then_target.basic_block().is_some()
                    && jump
                        .else_target
                        .as_ref()
                        .and_then(|target| target.basic_block())
                        .is_some()
            });
            let node = graph.add_basic_node(id, is_condition);
            graph.add_node(root, node);
            block_nodes.push(node);
        }

        if let Some(entry) = function.entry() {
            graph.set_entry(root, block_nodes[entry.index()]);
        }

        for tail in function.block_ids() {
            for head in cfg.successors(tail) {
                graph.create_edge(block_nodes[tail.index()], block_nodes[head.index()]);
            }
        }

        #[cfg(debug_assertions)]
        graph.assert_consistency();

        graph
    }
}
