//! Natural loop discovery.
//!
//! Given a candidate loop header and the DFS result of its region, the
//! explorer finds the nodes of the header's natural loop with a two-color
//! sweep: walk backward from every back-edge tail marking reachable nodes
//! gray (without crossing the header), then walk forward from the header
//! through gray nodes only, marking them black. The black set is the loop.

use indexmap::IndexMap;

use crate::dfs::{Dfs, EdgeType};
use crate::graph::StructuralGraph;
use crate::node::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Explores the natural loop of a candidate header node.
pub struct LoopExplorer<'g> {
    graph: &'g StructuralGraph,
    entry: NodeId,
    colors: IndexMap<NodeId, Color>,
    loop_nodes: Vec<NodeId>,
}

impl<'g> LoopExplorer<'g> {
    /// Runs the exploration. Returns the loop body, empty when no back edge
    /// targets `entry`.
    pub fn explore(graph: &'g StructuralGraph, entry: NodeId, dfs: &Dfs) -> Vec<NodeId> {
        let mut explorer = LoopExplorer {
            graph,
            entry,
            colors: IndexMap::new(),
            loop_nodes: Vec::new(),
        };

        for &edge in graph.node(entry).in_edges() {
            if dfs.edge_type(edge) == Some(EdgeType::Back) {
                if let Some(tail) = graph.edge(edge).tail() {
                    if explorer.color(tail) == Color::White {
                        explorer.backward_visit(tail);
                    }
                }
            }
        }

        if explorer.color(entry) == Color::Gray {
            explorer.forward_visit(entry);
        }

        explorer.loop_nodes
    }

    fn color(&self, node: NodeId) -> Color {
        self.colors.get(&node).copied().unwrap_or(Color::White)
    }

    fn backward_visit(&mut self, node: NodeId) {
        debug_assert_eq!(self.color(node), Color::White);

        self.colors.insert(node, Color::Gray);

        if node == self.entry {
            return;
        }

        for &edge in self.graph.node(node).in_edges() {
            if let Some(tail) = self.graph.edge(edge).tail() {
                if self.color(tail) == Color::White {
                    self.backward_visit(tail);
                }
            }
        }
    }

    fn forward_visit(&mut self, node: NodeId) {
        debug_assert_eq!(self.color(node), Color::Gray);

        self.colors.insert(node, Color::Black);
        self.loop_nodes.push(node);

        for &edge in self.graph.node(node).out_edges() {
            if let Some(head) = self.graph.edge(edge).head() {
                if self.color(head) == Color::Gray {
                    self.forward_visit(head);
                }
            }
        }
    }
}
