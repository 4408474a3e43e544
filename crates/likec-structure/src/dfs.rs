//! One-shot depth-first traversal of a region.
//!
//! Produces preorder and postorder node lists and classifies every edge
//! inside the region as forward, back, or cross based on the head's color at
//! discovery time. Children unreachable from the region's entry are swept as
//! extra traversal roots, so the orderings cover unreachable fragments too.

use indexmap::IndexMap;

use crate::edge::EdgeId;
use crate::graph::StructuralGraph;
use crate::node::NodeId;

/// Classification of an edge with respect to the DFS tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeType {
    Forward,
    Back,
    Cross,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// The result of one traversal.
#[derive(Debug)]
pub struct Dfs {
    preorder: Vec<NodeId>,
    postorder: Vec<NodeId>,
    edge_types: IndexMap<EdgeId, EdgeType>,
}

impl Dfs {
    /// Traverses the children of `region`, starting from its entry.
    pub fn run(graph: &StructuralGraph, region: NodeId) -> Dfs {
        let children = graph.region(region).children();

        let mut state = State {
            graph,
            region,
            colors: IndexMap::with_capacity(children.len()),
            preorder: Vec::with_capacity(children.len()),
            postorder: Vec::with_capacity(children.len()),
            edge_types: IndexMap::new(),
        };

        if let Some(entry) = graph.region(region).entry() {
            state.visit(entry);
        }

        for &node in children {
            if state.color(node) == Color::White {
                state.visit(node);
            }
        }

        Dfs {
            preorder: state.preorder,
            postorder: state.postorder,
            edge_types: state.edge_types,
        }
    }

    pub fn preorder(&self) -> &[NodeId] {
        &self.preorder
    }

    pub fn postorder(&self) -> &[NodeId] {
        &self.postorder
    }

    /// The classification of an edge inside the region; `None` for edges not
    /// seen by this traversal.
    pub fn edge_type(&self, edge: EdgeId) -> Option<EdgeType> {
        self.edge_types.get(&edge).copied()
    }
}

struct State<'g> {
    graph: &'g StructuralGraph,
    region: NodeId,
    colors: IndexMap<NodeId, Color>,
    preorder: Vec<NodeId>,
    postorder: Vec<NodeId>,
    edge_types: IndexMap<EdgeId, EdgeType>,
}

impl State<'_> {
    fn color(&self, node: NodeId) -> Color {
        self.colors.get(&node).copied().unwrap_or(Color::White)
    }

    fn visit(&mut self, node: NodeId) {
        debug_assert_eq!(self.color(node), Color::White);

        self.colors.insert(node, Color::Gray);
        self.preorder.push(node);

        for &edge in self.graph.node(node).out_edges() {
            let Some(head) = self.graph.edge(edge).head() else {
                continue;
            };
            // Only edges staying inside the region are classified.
            if self.graph.node(head).parent() != Some(self.region) {
                continue;
            }
            match self.color(head) {
                Color::White => {
                    self.edge_types.insert(edge, EdgeType::Forward);
                    self.visit(head);
                }
                Color::Gray => {
                    self.edge_types.insert(edge, EdgeType::Back);
                }
                Color::Black => {
                    self.edge_types.insert(edge, EdgeType::Cross);
                }
            }
        }

        self.colors.insert(node, Color::Black);
        self.postorder.push(node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use likec_ir::BasicBlockId;

    fn leaf(graph: &mut StructuralGraph, block: u32) -> NodeId {
        let root = graph.root();
        let node = graph.add_basic_node(BasicBlockId(block), false);
        graph.add_node(root, node);
        node
    }

    #[test]
    fn diamond_classification() {
        // a -> b -> d, a -> c -> d
        let mut graph = StructuralGraph::new();
        let root = graph.root();
        let a = leaf(&mut graph, 0);
        let b = leaf(&mut graph, 1);
        let c = leaf(&mut graph, 2);
        let d = leaf(&mut graph, 3);
        graph.set_entry(root, a);

        let a_b = graph.create_edge(a, b);
        let a_c = graph.create_edge(a, c);
        let b_d = graph.create_edge(b, d);
        let c_d = graph.create_edge(c, d);

        let dfs = Dfs::run(&graph, root);

        assert_eq!(dfs.preorder(), &[a, b, d, c]);
        assert_eq!(dfs.postorder(), &[d, b, c, a]);
        assert_eq!(dfs.edge_type(a_b), Some(EdgeType::Forward));
        assert_eq!(dfs.edge_type(b_d), Some(EdgeType::Forward));
        assert_eq!(dfs.edge_type(a_c), Some(EdgeType::Forward));
        assert_eq!(dfs.edge_type(c_d), Some(EdgeType::Cross));
    }

    #[test]
    fn back_edge_detection() {
        // a -> b -> a
        let mut graph = StructuralGraph::new();
        let root = graph.root();
        let a = leaf(&mut graph, 0);
        let b = leaf(&mut graph, 1);
        graph.set_entry(root, a);

        let a_b = graph.create_edge(a, b);
        let b_a = graph.create_edge(b, a);

        let dfs = Dfs::run(&graph, root);
        assert_eq!(dfs.edge_type(a_b), Some(EdgeType::Forward));
        assert_eq!(dfs.edge_type(b_a), Some(EdgeType::Back));
    }

    #[test]
    fn unreachable_fragment_is_swept() {
        let mut graph = StructuralGraph::new();
        let root = graph.root();
        let a = leaf(&mut graph, 0);
        let orphan = leaf(&mut graph, 1);
        graph.set_entry(root, a);

        let dfs = Dfs::run(&graph, root);
        assert!(dfs.preorder().contains(&orphan));
        assert!(dfs.postorder().contains(&orphan));
    }
}
