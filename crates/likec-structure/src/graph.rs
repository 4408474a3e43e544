//! The structural graph: arena-owned nodes and edges.
//!
//! [`StructuralGraph`] owns every node and edge of one decompile run; all
//! cross-links are IDs into the arenas. Edge endpoint mutation goes through
//! the graph so that per-node in/out edge lists stay symmetric with the edge
//! endpoints at all times.

use crate::edge::{Edge, EdgeId};
use crate::node::{BasicNode, Node, NodeId, NodeKind, Region, RegionKind, SwitchData};

use likec_ir::BasicBlockId;

/// Mutable graph of basic-block leaves and regions, reduced in place by the
/// structural analyzer.
#[derive(Debug, Clone)]
pub struct StructuralGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    root: NodeId,
}

impl StructuralGraph {
    /// Creates a graph holding a single empty root region.
    pub fn new() -> Self {
        let root = Node::new(NodeKind::Region(Region::new(RegionKind::Unknown)));
        StructuralGraph {
            nodes: vec![root],
            edges: Vec::new(),
            root: NodeId(0),
        }
    }

    /// The root region. Never has a parent.
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.index()]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// All edge IDs ever created, including logically deleted ones.
    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        (0..self.edges.len() as u32).map(EdgeId)
    }

    /// The region data of `id`. Panics if `id` is a leaf.
    pub fn region(&self, id: NodeId) -> &Region {
        self.node(id).as_region().expect("node is not a region")
    }

    pub(crate) fn region_mut(&mut self, id: NodeId) -> &mut Region {
        match &mut self.nodes[id.index()].kind {
            NodeKind::Region(region) => region,
            NodeKind::Basic(_) => panic!("node is not a region"),
        }
    }

    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    /// Allocates a leaf node for a basic block. The node starts unparented;
    /// attach it with [`add_node`](Self::add_node).
    pub fn add_basic_node(&mut self, block: BasicBlockId, is_condition: bool) -> NodeId {
        self.push_node(Node::new(NodeKind::Basic(BasicNode {
            block,
            is_condition,
        })))
    }

    /// Allocates an empty region of the given kind, unparented.
    pub fn add_region(&mut self, kind: RegionKind) -> NodeId {
        self.push_node(Node::new(NodeKind::Region(Region::new(kind))))
    }

    /// Allocates a switch region together with its switch data.
    pub fn add_switch_region(&mut self, data: SwitchData) -> NodeId {
        let id = self.push_node(Node::new(NodeKind::Region(Region::new(RegionKind::Switch))));
        self.region_mut(id).switch = Some(data);
        id
    }

    fn push_node(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Allocates an edge from `tail` to `head` and links it into both
    /// endpoint edge lists.
    pub fn create_edge(&mut self, tail: NodeId, head: NodeId) -> EdgeId {
        let id = EdgeId(self.edges.len() as u32);
        self.edges.push(Edge {
            tail: Some(tail),
            head: Some(head),
        });
        self.nodes[tail.index()].out_edges.push(id);
        self.nodes[head.index()].in_edges.push(id);
        id
    }

    // -----------------------------------------------------------------------
    // Edge mutation
    // -----------------------------------------------------------------------

    /// Moves the edge's tail. Detaches from the previous tail's out-edges;
    /// `None` logically deletes that endpoint.
    pub fn set_edge_tail(&mut self, edge: EdgeId, tail: Option<NodeId>) {
        if let Some(old) = self.edges[edge.index()].tail {
            self.nodes[old.index()].out_edges.retain(|e| *e != edge);
        }
        self.edges[edge.index()].tail = tail;
        if let Some(new) = tail {
            self.nodes[new.index()].out_edges.push(edge);
        }
    }

    /// Moves the edge's head. Detaches from the previous head's in-edges;
    /// `None` logically deletes that endpoint.
    pub fn set_edge_head(&mut self, edge: EdgeId, head: Option<NodeId>) {
        if let Some(old) = self.edges[edge.index()].head {
            self.nodes[old.index()].in_edges.retain(|e| *e != edge);
        }
        self.edges[edge.index()].head = head;
        if let Some(new) = head {
            self.nodes[new.index()].in_edges.push(edge);
        }
    }

    // -----------------------------------------------------------------------
    // Region mutation
    // -----------------------------------------------------------------------

    /// Appends `node` to `region`'s child list and reparents it.
    pub fn add_node(&mut self, region: NodeId, node: NodeId) {
        self.nodes[node.index()].parent = Some(region);
        self.region_mut(region).children.push(node);
    }

    /// Sets `region`'s entry. The entry must already be a child.
    pub fn set_entry(&mut self, region: NodeId, entry: NodeId) {
        debug_assert_eq!(
            self.node(entry).parent,
            Some(region),
            "entry must belong to the region"
        );
        self.region_mut(region).entry = Some(entry);
    }

    /// Installs `subregion` into `parent`, whose children currently include
    /// all of the subregion's nodes.
    ///
    /// Removes the subregion's nodes from the parent's child list, makes the
    /// subregion itself a child, then rewires boundary edges: one edge per
    /// outside predecessor of the subregion's entry is redirected to the
    /// subregion, one edge per outside successor is redirected from it, and
    /// every other boundary edge is cancelled by nulling both endpoints.
    /// Finally, if the parent's entry ended up inside the subregion, the
    /// subregion becomes the parent's entry.
    pub fn add_subregion(&mut self, parent: NodeId, subregion: NodeId) {
        // Remove subregion nodes from here.
        let sub_children = self.region(subregion).children.clone();
        let parent_children = std::mem::take(&mut self.region_mut(parent).children);
        let parent_children = parent_children
            .into_iter()
            .filter(|&n| self.nodes[n.index()].parent != Some(subregion))
            .collect();
        self.region_mut(parent).children = parent_children;

        // Add the subregion.
        self.add_node(parent, subregion);

        // Classify boundary edges.
        let sub_entry = self.region(subregion).entry;

        let mut edges_to_subregion: Vec<EdgeId> = Vec::new();
        let mut edges_from_subregion: Vec<EdgeId> = Vec::new();
        let mut cancelled_edges: Vec<EdgeId> = Vec::new();

        let mut tails: Vec<NodeId> = Vec::new();
        let mut heads: Vec<NodeId> = Vec::new();

        for &child in &sub_children {
            for &edge in self.node(child).in_edges() {
                let Some(tail) = self.edge(edge).tail() else {
                    continue;
                };
                let tail_parent = self.node(tail).parent;
                debug_assert!(
                    tail_parent == Some(parent) || tail_parent == Some(subregion),
                    "edge tail must live in the parent or the subregion"
                );

                if tail_parent == Some(parent) {
                    if self.edge(edge).head() == sub_entry && !tails.contains(&tail) {
                        edges_to_subregion.push(edge);
                        tails.push(tail);
                    } else {
                        cancelled_edges.push(edge);
                    }
                }
            }
            for &edge in self.node(child).out_edges() {
                let Some(head) = self.edge(edge).head() else {
                    continue;
                };
                let head_parent = self.node(head).parent;
                debug_assert!(
                    head_parent == Some(parent) || head_parent == Some(subregion),
                    "edge head must live in the parent or the subregion"
                );

                if head_parent == Some(parent) {
                    if !heads.contains(&head) {
                        edges_from_subregion.push(edge);
                        heads.push(head);
                    } else {
                        cancelled_edges.push(edge);
                    }
                }
            }
        }

        for edge in edges_to_subregion {
            self.set_edge_head(edge, Some(subregion));
        }
        for edge in edges_from_subregion {
            self.set_edge_tail(edge, Some(subregion));
        }
        for edge in cancelled_edges {
            self.set_edge_tail(edge, None);
            self.set_edge_head(edge, None);
        }

        // If the subregion contains our entry, the subregion is our new entry.
        let parent_entry = self.region(parent).entry;
        if let Some(entry) = parent_entry {
            if self.node(entry).parent == Some(subregion) {
                debug_assert_eq!(
                    sub_entry,
                    Some(entry),
                    "the subregion must enter through the old entry"
                );
                self.set_entry(parent, subregion);
            }
        }

        #[cfg(debug_assertions)]
        self.assert_consistency();
    }

    // -----------------------------------------------------------------------
    // Node observers
    // -----------------------------------------------------------------------

    /// The single in-neighbor, when there is exactly one incoming edge.
    pub fn unique_predecessor(&self, node: NodeId) -> Option<NodeId> {
        match self.node(node).in_edges() {
            [edge] => self.edge(*edge).tail(),
            _ => None,
        }
    }

    /// The single out-neighbor, when there is exactly one outgoing edge.
    pub fn unique_successor(&self, node: NodeId) -> Option<NodeId> {
        match self.node(node).out_edges() {
            [edge] => self.edge(*edge).head(),
            _ => None,
        }
    }

    /// `true` when the node has exactly two distinct successors.
    pub fn is_fork(&self, node: NodeId) -> bool {
        match self.node(node).out_edges() {
            [a, b] => self.edge(*a).head() != self.edge(*b).head(),
            _ => false,
        }
    }

    /// `true` for a leaf ending in a two-way conditional jump, or for a
    /// compound condition region.
    pub fn is_condition(&self, node: NodeId) -> bool {
        match self.node(node).kind() {
            NodeKind::Basic(basic) => basic.is_condition,
            NodeKind::Region(region) => region.is_condition(),
        }
    }

    /// Any successor different from `not_this`.
    pub fn other_successor(&self, node: NodeId, not_this: NodeId) -> Option<NodeId> {
        self.node(node)
            .out_edges()
            .iter()
            .filter_map(|&edge| self.edge(edge).head())
            .find(|&head| head != not_this)
    }

    /// The basic block control enters this node through.
    pub fn entry_basic_block(&self, node: NodeId) -> Option<BasicBlockId> {
        match self.node(node).kind() {
            NodeKind::Basic(basic) => Some(basic.block),
            NodeKind::Region(region) => region.entry.and_then(|e| self.entry_basic_block(e)),
        }
    }

    // -----------------------------------------------------------------------
    // Consistency
    // -----------------------------------------------------------------------

    /// Verifies the graph invariants, panicking on violation:
    /// every live edge appears in its endpoints' edge lists and vice versa,
    /// every node's parent lists it as a child, and every region's entry is
    /// among its children.
    pub fn assert_consistency(&self) {
        for (index, edge) in self.edges.iter().enumerate() {
            let id = EdgeId(index as u32);
            if let Some(tail) = edge.tail {
                assert!(
                    self.node(tail).out_edges().contains(&id),
                    "edge {id} missing from tail {tail} out-edges"
                );
            }
            if let Some(head) = edge.head {
                assert!(
                    self.node(head).in_edges().contains(&id),
                    "edge {id} missing from head {head} in-edges"
                );
            }
        }

        for (index, node) in self.nodes.iter().enumerate() {
            let id = NodeId(index as u32);
            for &edge in node.out_edges() {
                assert_eq!(
                    self.edge(edge).tail(),
                    Some(id),
                    "out-edge {edge} of node {id} has a different tail"
                );
            }
            for &edge in node.in_edges() {
                assert_eq!(
                    self.edge(edge).head(),
                    Some(id),
                    "in-edge {edge} of node {id} has a different head"
                );
            }

            if let Some(parent) = node.parent {
                assert!(
                    self.region(parent).children.contains(&id),
                    "node {id} missing from parent {parent} child list"
                );
            }

            if let NodeKind::Region(region) = &node.kind {
                if let Some(entry) = region.entry {
                    assert!(
                        region.children.contains(&entry),
                        "entry {entry} of region {id} is not a child"
                    );
                }
                for &child in &region.children {
                    assert_eq!(
                        self.node(child).parent,
                        Some(id),
                        "child {child} of region {id} has a different parent"
                    );
                }
            }
        }
    }
}

impl Default for StructuralGraph {
    fn default() -> Self {
        Self::new()
    }
}
