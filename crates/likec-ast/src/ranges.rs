//! The range tree: character ranges of printed nodes.
//!
//! The tree mirrors the printed nodes' nesting. Each node stores its offset
//! relative to its parent's start and its size in characters; sibling ranges
//! are sorted and non-overlapping. Queries map positions to nodes and back;
//! text edits update only the affected spine of the tree.

use crate::printer::{PrintListener, PrintedNodeKind};

/// Identifies the printed node a range covers: its kind plus its preorder
/// index among all printed nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeTag {
    pub index: u32,
    pub kind: PrintedNodeKind,
}

/// One node of the range tree.
#[derive(Debug, Clone)]
pub struct RangeNode {
    tag: NodeTag,
    /// Offset relative to the parent's start.
    offset: usize,
    size: usize,
    children: Vec<RangeNode>,
}

impl RangeNode {
    fn new(tag: NodeTag, offset: usize) -> Self {
        RangeNode {
            tag,
            offset,
            size: 0,
            children: Vec::new(),
        }
    }

    pub fn tag(&self) -> NodeTag {
        self.tag
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn end_offset(&self) -> usize {
        self.offset + self.size
    }

    pub fn children(&self) -> &[RangeNode] {
        &self.children
    }

    fn add_child(&mut self, node: RangeNode) {
        debug_assert!(
            self.children
                .last()
                .is_none_or(|last| last.end_offset() <= node.offset),
            "sibling ranges must be sorted and disjoint"
        );
        self.children.push(node);
    }

    /// Index of the first child not entirely to the left of `offset`.
    fn first_child_not_left_of(&self, offset: isize) -> usize {
        self.children
            .partition_point(|child| (child.end_offset() as isize) <= offset)
    }

    fn child_at(&self, offset: usize) -> Option<&RangeNode> {
        let i = self.first_child_not_left_of(offset as isize);
        let child = self.children.get(i)?;
        (child.offset <= offset && offset < child.end_offset()).then_some(child)
    }
}

/// Range tree over one printed text.
#[derive(Debug, Clone, Default)]
pub struct RangeTree {
    root: Option<RangeNode>,
}

impl RangeTree {
    pub fn new() -> Self {
        RangeTree::default()
    }

    pub fn root(&self) -> Option<&RangeNode> {
        self.root.as_ref()
    }

    pub fn set_root(&mut self, root: Option<RangeNode>) {
        debug_assert!(root.as_ref().is_none_or(|node| node.offset == 0));
        self.root = root;
    }

    /// The innermost node containing `position`.
    pub fn leaf_at(&self, position: usize) -> Option<&RangeNode> {
        let root = self.root.as_ref()?;
        if position >= root.size {
            return None;
        }

        let mut node = root;
        let mut position = position;
        while let Some(child) = node.child_at(position) {
            position -= child.offset;
            node = child;
        }
        Some(node)
    }

    /// All nodes lying entirely within `[start, end)`.
    pub fn nodes_in(&self, start: usize, end: usize) -> Vec<&RangeNode> {
        let mut result = Vec::new();
        if let Some(root) = self.root.as_ref() {
            if start < root.size && end > 0 {
                collect_nodes_in(root, start as isize, end as isize, &mut result);
            }
        }
        result
    }

    /// The absolute character range of the node carrying `tag`.
    pub fn range_of(&self, tag: NodeTag) -> Option<(usize, usize)> {
        fn locate(node: &RangeNode, tag: NodeTag, base: usize) -> Option<(usize, usize)> {
            let start = base + node.offset;
            if node.tag == tag {
                return Some((start, start + node.size));
            }
            node.children
                .iter()
                .find_map(|child| locate(child, tag, start))
        }
        locate(self.root.as_ref()?, tag, 0)
    }

    /// Updates the tree after `nchars` characters were removed at `position`.
    /// Returns the tags of every node whose range changed.
    pub fn handle_removal(&mut self, position: usize, nchars: usize) -> Vec<NodeTag> {
        let mut modified = Vec::new();
        if let Some(root) = self.root.as_mut() {
            if position < root.size {
                remove_chars(root, position as isize, nchars as isize, &mut modified);
            }
        }
        modified
    }

    /// Updates the tree after `nchars` characters were inserted at
    /// `position`. Returns the tags of every node whose range changed.
    pub fn handle_insertion(&mut self, position: usize, nchars: usize) -> Vec<NodeTag> {
        let mut modified = Vec::new();
        if let Some(root) = self.root.as_mut() {
            if position < root.size {
                insert_chars(root, position as isize, nchars, &mut modified);
            }
        }
        modified
    }
}

fn collect_nodes_in<'a>(
    node: &'a RangeNode,
    start: isize,
    end: isize,
    result: &mut Vec<&'a RangeNode>,
) {
    if start <= 0 && (node.size as isize) <= end {
        result.push(node);
    }

    let mut i = node.first_child_not_left_of(start);
    while let Some(child) = node.children.get(i) {
        if (child.offset as isize) >= end {
            break;
        }
        let shift = child.offset as isize;
        collect_nodes_in(child, start - shift, end - shift, result);
        i += 1;
    }
}

fn remove_chars(node: &mut RangeNode, offset: isize, nchars: isize, modified: &mut Vec<NodeTag>) {
    let mut offset = offset;
    let mut nchars = nchars;

    if offset < 0 {
        nchars += offset;
        offset = 0;
    }
    if nchars + offset > node.size as isize {
        nchars = node.size as isize - offset;
    }
    if nchars <= 0 {
        return;
    }

    node.size -= nchars as usize;
    modified.push(node.tag);

    let mut i = node.first_child_not_left_of(offset);
    while i < node.children.len() {
        let child_offset = node.children[i].offset as isize;
        if child_offset < offset + nchars {
            remove_chars(&mut node.children[i], offset - child_offset, nchars, modified);
            if offset < child_offset {
                node.children[i].offset = offset as usize;
            }
        } else {
            node.children[i].offset = (child_offset - nchars) as usize;
        }
        i += 1;
    }
}

fn insert_chars(node: &mut RangeNode, offset: isize, nchars: usize, modified: &mut Vec<NodeTag>) {
    debug_assert!(offset <= node.size as isize);

    node.size += nchars;
    modified.push(node.tag);

    let mut i = node.first_child_not_left_of(offset - 1);
    if i < node.children.len() {
        let child = &node.children[i];
        let contains = (child.offset as isize) <= offset && offset < child.end_offset() as isize;
        if contains || child.end_offset() as isize == offset {
            let shift = node.children[i].offset as isize;
            insert_chars(&mut node.children[i], offset - shift, nchars, modified);
            i += 1;
        }

        while i < node.children.len() {
            node.children[i].offset += nchars;
            i += 1;
        }
    }
}

/// Assembles a range tree from printer callbacks.
#[derive(Debug, Default)]
pub struct RangeTreeBuilder {
    /// Open nodes: absolute start offset plus the node under construction.
    stack: Vec<(usize, RangeNode)>,
    root: Option<RangeNode>,
    next_index: u32,
}

impl RangeTreeBuilder {
    pub fn new() -> Self {
        RangeTreeBuilder::default()
    }

    pub fn finish(self) -> RangeTree {
        debug_assert!(self.stack.is_empty(), "unbalanced print callbacks");
        let mut tree = RangeTree::new();
        tree.set_root(self.root);
        tree
    }
}

impl PrintListener for RangeTreeBuilder {
    fn node_started(&mut self, kind: PrintedNodeKind, offset: usize) {
        let parent_start = self.stack.last().map_or(0, |(start, _)| *start);
        let tag = NodeTag {
            index: self.next_index,
            kind,
        };
        self.next_index += 1;
        self.stack
            .push((offset, RangeNode::new(tag, offset - parent_start)));
    }

    fn node_finished(&mut self, _kind: PrintedNodeKind, offset: usize) {
        let (start, mut node) = self.stack.pop().expect("balanced print callbacks");
        node.size = offset - start;
        match self.stack.last_mut() {
            Some((_, parent)) => parent.add_child(node),
            None => self.root = Some(node),
        }
    }
}
