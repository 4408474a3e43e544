//! The structural analyzer: iterative pattern-driven graph reduction.
//!
//! One region at a time, the analyzer classifies edges with a DFS, then tries
//! reductions on every node in postorder, in a fixed priority: compound
//! conditions, loops, blocks, conditionals, switches, and finally a hopeless
//! conditional fallback. Every successful reduction wraps the matched nodes
//! in a new region and restarts the pass; a pass with no change reaches the
//! fixpoint and returns.
//!
//! The analyzer never fails. Control flow no pattern catches simply stays as
//! bare nodes in its region; downstream emission falls back to gotos and
//! labels.

use std::collections::VecDeque;

use indexmap::IndexMap;
use tracing::{debug, trace};

use likec_ir::{BasicBlockId, DataflowProvider, Function};

use crate::cancel::CancellationToken;
use crate::dfs::{Dfs, EdgeType};
use crate::graph::StructuralGraph;
use crate::loops::LoopExplorer;
use crate::node::{NodeId, NodeKind, RegionKind, SwitchData};

/// A switch branch is classified as the exit when strictly more than this
/// many branches join in it.
pub const EXIT_BRANCH_JOIN_DEGREE: usize = 2;

/// Reduces a structural graph to nested regions.
pub struct StructureAnalyzer<'a> {
    graph: &'a mut StructuralGraph,
    function: &'a Function,
    dataflow: &'a dyn DataflowProvider,
    cancel: CancellationToken,
}

impl<'a> StructureAnalyzer<'a> {
    pub fn new(
        graph: &'a mut StructuralGraph,
        function: &'a Function,
        dataflow: &'a dyn DataflowProvider,
    ) -> Self {
        StructureAnalyzer {
            graph,
            function,
            dataflow,
            cancel: CancellationToken::new(),
        }
    }

    /// Like [`new`](Self::new), with a cancellation token polled between
    /// fixpoint iterations.
    pub fn with_cancellation(
        graph: &'a mut StructuralGraph,
        function: &'a Function,
        dataflow: &'a dyn DataflowProvider,
        cancel: CancellationToken,
    ) -> Self {
        StructureAnalyzer {
            graph,
            function,
            dataflow,
            cancel,
        }
    }

    /// Runs the analysis on the root region.
    pub fn analyze(&mut self) {
        let root = self.graph.root();
        self.analyze_region(root);
    }

    fn analyze_region(&mut self, region: NodeId) {
        if self.cancel.is_cancelled() {
            debug!(%region, "analysis cancelled before region");
            return;
        }

        loop {
            if self.cancel.is_cancelled() {
                debug!(%region, "analysis cancelled at fixpoint boundary");
                return;
            }

            // Classify edges, sort nodes topologically.
            let dfs = Dfs::run(self.graph, region);

            // Try to reduce various kinds of regions.
            if self.run_pass(&dfs, |a, node, _| a.reduce_compound_condition(node)) {
                continue;
            }
            if self.run_pass(&dfs, |a, node, dfs| a.reduce_cyclic(node, dfs)) {
                continue;
            }
            if self.run_pass(&dfs, |a, node, _| a.reduce_block(node)) {
                continue;
            }
            if self.run_pass(&dfs, |a, node, _| a.reduce_conditional(node)) {
                continue;
            }
            if self.run_pass(&dfs, |a, node, _| {
                a.reduce_switch(node) || a.reduce_hopeless_conditional(node)
            }) {
                continue;
            }

            debug!(
                %region,
                children = self.graph.region(region).children().len(),
                "region reached fixpoint"
            );
            return;
        }
    }

    fn run_pass(
        &mut self,
        dfs: &Dfs,
        mut reduce: impl FnMut(&mut Self, NodeId, &Dfs) -> bool,
    ) -> bool {
        for &node in dfs.postorder() {
            if reduce(self, node, dfs) {
                return true;
            }
        }
        false
    }

    /// The two heads of a fork's out-edges.
    fn fork_successors(&self, node: NodeId) -> Option<(NodeId, NodeId)> {
        match self.graph.node(node).out_edges() {
            [a, b] => Some((self.graph.edge(*a).head()?, self.graph.edge(*b).head()?)),
            _ => None,
        }
    }

    /// Short-circuit conditions: the entry and one of its successors are both
    /// fork conditions sharing a target, the successor having no other way
    /// in and not looping back to the entry.
    fn reduce_compound_condition(&mut self, entry: NodeId) -> bool {
        if !self.graph.is_fork(entry) || !self.graph.is_condition(entry) {
            return false;
        }
        let Some((left, right)) = self.fork_successors(entry) else {
            return false;
        };
        let parent = self.graph.node(entry).parent().expect("entry has a parent");

        for (side, other) in [(left, right), (right, left)] {
            if self.graph.node(side).in_edges().len() != 1
                || !self.graph.is_fork(side)
                || !self.graph.is_condition(side)
            {
                continue;
            }
            let Some((side0, side1)) = self.fork_successors(side) else {
                continue;
            };
            if (side0 == other && side1 != entry) || (side1 == other && side0 != entry) {
                let region = self.graph.add_region(RegionKind::CompoundCondition);
                self.graph.add_node(region, entry);
                self.graph.add_node(region, side);
                self.graph.set_entry(region, entry);
                self.graph.add_subregion(parent, region);
                trace!(%entry, %side, "reduced compound condition");
                return true;
            }
        }

        false
    }

    /// Loops: wrap the natural loop of `entry`, classify it as while or
    /// do-while when a condition node controls the exit, and analyze the
    /// body recursively.
    fn reduce_cyclic(&mut self, entry: NodeId, dfs: &Dfs) -> bool {
        let loop_nodes = LoopExplorer::explore(self.graph, entry, dfs);
        if loop_nodes.is_empty() {
            return false;
        }

        let parent = self.graph.node(entry).parent().expect("entry has a parent");
        let region = self.graph.add_region(RegionKind::Loop);
        for &node in &loop_nodes {
            self.graph.add_node(region, node);
        }
        self.graph.set_entry(region, entry);

        // Detect a while loop early: the entry must be a condition with an
        // edge leaving the region. Edges are still unredirected here.
        if self.graph.is_fork(entry) && self.graph.is_condition(entry) {
            let exit = self
                .graph
                .node(entry)
                .out_edges()
                .iter()
                .filter_map(|&edge| self.graph.edge(edge).head())
                .find(|&head| self.graph.node(head).parent() == Some(parent));
            if let Some(head) = exit {
                let exit_block = self.graph.entry_basic_block(head);
                self.graph.region_mut(region).kind = RegionKind::While;
                self.graph.region_mut(region).exit_basic_block = exit_block;
            }
        }

        // Collect potential do-while conditions before edges are redirected:
        // back-edge tails that are conditions with an edge leaving the region.
        let mut do_while_conditions: Vec<(NodeId, Option<BasicBlockId>)> = Vec::new();
        for &edge in self.graph.node(entry).in_edges() {
            if dfs.edge_type(edge) != Some(EdgeType::Back) {
                continue;
            }
            let Some(tail) = self.graph.edge(edge).tail() else {
                continue;
            };
            if self.graph.is_fork(tail) && self.graph.is_condition(tail) {
                for &out in self.graph.node(tail).out_edges() {
                    let Some(head) = self.graph.edge(out).head() else {
                        continue;
                    };
                    if self.graph.node(head).parent() == Some(parent) {
                        do_while_conditions.push((tail, self.graph.entry_basic_block(head)));
                    }
                }
            }
        }

        // Install this new region, redirect edges.
        self.graph.add_subregion(parent, region);

        // Remove continue edges; they only make the structural analysis in
        // the loop region harder.
        let continue_edges: Vec<_> = self.graph.node(entry).in_edges().to_vec();
        for edge in continue_edges {
            self.graph.set_edge_tail(edge, None);
            self.graph.set_edge_head(edge, None);
        }

        trace!(%entry, nodes = loop_nodes.len(), "reduced loop");

        // Run structural analysis inside the loop region.
        self.analyze_region(region);

        // A surviving condition candidate makes this a do-while.
        for (condition, exit) in do_while_conditions {
            if self.graph.node(condition).parent() == Some(region) {
                self.graph.region_mut(region).kind = RegionKind::DoWhile;
                self.graph.region_mut(region).loop_condition = Some(condition);
                self.graph.region_mut(region).exit_basic_block = exit;
            }
        }

        true
    }

    /// Straight-line chains hanging off a condition, needed to reduce ifs.
    fn reduce_block(&mut self, entry: NodeId) -> bool {
        let Some(predecessor) = self.graph.unique_predecessor(entry) else {
            return false;
        };
        // Blocks are only needed for reducing ifs. If the unique predecessor
        // cannot be an if condition, stop.
        if !self.graph.is_fork(predecessor) || !self.graph.is_condition(predecessor) {
            return false;
        }

        // Discover all the nodes in the block.
        let mut traverse = vec![entry];
        let mut node = self.graph.unique_successor(entry);
        while let Some(next) = node {
            if self.graph.unique_predecessor(next).is_none() {
                break;
            }
            traverse.push(next);
            node = self.graph.unique_successor(next);
        }

        if traverse.len() > 1 {
            let parent = self.graph.node(entry).parent().expect("entry has a parent");
            let region = self.graph.add_region(RegionKind::Block);
            for &n in &traverse {
                self.graph.add_node(region, n);
            }
            self.graph.set_entry(region, entry);
            self.graph.add_subregion(parent, region);
            trace!(%entry, nodes = traverse.len(), "reduced block");
            return true;
        }

        false
    }

    /// If-then and if-then-else shapes around a fork condition.
    fn reduce_conditional(&mut self, entry: NodeId) -> bool {
        if !self.graph.is_fork(entry) || !self.graph.is_condition(entry) {
            return false;
        }
        let Some((left, right)) = self.fork_successors(entry) else {
            return false;
        };
        let parent = self.graph.node(entry).parent().expect("entry has a parent");

        // If-then-else: both arms are entered only from the entry, and either
        // dead-end or join in the same node.
        let left_out = self.graph.node(left).out_edges().len();
        let right_out = self.graph.node(right).out_edges().len();
        if self.graph.node(left).in_edges().len() == 1
            && self.graph.node(right).in_edges().len() == 1
            && left_out <= 1
            && right_out <= 1
            && (left_out == 0
                || right_out == 0
                || self.graph.unique_successor(left) == self.graph.unique_successor(right))
        {
            let region = self.graph.add_region(RegionKind::IfThenElse);
            self.graph.add_node(region, entry);
            self.graph.add_node(region, left);
            self.graph.add_node(region, right);
            self.graph.set_entry(region, entry);
            self.graph.add_subregion(parent, region);
            trace!(%entry, "reduced if-then-else");
            return true;
        }

        // If-then: one arm flows into the other (or dead-ends); the other arm
        // is where control continues.
        for (then_node, exit_node) in [(left, right), (right, left)] {
            let then_out = self.graph.node(then_node).out_edges();
            if self.graph.node(then_node).in_edges().len() == 1
                && (then_out.is_empty()
                    || (then_out.len() == 1
                        && self.graph.unique_successor(then_node) == Some(exit_node)))
            {
                let exit_block = self.graph.entry_basic_block(exit_node);
                let region = self.graph.add_region(RegionKind::IfThen);
                self.graph.add_node(region, entry);
                self.graph.add_node(region, then_node);
                self.graph.set_entry(region, entry);
                self.graph.region_mut(region).exit_basic_block = exit_block;
                self.graph.add_subregion(parent, region);
                trace!(%entry, "reduced if-then");
                return true;
            }
        }

        false
    }

    /// Last-resort fallback so that printing can still emit branching text:
    /// wrap the fork and both immediate successors regardless of the join
    /// structure.
    fn reduce_hopeless_conditional(&mut self, entry: NodeId) -> bool {
        if !self.graph.is_fork(entry) || !self.graph.is_condition(entry) {
            return false;
        }
        let Some((left, right)) = self.fork_successors(entry) else {
            return false;
        };
        let parent = self.graph.node(entry).parent().expect("entry has a parent");

        let region = self.graph.add_region(RegionKind::IfThenElse);
        self.graph.add_node(region, entry);
        self.graph.add_node(region, left);
        self.graph.add_node(region, right);
        self.graph.set_entry(region, entry);
        self.graph.add_subregion(parent, region);
        trace!(%entry, "reduced hopeless conditional");
        true
    }

    /// Switch recovery around a jump-table dispatch, consulting the dataflow
    /// oracle for the array access and the guarding bounds check.
    fn reduce_switch(&mut self, entry: NodeId) -> bool {
        // Do not detect the same switch multiple times.
        if let Some(parent) = self.graph.node(entry).parent() {
            if let Some(switch) = self.graph.node(parent).as_region().and_then(|r| r.switch()) {
                if switch.switch_node == entry {
                    return false;
                }
            }
        }

        // Entry must be a basic block node ending with an unconditional jump
        // through a table whose index the dataflow can trace.
        let NodeKind::Basic(basic) = self.graph.node(entry).kind() else {
            return false;
        };
        let entry_block = basic.block;
        let Some(jump) = self.function.block(entry_block).and_then(|b| b.jump()) else {
            return false;
        };
        if !jump.is_unconditional() {
            return false;
        }
        let Some(table) = jump.then_target.table() else {
            return false;
        };
        let Some(array_access) = self.dataflow.recognize_array_access(&table.address) else {
            return false;
        };
        let mut jump_table_size = table.size();

        // Typically, there is a bounds check before the switch:
        //
        // if (x < 10) {
        //     switch (x) {
        //       ...
        //     }
        // }
        let mut bounds_check_node: Option<NodeId> = None;
        if let Some(predecessor) = self.graph.unique_predecessor(entry) {
            if let NodeKind::Basic(pred_basic) = self.graph.node(predecessor).kind() {
                if let Some(pred_jump) = self.function.block(pred_basic.block).and_then(|b| b.jump())
                {
                    if let Some(bounds_check) = self
                        .dataflow
                        .recognize_bounds_check(pred_jump, entry_block)
                    {
                        if self.dataflow.first_copy(&bounds_check.index)
                            == self.dataflow.first_copy(&array_access.index)
                        {
                            bounds_check_node = Some(predecessor);
                            let bound = usize::try_from(bounds_check.max_value.saturating_add(1))
                                .unwrap_or(usize::MAX);
                            jump_table_size = jump_table_size.min(bound);
                        }
                    }
                }
            }
        }

        // The node getting control when the bounds check fails is either an
        // exit or a default.
        let exit_or_default_branch =
            bounds_check_node.and_then(|node| self.graph.other_successor(node, entry));

        // Direct successors of the entry plus that branch are the branches of
        // the switch.
        let mut branches: Vec<NodeId> = self
            .graph
            .node(entry)
            .out_edges()
            .iter()
            .filter_map(|&edge| self.graph.edge(edge).head())
            .collect();
        if let Some(branch) = exit_or_default_branch {
            branches.push(branch);
        }
        branches.sort();
        branches.dedup();

        // Using BFS, for each branch, compute the nodes reachable solely from
        // this branch: a node is labelled only when every predecessor already
        // carries the same label.
        let mut node_branches: IndexMap<NodeId, NodeId> = IndexMap::new();
        let mut queue: VecDeque<NodeId> = VecDeque::new();
        for &branch in &branches {
            node_branches.insert(branch, branch);
            queue.push_back(branch);
        }

        while let Some(front) = queue.pop_front() {
            let successors: Vec<NodeId> = self
                .graph
                .node(front)
                .out_edges()
                .iter()
                .filter_map(|&edge| self.graph.edge(edge).head())
                .collect();
            for head in successors {
                if node_branches.contains_key(&head) {
                    continue;
                }
                let mut label: Option<NodeId> = None;
                let mut consistent = true;
                for &in_edge in self.graph.node(head).in_edges() {
                    let tail_label = self
                        .graph
                        .edge(in_edge)
                        .tail()
                        .and_then(|tail| node_branches.get(&tail).copied());
                    match (label, tail_label) {
                        (_, None) => {
                            consistent = false;
                            break;
                        }
                        (None, Some(found)) => label = Some(found),
                        (Some(current), Some(found)) if current != found => {
                            consistent = false;
                            break;
                        }
                        _ => {}
                    }
                }
                if consistent {
                    if let Some(label) = label {
                        node_branches.insert(head, label);
                        queue.push_back(head);
                    }
                }
            }
        }

        // How many branches actually join in a node. Unlabelled predecessors
        // count as one extra joining branch.
        let join_degree = |node: NodeId| -> usize {
            let mut incoming: Vec<Option<NodeId>> = self
                .graph
                .node(node)
                .in_edges()
                .iter()
                .map(|&edge| {
                    self.graph
                        .edge(edge)
                        .tail()
                        .and_then(|tail| node_branches.get(&tail).copied())
                })
                .collect();
            incoming.sort();
            incoming.dedup();
            incoming.len()
        };

        // One of the branches can actually be an exit branch, going outside
        // the switch region.
        let mut exit_branch: Option<NodeId> = None;
        let mut exit_branch_join_degree = EXIT_BRANCH_JOIN_DEGREE;
        for &branch in &branches {
            let degree = join_degree(branch);
            if degree > exit_branch_join_degree {
                exit_branch_join_degree = degree;
                exit_branch = Some(branch);
            }
        }

        // If the bounds check does not lead to an exit, it leads to the
        // default branch.
        let default_branch = if exit_branch != exit_or_default_branch {
            exit_or_default_branch
        } else {
            None
        };

        // Create the region.
        let parent = self.graph.node(entry).parent().expect("entry has a parent");
        let default_basic_block = default_branch.and_then(|b| self.graph.entry_basic_block(b));
        let region = self.graph.add_switch_region(SwitchData {
            switch_node: entry,
            switch_term: array_access.index.clone(),
            jump_table_size,
            bounds_check_node,
            default_basic_block,
        });

        self.graph.add_node(region, entry);
        if let Some(bounds_check) = bounds_check_node {
            self.graph.add_node(region, bounds_check);
            self.graph.set_entry(region, bounds_check);
        } else {
            self.graph.set_entry(region, entry);
        }

        if let Some(exit) = exit_branch {
            let exit_block = self.graph.entry_basic_block(exit);
            self.graph.region_mut(region).exit_basic_block = exit_block;
        }

        for (&node, &branch) in &node_branches {
            if Some(branch) != exit_branch {
                self.graph.add_node(region, node);
            }
        }

        // Install this new region, redirect edges.
        self.graph.add_subregion(parent, region);
        trace!(%entry, table = jump_table_size, "reduced switch");
        true
    }
}
