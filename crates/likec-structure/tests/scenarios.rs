//! End-to-end structural analysis scenarios over hand-lifted functions.

use likec_ir::{
    ArrayAccess, BasicBlockId, BoundsCheck, Cfg, DataflowProvider, Function, Jump, JumpTable,
    JumpTarget, NoDataflow, Statement, StatementKind, Term,
};
use likec_structure::{
    CancellationToken, NodeId, NodeKind, RegionKind, StructuralGraph, StructureAnalyzer,
};

fn reg(offset: u64) -> Term {
    Term::access(likec_ir::MemoryLocation::new(
        likec_ir::LocationDomain::Registers,
        offset,
        32,
    ))
}

fn cond_jump(condition: Term, then_block: BasicBlockId, else_block: BasicBlockId) -> Statement {
    Statement::new(StatementKind::Jump(Jump::conditional(
        condition,
        JumpTarget::Block(then_block),
        JumpTarget::Block(else_block),
    )))
}

fn goto(block: BasicBlockId) -> Statement {
    Statement::new(StatementKind::Jump(Jump::unconditional(JumpTarget::Block(
        block,
    ))))
}

fn analyze(function: &Function, dataflow: &dyn DataflowProvider) -> StructuralGraph {
    let cfg = Cfg::new(function);
    let mut graph = StructuralGraph::build(function, &cfg);
    StructureAnalyzer::new(&mut graph, function, dataflow).analyze();
    graph.assert_consistency();
    graph
}

fn child_regions(graph: &StructuralGraph, region: NodeId, kind: RegionKind) -> Vec<NodeId> {
    graph
        .region(region)
        .children()
        .iter()
        .copied()
        .filter(|&c| graph.node(c).as_region().is_some_and(|r| r.kind() == kind))
        .collect()
}

/// A loop whose condition is a chain of three short-circuit tests:
///
/// ```c
/// while (a && b && c) { ... }
/// ```
#[test]
fn compound_loop_condition() {
    let mut f = Function::new();
    let entry = f.add_block(None);
    let b1 = f.add_block(None);
    let b2 = f.add_block(None);
    let b3 = f.add_block(None);
    let exit = f.add_block(None);
    f.set_entry(entry).unwrap();

    f.push_statement(entry, cond_jump(reg(0), b1, exit)).unwrap();
    f.push_statement(b1, cond_jump(reg(32), b2, exit)).unwrap();
    f.push_statement(b2, cond_jump(reg(64), b3, exit)).unwrap();
    f.push_statement(b3, goto(entry)).unwrap();

    let graph = analyze(&f, &NoDataflow);
    let root = graph.root();

    // The loop and the exit block are the only top-level nodes left.
    assert_eq!(graph.region(root).children().len(), 2);

    let whiles = child_regions(&graph, root, RegionKind::While);
    assert_eq!(whiles.len(), 1);
    let while_region = whiles[0];

    // The while exits into the exit block.
    assert_eq!(
        graph.region(while_region).exit_basic_block(),
        Some(exit)
    );

    // Its entry is the outer compound condition, which nests the inner one:
    // ((entry && b1) && b2) as two compound condition regions.
    let while_entry = graph.region(while_region).entry().unwrap();
    let outer = graph.node(while_entry).as_region().unwrap();
    assert_eq!(outer.kind(), RegionKind::CompoundCondition);
    assert_eq!(outer.children().len(), 2);

    let inner = child_regions(&graph, while_entry, RegionKind::CompoundCondition);
    assert_eq!(inner.len(), 1);
    assert_eq!(graph.region(inner[0]).children().len(), 2);

    // The loop body block is a direct child of the while region.
    let body: Vec<_> = graph
        .region(while_region)
        .children()
        .iter()
        .copied()
        .filter(|&c| graph.node(c).as_basic().is_some())
        .collect();
    assert_eq!(body.len(), 1);
    assert_eq!(graph.entry_basic_block(body[0]), Some(b3));

    // The compound condition chain starts at the function entry block.
    assert_eq!(graph.entry_basic_block(while_entry), Some(entry));
}

/// Oracle for the switch scenario: knows one array access and one bounds
/// check over the same index register.
struct SwitchOracle {
    index: Term,
    table_address: Term,
    passing_target: BasicBlockId,
    max_value: u64,
}

impl DataflowProvider for SwitchOracle {
    fn abstract_value(&self, _term: &Term) -> Option<likec_ir::AbstractValue> {
        None
    }

    fn memory_location(&self, _term: &Term) -> Option<likec_ir::MemoryLocation> {
        None
    }

    fn reaching_definitions(&self, _term: &Term) -> likec_ir::ReachingDefinitions {
        likec_ir::ReachingDefinitions::default()
    }

    fn recognize_array_access(&self, address: &Term) -> Option<ArrayAccess> {
        (address == &self.table_address).then(|| ArrayAccess {
            index: self.index.clone(),
            element_size: 8,
        })
    }

    fn recognize_bounds_check(
        &self,
        jump: &Jump,
        passing_target: BasicBlockId,
    ) -> Option<BoundsCheck> {
        (jump.is_conditional() && passing_target == self.passing_target).then(|| BoundsCheck {
            index: self.index.clone(),
            max_value: self.max_value,
        })
    }

    fn first_copy(&self, term: &Term) -> Term {
        term.clone()
    }
}

/// A bounds-checked jump-table switch:
///
/// ```c
/// if (x < 10) { switch (x) { ... } } else { default-ish branch }
/// ```
///
/// Nine cases have bodies jumping to the join; one table slot points at the
/// join directly, which makes the join a branch with a high join degree and
/// classifies it as the switch's exit.
#[test]
fn switch_with_bounds_check() {
    let mut f = Function::new();
    let check = f.add_block(None);
    let dispatch = f.add_block(None);
    let cases: Vec<BasicBlockId> = (0..9).map(|_| f.add_block(None)).collect();
    let default = f.add_block(None);
    let join = f.add_block(None);
    f.set_entry(check).unwrap();

    let x = reg(0);
    let table_address = Term::binary(
        likec_ir::BinaryTermOp::Add,
        Term::int_const(0x4000, 64),
        x.clone(),
        64,
    );

    f.push_statement(check, cond_jump(x.clone(), dispatch, default))
        .unwrap();

    let mut table_blocks = cases.clone();
    table_blocks.push(join);
    f.push_statement(
        dispatch,
        Statement::new(StatementKind::Jump(Jump::unconditional(JumpTarget::Table(
            JumpTable {
                address: table_address.clone(),
                blocks: table_blocks,
            },
        )))),
    )
    .unwrap();

    for &case in &cases {
        f.push_statement(case, goto(join)).unwrap();
    }
    f.push_statement(default, goto(join)).unwrap();

    let oracle = SwitchOracle {
        index: x.clone(),
        table_address,
        passing_target: dispatch,
        max_value: 9,
    };

    let graph = analyze(&f, &oracle);
    let root = graph.root();

    let switches = child_regions(&graph, root, RegionKind::Switch);
    assert_eq!(switches.len(), 1);
    let switch_region = switches[0];

    let region = graph.region(switch_region);
    let data = region.switch().unwrap();

    assert_eq!(graph.entry_basic_block(data.switch_node), Some(dispatch));
    assert_eq!(data.jump_table_size, 10);
    assert_eq!(data.switch_term, x);

    // The bounds check is the region's entry.
    let bounds = data.bounds_check_node.unwrap();
    assert_eq!(graph.entry_basic_block(bounds), Some(check));
    assert_eq!(region.entry(), Some(bounds));

    // The failure branch of the bounds check became the default; the join is
    // the exit and stays outside the region.
    assert_eq!(data.default_basic_block, Some(default));
    assert_eq!(region.exit_basic_block(), Some(join));

    let member_blocks: Vec<_> = region
        .children()
        .iter()
        .filter_map(|&c| graph.entry_basic_block(c))
        .collect();
    assert!(member_blocks.contains(&check));
    assert!(member_blocks.contains(&dispatch));
    assert!(member_blocks.contains(&default));
    for case in &cases {
        assert!(member_blocks.contains(case));
    }
    assert!(!member_blocks.contains(&join));

    // Root keeps the join after the switch.
    assert_eq!(graph.region(root).children().len(), 2);
}

/// Without dataflow, the same CFG produces no switch region.
#[test]
fn switch_without_dataflow_is_skipped() {
    let mut f = Function::new();
    let dispatch = f.add_block(None);
    let c0 = f.add_block(None);
    let c1 = f.add_block(None);
    let join = f.add_block(None);
    f.set_entry(dispatch).unwrap();

    f.push_statement(
        dispatch,
        Statement::new(StatementKind::Jump(Jump::unconditional(JumpTarget::Table(
            JumpTable {
                address: Term::int_const(0x4000, 64),
                blocks: vec![c0, c1],
            },
        )))),
    )
    .unwrap();
    f.push_statement(c0, goto(join)).unwrap();
    f.push_statement(c1, goto(join)).unwrap();

    let graph = analyze(&f, &NoDataflow);
    assert!(child_regions(&graph, graph.root(), RegionKind::Switch).is_empty());
}

/// A do-while loop: the condition sits at the bottom.
#[test]
fn do_while_loop() {
    let mut f = Function::new();
    let entry = f.add_block(None);
    let body = f.add_block(None);
    let cond = f.add_block(None);
    let exit = f.add_block(None);
    f.set_entry(entry).unwrap();

    f.push_statement(entry, goto(body)).unwrap();
    f.push_statement(body, goto(cond)).unwrap();
    f.push_statement(cond, cond_jump(reg(0), body, exit)).unwrap();

    let graph = analyze(&f, &NoDataflow);
    let root = graph.root();

    let loops = child_regions(&graph, root, RegionKind::DoWhile);
    assert_eq!(loops.len(), 1);
    let region = graph.region(loops[0]);
    assert_eq!(region.exit_basic_block(), Some(exit));
    let condition = region.loop_condition().unwrap();
    assert_eq!(graph.entry_basic_block(condition), Some(cond));
}

/// Counts how often each basic block occurs as a leaf of the region tree.
fn count_leaves(graph: &StructuralGraph, node: NodeId, found: &mut Vec<usize>) {
    match graph.node(node).kind() {
        NodeKind::Basic(basic) => found[basic.block.index()] += 1,
        NodeKind::Region(region) => {
            for &child in region.children() {
                count_leaves(graph, child, found);
            }
        }
    }
}

/// Pathological control flow: a loop whose body is entered from outside.
/// The analyzer must terminate with leftover top-level nodes and an intact
/// graph; it must not panic.
#[test]
fn irreducible_fragment_terminates() {
    let mut f = Function::new();
    let entry = f.add_block(None);
    let b = f.add_block(None);
    let c = f.add_block(None);
    let ret = f.add_block(None);
    f.set_entry(entry).unwrap();

    // entry forks into both b and c; b and c jump into each other's bodies.
    f.push_statement(entry, cond_jump(reg(0), b, c)).unwrap();
    f.push_statement(b, cond_jump(reg(32), c, ret)).unwrap();
    f.push_statement(c, cond_jump(reg(64), b, ret)).unwrap();

    let graph = analyze(&f, &NoDataflow);
    let root = graph.root();

    // Analysis terminated and left the root with more than one node.
    assert!(graph.region(root).children().len() > 1);

    // Every basic block is still represented exactly once in the tree.
    let mut found = vec![0usize; 4];
    count_leaves(&graph, root, &mut found);
    assert_eq!(found, vec![1, 1, 1, 1]);
}

/// A cancelled token stops the analyzer before any reduction.
#[test]
fn cancellation_stops_analysis() {
    let mut f = Function::new();
    let a = f.add_block(None);
    let b = f.add_block(None);
    let c = f.add_block(None);
    let d = f.add_block(None);
    f.set_entry(a).unwrap();
    f.push_statement(a, cond_jump(reg(0), b, c)).unwrap();
    f.push_statement(b, goto(d)).unwrap();
    f.push_statement(c, goto(d)).unwrap();

    let cfg = Cfg::new(&f);
    let mut graph = StructuralGraph::build(&f, &cfg);

    let token = CancellationToken::new();
    token.cancel();
    StructureAnalyzer::with_cancellation(&mut graph, &f, &NoDataflow, token).analyze();

    // Nothing was reduced; all four leaves are still top-level.
    assert_eq!(graph.region(graph.root()).children().len(), 4);
    graph.assert_consistency();
}

/// A plain diamond collapses into an if-then-else.
#[test]
fn diamond_becomes_if_then_else() {
    let mut f = Function::new();
    let a = f.add_block(None);
    let b = f.add_block(None);
    let c = f.add_block(None);
    let d = f.add_block(None);
    f.set_entry(a).unwrap();
    f.push_statement(a, cond_jump(reg(0), b, c)).unwrap();
    f.push_statement(b, goto(d)).unwrap();
    f.push_statement(c, goto(d)).unwrap();

    let graph = analyze(&f, &NoDataflow);
    let regions = child_regions(&graph, graph.root(), RegionKind::IfThenElse);
    assert_eq!(regions.len(), 1);
    assert_eq!(graph.region(regions[0]).children().len(), 3);
}

// ---------------------------------------------------------------------------
// Graph invariants under arbitrary control flow
// ---------------------------------------------------------------------------

use proptest::prelude::*;

fn arb_function() -> impl Strategy<Value = Function> {
    (2usize..8).prop_flat_map(|n| {
        proptest::collection::vec((0u8..3, 0..n, 0..n), n).prop_map(move |jumps| {
            let mut f = Function::new();
            let ids: Vec<BasicBlockId> = (0..n).map(|_| f.add_block(None)).collect();
            f.set_entry(ids[0]).unwrap();
            for (i, (kind, then_index, else_index)) in jumps.into_iter().enumerate() {
                match kind {
                    0 => {}
                    1 => f.push_statement(ids[i], goto(ids[then_index])).unwrap(),
                    _ => f
                        .push_statement(ids[i], cond_jump(reg(0), ids[then_index], ids[else_index]))
                        .unwrap(),
                }
            }
            f
        })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// After analyzing any small function the graph invariants hold and every
    /// basic block sits in exactly one place of the region tree.
    #[test]
    fn analysis_preserves_graph_invariants(function in arb_function()) {
        let cfg = Cfg::new(&function);
        let mut graph = StructuralGraph::build(&function, &cfg);
        StructureAnalyzer::new(&mut graph, &function, &NoDataflow).analyze();
        graph.assert_consistency();

        let mut found = vec![0usize; function.block_count()];
        count_leaves(&graph, graph.root(), &mut found);
        prop_assert!(found.iter().all(|&occurrences| occurrences == 1));
    }
}

/// One-armed if: the else side is just the join.
#[test]
fn if_then_records_exit_block() {
    let mut f = Function::new();
    let a = f.add_block(None);
    let then_block = f.add_block(None);
    let join = f.add_block(None);
    f.set_entry(a).unwrap();
    f.push_statement(a, cond_jump(reg(0), then_block, join)).unwrap();
    f.push_statement(then_block, goto(join)).unwrap();

    let graph = analyze(&f, &NoDataflow);
    let regions = child_regions(&graph, graph.root(), RegionKind::IfThen);
    assert_eq!(regions.len(), 1);
    assert_eq!(graph.region(regions[0]).exit_basic_block(), Some(join));
}
