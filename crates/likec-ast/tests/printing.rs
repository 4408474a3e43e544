//! Printer output and range tree scenarios.

use likec_ast::{
    BinaryOperatorKind, Block, CastKind, CompilationUnit, Expression, FunctionDefinition,
    MemberAccessKind, Printer, RangeTreeBuilder, SizedValue, Statement, TopLevelDeclaration, Tree,
    TypeId, UnaryOperatorKind,
};
use likec_ir::Platform;

use BinaryOperatorKind::*;
use UnaryOperatorKind::*;

fn tree() -> Tree {
    Tree::new(Platform::lp64())
}

fn print_expression(tree: &Tree, expression: &Expression) -> String {
    Printer::new(tree).print_expression_only(expression)
}

fn print_statement(tree: &Tree, statement: &Statement) -> String {
    Printer::new(tree).print_statement_only(statement)
}

fn int32(tree: &mut Tree, value: i64) -> Expression {
    let ty = tree.types.make_integer_type(32, false);
    Expression::int_constant(SizedValue::new(32, value as u64), ty)
}

#[test]
fn function_definition_layout() {
    let mut t = tree();
    let i32t = t.types.make_integer_type(32, false);

    let a = t.declare_variable("a", i32t);
    let b = t.declare_variable("b", i32t);
    let c = t.declare_variable("c", i32t);

    let f = t.declare_function("f", TypeId::VOID, vec![], false);

    let condition = Expression::binary(
        LogicalAnd,
        Expression::binary(
            LogicalAnd,
            Expression::variable(a),
            Expression::variable(b),
        ),
        Expression::variable(c),
    );

    let body = Block::with_statements(vec![Statement::While {
        condition,
        body: Box::new(Statement::Block(Block::with_statements(vec![
            Statement::expression(Expression::unary(PrefixIncrement, Expression::variable(a))),
            Statement::expression(Expression::unary(PrefixDecrement, Expression::variable(b))),
            Statement::expression(Expression::binary(
                Assign,
                Expression::variable(c),
                Expression::binary(Mul, Expression::variable(a), Expression::variable(b)),
            )),
        ]))),
    }]);

    t.set_root(CompilationUnit {
        declarations: vec![TopLevelDeclaration::FunctionDefinition(FunctionDefinition {
            declaration: f,
            body,
            labels: vec![],
        })],
    });

    let text = Printer::new(&t).print();
    let expected = "\nvoid f() {\n    while (a && b && c) {\n        ++a;\n        --b;\n        c = a * b;\n    }\n}\n";
    assert_eq!(text, expected);
}

#[test]
fn switch_case_labels_outdent() {
    let mut t = tree();
    let i32t = t.types.make_integer_type(32, false);
    let x = t.declare_variable("x", i32t);

    let statement = Statement::Switch {
        expression: Expression::variable(x),
        body: Box::new(Statement::Block(Block::with_statements(vec![
            Statement::CaseLabel {
                expression: int32(&mut t, 0),
            },
            Statement::expression(Expression::unary(PrefixIncrement, Expression::variable(x))),
            Statement::CaseLabel {
                expression: int32(&mut t, 1),
            },
            Statement::expression(Expression::unary(PrefixDecrement, Expression::variable(x))),
            Statement::DefaultLabel,
            Statement::Break,
        ]))),
    };

    let text = print_statement(&t, &statement);
    let expected =
        "switch (x) {\ncase 0:\n    ++x;\ncase 1:\n    --x;\ndefault:\n    break;\n}";
    assert_eq!(text, expected);
}

#[test]
fn nested_non_block_statements_indent() {
    let mut t = tree();
    let i32t = t.types.make_integer_type(32, false);
    let x = t.declare_variable("x", i32t);

    let statement = Statement::If {
        condition: Expression::variable(x),
        then_statement: Box::new(Statement::expression(Expression::unary(
            PrefixIncrement,
            Expression::variable(x),
        ))),
        else_statement: None,
    };

    let text = print_statement(&t, &statement);
    assert_eq!(text, "if (x) \n    ++x;");
}

#[test]
fn do_while_and_goto() {
    let mut t = tree();
    let i32t = t.types.make_integer_type(32, false);
    let x = t.declare_variable("x", i32t);
    let label = t.declare_label("retry");
    let destination = t.label_identifier(label);

    let loop_statement = Statement::DoWhile {
        body: Box::new(Statement::Block(Block::with_statements(vec![
            Statement::expression(Expression::unary(PrefixIncrement, Expression::variable(x))),
        ]))),
        condition: Expression::binary(Less, Expression::variable(x), int32(&mut t, 10)),
    };
    assert_eq!(
        print_statement(&t, &loop_statement),
        "do {\n    ++x;\n} while (x < 10);"
    );

    let goto = Statement::Goto { destination };
    assert_eq!(print_statement(&t, &goto), "goto retry;");

    let label_statement = Statement::Label { declaration: label };
    assert_eq!(print_statement(&t, &label_statement), "retry:");

    let asm = Statement::InlineAssembly {
        code: "nop".into(),
    };
    assert_eq!(print_statement(&t, &asm), "__asm__(\"nop\");");
}

#[test]
fn integer_literal_formatting() {
    let mut t = tree();
    let u32t = t.types.make_integer_type(32, true);

    let small = int32(&mut t, 100);
    assert_eq!(print_expression(&t, &small), "100");

    let negative = int32(&mut t, -5);
    assert_eq!(print_expression(&t, &negative), "-5");

    let negative_edge = int32(&mut t, -100);
    assert_eq!(print_expression(&t, &negative_edge), "-100");

    let large = int32(&mut t, 200);
    assert_eq!(print_expression(&t, &large), "0xc8");

    // An unsigned all-ones value never prints as a negative decimal.
    let all_ones = Expression::int_constant(SizedValue::new(32, 0xffff_ffff), u32t);
    assert_eq!(print_expression(&t, &all_ones), "0xffffffff");
}

#[test]
fn precedence_parenthesization() {
    let mut t = tree();
    let i32t = t.types.make_integer_type(32, false);
    let a = t.declare_variable("a", i32t);
    let b = t.declare_variable("b", i32t);
    let c = t.declare_variable("c", i32t);

    let grouped = Expression::binary(
        Mul,
        Expression::binary(Add, Expression::variable(a), Expression::variable(b)),
        Expression::variable(c),
    );
    assert_eq!(print_expression(&t, &grouped), "(a + b) * c");

    let natural = Expression::binary(
        Add,
        Expression::variable(a),
        Expression::binary(Mul, Expression::variable(b), Expression::variable(c)),
    );
    assert_eq!(print_expression(&t, &natural), "a + b * c");

    // Assignment is right-associative.
    let chained = Expression::binary(
        Assign,
        Expression::variable(a),
        Expression::binary(Assign, Expression::variable(b), Expression::variable(c)),
    );
    assert_eq!(print_expression(&t, &chained), "a = b = c");

    let left_assign = Expression::binary(
        Assign,
        Expression::binary(Assign, Expression::variable(a), Expression::variable(b)),
        Expression::variable(c),
    );
    assert_eq!(print_expression(&t, &left_assign), "(a = b) = c");

    // Minus runs are separated.
    let minus_run = Expression::unary(
        Negation,
        Expression::unary(Negation, Expression::variable(a)),
    );
    assert_eq!(print_expression(&t, &minus_run), "-(-a)");

    let subscript = Expression::binary(
        ArraySubscript,
        Expression::variable(a),
        Expression::binary(Add, Expression::variable(b), Expression::variable(c)),
    );
    assert_eq!(print_expression(&t, &subscript), "a[b + c]");
}

#[test]
fn casts_and_member_access() {
    let mut t = tree();
    let i32t = t.types.make_integer_type(32, false);
    let i64t = t.types.make_integer_type(64, false);
    let x = t.declare_variable("x", i32t);

    let cstyle = Expression::typecast(CastKind::CStyle, i64t, Expression::variable(x));
    assert_eq!(print_expression(&t, &cstyle), "(int64_t)x");

    let static_cast = Expression::typecast(CastKind::Static, i64t, Expression::variable(x));
    assert_eq!(print_expression(&t, &static_cast), "static_cast<int64_t>(x)");

    let reinterpret =
        Expression::typecast(CastKind::Reinterpret, i64t, Expression::variable(x));
    assert_eq!(
        print_expression(&t, &reinterpret),
        "reinterpret_cast<int64_t>(x)"
    );

    // A compound that is itself an operator is parenthesized.
    let record = t.declare_struct("record").unwrap();
    let lo = t.add_struct_member(record, "lo", i32t).unwrap();
    let record_ty = t.struct_type(record).unwrap().ty;
    let record_ptr = t.types.make_pointer_to(record_ty);
    let q = t.declare_variable("q", record_ptr);

    let plain = Expression::member_access(MemberAccessKind::Arrow, Expression::variable(q), lo);
    assert_eq!(print_expression(&t, &plain), "q->lo");

    let through_deref = Expression::member_access(
        MemberAccessKind::Dot,
        Expression::unary(Dereference, Expression::variable(q)),
        lo,
    );
    assert_eq!(print_expression(&t, &through_deref), "(*q).lo");
}

#[test]
fn type_spellings() {
    let mut t = tree();
    let i8t = t.types.make_integer_type(8, false);
    let u8t = t.types.make_integer_type(8, true);
    let u32t = t.types.make_integer_type(32, true);
    let f64t = t.types.make_float_type(64);
    let i32t = t.types.make_integer_type(32, false);
    let ptr = t.types.make_pointer_to(i32t);
    let array = t.types.make_array_of(i32t, 10);
    let record = t.declare_struct("record").unwrap();
    let record_ty = t.struct_type(record).unwrap().ty;

    let printer = Printer::new(&t);
    assert_eq!(printer.type_text(i8t), "signed char");
    assert_eq!(printer.type_text(u8t), "unsigned char");
    assert_eq!(printer.type_text(u32t), "uint32_t");
    assert_eq!(printer.type_text(f64t), "float64");
    assert_eq!(printer.type_text(ptr), "int32_t*");
    assert_eq!(printer.type_text(array), "int32_t[10]");
    assert_eq!(printer.type_text(record_ty), "struct record");
    assert_eq!(printer.type_text(TypeId::VOID), "void");
    assert_eq!(printer.type_text(TypeId::ERRONEOUS), "<erroneous type>");
}

#[test]
fn struct_declaration_layout() {
    let mut t = tree();
    let i32t = t.types.make_integer_type(32, false);
    let i64t = t.types.make_integer_type(64, false);

    let record = t.declare_struct("record").unwrap();
    t.add_struct_member(record, "lo", i64t).unwrap();
    t.add_struct_member(record, "hi", i32t).unwrap();

    t.set_root(CompilationUnit {
        declarations: vec![TopLevelDeclaration::StructTypeDeclaration(record)],
    });

    let text = Printer::new(&t).print();
    let expected = "\nstruct record {\n    int64_t lo;\n    int32_t hi;\n};\n";
    assert_eq!(text, expected);
}

#[test]
fn expression_snapshots() {
    let mut t = tree();
    let i32t = t.types.make_integer_type(32, false);
    let i64t = t.types.make_integer_type(64, false);
    let x = t.declare_variable("x", i32t);
    let y = t.declare_variable("y", i32t);

    let masked = Expression::binary(
        BitwiseAnd,
        Expression::variable(x),
        Expression::binary(Add, Expression::variable(y), int32(&mut t, 1)),
    );
    insta::assert_snapshot!(print_expression(&t, &masked), @"x & y + 1");

    let shifted = Expression::binary(
        Shl,
        Expression::typecast(CastKind::CStyle, i64t, Expression::variable(x)),
        int32(&mut t, 8),
    );
    insta::assert_snapshot!(print_expression(&t, &shifted), @"(int64_t)x << 8");

    let compared = Expression::binary(
        NotEqual,
        Expression::binary(Rem, Expression::variable(x), int32(&mut t, 2)),
        int32(&mut t, 0),
    );
    insta::assert_snapshot!(print_expression(&t, &compared), @"x % 2 != 0");
}

/// Property: a node's recorded range selects exactly the text it printed.
#[test]
fn ranges_select_printed_text() {
    let mut t = tree();
    let i32t = t.types.make_integer_type(32, false);
    let a = t.declare_variable("a", i32t);
    let b = t.declare_variable("b", i32t);
    let c = t.declare_variable("c", i32t);

    let inner = Expression::binary(Add, Expression::variable(a), Expression::variable(b));
    let outer = Expression::binary(Mul, inner.clone(), Expression::variable(c));

    let mut builder = RangeTreeBuilder::new();
    let text = Printer::with_listener(&t, &mut builder).print_expression_only(&outer);
    let ranges = builder.finish();

    assert_eq!(text, "(a + b) * c");

    let root = ranges.root().unwrap();
    assert_eq!(root.offset(), 0);
    assert_eq!(root.size(), text.len());

    // Preorder: 0 = outer, 1 = a + b, 2 = a, 3 = b, 4 = c.
    let (start, end) = ranges.range_of(root.children()[0].tag()).unwrap();
    assert_eq!(&text[start..end], "a + b");
    assert_eq!(&text[start..end], print_expression(&t, &inner));

    // The parenthesis belongs to the outer node, the letters to the leaves.
    assert_eq!(ranges.leaf_at(0).unwrap().tag(), root.tag());
    assert_eq!(ranges.leaf_at(1).unwrap().tag().index, 2);
    assert_eq!(ranges.leaf_at(5).unwrap().tag().index, 3);
    assert_eq!(ranges.leaf_at(10).unwrap().tag().index, 4);

    // Position 3 is the '+': inside the inner sum but in no leaf.
    assert_eq!(ranges.leaf_at(3).unwrap().tag().index, 1);

    // Nodes fully inside the inner sum's range.
    let inside = ranges.nodes_in(1, 6);
    assert_eq!(inside.len(), 3);
}
