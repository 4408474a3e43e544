//! The LikeC simplifier: a bottom-up rewriter producing canonical idiomatic C.
//!
//! Every method takes ownership of a subtree and returns ownership of the
//! rewritten subtree. Statements may simplify away entirely (an unreferenced
//! label); containers filter those out. The simplifier is idempotent:
//! re-running it on its own output yields the same tree.

use crate::expr::{
    is_one, is_zero, BinaryOperatorKind, CastKind, Expression, MemberAccessKind, SizedValue,
    UnaryOperatorKind,
};
use crate::stmt::{Block, Statement};
use crate::tree::{CompilationUnit, DeclarationId, TopLevelDeclaration, Tree};
use crate::type_calc::{binary_operator_type, expression_type};
use crate::types::{LikecType, TypeId};

/// Rewrites LikeC trees into canonical form.
pub struct Simplifier<'t> {
    tree: &'t mut Tree,
}

impl<'t> Simplifier<'t> {
    pub fn new(tree: &'t mut Tree) -> Self {
        Simplifier { tree }
    }

    fn expr_type(&mut self, expression: &Expression) -> TypeId {
        expression_type(self.tree, expression)
    }

    // -----------------------------------------------------------------------
    // Declarations and statements
    // -----------------------------------------------------------------------

    pub fn simplify_compilation_unit(&mut self, unit: CompilationUnit) -> CompilationUnit {
        CompilationUnit {
            declarations: unit
                .declarations
                .into_iter()
                .map(|declaration| self.simplify_top_level(declaration))
                .collect(),
        }
    }

    fn simplify_top_level(&mut self, declaration: TopLevelDeclaration) -> TopLevelDeclaration {
        match declaration {
            TopLevelDeclaration::FunctionDefinition(mut definition) => {
                definition.body = self.simplify_block(definition.body);
                TopLevelDeclaration::FunctionDefinition(definition)
            }
            other => other,
        }
    }

    pub fn simplify_block(&mut self, block: Block) -> Block {
        Block {
            declarations: block.declarations,
            statements: block
                .statements
                .into_iter()
                .filter_map(|statement| self.simplify_statement(statement))
                .collect(),
        }
    }

    /// Simplifies one statement. Returns `None` when the statement vanishes
    /// (a label nothing references).
    pub fn simplify_statement(&mut self, statement: Statement) -> Option<Statement> {
        Some(match statement {
            Statement::Block(block) => Statement::Block(self.simplify_block(block)),
            Statement::If {
                condition,
                then_statement,
                else_statement,
            } => self.simplify_if(condition, *then_statement, else_statement.map(|s| *s)),
            Statement::While { condition, body } => {
                let condition = self.simplify_expression(condition);
                let condition = self.simplify_boolean(condition);
                let body = self.simplify_body(*body);
                Statement::While {
                    condition,
                    body: Box::new(body),
                }
            }
            Statement::DoWhile { body, condition } => {
                let condition = self.simplify_expression(condition);
                let condition = self.simplify_boolean(condition);
                let body = self.simplify_body(*body);
                Statement::DoWhile {
                    body: Box::new(body),
                    condition,
                }
            }
            Statement::Switch { expression, body } => {
                let expression = self.simplify_expression(expression);
                let expression = self.simplify_boolean(expression);
                let body = self.simplify_body(*body);
                Statement::Switch {
                    expression,
                    body: Box::new(body),
                }
            }
            Statement::Goto { destination } => Statement::Goto {
                destination: self.simplify_expression(destination),
            },
            Statement::Return { value } => Statement::Return {
                value: value.map(|value| self.simplify_expression(value)),
            },
            Statement::Label { declaration } => {
                let referenced = self
                    .tree
                    .label(declaration)
                    .is_some_and(|label| label.reference_count > 0);
                if !referenced {
                    return None;
                }
                Statement::Label { declaration }
            }
            Statement::Expression { expression } => Statement::Expression {
                expression: self.simplify_expression(expression),
            },
            other @ (Statement::Break
            | Statement::Continue
            | Statement::CaseLabel { .. }
            | Statement::DefaultLabel
            | Statement::InlineAssembly { .. }
            | Statement::Comment { .. }) => other,
        })
    }

    fn simplify_body(&mut self, body: Statement) -> Statement {
        self.simplify_statement(body)
            .unwrap_or(Statement::Block(Block::new()))
    }

    fn simplify_if(
        &mut self,
        condition: Expression,
        then_statement: Statement,
        else_statement: Option<Statement>,
    ) -> Statement {
        let mut then_statement = self.simplify_body(then_statement);
        let mut else_statement =
            else_statement.and_then(|statement| self.simplify_statement(statement));
        let mut condition = condition;

        // An empty else branch is dropped.
        if else_statement
            .as_ref()
            .and_then(|statement| statement.as_block())
            .is_some_and(|block| block.statements.is_empty())
        {
            else_statement = None;
        }

        // An empty then branch swaps with the else branch under a negated
        // condition.
        if then_statement
            .as_block()
            .is_some_and(|block| block.statements.is_empty())
        {
            if let Some(replacement) = else_statement.take() {
                then_statement = replacement;
                condition = self.simplify_expression(Expression::unary(
                    UnaryOperatorKind::LogicalNot,
                    condition,
                ));
            }
        }

        let condition = self.simplify_expression(condition);
        let condition = self.simplify_boolean(condition);

        Statement::If {
            condition,
            then_statement: Box::new(then_statement),
            else_statement: else_statement.map(Box::new),
        }
    }

    // -----------------------------------------------------------------------
    // Expressions
    // -----------------------------------------------------------------------

    pub fn simplify_expression(&mut self, expression: Expression) -> Expression {
        match expression {
            Expression::BinaryOperator {
                operator,
                left,
                right,
            } => self.simplify_binary(operator, *left, *right),
            Expression::UnaryOperator { operator, operand } => {
                self.simplify_unary(operator, *operand)
            }
            Expression::Typecast {
                cast,
                target,
                operand,
            } => self.simplify_typecast(cast, target, *operand),
            Expression::CallOperator { callee, arguments } => Expression::CallOperator {
                callee: Box::new(self.simplify_expression(*callee)),
                arguments: arguments
                    .into_iter()
                    .map(|argument| self.simplify_expression(argument))
                    .collect(),
            },
            Expression::MemberAccessOperator {
                access,
                compound,
                member,
            } => Expression::MemberAccessOperator {
                access,
                compound: Box::new(self.simplify_expression(*compound)),
                member,
            },
            other => other,
        }
    }

    fn simplify_binary(
        &mut self,
        operator: BinaryOperatorKind,
        left: Expression,
        right: Expression,
    ) -> Expression {
        use BinaryOperatorKind::*;

        let mut operator = operator;
        let mut left = self.simplify_expression(left);
        let mut right = self.simplify_expression(right);

        // Remove typecasts of operands if this won't change anything.
        if matches!(operator, Add | Sub | Mul | Div | Rem) {
            left = self.drop_redundant_cast(operator, left, &right, true);
            right = self.drop_redundant_cast(operator, right, &left, false);
        }

        // Rewrite computing of member address:
        // (IntT)structPtr + N -> &structPtr->member
        if operator == Add {
            if let Some(member) = self.member_at_constant_offset(&left, &right) {
                let Expression::Typecast { operand, .. } = left else {
                    unreachable!();
                };
                return self.simplify_expression(Expression::unary(
                    UnaryOperatorKind::Reference,
                    Expression::member_access(MemberAccessKind::Arrow, *operand, member),
                ));
            }
            if let Some(member) = self.member_at_constant_offset(&right, &left) {
                let Expression::Typecast { operand, .. } = right else {
                    unreachable!();
                };
                return self.simplify_expression(Expression::unary(
                    UnaryOperatorKind::Reference,
                    Expression::member_access(MemberAccessKind::Arrow, *operand, member),
                ));
            }
        }

        // Pointer arithmetic:
        // (int32_t*)((int64_t)p + 4) -> (int32_t*)(p + 1)
        match operator {
            Add => {
                match self.try_pointer_arithmetic(operator, left, right) {
                    Ok(rewritten) => return rewritten,
                    Err((l, r)) => {
                        (left, right) = (l, r);
                    }
                }
                match self.try_pointer_arithmetic_swapped(operator, left, right) {
                    Ok(rewritten) => return rewritten,
                    Err((l, r)) => {
                        (left, right) = (l, r);
                    }
                }
            }
            Sub => match self.try_pointer_arithmetic(operator, left, right) {
                Ok(rewritten) => return rewritten,
                Err((l, r)) => {
                    (left, right) = (l, r);
                }
            },
            _ => {}
        }

        // Mathematical identities. The type is preserved by a static cast.
        match operator {
            Add => {
                if is_zero(&left) {
                    let ty = binary_operator_type(self.tree, operator, &left, &right);
                    return self
                        .simplify_expression(Expression::typecast(CastKind::Static, ty, right));
                }
                if is_zero(&right) {
                    let ty = binary_operator_type(self.tree, operator, &left, &right);
                    return self
                        .simplify_expression(Expression::typecast(CastKind::Static, ty, left));
                }
            }
            Sub => {
                if is_zero(&right) {
                    let ty = binary_operator_type(self.tree, operator, &left, &right);
                    return self
                        .simplify_expression(Expression::typecast(CastKind::Static, ty, left));
                }
                if is_zero(&left) {
                    let ty = binary_operator_type(self.tree, operator, &left, &right);
                    return self.simplify_expression(Expression::unary(
                        UnaryOperatorKind::Negation,
                        Expression::typecast(CastKind::Static, ty, right),
                    ));
                }
            }
            Mul => {
                if is_one(&left) {
                    let ty = binary_operator_type(self.tree, operator, &left, &right);
                    return self
                        .simplify_expression(Expression::typecast(CastKind::Static, ty, right));
                }
                if is_one(&right) {
                    let ty = binary_operator_type(self.tree, operator, &left, &right);
                    return self
                        .simplify_expression(Expression::typecast(CastKind::Static, ty, left));
                }
            }
            Shl | Shr => {
                if is_zero(&right) {
                    let ty = binary_operator_type(self.tree, operator, &left, &right);
                    return self
                        .simplify_expression(Expression::typecast(CastKind::Static, ty, left));
                }
            }
            BitwiseOr | BitwiseXor | LogicalOr => {
                if is_zero(&left) {
                    let ty = binary_operator_type(self.tree, operator, &left, &right);
                    return self
                        .simplify_expression(Expression::typecast(CastKind::Static, ty, right));
                }
                if is_zero(&right) {
                    let ty = binary_operator_type(self.tree, operator, &left, &right);
                    return self
                        .simplify_expression(Expression::typecast(CastKind::Static, ty, left));
                }
            }
            LogicalAnd => {
                if is_one(&right) {
                    let ty = binary_operator_type(self.tree, operator, &left, &right);
                    return self
                        .simplify_expression(Expression::typecast(CastKind::Static, ty, left));
                }
                if is_one(&left) {
                    let ty = binary_operator_type(self.tree, operator, &left, &right);
                    return self
                        .simplify_expression(Expression::typecast(CastKind::Static, ty, right));
                }
            }
            _ => {}
        }

        // Simplifying boolean subexpressions.
        if matches!(operator, LogicalAnd | LogicalOr) {
            left = self.simplify_boolean(left);
            right = self.simplify_boolean(right);
        }

        // a + -1 -> a - 1, a - -1 -> a + 1
        if matches!(operator, Add | Sub) {
            if let Expression::IntegerConstant { value, ty } = &mut right {
                if self.tree.types.is_integer(*ty)
                    && !self.tree.types.is_unsigned(*ty)
                    && value.size() > 1
                    && value.signed_value() < 0
                {
                    *value = SizedValue::new(value.size(), value.absolute_value());
                    operator = if operator == Add { Sub } else { Add };
                }
            }
        }

        // x = x + 1 -> ++x, x = x - 1 -> --x
        if operator == Assign {
            if let Some(rewritten) = self.try_increment(&left, &right) {
                return Expression::unary(rewritten, left);
            }
        }

        Expression::BinaryOperator {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Drops a cast around an arithmetic operand when the cast is at least as
    /// wide as the operand and removing it leaves the whole expression's type
    /// unchanged.
    fn drop_redundant_cast(
        &mut self,
        operator: BinaryOperatorKind,
        side: Expression,
        other: &Expression,
        side_is_left: bool,
    ) -> Expression {
        let (cast, target, operand) = match side {
            Expression::Typecast {
                cast,
                target,
                operand,
            } => (cast, target, operand),
            other => return other,
        };

        let operand_type = self.expr_type(&operand);
        if self.tree.types.size(target) >= self.tree.types.size(operand_type) {
            let with_cast = Expression::Typecast {
                cast,
                target,
                operand,
            };
            let type_with = self.positioned_type(operator, &with_cast, other, side_is_left);
            let Expression::Typecast {
                cast,
                target,
                operand,
            } = with_cast
            else {
                unreachable!();
            };
            let type_without = self.positioned_type(operator, &operand, other, side_is_left);
            if type_with == type_without {
                return *operand;
            }
            return Expression::Typecast {
                cast,
                target,
                operand,
            };
        }

        Expression::Typecast {
            cast,
            target,
            operand,
        }
    }

    fn positioned_type(
        &mut self,
        operator: BinaryOperatorKind,
        side: &Expression,
        other: &Expression,
        side_is_left: bool,
    ) -> TypeId {
        if side_is_left {
            binary_operator_type(self.tree, operator, side, other)
        } else {
            binary_operator_type(self.tree, operator, other, side)
        }
    }

    /// Matches `(IntT)structPtr + N` where N names a member offset. Returns
    /// the member; the caller consumes the cast side.
    fn member_at_constant_offset(
        &mut self,
        cast_side: &Expression,
        constant_side: &Expression,
    ) -> Option<DeclarationId> {
        let Expression::Typecast {
            target, operand, ..
        } = cast_side
        else {
            return None;
        };
        if !self.tree.types.is_integer(*target) {
            return None;
        }
        let operand_type = self.expr_type(operand);
        if self.tree.types.size(*target) != self.tree.types.size(operand_type) {
            return None;
        }
        if !self.tree.types.is_pointer(operand_type) {
            return None;
        }
        let pointee = self.tree.types.pointee(operand_type)?;
        let LikecType::Struct { declaration, .. } = self.tree.types.get(pointee) else {
            return None;
        };
        let declaration = *declaration;
        let Expression::IntegerConstant { value, .. } = constant_side else {
            return None;
        };
        self.tree
            .struct_member_at_offset(declaration, value.value() * 8)
    }

    /// Matches `(IntT)ptr ± k` where the cast is a same-size integer view of
    /// a pointer and `k` divides by the pointee size, rewriting to
    /// `ptr ± k / sizeof(*ptr)`.
    fn try_pointer_arithmetic(
        &mut self,
        operator: BinaryOperatorKind,
        cast_side: Expression,
        other: Expression,
    ) -> Result<Expression, (Expression, Expression)> {
        let pointee_bytes = match self.pointer_behind_integer_cast(&cast_side) {
            Some(bytes) => bytes,
            None => return Err((cast_side, other)),
        };

        match divide(other, pointee_bytes as i64) {
            Ok(quotient) => {
                let Expression::Typecast { operand, .. } = cast_side else {
                    unreachable!();
                };
                Ok(self.simplify_expression(Expression::binary(operator, *operand, quotient)))
            }
            Err(other) => Err((cast_side, other)),
        }
    }

    fn try_pointer_arithmetic_swapped(
        &mut self,
        operator: BinaryOperatorKind,
        left: Expression,
        right: Expression,
    ) -> Result<Expression, (Expression, Expression)> {
        match self.try_pointer_arithmetic(operator, right, left) {
            Ok(rewritten) => Ok(rewritten),
            Err((right, left)) => Err((left, right)),
        }
    }

    /// When `expression` is a same-size integer cast of a pointer whose
    /// pointee has a whole-byte, non-zero size, returns that size in bytes.
    fn pointer_behind_integer_cast(&mut self, expression: &Expression) -> Option<u64> {
        let Expression::Typecast {
            target, operand, ..
        } = expression
        else {
            return None;
        };
        if !self.tree.types.is_integer(*target) {
            return None;
        }
        let operand_type = self.expr_type(operand);
        if self.tree.types.size(*target) != self.tree.types.size(operand_type) {
            return None;
        }
        if !self.tree.types.is_pointer(operand_type) {
            return None;
        }
        let pointee = self.tree.types.pointee(operand_type)?;
        let pointee_size = u64::from(self.tree.types.size_of(pointee));
        if pointee_size == 0 || pointee_size % 8 != 0 {
            return None;
        }
        Some(pointee_size / 8)
    }

    /// Recognizes `x = x ± 1` over the same variable declaration.
    fn try_increment(
        &mut self,
        left: &Expression,
        right: &Expression,
    ) -> Option<UnaryOperatorKind> {
        use BinaryOperatorKind::*;

        let Expression::VariableIdentifier { declaration } = left else {
            return None;
        };
        let Expression::BinaryOperator {
            operator: inner,
            left: inner_left,
            right: inner_right,
        } = right
        else {
            return None;
        };

        let unit_step = |variable: &Expression, step: &Expression| -> Option<bool> {
            let Expression::VariableIdentifier {
                declaration: stepped,
            } = variable
            else {
                return None;
            };
            if stepped != declaration {
                return None;
            }
            let Expression::IntegerConstant { value, .. } = step else {
                return None;
            };
            if value.value() == 1 {
                Some(true)
            } else if value.signed_value() == -1 {
                Some(false)
            } else {
                None
            }
        };

        let positive_step = match inner {
            Add => unit_step(inner_left, inner_right).or_else(|| unit_step(inner_right, inner_left)),
            Sub => unit_step(inner_left, inner_right),
            _ => None,
        }?;

        let increments = (*inner == Add) == positive_step;
        Some(if increments {
            UnaryOperatorKind::PrefixIncrement
        } else {
            UnaryOperatorKind::PrefixDecrement
        })
    }

    fn simplify_unary(
        &mut self,
        operator: UnaryOperatorKind,
        operand: Expression,
    ) -> Expression {
        use UnaryOperatorKind::*;

        let mut operator = operator;
        let mut operand = self.simplify_expression(operand);

        // A one-bit complement is a logical negation.
        if operator == BitwiseNot {
            let operand_type = self.expr_type(&operand);
            if self.tree.types.size(operand_type) == 1 {
                operator = LogicalNot;
            }
        }

        match operator {
            Dereference => {
                match operand {
                    Expression::UnaryOperator {
                        operator: Reference,
                        operand: inner,
                    } => return *inner,
                    Expression::BinaryOperator {
                        operator: BinaryOperatorKind::Add,
                        left,
                        right,
                    } => {
                        let left_type = self.expr_type(&left);
                        if self.tree.types.is_pointer(left_type) {
                            return Expression::BinaryOperator {
                                operator: BinaryOperatorKind::ArraySubscript,
                                left,
                                right,
                            };
                        }
                        let right_type = self.expr_type(&right);
                        if self.tree.types.is_pointer(right_type) {
                            return Expression::BinaryOperator {
                                operator: BinaryOperatorKind::ArraySubscript,
                                left: right,
                                right: left,
                            };
                        }
                        operand = Expression::BinaryOperator {
                            operator: BinaryOperatorKind::Add,
                            left,
                            right,
                        };
                    }
                    other => operand = other,
                }
            }
            LogicalNot => {
                operand = self.simplify_boolean(operand);

                if let Expression::BinaryOperator {
                    operator: comparison,
                    ..
                } = &mut operand
                {
                    if let Some(negated) = negate_comparison(*comparison) {
                        *comparison = negated;
                        return operand;
                    }
                }
                if let Expression::UnaryOperator {
                    operator: LogicalNot,
                    operand: inner,
                } = &operand
                {
                    let inner_type = self.expr_type(inner);
                    if self.tree.types.size(inner_type) == 1 {
                        let Expression::UnaryOperator { operand: inner, .. } = operand else {
                            unreachable!();
                        };
                        return *inner;
                    }
                }
            }
            _ => {}
        }

        Expression::UnaryOperator {
            operator,
            operand: Box::new(operand),
        }
    }

    /// Simplification in boolean context: strips widening scalar casts and
    /// zero comparisons. Applied to conditions, switch subjects, and the
    /// operands of `&&`/`||`.
    pub fn simplify_boolean(&mut self, expression: Expression) -> Expression {
        use BinaryOperatorKind::*;

        let mut expression = expression;

        loop {
            match expression {
                Expression::Typecast {
                    cast,
                    target,
                    operand,
                } => {
                    let operand_type = self.expr_type(&operand);
                    if self.tree.types.is_scalar(target)
                        && self.tree.types.is_scalar(operand_type)
                        && self.tree.types.size(target) >= self.tree.types.size(operand_type)
                    {
                        expression = *operand;
                    } else {
                        expression = Expression::Typecast {
                            cast,
                            target,
                            operand,
                        };
                        break;
                    }
                }
                other => {
                    expression = other;
                    break;
                }
            }
        }

        if let Expression::UnaryOperator {
            operator: UnaryOperatorKind::LogicalNot,
            operand,
        } = &expression
        {
            if matches!(
                operand.as_ref(),
                Expression::UnaryOperator {
                    operator: UnaryOperatorKind::LogicalNot,
                    ..
                }
            ) {
                let Expression::UnaryOperator { operand, .. } = expression else {
                    unreachable!();
                };
                let Expression::UnaryOperator { operand, .. } = *operand else {
                    unreachable!();
                };
                return self.simplify_boolean(*operand);
            }
        }

        match expression {
            Expression::BinaryOperator {
                operator,
                left,
                right,
            } if matches!(operator, Equal | NotEqual) => {
                if operator == NotEqual {
                    if is_zero(&right) {
                        return self.simplify_boolean(*left);
                    }
                    if is_zero(&left) {
                        return self.simplify_boolean(*right);
                    }
                } else {
                    if is_zero(&right) {
                        return self.simplify_expression(Expression::unary(
                            UnaryOperatorKind::LogicalNot,
                            *left,
                        ));
                    }
                    if is_zero(&left) {
                        return self.simplify_expression(Expression::unary(
                            UnaryOperatorKind::LogicalNot,
                            *right,
                        ));
                    }
                }
                Expression::BinaryOperator {
                    operator,
                    left,
                    right,
                }
            }
            other => other,
        }
    }

    fn simplify_typecast(
        &mut self,
        cast: CastKind,
        target: TypeId,
        operand: Expression,
    ) -> Expression {
        let mut operand = self.simplify_expression(operand);

        // A cast of a struct pointer to something else goes through the
        // address of the first member.
        if self.tree.types.is_pointer(target) && !self.tree.types.is_structure_pointer(target) {
            let operand_type = self.expr_type(&operand);
            if self.tree.types.is_pointer(operand_type) {
                if let Some(pointee) = self.tree.types.pointee(operand_type) {
                    if let LikecType::Struct { declaration, .. } = self.tree.types.get(pointee) {
                        let declaration = *declaration;
                        if let Some(first) = self.tree.struct_member_at_offset(declaration, 0) {
                            operand = Expression::unary(
                                UnaryOperatorKind::Reference,
                                Expression::member_access(MemberAccessKind::Arrow, operand, first),
                            );
                        }
                    }
                }
            }
        }

        // (int32_t*)(int64_t)expr -> (int32_t*)expr
        if self.tree.types.is_scalar(target) {
            operand = match operand {
                Expression::Typecast {
                    cast: inner_cast,
                    target: inner_target,
                    operand: inner,
                } => {
                    let inner_type = self.expr_type(&inner);
                    if self.tree.types.is_scalar(inner_target)
                        && self.tree.types.is_scalar(inner_type)
                        && self.tree.types.size(target) == self.tree.types.size(inner_target)
                        && self.tree.types.size(inner_target) == self.tree.types.size(inner_type)
                    {
                        *inner
                    } else {
                        Expression::Typecast {
                            cast: inner_cast,
                            target: inner_target,
                            operand: inner,
                        }
                    }
                }
                other => other,
            };
        }

        // This really must be the last rule.
        if target == self.expr_type(&operand) {
            return operand;
        }

        Expression::Typecast {
            cast,
            target,
            operand: Box::new(operand),
        }
    }
}

fn negate_comparison(operator: BinaryOperatorKind) -> Option<BinaryOperatorKind> {
    use BinaryOperatorKind::*;
    match operator {
        Equal => Some(NotEqual),
        NotEqual => Some(Equal),
        Less => Some(GreaterOrEqual),
        LessOrEqual => Some(Greater),
        Greater => Some(LessOrEqual),
        GreaterOrEqual => Some(Less),
        _ => None,
    }
}

/// Divides an expression tree by a constant, when the division is exact: an
/// integer constant divides directly; a product divides through either
/// factor. Returns the expression unchanged on failure.
fn divide(expression: Expression, divisor: i64) -> Result<Expression, Expression> {
    debug_assert!(divisor != 0);

    match expression {
        Expression::IntegerConstant { value, ty } => {
            if value.signed_value() % divisor == 0 {
                Ok(Expression::int_constant(
                    SizedValue::new(value.size(), (value.signed_value() / divisor) as u64),
                    ty,
                ))
            } else {
                Err(Expression::IntegerConstant { value, ty })
            }
        }
        Expression::BinaryOperator {
            operator: BinaryOperatorKind::Mul,
            left,
            right,
        } => match divide(*left, divisor) {
            Ok(quotient) => Ok(Expression::binary(
                BinaryOperatorKind::Mul,
                quotient,
                *right,
            )),
            Err(left) => match divide(*right, divisor) {
                Ok(quotient) => Ok(Expression::binary(BinaryOperatorKind::Mul, left, quotient)),
                Err(right) => Err(Expression::binary(BinaryOperatorKind::Mul, left, right)),
            },
        },
        other => Err(other),
    }
}
