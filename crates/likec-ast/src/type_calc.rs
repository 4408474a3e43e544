//! Type calculation for expressions.
//!
//! A pure function over the tree structure: no expression is mutated, but the
//! tree is borrowed mutably because computing a type may intern a new one.
//! Any combination the C rules do not cover yields the erroneous type; the
//! calculator never fails.

use crate::expr::{is_zero, BinaryOperatorKind, Expression, UnaryOperatorKind};
use crate::tree::{Declaration, Tree};
use crate::types::{LikecType, TypeId};

/// The type of an expression.
pub fn expression_type(tree: &mut Tree, expression: &Expression) -> TypeId {
    match expression {
        Expression::BinaryOperator {
            operator,
            left,
            right,
        } => binary_operator_type(tree, *operator, left, right),
        Expression::UnaryOperator { operator, operand } => {
            unary_operator_type(tree, *operator, operand)
        }
        Expression::CallOperator { callee, .. } => {
            let callee_type = expression_type(tree, callee);
            match tree.types.get(callee_type) {
                LikecType::FunctionPointer { return_type, .. } => *return_type,
                _ => tree.types.erroneous_type(),
            }
        }
        Expression::MemberAccessOperator { member, .. } => match tree.member(*member) {
            Some(declaration) => declaration.ty,
            None => tree.types.erroneous_type(),
        },
        Expression::Typecast { target, .. } => *target,
        Expression::IntegerConstant { ty, .. } => *ty,
        Expression::String { .. } => {
            let char_type = tree.types.make_integer_type(8, false);
            tree.types.make_pointer_to(char_type)
        }
        Expression::VariableIdentifier { declaration } => match tree.declaration(*declaration) {
            Declaration::Variable(d) => d.ty,
            _ => tree.types.erroneous_type(),
        },
        Expression::FunctionIdentifier { declaration } => match tree.declaration(*declaration) {
            Declaration::Function(d) => d.ty,
            _ => tree.types.erroneous_type(),
        },
        Expression::LabelIdentifier { .. } => {
            let void = tree.types.void_type();
            tree.types.make_pointer_to(void)
        }
        Expression::UndeclaredIdentifier { ty, .. } => *ty,
    }
}

/// The type a binary operator would have over the given operands.
pub fn binary_operator_type(
    tree: &mut Tree,
    operator: BinaryOperatorKind,
    left: &Expression,
    right: &Expression,
) -> TypeId {
    use BinaryOperatorKind::*;

    let left_type = expression_type(tree, left);
    let right_type = expression_type(tree, right);

    match operator {
        Assign => {
            if left_type == right_type
                || (tree.types.is_arithmetic(left_type) && tree.types.is_arithmetic(right_type))
                || (tree.types.is_pointer(left_type)
                    && tree.types.is_pointer(right_type)
                    && (tree.types.is_void_pointer(left_type) || tree.types.is_void_pointer(right_type)))
                || (tree.types.is_pointer(left_type) && is_zero(right))
            {
                left_type
            } else {
                tree.types.erroneous_type()
            }
        }
        Add => {
            if tree.types.is_arithmetic(left_type) && tree.types.is_arithmetic(right_type) {
                tree.types.usual_arithmetic_conversion(left_type, right_type)
            } else if tree.types.is_pointer(left_type)
                && !tree.types.is_void_pointer(left_type)
                && tree.types.is_integer(right_type)
            {
                left_type
            } else if tree.types.is_integer(left_type)
                && tree.types.is_pointer(right_type)
                && !tree.types.is_void_pointer(right_type)
            {
                right_type
            } else {
                tree.types.erroneous_type()
            }
        }
        Sub => {
            if tree.types.is_arithmetic(left_type) && tree.types.is_arithmetic(right_type) {
                tree.types.usual_arithmetic_conversion(left_type, right_type)
            } else if tree.types.is_pointer(left_type)
                && !tree.types.is_void_pointer(left_type)
                && left_type == right_type
            {
                // ptrdiff_t is a signed integer of platform-dependent size.
                let size = tree.types.ptrdiff_size();
                tree.types.make_integer_type(size, false)
            } else if tree.types.is_pointer(left_type)
                && !tree.types.is_void_pointer(left_type)
                && tree.types.is_integer(right_type)
            {
                left_type
            } else {
                tree.types.erroneous_type()
            }
        }
        Mul | Div => {
            if tree.types.is_arithmetic(left_type) && tree.types.is_arithmetic(right_type) {
                tree.types.usual_arithmetic_conversion(left_type, right_type)
            } else {
                tree.types.erroneous_type()
            }
        }
        Rem | BitwiseAnd | BitwiseOr | BitwiseXor => {
            if tree.types.is_integer(left_type) && tree.types.is_integer(right_type) {
                tree.types.usual_arithmetic_conversion(left_type, right_type)
            } else {
                tree.types.erroneous_type()
            }
        }
        LogicalAnd | LogicalOr => {
            if tree.types.is_scalar(left_type) && tree.types.is_scalar(right_type) {
                tree.types.make_integer_type(1, false)
            } else {
                tree.types.erroneous_type()
            }
        }
        Shl | Shr => {
            if tree.types.is_integer(left_type) && tree.types.is_integer(right_type) {
                tree.types.integer_promotion(left_type)
            } else {
                tree.types.erroneous_type()
            }
        }
        Equal | NotEqual => {
            if left_type == right_type
                || (tree.types.is_arithmetic(left_type) && tree.types.is_arithmetic(right_type))
                || (tree.types.is_pointer(left_type)
                    && (tree.types.is_void_pointer(right_type) || is_zero(right)))
                || (tree.types.is_pointer(right_type)
                    && (tree.types.is_void_pointer(left_type) || is_zero(left)))
            {
                tree.types.make_integer_type(1, false)
            } else {
                tree.types.erroneous_type()
            }
        }
        Less | LessOrEqual | Greater | GreaterOrEqual => {
            if left_type == right_type
                || (tree.types.is_arithmetic(left_type) && tree.types.is_arithmetic(right_type))
                || (tree.types.is_pointer(left_type) && tree.types.is_void_pointer(right_type))
                || (tree.types.is_pointer(right_type) && tree.types.is_void_pointer(left_type))
            {
                tree.types.make_integer_type(1, false)
            } else {
                tree.types.erroneous_type()
            }
        }
        Comma => right_type,
        ArraySubscript => {
            let sum_type = binary_operator_type(tree, Add, left, right);
            match tree.types.pointee(sum_type) {
                Some(pointee) => pointee,
                None => tree.types.erroneous_type(),
            }
        }
    }
}

fn unary_operator_type(
    tree: &mut Tree,
    operator: UnaryOperatorKind,
    operand: &Expression,
) -> TypeId {
    use UnaryOperatorKind::*;

    let operand_type = expression_type(tree, operand);

    match operator {
        Reference => tree.types.make_pointer_to(operand_type),
        Dereference => match tree.types.pointee(operand_type) {
            Some(pointee) => pointee,
            None => tree.types.erroneous_type(),
        },
        BitwiseNot => {
            if tree.types.is_integer(operand_type) {
                tree.types.integer_promotion(operand_type)
            } else {
                tree.types.erroneous_type()
            }
        }
        LogicalNot => {
            if tree.types.is_scalar(operand_type) {
                let size = tree.types.int_size();
                tree.types.make_integer_type(size, false)
            } else {
                tree.types.erroneous_type()
            }
        }
        Negation => {
            if tree.types.is_arithmetic(operand_type) {
                operand_type
            } else {
                tree.types.erroneous_type()
            }
        }
        PrefixIncrement | PrefixDecrement => {
            if tree.types.is_scalar(operand_type) {
                operand_type
            } else {
                tree.types.erroneous_type()
            }
        }
    }
}
