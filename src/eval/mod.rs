//! Constant-expression evaluation.
//!
//! The comparator hands closed comparisons (`const OP const`) to a
//! [`ConstExprEvaluator`] when it has no cheaper way to decide them. The
//! evaluator must answer with a boolean constant.

use std::cmp::Ordering;

use thiserror::Error;

use crate::datum::{Datum, TypeId, Value};
use crate::expr::{CmpKind, ScalarExpr};

/// Errors raised by an evaluator.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    #[error("Expression is not a closed constant expression: {0}")]
    NotConstant(String),

    #[error("Cannot compare {left} with {right}")]
    IncomparableTypes { left: TypeId, right: TypeId },

    #[error("Unsupported expression: {0}")]
    Unsupported(String),
}

/// Evaluates closed constant expressions down to a constant.
pub trait ConstExprEvaluator {
    fn evaluate(&self, expr: &ScalarExpr) -> Result<ScalarExpr, EvalError>;
}

/// Evaluator for comparisons between built-in values.
///
/// Integers and floats compare numerically across widths, text compares
/// bytewise, booleans with `false < true`. A NULL operand yields a NULL
/// boolean unless the comparison is null-safe.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinEvaluator;

impl BuiltinEvaluator {
    fn order(left: &Datum, right: &Datum) -> Result<Ordering, EvalError> {
        let incomparable = || EvalError::IncomparableTypes {
            left: left.type_id(),
            right: right.type_id(),
        };
        match (left.value(), right.value()) {
            (Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => Ok(a.total_cmp(b)),
            (Value::Int(a), Value::Float(b)) => Ok((*a as f64).total_cmp(b)),
            (Value::Float(a), Value::Int(b)) => Ok(a.total_cmp(&(*b as f64))),
            (Value::Text(a), Value::Text(b)) => Ok(a.as_bytes().cmp(b.as_bytes())),
            (Value::Bool(a), Value::Bool(b)) => Ok(a.cmp(b)),
            _ => Err(incomparable()),
        }
    }

    fn compare(left: &Datum, op: CmpKind, right: &Datum) -> Result<Datum, EvalError> {
        if left.is_null() || right.is_null() {
            if !op.is_null_safe() {
                return Ok(Datum::null(TypeId::BOOL));
            }
            // NULL is not distinct from NULL and distinct from every value
            let same = left.is_null() && right.is_null();
            return Ok(Datum::bool(same == (op == CmpKind::IsNotDistinctFrom)));
        }
        let ord = Self::order(left, right)?;
        let result = match op {
            CmpKind::Eq | CmpKind::IsNotDistinctFrom => ord == Ordering::Equal,
            CmpKind::NotEq | CmpKind::IsDistinctFrom => ord != Ordering::Equal,
            CmpKind::Lt => ord == Ordering::Less,
            CmpKind::LtEq => ord != Ordering::Greater,
            CmpKind::Gt => ord == Ordering::Greater,
            CmpKind::GtEq => ord != Ordering::Less,
        };
        Ok(Datum::bool(result))
    }
}

impl ConstExprEvaluator for BuiltinEvaluator {
    fn evaluate(&self, expr: &ScalarExpr) -> Result<ScalarExpr, EvalError> {
        match expr {
            ScalarExpr::Const(_) => Ok(expr.clone()),
            ScalarExpr::Cmp { left, op, right } => match (left.as_const(), right.as_const()) {
                (Some(l), Some(r)) => Ok(ScalarExpr::Const(Self::compare(l, *op, r)?)),
                _ => Err(EvalError::NotConstant(expr.to_string())),
            },
            other => Err(EvalError::Unsupported(other.to_string())),
        }
    }
}
