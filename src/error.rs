//! Errors raised by the constraint core.
//!
//! Only contract violations surface here. Unrecognized predicate shapes and
//! unconstrainable types are not errors: they widen to an unconstrained
//! interval (or a `false` comparator answer) and processing continues.

use thiserror::Error;

use crate::eval::EvalError;
use crate::expr::ColumnRef;

/// Fatal errors that abort the current derivation.
#[derive(Debug, Error)]
pub enum ConstraintError {
    /// A binary interval operation was called on intervals of two different columns.
    #[error("Column mismatch: cannot combine interval on {left} with interval on {right}")]
    ColumnMismatch { left: ColumnRef, right: ColumnRef },

    /// The constant evaluator answered a comparison with something other than a boolean constant.
    #[error("Evaluator contract violation: {0}")]
    EvaluatorContractViolation(String),

    /// The constant evaluator itself failed.
    #[error("Evaluator failed: {0}")]
    Evaluator(#[from] EvalError),

    /// A typed constructor received an expression of the wrong kind.
    #[error("Malformed expression: {0}")]
    MalformedExpression(String),
}

pub type ConstraintResult<T> = Result<T, ConstraintError>;
