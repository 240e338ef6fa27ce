//! Datum ordering for interval arithmetic.
//!
//! The comparator deliberately departs from SQL three-valued logic: NULL
//! equals NULL and sorts below every value, so that domains including NULL
//! stay totally ordered. Values of a type that cannot be constrained never
//! satisfy any comparison.
//!
//! | predicate              | NULL, NULL | NULL, x | x, NULL |
//! |------------------------|-----------|---------|---------|
//! | `equals`               | true      | false   | false   |
//! | `less_than`            | false     | true    | false   |
//! | `less_or_equal`        | true      | true    | false   |
//! | `greater_than`         | false     | false   | true    |
//! | `greater_or_equal`     | true      | false   | true    |

use std::cmp::Ordering;

use tracing::{trace, warn};

use crate::config::ComparatorSettings;
use crate::datum::{Datum, TypeCatalog, TypeId, Value};
use crate::error::{ConstraintError, ConstraintResult};
use crate::eval::ConstExprEvaluator;
use crate::expr::{cmp, CmpKind, ScalarExpr};

/// Ordering policy over pairs of datums.
pub trait DatumComparator {
    /// True when the datum's type has a meaningful order for this comparator.
    fn is_constrainable(&self, datum: &Datum) -> bool;

    fn equals(&self, a: &Datum, b: &Datum) -> ConstraintResult<bool>;
    fn less_than(&self, a: &Datum, b: &Datum) -> ConstraintResult<bool>;
    fn less_or_equal(&self, a: &Datum, b: &Datum) -> ConstraintResult<bool>;
    fn greater_than(&self, a: &Datum, b: &Datum) -> ConstraintResult<bool>;
    fn greater_or_equal(&self, a: &Datum, b: &Datum) -> ConstraintResult<bool>;

    /// Three-way comparison derived from `equals` and `less_than`.
    ///
    /// Only meaningful for constrainable datums; the range algebra never
    /// builds bounds from anything else.
    fn compare(&self, a: &Datum, b: &Datum) -> ConstraintResult<Ordering> {
        if self.equals(a, b)? {
            Ok(Ordering::Equal)
        } else if self.less_than(a, b)? {
            Ok(Ordering::Less)
        } else {
            Ok(Ordering::Greater)
        }
    }
}

/// Comparator backed by a constant evaluator and a type catalog.
pub struct DefaultComparator<'a> {
    evaluator: &'a dyn ConstExprEvaluator,
    types: &'a dyn TypeCatalog,
    settings: ComparatorSettings,
}

impl<'a> DefaultComparator<'a> {
    pub fn new(
        evaluator: &'a dyn ConstExprEvaluator,
        types: &'a dyn TypeCatalog,
        settings: ComparatorSettings,
    ) -> Self {
        Self {
            evaluator,
            types,
            settings,
        }
    }

    pub fn settings(&self) -> &ComparatorSettings {
        &self.settings
    }

    fn both_constrainable(&self, a: &Datum, b: &Datum) -> bool {
        self.is_constrainable(a) && self.is_constrainable(b)
    }

    /// Numeric comparison for native integer pairs, when enabled.
    fn fast_path(&self, a: &Datum, b: &Datum) -> Option<Ordering> {
        if !self.settings.use_int_fast_path()
            || !self.types.is_native_int(a.type_id())
            || !self.types.is_native_int(b.type_id())
        {
            return None;
        }
        match (a.as_i64(), b.as_i64()) {
            (Some(x), Some(y)) => Some(x.cmp(&y)),
            _ => None,
        }
    }

    /// Ask the evaluator to decide `a op b` for two non-NULL datums.
    fn evaluate(&self, a: &Datum, op: CmpKind, b: &Datum) -> ConstraintResult<bool> {
        let expr = cmp(
            ScalarExpr::Const(a.clone()),
            op,
            ScalarExpr::Const(b.clone()),
        );
        let result = self.evaluator.evaluate(&expr)?;
        trace!(expr = %expr, result = %result, "comparator.evaluate");
        match result {
            ScalarExpr::Const(d) => match d.value() {
                Value::Bool(b) => Ok(*b),
                // an unknown comparison result is not a match
                Value::Null if d.type_id() == TypeId::BOOL => Ok(false),
                _ => {
                    warn!(expr = %expr, result = %d, "evaluator returned a non-boolean constant");
                    Err(ConstraintError::EvaluatorContractViolation(format!(
                        "{} evaluated to non-boolean {}",
                        expr, d
                    )))
                }
            },
            other => {
                warn!(expr = %expr, result = %other, "evaluator did not fold to a constant");
                Err(ConstraintError::EvaluatorContractViolation(format!(
                    "{} evaluated to non-constant {}",
                    expr, other
                )))
            }
        }
    }
}

impl DatumComparator for DefaultComparator<'_> {
    fn is_constrainable(&self, datum: &Datum) -> bool {
        let ty = datum.type_id();
        self.types.is_native_int(ty)
            || (self.settings.enable_const_eval && self.types.is_orderable(ty))
    }

    fn equals(&self, a: &Datum, b: &Datum) -> ConstraintResult<bool> {
        if !self.both_constrainable(a, b) {
            return Ok(false);
        }
        if let Some(ord) = self.fast_path(a, b) {
            return Ok(ord == Ordering::Equal);
        }
        match (a.is_null(), b.is_null()) {
            (true, true) => Ok(true),
            (true, false) | (false, true) => Ok(false),
            (false, false) => self.evaluate(a, CmpKind::Eq, b),
        }
    }

    fn less_than(&self, a: &Datum, b: &Datum) -> ConstraintResult<bool> {
        if !self.both_constrainable(a, b) {
            return Ok(false);
        }
        if let Some(ord) = self.fast_path(a, b) {
            return Ok(ord == Ordering::Less);
        }
        match (a.is_null(), b.is_null()) {
            (true, false) => Ok(true),
            (true, true) | (false, true) => Ok(false),
            (false, false) => self.evaluate(a, CmpKind::Lt, b),
        }
    }

    fn less_or_equal(&self, a: &Datum, b: &Datum) -> ConstraintResult<bool> {
        if !self.both_constrainable(a, b) {
            return Ok(false);
        }
        if let Some(ord) = self.fast_path(a, b) {
            return Ok(ord != Ordering::Greater);
        }
        match (a.is_null(), b.is_null()) {
            (true, _) => Ok(true),
            (false, true) => Ok(false),
            (false, false) => self.evaluate(a, CmpKind::LtEq, b),
        }
    }

    fn greater_than(&self, a: &Datum, b: &Datum) -> ConstraintResult<bool> {
        if !self.both_constrainable(a, b) {
            return Ok(false);
        }
        if let Some(ord) = self.fast_path(a, b) {
            return Ok(ord == Ordering::Greater);
        }
        match (a.is_null(), b.is_null()) {
            (false, true) => Ok(true),
            (true, _) => Ok(false),
            (false, false) => self.evaluate(a, CmpKind::Gt, b),
        }
    }

    fn greater_or_equal(&self, a: &Datum, b: &Datum) -> ConstraintResult<bool> {
        if !self.both_constrainable(a, b) {
            return Ok(false);
        }
        if let Some(ord) = self.fast_path(a, b) {
            return Ok(ord != Ordering::Less);
        }
        match (a.is_null(), b.is_null()) {
            (_, true) => Ok(true),
            (true, false) => Ok(false),
            (false, false) => self.evaluate(a, CmpKind::GtEq, b),
        }
    }
}
