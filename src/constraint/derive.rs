//! Deriving constraints from predicate trees.
//!
//! Derivation never fails on an unfamiliar shape: a predicate it cannot read
//! leaves its columns unconstrained. Internally every derived interval
//! carries an `exact` flag. An exact interval admits every value for which
//! the predicate is true and nothing for which it is false (values where it
//! is unknown may go either way). Only exact intervals may be complemented
//! under `NOT`; an inexact one is a plain over-approximation, whose
//! complement would reject rows the predicate accepts.

use tracing::debug;

use super::composite::{merge_intervals, Constraint, Merge};
use super::equivalence::EquivalenceClasses;
use super::interval::ConstraintInterval;
use super::range::{Bound, Range};
use crate::compare::DatumComparator;
use crate::config::DeriveSettings;
use crate::datum::{Datum, TypeId, Value};
use crate::error::{ConstraintError, ConstraintResult};
use crate::expr::{ArrayQuantifier, CmpKind, ColumnRef, ColumnSet, ScalarExpr};

/// What derivation needs besides the predicate.
#[derive(Clone, Copy)]
pub struct DeriveContext<'a> {
    comparator: &'a dyn DatumComparator,
    settings: DeriveSettings,
}

impl<'a> DeriveContext<'a> {
    pub fn new(comparator: &'a dyn DatumComparator, settings: DeriveSettings) -> Self {
        Self {
            comparator,
            settings,
        }
    }

    pub fn comparator(&self) -> &'a dyn DatumComparator {
        self.comparator
    }

    pub fn settings(&self) -> &DeriveSettings {
        &self.settings
    }
}

/// Result of [`Constraint::from_scalar_expr`].
#[derive(Debug, Clone)]
pub struct DerivedConstraint {
    /// The constraint, or `None` when the predicate restricts no column.
    pub constraint: Option<Constraint>,
    /// Columns equated by top-level `a = b` conjuncts, smallest column first.
    pub equivalence_classes: Vec<ColumnSet>,
}

struct Derived<T> {
    value: T,
    exact: bool,
}

impl<T> Derived<T> {
    fn exact(value: T) -> Self {
        Self { value, exact: true }
    }
}

// =============================================================================
// Interval derivation
// =============================================================================

impl ConstraintInterval {
    /// The values `column` may take wherever `expr` is true.
    ///
    /// Parts of `expr` that cannot be read widen the result; an expression
    /// that says nothing usable about `column` yields the unbounded interval.
    pub fn from_scalar_expr(
        expr: &ScalarExpr,
        column: &ColumnRef,
        ctx: &DeriveContext<'_>,
    ) -> ConstraintResult<Self> {
        let derived = derive_interval(expr, column, ctx)?;
        Ok(match derived {
            Some(d) => d.value,
            None => {
                debug!(column = %column, expr = %expr, "predicate not usable, column left unbounded");
                ConstraintInterval::unbounded(column.clone())
            }
        })
    }

    /// The interval of a single `column OP constant` comparison (either side
    /// order).
    ///
    /// Returns `Ok(None)` when the comparison does not pair a column with a
    /// constant or the constant cannot be constrained.
    pub fn from_comparison(expr: &ScalarExpr, ctx: &DeriveContext<'_>) -> ConstraintResult<Option<Self>> {
        let ScalarExpr::Cmp { left, op, right } = expr else {
            return Err(ConstraintError::MalformedExpression(format!(
                "expected a comparison, got {}",
                expr
            )));
        };
        let Some(column) = left.as_column().or_else(|| right.as_column()) else {
            return Ok(None);
        };
        derive_comparison(left, *op, right, column, ctx.comparator())
    }
}

fn derive_interval(
    expr: &ScalarExpr,
    column: &ColumnRef,
    ctx: &DeriveContext<'_>,
) -> ConstraintResult<Option<Derived<ConstraintInterval>>> {
    let cmp = ctx.comparator();
    match expr {
        ScalarExpr::Const(d) if d.type_id() == TypeId::BOOL => Ok(Some(Derived::exact(match d.value() {
            Value::Bool(true) => ConstraintInterval::unbounded(column.clone()),
            _ => ConstraintInterval::empty(column.clone()),
        }))),

        ScalarExpr::Cmp { left, op, right } => {
            Ok(derive_comparison(left, *op, right, column, cmp)?.map(Derived::exact))
        }

        ScalarExpr::IsNull { expr: inner, negated } if inner.as_column() == Some(column) => {
            Ok(Some(Derived::exact(if *negated {
                ConstraintInterval::not_null(column.clone())
            } else {
                ConstraintInterval::null_only(column.clone())
            })))
        }

        ScalarExpr::And(args) => {
            let mut acc: Option<ConstraintInterval> = None;
            let mut exact = true;
            for arg in args {
                match derive_interval(arg, column, ctx)? {
                    Some(d) => {
                        exact &= d.exact;
                        acc = Some(match acc {
                            None => d.value,
                            Some(prev) => prev.intersect(&d.value, cmp)?,
                        });
                    }
                    // an unreadable conjunct only loosens the result
                    None => exact = false,
                }
            }
            Ok(match acc {
                Some(value) => Some(Derived { value, exact }),
                None if args.is_empty() => Some(Derived::exact(ConstraintInterval::unbounded(column.clone()))),
                None => None,
            })
        }

        ScalarExpr::Or(args) => {
            let mut acc = ConstraintInterval::empty(column.clone());
            let mut exact = true;
            for arg in args {
                // one unreadable branch can admit anything
                let Some(d) = derive_interval(arg, column, ctx)? else {
                    return Ok(None);
                };
                exact &= d.exact;
                acc = acc.union(&d.value, cmp)?;
            }
            Ok(Some(Derived { value: acc, exact }))
        }

        ScalarExpr::Not(inner) => match derive_interval(inner, column, ctx)? {
            Some(d) if d.exact => Ok(Some(Derived::exact(d.value.complement(cmp)?))),
            _ => Ok(None),
        },

        ScalarExpr::ArrayCmp {
            left,
            op,
            quantifier,
            elements,
        } if left.as_column() == Some(column) => {
            Ok(derive_array_cmp(column, *op, *quantifier, elements, ctx)?.map(Derived::exact))
        }

        _ => Ok(None),
    }
}

/// `column OP constant` or `constant OP column`.
fn derive_comparison(
    left: &ScalarExpr,
    op: CmpKind,
    right: &ScalarExpr,
    column: &ColumnRef,
    cmp: &dyn DatumComparator,
) -> ConstraintResult<Option<ConstraintInterval>> {
    let (op, datum) = if left.as_column() == Some(column) {
        (op, right.as_const())
    } else if right.as_column() == Some(column) {
        (op.commute(), left.as_const())
    } else {
        return Ok(None);
    };
    let Some(datum) = datum else {
        return Ok(None);
    };
    if !datum.is_null() && !cmp.is_constrainable(datum) {
        debug!(column = %column, datum = %datum, "constant type cannot be constrained");
        return Ok(None);
    }
    Ok(Some(interval_for_cmp(column, op, datum)))
}

/// The interval of `column OP datum`.
fn interval_for_cmp(column: &ColumnRef, op: CmpKind, datum: &Datum) -> ConstraintInterval {
    let column = column.clone();
    if datum.is_null() {
        // comparing with NULL is never true
        if !op.is_null_safe() {
            return ConstraintInterval::empty(column);
        }
        return if op == CmpKind::IsNotDistinctFrom {
            ConstraintInterval::null_only(column)
        } else {
            ConstraintInterval::not_null(column)
        };
    }
    let d = datum.clone();
    match op {
        CmpKind::Eq | CmpKind::IsNotDistinctFrom => ConstraintInterval::from_range(column, Range::point(d)),
        CmpKind::Lt => ConstraintInterval::from_range(column, Range::less_than(d)),
        CmpKind::LtEq => ConstraintInterval::from_range(column, Range::at_most(d)),
        CmpKind::Gt => ConstraintInterval::from_range(column, Range::greater_than(d)),
        CmpKind::GtEq => ConstraintInterval::from_range(column, Range::at_least(d)),
        CmpKind::NotEq | CmpKind::IsDistinctFrom => ConstraintInterval::from_canonical(
            column,
            vec![
                Range::new(Bound::Unbounded, Bound::exclusive(d.clone())),
                Range::new(Bound::exclusive(d), Bound::Unbounded),
            ],
            // only IS DISTINCT FROM admits NULL rows
            op.is_null_safe(),
        ),
    }
}

/// `column OP ANY (...)` and `column OP ALL (...)` over constant elements.
fn derive_array_cmp(
    column: &ColumnRef,
    op: CmpKind,
    quantifier: ArrayQuantifier,
    elements: &[ScalarExpr],
    ctx: &DeriveContext<'_>,
) -> ConstraintResult<Option<ConstraintInterval>> {
    let cmp = ctx.comparator();
    let threshold = ctx.settings().array_expansion_threshold;
    if elements.len() > threshold {
        debug!(column = %column, elements = elements.len(), threshold, "array too large to expand");
        return Ok(None);
    }
    let mut datums = Vec::with_capacity(elements.len());
    for element in elements {
        match element.as_const() {
            Some(d) if d.is_null() || cmp.is_constrainable(d) => datums.push(d),
            _ => return Ok(None),
        }
    }

    if datums.is_empty() {
        // ANY over nothing is false, ALL over nothing is true
        return Ok(Some(match quantifier {
            ArrayQuantifier::Any => ConstraintInterval::empty(column.clone()),
            ArrayQuantifier::All => ConstraintInterval::unbounded(column.clone()),
        }));
    }

    let interval = match (op, quantifier) {
        (CmpKind::Eq, ArrayQuantifier::Any) => {
            let has_null = datums.iter().any(|d| d.is_null());
            let points = datums.iter().filter(|d| !d.is_null()).map(|d| (*d).clone());
            ConstraintInterval::from_points(column.clone(), points, has_null, cmp)?
        }
        (CmpKind::NotEq, ArrayQuantifier::All) => {
            if datums.iter().any(|d| d.is_null()) {
                // x <> NULL is never true, so neither is the whole list
                ConstraintInterval::empty(column.clone())
            } else {
                let points = datums.iter().map(|d| (*d).clone());
                ConstraintInterval::from_points(column.clone(), points, false, cmp)?
                    .complement(cmp)?
                    .with_includes_null(false)
            }
        }
        (op, ArrayQuantifier::Any) => {
            let mut acc = ConstraintInterval::empty(column.clone());
            for d in &datums {
                acc = acc.union(&interval_for_cmp(column, op, d), cmp)?;
            }
            acc
        }
        (op, ArrayQuantifier::All) => {
            let mut acc = ConstraintInterval::unbounded(column.clone());
            for d in &datums {
                acc = acc.intersect(&interval_for_cmp(column, op, d), cmp)?;
            }
            acc
        }
    };
    Ok(Some(interval))
}

// =============================================================================
// Constraint derivation
// =============================================================================

impl Constraint {
    /// Derive a constraint and the column equivalence classes implied by
    /// `expr`.
    ///
    /// Top-level `a = b` conjuncts become equivalence classes instead of
    /// constraints. Predicates on a single column become one interval;
    /// anything else becomes a conjunction, disjunction or negation of the
    /// parts that can be read.
    pub fn from_scalar_expr(expr: &ScalarExpr, ctx: &DeriveContext<'_>) -> ConstraintResult<DerivedConstraint> {
        let mut classes = EquivalenceClasses::new();
        let derived = derive_constraint(expr, ctx, &mut classes)?;
        let constraint = derived.map(|d| d.value);
        let equivalence_classes = classes.into_sets();
        debug!(
            expr = %expr,
            constraint = %constraint.as_ref().map(|c| c.to_string()).unwrap_or_else(|| "none".to_string()),
            classes = equivalence_classes.len(),
            "derived constraint"
        );
        Ok(DerivedConstraint {
            constraint,
            equivalence_classes,
        })
    }
}

/// `a = b` between two distinct columns.
fn column_equality(expr: &ScalarExpr) -> Option<(&ColumnRef, &ColumnRef)> {
    match expr {
        ScalarExpr::Cmp {
            left,
            op: CmpKind::Eq,
            right,
        } => match (left.as_column(), right.as_column()) {
            (Some(a), Some(b)) if a != b => Some((a, b)),
            _ => None,
        },
        _ => None,
    }
}

fn derive_constraint(
    expr: &ScalarExpr,
    ctx: &DeriveContext<'_>,
    classes: &mut EquivalenceClasses,
) -> ConstraintResult<Option<Derived<Constraint>>> {
    let cmp = ctx.comparator();

    if let Some((a, b)) = column_equality(expr) {
        debug!(left = %a, right = %b, "column equality");
        classes.union(a, b);
        return Ok(None);
    }

    let columns = expr.columns();
    if let Some(column) = columns.single() {
        if let Some(d) = derive_interval(expr, column, ctx)? {
            if d.value.is_unbounded() {
                return Ok(None);
            }
            return Ok(Some(Derived {
                value: Constraint::interval(d.value),
                exact: d.exact,
            }));
        }
    }

    match expr {
        ScalarExpr::And(args) => {
            let mut children = Vec::with_capacity(args.len());
            let mut exact = true;
            for arg in args {
                match derive_constraint(arg, ctx, classes)? {
                    Some(d) => {
                        exact &= d.exact;
                        children.push(d.value);
                    }
                    None => exact = false,
                }
            }
            if children.is_empty() {
                return Ok(None);
            }
            let children = merge_intervals(children, Merge::Intersect, cmp)?;
            Ok(Some(Derived {
                value: Constraint::conjunction(children)?,
                exact,
            }))
        }
        ScalarExpr::Or(args) => {
            let mut children = Vec::with_capacity(args.len());
            let mut exact = true;
            for arg in args {
                // equalities under OR hold only on some rows
                let mut branch_classes = EquivalenceClasses::new();
                let Some(d) = derive_constraint(arg, ctx, &mut branch_classes)? else {
                    return Ok(None);
                };
                exact &= d.exact && branch_classes.is_empty();
                children.push(d.value);
            }
            if children.is_empty() {
                return Ok(None);
            }
            let children = merge_intervals(children, Merge::Union, cmp)?;
            Ok(Some(Derived {
                value: Constraint::disjunction(children)?,
                exact,
            }))
        }
        ScalarExpr::Not(inner) => {
            let mut scratch = EquivalenceClasses::new();
            match derive_constraint(inner, ctx, &mut scratch)? {
                Some(d) if d.exact && scratch.is_empty() => {
                    Ok(Some(Derived::exact(Constraint::negation(d.value))))
                }
                _ => Ok(None),
            }
        }
        _ => Ok(None),
    }
}
