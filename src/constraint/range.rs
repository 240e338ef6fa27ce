//! One contiguous interval of a column's domain.

use std::cmp::Ordering;
use std::fmt;

use crate::compare::DatumComparator;
use crate::datum::Datum;
use crate::error::ConstraintResult;
use crate::expr::{col, lit, ColumnRef, PredicateExt, ScalarExpr};

/// Whether a bound value belongs to the range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundKind {
    Inclusive,
    Exclusive,
}

impl BoundKind {
    pub fn flip(self) -> Self {
        match self {
            BoundKind::Inclusive => BoundKind::Exclusive,
            BoundKind::Exclusive => BoundKind::Inclusive,
        }
    }

    pub fn is_inclusive(self) -> bool {
        self == BoundKind::Inclusive
    }
}

/// One edge of a range.
#[derive(Debug, Clone, PartialEq)]
pub enum Bound {
    Unbounded,
    Value(Datum, BoundKind),
}

impl Bound {
    pub fn inclusive(datum: Datum) -> Self {
        Bound::Value(datum, BoundKind::Inclusive)
    }

    pub fn exclusive(datum: Datum) -> Self {
        Bound::Value(datum, BoundKind::Exclusive)
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, Bound::Unbounded)
    }

    pub fn datum(&self) -> Option<&Datum> {
        match self {
            Bound::Unbounded => None,
            Bound::Value(d, _) => Some(d),
        }
    }

    /// Same datum, opposite kind. Used when cutting the domain at this edge.
    fn flipped(&self) -> Self {
        match self {
            Bound::Unbounded => Bound::Unbounded,
            Bound::Value(d, kind) => Bound::Value(d.clone(), kind.flip()),
        }
    }
}

/// Order two lower bounds: `Unbounded` first, and on equal datums an
/// inclusive edge starts before an exclusive one.
pub(crate) fn cmp_lower(
    a: &Bound,
    b: &Bound,
    cmp: &dyn DatumComparator,
) -> ConstraintResult<Ordering> {
    match (a, b) {
        (Bound::Unbounded, Bound::Unbounded) => Ok(Ordering::Equal),
        (Bound::Unbounded, Bound::Value(..)) => Ok(Ordering::Less),
        (Bound::Value(..), Bound::Unbounded) => Ok(Ordering::Greater),
        (Bound::Value(x, kx), Bound::Value(y, ky)) => Ok(match cmp.compare(x, y)? {
            Ordering::Equal => match (kx, ky) {
                (BoundKind::Inclusive, BoundKind::Exclusive) => Ordering::Less,
                (BoundKind::Exclusive, BoundKind::Inclusive) => Ordering::Greater,
                _ => Ordering::Equal,
            },
            ord => ord,
        }),
    }
}

/// Order two upper bounds: `Unbounded` last, and on equal datums an
/// exclusive edge ends before an inclusive one.
pub(crate) fn cmp_upper(
    a: &Bound,
    b: &Bound,
    cmp: &dyn DatumComparator,
) -> ConstraintResult<Ordering> {
    match (a, b) {
        (Bound::Unbounded, Bound::Unbounded) => Ok(Ordering::Equal),
        (Bound::Unbounded, Bound::Value(..)) => Ok(Ordering::Greater),
        (Bound::Value(..), Bound::Unbounded) => Ok(Ordering::Less),
        (Bound::Value(x, kx), Bound::Value(y, ky)) => Ok(match cmp.compare(x, y)? {
            Ordering::Equal => match (kx, ky) {
                (BoundKind::Exclusive, BoundKind::Inclusive) => Ordering::Less,
                (BoundKind::Inclusive, BoundKind::Exclusive) => Ordering::Greater,
                _ => Ordering::Equal,
            },
            ord => ord,
        }),
    }
}

/// True when no point lies at or below `upper` and at or above `lower`.
fn separated(upper: &Bound, lower: &Bound, cmp: &dyn DatumComparator) -> ConstraintResult<bool> {
    match (upper, lower) {
        (Bound::Value(u, ku), Bound::Value(l, kl)) => Ok(match cmp.compare(u, l)? {
            Ordering::Less => true,
            Ordering::Equal => !(ku.is_inclusive() && kl.is_inclusive()),
            Ordering::Greater => false,
        }),
        _ => Ok(false),
    }
}

/// True when `upper` and `lower` meet at the same value with at least one
/// side including it, so the two ranges can be joined without a hole.
fn touches(upper: &Bound, lower: &Bound, cmp: &dyn DatumComparator) -> ConstraintResult<bool> {
    match (upper, lower) {
        (Bound::Value(u, ku), Bound::Value(l, kl)) => {
            Ok((ku.is_inclusive() || kl.is_inclusive()) && cmp.equals(u, l)?)
        }
        _ => Ok(false),
    }
}

/// A contiguous interval `left .. right`.
///
/// Invariant: when both edges carry values, `left <= right` under the
/// comparator, and a range with `left == right` is a closed point. Ranges are
/// immutable; every operation returns new ranges.
///
/// The derived `PartialEq` is structural over datums; use [`Range::equals`]
/// for comparator-aware equality.
#[derive(Debug, Clone, PartialEq)]
pub struct Range {
    left: Bound,
    right: Bound,
}

impl Range {
    /// Build a range without validating the edges. The caller guarantees the
    /// range is non-empty.
    pub fn new(left: Bound, right: Bound) -> Self {
        Self { left, right }
    }

    /// Build a range, or `None` when the edges describe an empty interval.
    pub fn checked(
        left: Bound,
        right: Bound,
        cmp: &dyn DatumComparator,
    ) -> ConstraintResult<Option<Self>> {
        if separated(&right, &left, cmp)? {
            Ok(None)
        } else {
            Ok(Some(Self { left, right }))
        }
    }

    /// The whole domain (NULL excluded; NULL is tracked by the interval).
    pub fn full() -> Self {
        Self::new(Bound::Unbounded, Bound::Unbounded)
    }

    /// `[d, d]`
    pub fn point(d: Datum) -> Self {
        Self::new(Bound::inclusive(d.clone()), Bound::inclusive(d))
    }

    /// `(-inf, d)`
    pub fn less_than(d: Datum) -> Self {
        Self::new(Bound::Unbounded, Bound::exclusive(d))
    }

    /// `(-inf, d]`
    pub fn at_most(d: Datum) -> Self {
        Self::new(Bound::Unbounded, Bound::inclusive(d))
    }

    /// `(d, +inf)`
    pub fn greater_than(d: Datum) -> Self {
        Self::new(Bound::exclusive(d), Bound::Unbounded)
    }

    /// `[d, +inf)`
    pub fn at_least(d: Datum) -> Self {
        Self::new(Bound::inclusive(d), Bound::Unbounded)
    }

    pub fn left(&self) -> &Bound {
        &self.left
    }

    pub fn right(&self) -> &Bound {
        &self.right
    }

    /// Both edges unbounded.
    pub fn is_full(&self) -> bool {
        self.left.is_unbounded() && self.right.is_unbounded()
    }

    /// A single closed point `[d, d]`.
    pub fn is_point(&self, cmp: &dyn DatumComparator) -> ConstraintResult<bool> {
        match (&self.left, &self.right) {
            (Bound::Value(l, BoundKind::Inclusive), Bound::Value(r, BoundKind::Inclusive)) => {
                cmp.equals(l, r)
            }
            _ => Ok(false),
        }
    }

    /// Order by lower bound, then upper bound.
    pub fn order(&self, other: &Range, cmp: &dyn DatumComparator) -> ConstraintResult<Ordering> {
        match cmp_lower(&self.left, &other.left, cmp)? {
            Ordering::Equal => cmp_upper(&self.right, &other.right, cmp),
            ord => Ok(ord),
        }
    }

    pub fn equals(&self, other: &Range, cmp: &dyn DatumComparator) -> ConstraintResult<bool> {
        Ok(self.order(other, cmp)? == Ordering::Equal)
    }

    /// True when every point of `other` lies in `self`.
    pub fn contains(&self, other: &Range, cmp: &dyn DatumComparator) -> ConstraintResult<bool> {
        Ok(cmp_lower(&self.left, &other.left, cmp)? != Ordering::Greater
            && cmp_upper(&self.right, &other.right, cmp)? != Ordering::Less)
    }

    pub fn overlaps(&self, other: &Range, cmp: &dyn DatumComparator) -> ConstraintResult<bool> {
        Ok(!separated(&self.right, &other.left, cmp)?
            && !separated(&other.right, &self.left, cmp)?)
    }

    /// True when the two ranges overlap or meet at a shared value that at
    /// least one of them includes, i.e. their union is a single range.
    pub fn overlaps_or_adjacent(
        &self,
        other: &Range,
        cmp: &dyn DatumComparator,
    ) -> ConstraintResult<bool> {
        Ok(self.overlaps(other, cmp)?
            || touches(&self.right, &other.left, cmp)?
            || touches(&other.right, &self.left, cmp)?)
    }

    /// True when `self` lies entirely below `other` with no shared point.
    pub fn ends_before(&self, other: &Range, cmp: &dyn DatumComparator) -> ConstraintResult<bool> {
        separated(&self.right, &other.left, cmp)
    }

    /// Join two overlapping or adjacent ranges, keeping the more permissive
    /// edge on each side.
    pub fn merge(&self, other: &Range, cmp: &dyn DatumComparator) -> ConstraintResult<Range> {
        let left = match cmp_lower(&self.left, &other.left, cmp)? {
            Ordering::Greater => other.left.clone(),
            _ => self.left.clone(),
        };
        let right = match cmp_upper(&self.right, &other.right, cmp)? {
            Ordering::Less => other.right.clone(),
            _ => self.right.clone(),
        };
        Ok(Range::new(left, right))
    }

    /// The common part of two ranges, if any.
    pub fn intersect(&self, other: &Range, cmp: &dyn DatumComparator) -> ConstraintResult<Option<Range>> {
        let left = match cmp_lower(&self.left, &other.left, cmp)? {
            Ordering::Less => other.left.clone(),
            _ => self.left.clone(),
        };
        let right = match cmp_upper(&self.right, &other.right, cmp)? {
            Ordering::Greater => other.right.clone(),
            _ => self.right.clone(),
        };
        Range::checked(left, right, cmp)
    }

    /// The parts of the domain outside this range: zero, one or two ranges.
    pub fn complement(&self) -> Vec<Range> {
        let mut out = Vec::with_capacity(2);
        if !self.left.is_unbounded() {
            out.push(Range::new(Bound::Unbounded, self.left.flipped()));
        }
        if !self.right.is_unbounded() {
            out.push(Range::new(self.right.flipped(), Bound::Unbounded));
        }
        out
    }

    /// Render as bound comparisons on `column`. A point renders as `col = d`;
    /// the full range has no bound to render and yields `None`.
    pub fn to_scalar_expr(
        &self,
        column: &ColumnRef,
        cmp: &dyn DatumComparator,
    ) -> ConstraintResult<Option<ScalarExpr>> {
        if self.is_point(cmp)? {
            if let Some(d) = self.left.datum() {
                return Ok(Some(col(column).eq(lit(d.clone()))));
            }
        }
        let mut parts = Vec::with_capacity(2);
        match &self.left {
            Bound::Unbounded => {}
            Bound::Value(d, BoundKind::Inclusive) => parts.push(col(column).gte(lit(d.clone()))),
            Bound::Value(d, BoundKind::Exclusive) => parts.push(col(column).gt(lit(d.clone()))),
        }
        match &self.right {
            Bound::Unbounded => {}
            Bound::Value(d, BoundKind::Inclusive) => parts.push(col(column).lte(lit(d.clone()))),
            Bound::Value(d, BoundKind::Exclusive) => parts.push(col(column).lt(lit(d.clone()))),
        }
        Ok(match parts.len() {
            0 => None,
            _ => Some(crate::expr::and(parts)),
        })
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.left {
            Bound::Unbounded => write!(f, "(-inf")?,
            Bound::Value(d, BoundKind::Inclusive) => write!(f, "[{}", d)?,
            Bound::Value(d, BoundKind::Exclusive) => write!(f, "({}", d)?,
        }
        write!(f, ", ")?;
        match &self.right {
            Bound::Unbounded => write!(f, "+inf)"),
            Bound::Value(d, BoundKind::Inclusive) => write!(f, "{}]", d),
            Bound::Value(d, BoundKind::Exclusive) => write!(f, "{})", d),
        }
    }
}
