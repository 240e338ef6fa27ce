//! Per-column constraint intervals and their set algebra.
//!
//! A [`ConstraintInterval`] is the set of values one column may take: a
//! sorted list of disjoint, non-adjacent ranges plus a flag saying whether
//! NULL is allowed. Every constructor canonicalizes, so two intervals that
//! describe the same set have the same ranges.

use std::cmp::Ordering;
use std::fmt;

use tracing::{trace, warn};

use super::range::{cmp_upper, Bound, Range};
use crate::compare::DatumComparator;
use crate::config::RenderSettings;
use crate::datum::Datum;
use crate::error::{ConstraintError, ConstraintResult};
use crate::expr::{col, is_not_null, is_null, lit, lit_bool, or, ColumnRef, PredicateExt, ScalarExpr};

/// The admissible values of one column.
///
/// Invariants: `ranges` is sorted by lower bound, no two ranges overlap, and
/// no two neighbours share an endpoint that either of them includes.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintInterval {
    column: ColumnRef,
    ranges: Vec<Range>,
    includes_null: bool,
}

impl ConstraintInterval {
    /// Build an interval from arbitrary ranges, sorting and coalescing them.
    pub fn new(
        column: ColumnRef,
        ranges: Vec<Range>,
        includes_null: bool,
        cmp: &dyn DatumComparator,
    ) -> ConstraintResult<Self> {
        let sorted = sort_ranges(ranges, cmp)?;
        Ok(Self {
            column,
            ranges: coalesce(sorted, cmp)?,
            includes_null,
        })
    }

    /// Build from ranges the caller already knows to be canonical.
    pub(crate) fn from_canonical(column: ColumnRef, ranges: Vec<Range>, includes_null: bool) -> Self {
        Self {
            column,
            ranges,
            includes_null,
        }
    }

    /// Every value, NULL included.
    pub fn unbounded(column: ColumnRef) -> Self {
        Self::from_canonical(column, vec![Range::full()], true)
    }

    /// Every non-NULL value: `col IS NOT NULL`.
    pub fn not_null(column: ColumnRef) -> Self {
        Self::from_canonical(column, vec![Range::full()], false)
    }

    /// Only NULL: `col IS NULL`.
    pub fn null_only(column: ColumnRef) -> Self {
        Self::from_canonical(column, Vec::new(), true)
    }

    /// No value at all.
    pub fn empty(column: ColumnRef) -> Self {
        Self::from_canonical(column, Vec::new(), false)
    }

    /// A single range, NULL excluded.
    pub fn from_range(column: ColumnRef, range: Range) -> Self {
        Self::from_canonical(column, vec![range], false)
    }

    /// A set of points, deduplicated.
    pub fn from_points(
        column: ColumnRef,
        points: impl IntoIterator<Item = Datum>,
        includes_null: bool,
        cmp: &dyn DatumComparator,
    ) -> ConstraintResult<Self> {
        let ranges = points.into_iter().map(Range::point).collect();
        Self::new(column, ranges, includes_null, cmp)
    }

    pub fn column(&self) -> &ColumnRef {
        &self.column
    }

    pub fn ranges(&self) -> &[Range] {
        &self.ranges
    }

    pub fn includes_null(&self) -> bool {
        self.includes_null
    }

    /// The same value set on another column.
    pub fn with_column(&self, column: ColumnRef) -> Self {
        Self {
            column,
            ranges: self.ranges.clone(),
            includes_null: self.includes_null,
        }
    }

    pub fn with_includes_null(mut self, includes_null: bool) -> Self {
        self.includes_null = includes_null;
        self
    }

    /// No ranges and no NULL.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty() && !self.includes_null
    }

    /// The whole domain plus NULL.
    pub fn is_unbounded(&self) -> bool {
        self.includes_null && self.ranges.len() == 1 && self.ranges[0].is_full()
    }

    fn check_column(&self, other: &ConstraintInterval) -> ConstraintResult<()> {
        if self.column == other.column {
            return Ok(());
        }
        warn!(left = %self.column, right = %other.column, "interval column mismatch");
        Err(ConstraintError::ColumnMismatch {
            left: self.column.clone(),
            right: other.column.clone(),
        })
    }

    /// Values admitted by both intervals.
    pub fn intersect(
        &self,
        other: &ConstraintInterval,
        cmp: &dyn DatumComparator,
    ) -> ConstraintResult<Self> {
        self.check_column(other)?;
        let (a, b) = (&self.ranges, &other.ranges);
        let mut out = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            if let Some(r) = a[i].intersect(&b[j], cmp)? {
                out.push(r);
            }
            // advance whichever range ends first
            match cmp_upper(a[i].right(), b[j].right(), cmp)? {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    i += 1;
                    j += 1;
                }
            }
        }
        let result = Self {
            column: self.column.clone(),
            ranges: coalesce(out, cmp)?,
            includes_null: self.includes_null && other.includes_null,
        };
        trace!(left = %self, right = %other, result = %result, "interval.intersect");
        Ok(result)
    }

    /// Values admitted by either interval.
    pub fn union(&self, other: &ConstraintInterval, cmp: &dyn DatumComparator) -> ConstraintResult<Self> {
        self.check_column(other)?;
        let merged = merge_sorted(self.ranges.clone(), other.ranges.clone(), cmp)?;
        let result = Self {
            column: self.column.clone(),
            ranges: coalesce(merged, cmp)?,
            includes_null: self.includes_null || other.includes_null,
        };
        trace!(left = %self, right = %other, result = %result, "interval.union");
        Ok(result)
    }

    /// Values this interval rejects, NULL flag flipped.
    pub fn complement(&self, cmp: &dyn DatumComparator) -> ConstraintResult<Self> {
        let mut out = Vec::with_capacity(self.ranges.len() + 1);
        let mut lower = Bound::Unbounded;
        let mut open_tail = true;
        for r in &self.ranges {
            if let Bound::Value(d, kind) = r.left() {
                let upper = Bound::Value(d.clone(), kind.flip());
                if let Some(gap) = Range::checked(lower.clone(), upper, cmp)? {
                    out.push(gap);
                }
            }
            match r.right() {
                Bound::Unbounded => open_tail = false,
                Bound::Value(d, kind) => lower = Bound::Value(d.clone(), kind.flip()),
            }
        }
        if open_tail {
            out.push(Range::new(lower, Bound::Unbounded));
        }
        Ok(Self {
            column: self.column.clone(),
            ranges: out,
            includes_null: !self.includes_null,
        })
    }

    /// Values in `self` but not in `other`.
    pub fn difference(
        &self,
        other: &ConstraintInterval,
        cmp: &dyn DatumComparator,
    ) -> ConstraintResult<Self> {
        self.check_column(other)?;
        self.intersect(&other.complement(cmp)?, cmp)
    }

    /// True when every value `other` admits, `self` admits too.
    pub fn contains(&self, other: &ConstraintInterval, cmp: &dyn DatumComparator) -> ConstraintResult<bool> {
        self.check_column(other)?;
        if other.includes_null && !self.includes_null {
            return Ok(false);
        }
        let mut i = 0;
        for r in &other.ranges {
            while i < self.ranges.len()
                && cmp_upper(self.ranges[i].right(), r.right(), cmp)? == Ordering::Less
            {
                i += 1;
            }
            if i == self.ranges.len() || !self.ranges[i].contains(r, cmp)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Same column, same NULL flag, pairwise equal ranges.
    pub fn equals(&self, other: &ConstraintInterval, cmp: &dyn DatumComparator) -> ConstraintResult<bool> {
        if self.column != other.column
            || self.includes_null != other.includes_null
            || self.ranges.len() != other.ranges.len()
        {
            return Ok(false);
        }
        for (a, b) in self.ranges.iter().zip(&other.ranges) {
            if !a.equals(b, cmp)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// True when every range is a single point, so the interval is an
    /// `IN (...)` list. An interval without ranges is not a list.
    pub fn converts_to_in_list(&self, cmp: &dyn DatumComparator) -> ConstraintResult<bool> {
        if self.ranges.is_empty() {
            return Ok(false);
        }
        for r in &self.ranges {
            if !r.is_point(cmp)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// True when the complement is an `IN` list, renderable as
    /// `col NOT IN (...)`.
    pub fn converts_to_not_in_list(&self, cmp: &dyn DatumComparator) -> ConstraintResult<bool> {
        self.complement(cmp)?.converts_to_in_list(cmp)
    }

    fn points(&self) -> Vec<ScalarExpr> {
        self.ranges
            .iter()
            .filter_map(|r| r.left().datum().cloned())
            .map(lit)
            .collect()
    }

    /// Render the interval as a predicate on its column.
    ///
    /// The output parses back (through
    /// [`from_scalar_expr`](Self::from_scalar_expr)) to an equal interval.
    pub fn to_scalar_expr(
        &self,
        settings: &RenderSettings,
        cmp: &dyn DatumComparator,
    ) -> ConstraintResult<ScalarExpr> {
        if self.is_unbounded() {
            return Ok(lit_bool(true));
        }
        let column = col(&self.column);
        let mut disjuncts = Vec::new();

        // a lone point reads better as `col = v`
        if settings.array_predicates && self.ranges.len() > 1 && self.converts_to_in_list(cmp)? {
            disjuncts.push(column.clone().in_list(self.points()));
        } else {
            let excluded = self.complement(cmp)?;
            if excluded.ranges.len() == 1 && excluded.ranges[0].is_point(cmp)? {
                disjuncts.push(column.clone().ne(excluded.points().remove(0)));
            } else if settings.array_predicates && excluded.converts_to_in_list(cmp)? {
                disjuncts.push(column.clone().not_in_list(excluded.points()));
            } else {
                for r in &self.ranges {
                    match r.to_scalar_expr(&self.column, cmp)? {
                        Some(e) => disjuncts.push(e),
                        None => disjuncts.push(is_not_null(column.clone())),
                    }
                }
            }
        }

        if self.includes_null {
            disjuncts.push(is_null(column));
        }
        Ok(or(disjuncts))
    }
}

impl fmt::Display for ConstraintInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {{", self.column)?;
        for (i, r) in self.ranges.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", r)?;
        }
        if self.includes_null {
            if !self.ranges.is_empty() {
                write!(f, ", ")?;
            }
            write!(f, "NULL")?;
        }
        write!(f, "}}")
    }
}

/// Merge sort that propagates comparator failures.
fn sort_ranges(mut ranges: Vec<Range>, cmp: &dyn DatumComparator) -> ConstraintResult<Vec<Range>> {
    if ranges.len() <= 1 {
        return Ok(ranges);
    }
    let tail = ranges.split_off(ranges.len() / 2);
    let head = sort_ranges(ranges, cmp)?;
    let tail = sort_ranges(tail, cmp)?;
    merge_sorted(head, tail, cmp)
}

fn merge_sorted(a: Vec<Range>, b: Vec<Range>, cmp: &dyn DatumComparator) -> ConstraintResult<Vec<Range>> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let mut a = a.into_iter().peekable();
    let mut b = b.into_iter().peekable();
    loop {
        let take_a = match (a.peek(), b.peek()) {
            (Some(x), Some(y)) => x.order(y, cmp)? != Ordering::Greater,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };
        let next = if take_a { a.next() } else { b.next() };
        out.extend(next);
    }
    Ok(out)
}

/// Fold overlapping or adjacent neighbours of a sorted list together.
fn coalesce(sorted: Vec<Range>, cmp: &dyn DatumComparator) -> ConstraintResult<Vec<Range>> {
    let mut out: Vec<Range> = Vec::with_capacity(sorted.len());
    for r in sorted {
        if let Some(last) = out.last_mut() {
            if last.overlaps_or_adjacent(&r, cmp)? {
                let merged = last.merge(&r, cmp)?;
                trace!(left = %last, right = %r, merged = %merged, "range merge");
                *last = merged;
                continue;
            }
        }
        out.push(r);
    }
    Ok(out)
}
