//! Constraints over several columns: conjunction, disjunction, negation.
//!
//! A [`Constraint`] is a tree whose leaves are per-column intervals. Nodes
//! are reference counted and never mutated, so sub-trees are shared freely
//! between derivations. NULL follows the interval model: a negation is the
//! complement of its child, NULL flag included.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use super::interval::ConstraintInterval;
use crate::compare::DatumComparator;
use crate::config::RenderSettings;
use crate::error::{ConstraintError, ConstraintResult};
use crate::expr::{self, ColumnRef, ColumnSet, ScalarExpr};

// =============================================================================
// Constraint
// =============================================================================

/// A derived restriction on the values of one or more columns.
#[derive(Debug, Clone)]
pub enum Constraint {
    Interval(Arc<ConstraintInterval>),
    Conjunction(Arc<Conjunction>),
    Disjunction(Arc<Disjunction>),
    Negation(Arc<Negation>),
}

/// All children hold.
#[derive(Debug)]
pub struct Conjunction {
    children: Vec<Constraint>,
    columns: ColumnSet,
}

/// At least one child holds.
#[derive(Debug)]
pub struct Disjunction {
    children: Vec<Constraint>,
    columns: ColumnSet,
}

/// The child does not hold.
#[derive(Debug)]
pub struct Negation {
    child: Constraint,
}

fn union_columns(children: &[Constraint]) -> ColumnSet {
    let mut columns = ColumnSet::new();
    for child in children {
        columns.extend_from(&child.columns());
    }
    columns
}

impl Conjunction {
    /// Nested conjunctions are flattened into this one.
    pub fn new(children: Vec<Constraint>) -> ConstraintResult<Self> {
        if children.is_empty() {
            return Err(ConstraintError::MalformedExpression(
                "conjunction needs at least one child".to_string(),
            ));
        }
        let mut flat = Vec::with_capacity(children.len());
        for child in children {
            match child {
                Constraint::Conjunction(inner) => flat.extend(inner.children.iter().cloned()),
                other => flat.push(other),
            }
        }
        Ok(Self::build(flat))
    }

    fn build(children: Vec<Constraint>) -> Self {
        let columns = union_columns(&children);
        Self { children, columns }
    }

    pub fn children(&self) -> &[Constraint] {
        &self.children
    }

    pub fn columns(&self) -> &ColumnSet {
        &self.columns
    }
}

impl Disjunction {
    /// Nested disjunctions are flattened into this one.
    pub fn new(children: Vec<Constraint>) -> ConstraintResult<Self> {
        if children.is_empty() {
            return Err(ConstraintError::MalformedExpression(
                "disjunction needs at least one child".to_string(),
            ));
        }
        let mut flat = Vec::with_capacity(children.len());
        for child in children {
            match child {
                Constraint::Disjunction(inner) => flat.extend(inner.children.iter().cloned()),
                other => flat.push(other),
            }
        }
        Ok(Self::build(flat))
    }

    fn build(children: Vec<Constraint>) -> Self {
        let columns = union_columns(&children);
        Self { children, columns }
    }

    pub fn children(&self) -> &[Constraint] {
        &self.children
    }

    pub fn columns(&self) -> &ColumnSet {
        &self.columns
    }
}

impl Negation {
    pub fn new(child: Constraint) -> Self {
        Self { child }
    }

    pub fn child(&self) -> &Constraint {
        &self.child
    }
}

impl From<ConstraintInterval> for Constraint {
    fn from(interval: ConstraintInterval) -> Self {
        Constraint::Interval(Arc::new(interval))
    }
}

impl Constraint {
    pub fn interval(interval: ConstraintInterval) -> Self {
        interval.into()
    }

    /// A conjunction of `children`; a single child is returned as is.
    pub fn conjunction(mut children: Vec<Constraint>) -> ConstraintResult<Self> {
        if children.len() == 1 {
            return Ok(children.remove(0));
        }
        Ok(Constraint::Conjunction(Arc::new(Conjunction::new(children)?)))
    }

    /// A disjunction of `children`; a single child is returned as is.
    pub fn disjunction(mut children: Vec<Constraint>) -> ConstraintResult<Self> {
        if children.len() == 1 {
            return Ok(children.remove(0));
        }
        Ok(Constraint::Disjunction(Arc::new(Disjunction::new(children)?)))
    }

    pub fn negation(child: Constraint) -> Self {
        Constraint::Negation(Arc::new(Negation::new(child)))
    }

    pub fn as_interval(&self) -> Option<&ConstraintInterval> {
        match self {
            Constraint::Interval(ci) => Some(ci),
            _ => None,
        }
    }

    /// Columns referenced anywhere in the constraint.
    pub fn columns(&self) -> ColumnSet {
        match self {
            Constraint::Interval(ci) => std::iter::once(ci.column().clone()).collect(),
            Constraint::Conjunction(c) => c.columns.clone(),
            Constraint::Disjunction(d) => d.columns.clone(),
            Constraint::Negation(n) => n.child.columns(),
        }
    }

    /// True when no row can satisfy the constraint.
    ///
    /// Conservative: `false` means "not proven empty".
    pub fn is_contradiction(&self, cmp: &dyn DatumComparator) -> ConstraintResult<bool> {
        match self {
            Constraint::Interval(ci) => Ok(ci.is_empty()),
            Constraint::Conjunction(c) => {
                for child in &c.children {
                    if child.is_contradiction(cmp)? {
                        return Ok(true);
                    }
                }
                for column in c.columns.iter() {
                    if let Some(ci) = self.interval_for_column(column, cmp)? {
                        if ci.is_empty() {
                            debug!(column = %column, constraint = %self, "contradiction");
                            return Ok(true);
                        }
                    }
                }
                Ok(false)
            }
            Constraint::Disjunction(d) => {
                for child in &d.children {
                    if !child.is_contradiction(cmp)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Constraint::Negation(_) => self.expand(cmp)?.is_contradiction(cmp),
        }
    }

    /// The constraint that holds exactly where this one does not.
    ///
    /// Pushes the negation down to the intervals (De Morgan), so the result
    /// contains no [`Negation`] node.
    pub fn negate(&self, cmp: &dyn DatumComparator) -> ConstraintResult<Constraint> {
        match self {
            Constraint::Interval(ci) => Ok(Constraint::interval(ci.complement(cmp)?)),
            Constraint::Conjunction(c) => {
                let children = c
                    .children
                    .iter()
                    .map(|child| child.negate(cmp))
                    .collect::<ConstraintResult<Vec<_>>>()?;
                Constraint::disjunction(children)
            }
            Constraint::Disjunction(d) => {
                let children = d
                    .children
                    .iter()
                    .map(|child| child.negate(cmp))
                    .collect::<ConstraintResult<Vec<_>>>()?;
                Constraint::conjunction(children)
            }
            Constraint::Negation(n) => n.child.expand(cmp),
        }
    }

    /// An equivalent constraint without negation nodes.
    fn expand(&self, cmp: &dyn DatumComparator) -> ConstraintResult<Constraint> {
        match self {
            Constraint::Interval(_) => Ok(self.clone()),
            Constraint::Conjunction(c) => {
                let children = c
                    .children
                    .iter()
                    .map(|child| child.expand(cmp))
                    .collect::<ConstraintResult<Vec<_>>>()?;
                Constraint::conjunction(children)
            }
            Constraint::Disjunction(d) => {
                let children = d
                    .children
                    .iter()
                    .map(|child| child.expand(cmp))
                    .collect::<ConstraintResult<Vec<_>>>()?;
                Constraint::disjunction(children)
            }
            Constraint::Negation(n) => n.child.negate(cmp),
        }
    }

    /// The values `column` may take wherever this constraint holds, or `None`
    /// when the constraint does not restrict it.
    pub fn interval_for_column(
        &self,
        column: &ColumnRef,
        cmp: &dyn DatumComparator,
    ) -> ConstraintResult<Option<ConstraintInterval>> {
        match self {
            Constraint::Interval(ci) if ci.column() == column => Ok(Some(ConstraintInterval::clone(ci))),
            Constraint::Interval(_) => Ok(None),
            Constraint::Conjunction(c) => {
                let mut acc: Option<ConstraintInterval> = None;
                for child in &c.children {
                    if let Some(ci) = child.interval_for_column(column, cmp)? {
                        acc = Some(match acc {
                            None => ci,
                            Some(prev) => prev.intersect(&ci, cmp)?,
                        });
                    }
                }
                Ok(acc)
            }
            Constraint::Disjunction(d) => {
                let mut acc: Option<ConstraintInterval> = None;
                for child in &d.children {
                    // an unrestricted branch leaves the column unrestricted
                    let Some(ci) = child.interval_for_column(column, cmp)? else {
                        return Ok(None);
                    };
                    acc = Some(match acc {
                        None => ci,
                        Some(prev) => prev.union(&ci, cmp)?,
                    });
                }
                Ok(acc)
            }
            Constraint::Negation(_) => self.expand(cmp)?.interval_for_column(column, cmp),
        }
    }

    /// True when every row satisfying `other` satisfies `self`.
    ///
    /// Conservative: `false` means "not proven".
    pub fn contains(&self, other: &Constraint, cmp: &dyn DatumComparator) -> ConstraintResult<bool> {
        let s = self.expand(cmp)?;
        let o = other.expand(cmp)?;
        let result = contains_expanded(&s, &o, cmp)?;
        trace!(container = %self, contained = %other, result, "constraint.contains");
        Ok(result)
    }

    /// Mutual containment.
    pub fn equals(&self, other: &Constraint, cmp: &dyn DatumComparator) -> ConstraintResult<bool> {
        Ok(self.contains(other, cmp)? && other.contains(self, cmp)?)
    }

    /// The same constraint with columns renamed through `mapping`. Columns
    /// missing from the mapping are kept.
    pub fn remap_columns(&self, mapping: &HashMap<ColumnRef, ColumnRef>) -> Constraint {
        match self {
            Constraint::Interval(ci) => match mapping.get(ci.column()) {
                Some(target) => Constraint::interval(ci.with_column(target.clone())),
                None => self.clone(),
            },
            Constraint::Conjunction(c) => Constraint::Conjunction(Arc::new(Conjunction::build(
                c.children.iter().map(|child| child.remap_columns(mapping)).collect(),
            ))),
            Constraint::Disjunction(d) => Constraint::Disjunction(Arc::new(Disjunction::build(
                d.children.iter().map(|child| child.remap_columns(mapping)).collect(),
            ))),
            Constraint::Negation(n) => Constraint::negation(n.child.remap_columns(mapping)),
        }
    }

    /// Render the constraint as a predicate.
    pub fn to_scalar_expr(
        &self,
        settings: &RenderSettings,
        cmp: &dyn DatumComparator,
    ) -> ConstraintResult<ScalarExpr> {
        match self {
            Constraint::Interval(ci) => ci.to_scalar_expr(settings, cmp),
            Constraint::Conjunction(c) => Ok(expr::and(
                c.children
                    .iter()
                    .map(|child| child.to_scalar_expr(settings, cmp))
                    .collect::<ConstraintResult<Vec<_>>>()?,
            )),
            Constraint::Disjunction(d) => Ok(expr::or(
                d.children
                    .iter()
                    .map(|child| child.to_scalar_expr(settings, cmp))
                    .collect::<ConstraintResult<Vec<_>>>()?,
            )),
            Constraint::Negation(n) => Ok(expr::not(n.child.to_scalar_expr(settings, cmp)?)),
        }
    }

    /// Copy what is known about one column of each equivalence class to the
    /// other members. `a = b AND a > 5` also restricts `b > 5`.
    pub fn infer_from_equivalences(
        &self,
        classes: &[ColumnSet],
        cmp: &dyn DatumComparator,
    ) -> ConstraintResult<Constraint> {
        let mut inferred = Vec::new();
        for class in classes {
            let Some(anchor) = class.iter().next() else {
                continue;
            };
            let mut shared: Option<ConstraintInterval> = None;
            for column in class {
                if let Some(ci) = self.interval_for_column(column, cmp)? {
                    let ci = ci.with_column(anchor.clone());
                    shared = Some(match shared {
                        None => ci,
                        Some(prev) => prev.intersect(&ci, cmp)?,
                    });
                }
            }
            if let Some(shared) = shared {
                for column in class {
                    inferred.push(Constraint::interval(shared.with_column(column.clone())));
                }
            }
        }
        if inferred.is_empty() {
            return Ok(self.clone());
        }
        let mut children = vec![self.clone()];
        children.extend(inferred);
        let flat = Conjunction::new(children)?.children;
        Constraint::conjunction(merge_intervals(flat, Merge::Intersect, cmp)?)
    }
}

fn contains_expanded(s: &Constraint, o: &Constraint, cmp: &dyn DatumComparator) -> ConstraintResult<bool> {
    if o.is_contradiction(cmp)? {
        return Ok(true);
    }

    // a single-column, negation-free constraint is exactly its interval
    if let Some(column) = s.columns().single() {
        if let (Some(si), Some(oi)) = (
            s.interval_for_column(column, cmp)?,
            o.interval_for_column(column, cmp)?,
        ) {
            if si.contains(&oi, cmp)? {
                return Ok(true);
            }
        }
    }

    match (s, o) {
        (_, Constraint::Disjunction(d)) => {
            for child in &d.children {
                if !contains_expanded(s, child, cmp)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        (Constraint::Conjunction(c), _) => {
            for child in &c.children {
                if !contains_expanded(child, o, cmp)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        (Constraint::Disjunction(d), _) => {
            for child in &d.children {
                if contains_expanded(child, o, cmp)? {
                    return Ok(true);
                }
            }
            contains_some_conjunct(s, o, cmp)
        }
        (Constraint::Interval(_), _) => contains_some_conjunct(s, o, cmp),
        (Constraint::Negation(_), _) => Ok(false),
    }
}

/// `s` holds wherever one conjunct of `o` holds.
fn contains_some_conjunct(s: &Constraint, o: &Constraint, cmp: &dyn DatumComparator) -> ConstraintResult<bool> {
    if let Constraint::Conjunction(c) = o {
        for child in &c.children {
            if contains_expanded(s, child, cmp)? {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

/// How [`merge_intervals`] folds two intervals on the same column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Merge {
    Intersect,
    Union,
}

/// Fold interval children on the same column into one interval, keeping the
/// position of the first. Other children pass through in order.
pub(crate) fn merge_intervals(
    children: Vec<Constraint>,
    merge: Merge,
    cmp: &dyn DatumComparator,
) -> ConstraintResult<Vec<Constraint>> {
    let mut out: Vec<Constraint> = Vec::with_capacity(children.len());
    let mut slots: HashMap<ColumnRef, usize> = HashMap::new();
    for child in children {
        if let Constraint::Interval(ci) = &child {
            if let Some(&slot) = slots.get(ci.column()) {
                if let Constraint::Interval(prev) = &out[slot] {
                    let combined = match merge {
                        Merge::Intersect => prev.intersect(ci, cmp)?,
                        Merge::Union => prev.union(ci, cmp)?,
                    };
                    out[slot] = Constraint::interval(combined);
                }
                continue;
            }
            slots.insert(ci.column().clone(), out.len());
        }
        out.push(child);
    }
    Ok(out)
}

fn write_children(f: &mut fmt::Formatter<'_>, children: &[Constraint], sep: &str) -> fmt::Result {
    write!(f, "(")?;
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            write!(f, " {} ", sep)?;
        }
        write!(f, "{}", child)?;
    }
    write!(f, ")")
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Interval(ci) => write!(f, "{}", ci),
            Constraint::Conjunction(c) => write_children(f, &c.children, "AND"),
            Constraint::Disjunction(d) => write_children(f, &d.children, "OR"),
            Constraint::Negation(n) => write!(f, "NOT {}", n.child),
        }
    }
}
