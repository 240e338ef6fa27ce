//! Constraint derivation and range algebra.
//!
//! ```text
//! ScalarExpr ──► derive ──► Constraint ──────────► to_scalar_expr
//!                  │          ├─ Interval ◄── range algebra (Range, Bound)
//!                  │          ├─ Conjunction / Disjunction
//!                  │          └─ Negation
//!                  └──► equivalence classes (a = b)
//! ```
//!
//! All comparisons between datums go through a [`DatumComparator`], so the
//! algebra itself knows nothing about types.
//!
//! [`DatumComparator`]: crate::compare::DatumComparator

mod composite;
mod derive;
mod equivalence;
mod interval;
mod range;

pub use composite::{Conjunction, Constraint, Disjunction, Negation};
pub use derive::{DeriveContext, DerivedConstraint};
pub use equivalence::EquivalenceClasses;
pub use interval::ConstraintInterval;
pub use range::{Bound, BoundKind, Range};
