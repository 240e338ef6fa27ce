//! # Mantis Constraints
//!
//! Predicate analysis for a query optimizer: derive per-column value ranges
//! from filter predicates, combine them with set algebra, and render them
//! back as predicates.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │            SQL predicate text / ScalarExpr               │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [sql::parse_predicate]
//! ┌─────────────────────────────────────────────────────────┐
//! │                  ScalarExpr tree                         │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [Constraint::from_scalar_expr]
//! ┌─────────────────────────────────────────────────────────┐
//! │   Constraint (Interval / Conjunction / Disjunction /     │
//! │   Negation) + column equivalence classes                 │
//! │        ▲                                                 │
//! │        └── DatumComparator ◄── ConstExprEvaluator        │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [to_scalar_expr]
//! ┌─────────────────────────────────────────────────────────┐
//! │              Simplified predicate                        │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use mantis_constraints::prelude::*;
//!
//! let settings = Settings::default();
//! let comparator = DefaultComparator::new(&BuiltinEvaluator, &BuiltinTypes, settings.comparator);
//! let ctx = DeriveContext::new(&comparator, settings.derive);
//!
//! let mut columns = ColumnRegistry::new();
//! let expr = parse_predicate("a > 1 AND a < 10 AND a <> 5", &mut columns).unwrap();
//! let derived = Constraint::from_scalar_expr(&expr, &ctx).unwrap();
//! let constraint = derived.constraint.unwrap();
//! assert_eq!(constraint.to_string(), "a: {(1, 5), (5, 10)}");
//! ```

pub mod compare;
pub mod config;
pub mod constraint;
pub mod datum;
pub mod error;
pub mod eval;
pub mod expr;
pub mod sql;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::compare::{DatumComparator, DefaultComparator};
    pub use crate::config::{ComparatorSettings, DeriveSettings, RenderSettings, Settings};
    pub use crate::constraint::{
        Bound, BoundKind, Constraint, ConstraintInterval, DeriveContext, DerivedConstraint, Range,
    };
    pub use crate::datum::{BuiltinTypes, Datum, TypeCatalog, TypeId};
    pub use crate::error::{ConstraintError, ConstraintResult};
    pub use crate::eval::{BuiltinEvaluator, ConstExprEvaluator};
    pub use crate::expr::{
        // Constructors
        and,
        array_cmp,
        cmp,
        col,
        func,
        is_not_null,
        is_null,
        lit,
        lit_bool,
        lit_null,
        not,
        or,
        // Types
        ArrayQuantifier,
        CmpKind,
        ColumnRef,
        ColumnSet,
        PredicateExt,
        ScalarExpr,
    };
    pub use crate::sql::{parse_predicate, ColumnRegistry};
}

// Also export at crate root for convenience
pub use constraint::{Constraint, ConstraintInterval};
pub use error::{ConstraintError, ConstraintResult};
