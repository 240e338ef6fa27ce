//! Predicate expression tree.
//!
//! A closed sum type over the node kinds the constraint core pattern-matches
//! and constructs: column references, constants, comparisons, boolean
//! connectives, null tests and quantified array comparisons. Everything else
//! is carried as an opaque [`ScalarExpr::Function`] and never interpreted.

mod column;

pub use column::{ColumnRef, ColumnSet};

use std::fmt;

use crate::datum::{Datum, TypeId};

// =============================================================================
// Comparison kinds
// =============================================================================

/// Comparison operators, with their commute and NULL-handling table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmpKind {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    IsDistinctFrom,
    IsNotDistinctFrom,
}

impl CmpKind {
    /// The operator that gives the same answer with operands swapped.
    pub fn commute(self) -> Self {
        match self {
            CmpKind::Lt => CmpKind::Gt,
            CmpKind::LtEq => CmpKind::GtEq,
            CmpKind::Gt => CmpKind::Lt,
            CmpKind::GtEq => CmpKind::LtEq,
            other => other,
        }
    }

    /// True when a NULL operand yields a definite boolean instead of NULL.
    pub fn is_null_safe(self) -> bool {
        matches!(self, CmpKind::IsDistinctFrom | CmpKind::IsNotDistinctFrom)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            CmpKind::Eq => "=",
            CmpKind::NotEq => "<>",
            CmpKind::Lt => "<",
            CmpKind::LtEq => "<=",
            CmpKind::Gt => ">",
            CmpKind::GtEq => ">=",
            CmpKind::IsDistinctFrom => "IS DISTINCT FROM",
            CmpKind::IsNotDistinctFrom => "IS NOT DISTINCT FROM",
        }
    }
}

/// Quantifier of an array comparison: `op ANY (...)` or `op ALL (...)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArrayQuantifier {
    Any,
    All,
}

// =============================================================================
// Expression tree
// =============================================================================

/// A scalar (predicate) expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarExpr {
    /// Column reference
    Column(ColumnRef),

    /// Constant datum
    Const(Datum),

    /// Comparison: left op right
    Cmp {
        left: Box<ScalarExpr>,
        op: CmpKind,
        right: Box<ScalarExpr>,
    },

    /// Conjunction of any number of predicates
    And(Vec<ScalarExpr>),

    /// Disjunction of any number of predicates
    Or(Vec<ScalarExpr>),

    /// Logical negation
    Not(Box<ScalarExpr>),

    /// IS NULL / IS NOT NULL
    IsNull { expr: Box<ScalarExpr>, negated: bool },

    /// Quantified comparison against an array: left op ANY|ALL (elements...)
    ArrayCmp {
        left: Box<ScalarExpr>,
        op: CmpKind,
        quantifier: ArrayQuantifier,
        elements: Vec<ScalarExpr>,
    },

    /// Any other scalar; opaque to constraint derivation.
    Function { name: String, args: Vec<ScalarExpr> },
}

impl ScalarExpr {
    pub fn as_column(&self) -> Option<&ColumnRef> {
        match self {
            ScalarExpr::Column(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_const(&self) -> Option<&Datum> {
        match self {
            ScalarExpr::Const(d) => Some(d),
            _ => None,
        }
    }

    /// True for the boolean constant `value`.
    pub fn is_bool_const(&self, value: bool) -> bool {
        matches!(self, ScalarExpr::Const(d) if d.as_bool() == Some(value))
    }

    /// All columns referenced anywhere in the expression.
    pub fn columns(&self) -> ColumnSet {
        let mut set = ColumnSet::new();
        self.collect_columns(&mut set);
        set
    }

    fn collect_columns(&self, set: &mut ColumnSet) {
        match self {
            ScalarExpr::Column(c) => {
                set.insert(c.clone());
            }
            ScalarExpr::Const(_) => {}
            ScalarExpr::Cmp { left, right, .. } => {
                left.collect_columns(set);
                right.collect_columns(set);
            }
            ScalarExpr::And(args) | ScalarExpr::Or(args) => {
                for arg in args {
                    arg.collect_columns(set);
                }
            }
            ScalarExpr::Not(inner) | ScalarExpr::IsNull { expr: inner, .. } => {
                inner.collect_columns(set)
            }
            ScalarExpr::ArrayCmp { left, elements, .. } => {
                left.collect_columns(set);
                for e in elements {
                    e.collect_columns(set);
                }
            }
            ScalarExpr::Function { args, .. } => {
                for arg in args {
                    arg.collect_columns(set);
                }
            }
        }
    }
}

// =============================================================================
// Expression Constructors
// =============================================================================

/// Create a column reference.
pub fn col(column: &ColumnRef) -> ScalarExpr {
    ScalarExpr::Column(column.clone())
}

/// Create a constant.
pub fn lit(datum: impl Into<Datum>) -> ScalarExpr {
    ScalarExpr::Const(datum.into())
}

/// Create a typed NULL constant.
pub fn lit_null(type_id: TypeId) -> ScalarExpr {
    ScalarExpr::Const(Datum::null(type_id))
}

/// Create a boolean constant.
pub fn lit_bool(b: bool) -> ScalarExpr {
    ScalarExpr::Const(Datum::bool(b))
}

/// Create a comparison.
pub fn cmp(left: ScalarExpr, op: CmpKind, right: ScalarExpr) -> ScalarExpr {
    ScalarExpr::Cmp {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}

/// AND of the given predicates. Nested ANDs are flattened; a single predicate
/// is returned as-is and an empty list is `TRUE`.
pub fn and(args: Vec<ScalarExpr>) -> ScalarExpr {
    let mut flat = Vec::with_capacity(args.len());
    for arg in args {
        match arg {
            ScalarExpr::And(inner) => flat.extend(inner),
            other => flat.push(other),
        }
    }
    match flat.len() {
        0 => lit_bool(true),
        1 => flat.pop().unwrap_or_else(|| lit_bool(true)),
        _ => ScalarExpr::And(flat),
    }
}

/// OR of the given predicates. Nested ORs are flattened; a single predicate
/// is returned as-is and an empty list is `FALSE`.
pub fn or(args: Vec<ScalarExpr>) -> ScalarExpr {
    let mut flat = Vec::with_capacity(args.len());
    for arg in args {
        match arg {
            ScalarExpr::Or(inner) => flat.extend(inner),
            other => flat.push(other),
        }
    }
    match flat.len() {
        0 => lit_bool(false),
        1 => flat.pop().unwrap_or_else(|| lit_bool(false)),
        _ => ScalarExpr::Or(flat),
    }
}

/// NOT expr
pub fn not(expr: ScalarExpr) -> ScalarExpr {
    ScalarExpr::Not(Box::new(expr))
}

/// expr IS NULL
pub fn is_null(expr: ScalarExpr) -> ScalarExpr {
    ScalarExpr::IsNull {
        expr: Box::new(expr),
        negated: false,
    }
}

/// expr IS NOT NULL
pub fn is_not_null(expr: ScalarExpr) -> ScalarExpr {
    ScalarExpr::IsNull {
        expr: Box::new(expr),
        negated: true,
    }
}

/// left op ANY|ALL (elements...)
pub fn array_cmp(
    left: ScalarExpr,
    op: CmpKind,
    quantifier: ArrayQuantifier,
    elements: Vec<ScalarExpr>,
) -> ScalarExpr {
    ScalarExpr::ArrayCmp {
        left: Box::new(left),
        op,
        quantifier,
        elements,
    }
}

/// Opaque function call.
pub fn func(name: &str, args: Vec<ScalarExpr>) -> ScalarExpr {
    ScalarExpr::Function {
        name: name.into(),
        args,
    }
}

// =============================================================================
// Expression Builder Trait
// =============================================================================

/// Extension trait for building predicates fluently.
pub trait PredicateExt: Sized {
    fn into_expr(self) -> ScalarExpr;

    fn eq(self, other: impl Into<ScalarExpr>) -> ScalarExpr {
        cmp(self.into_expr(), CmpKind::Eq, other.into())
    }

    fn ne(self, other: impl Into<ScalarExpr>) -> ScalarExpr {
        cmp(self.into_expr(), CmpKind::NotEq, other.into())
    }

    fn lt(self, other: impl Into<ScalarExpr>) -> ScalarExpr {
        cmp(self.into_expr(), CmpKind::Lt, other.into())
    }

    fn lte(self, other: impl Into<ScalarExpr>) -> ScalarExpr {
        cmp(self.into_expr(), CmpKind::LtEq, other.into())
    }

    fn gt(self, other: impl Into<ScalarExpr>) -> ScalarExpr {
        cmp(self.into_expr(), CmpKind::Gt, other.into())
    }

    fn gte(self, other: impl Into<ScalarExpr>) -> ScalarExpr {
        cmp(self.into_expr(), CmpKind::GtEq, other.into())
    }

    fn is_distinct_from(self, other: impl Into<ScalarExpr>) -> ScalarExpr {
        cmp(self.into_expr(), CmpKind::IsDistinctFrom, other.into())
    }

    fn is_not_distinct_from(self, other: impl Into<ScalarExpr>) -> ScalarExpr {
        cmp(self.into_expr(), CmpKind::IsNotDistinctFrom, other.into())
    }

    fn and(self, other: impl Into<ScalarExpr>) -> ScalarExpr {
        and(vec![self.into_expr(), other.into()])
    }

    fn or(self, other: impl Into<ScalarExpr>) -> ScalarExpr {
        or(vec![self.into_expr(), other.into()])
    }

    fn not(self) -> ScalarExpr {
        not(self.into_expr())
    }

    fn is_null(self) -> ScalarExpr {
        is_null(self.into_expr())
    }

    fn is_not_null(self) -> ScalarExpr {
        is_not_null(self.into_expr())
    }

    /// expr = ANY (values...)
    fn in_list(self, values: Vec<ScalarExpr>) -> ScalarExpr {
        array_cmp(self.into_expr(), CmpKind::Eq, ArrayQuantifier::Any, values)
    }

    /// expr <> ALL (values...)
    fn not_in_list(self, values: Vec<ScalarExpr>) -> ScalarExpr {
        array_cmp(self.into_expr(), CmpKind::NotEq, ArrayQuantifier::All, values)
    }
}

impl PredicateExt for ScalarExpr {
    fn into_expr(self) -> ScalarExpr {
        self
    }
}

impl From<Datum> for ScalarExpr {
    fn from(d: Datum) -> Self {
        ScalarExpr::Const(d)
    }
}

impl From<ColumnRef> for ScalarExpr {
    fn from(c: ColumnRef) -> Self {
        ScalarExpr::Column(c)
    }
}

impl From<i64> for ScalarExpr {
    fn from(n: i64) -> Self {
        lit(n)
    }
}

impl From<i32> for ScalarExpr {
    fn from(n: i32) -> Self {
        lit(n)
    }
}

impl From<f64> for ScalarExpr {
    fn from(f: f64) -> Self {
        lit(f)
    }
}

impl From<&str> for ScalarExpr {
    fn from(s: &str) -> Self {
        lit(s)
    }
}

impl From<bool> for ScalarExpr {
    fn from(b: bool) -> Self {
        lit_bool(b)
    }
}

// =============================================================================
// SQL rendering
// =============================================================================

impl ScalarExpr {
    fn is_connective(&self) -> bool {
        matches!(self, ScalarExpr::And(_) | ScalarExpr::Or(_))
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[ScalarExpr]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

fn write_joined(f: &mut fmt::Formatter<'_>, args: &[ScalarExpr], sep: &str) -> fmt::Result {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            write!(f, " {} ", sep)?;
        }
        if arg.is_connective() {
            write!(f, "({})", arg)?;
        } else {
            write!(f, "{}", arg)?;
        }
    }
    Ok(())
}

/// Renders the expression as SQL text the [`sql`](crate::sql) frontend can
/// parse back. `= ANY` and `<> ALL` render as `IN` / `NOT IN` lists.
impl fmt::Display for ScalarExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarExpr::Column(c) => write!(f, "{}", c),
            ScalarExpr::Const(d) => write!(f, "{}", d),
            ScalarExpr::Cmp { left, op, right } => {
                write!(f, "{} {} {}", left, op.symbol(), right)
            }
            ScalarExpr::And(args) if args.is_empty() => write!(f, "TRUE"),
            ScalarExpr::And(args) => write_joined(f, args, "AND"),
            ScalarExpr::Or(args) if args.is_empty() => write!(f, "FALSE"),
            ScalarExpr::Or(args) => write_joined(f, args, "OR"),
            ScalarExpr::Not(inner) => match inner.as_ref() {
                ScalarExpr::Column(_) | ScalarExpr::Const(_) | ScalarExpr::Function { .. } => {
                    write!(f, "NOT {}", inner)
                }
                _ => write!(f, "NOT ({})", inner),
            },
            ScalarExpr::IsNull { expr, negated } => {
                write!(f, "{} IS {}NULL", expr, if *negated { "NOT " } else { "" })
            }
            ScalarExpr::ArrayCmp {
                left,
                op,
                quantifier,
                elements,
            } => match (op, quantifier) {
                // "x IN ()" is invalid SQL
                (CmpKind::Eq, ArrayQuantifier::Any) if elements.is_empty() => write!(f, "FALSE"),
                (CmpKind::NotEq, ArrayQuantifier::All) if elements.is_empty() => write!(f, "TRUE"),
                (CmpKind::Eq, ArrayQuantifier::Any) => {
                    write!(f, "{} IN (", left)?;
                    write_list(f, elements)?;
                    write!(f, ")")
                }
                (CmpKind::NotEq, ArrayQuantifier::All) => {
                    write!(f, "{} NOT IN (", left)?;
                    write_list(f, elements)?;
                    write!(f, ")")
                }
                (op, quantifier) => {
                    let q = match quantifier {
                        ArrayQuantifier::Any => "ANY",
                        ArrayQuantifier::All => "ALL",
                    };
                    write!(f, "{} {} {} (ARRAY[", left, op.symbol(), q)?;
                    write_list(f, elements)?;
                    write!(f, "])")
                }
            },
            ScalarExpr::Function { name, args } => {
                write!(f, "{}(", name)?;
                write_list(f, args)?;
                write!(f, ")")
            }
        }
    }
}
