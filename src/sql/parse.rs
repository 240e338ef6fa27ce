//! SQL predicate parser.
//!
//! Converts SQL predicate text into a [`ScalarExpr`] using sqlparser, so
//! constraints can be derived from (and checked against) plain SQL:
//!
//! ```text
//! a >= 1 AND a < 5 OR a IS NULL
//! b IN (1, 2, 3) AND c <> 'x'
//! ```
//!
//! `IN` lists become `= ANY`, `NOT IN` lists become `<> ALL`, `BETWEEN`
//! expands to a pair of bound comparisons.

use std::collections::HashMap;

use sqlparser::ast::{
    self as sql, BinaryOperator as SqlBinaryOp, Expr as SqlExpr, UnaryOperator as SqlUnaryOp,
    Value as SqlValue,
};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::{Parser, ParserError};
use sqlparser::tokenizer::Token;
use thiserror::Error;

use crate::datum::{Datum, TypeId};
use crate::expr::{
    and, array_cmp, cmp, col, func, is_not_null, is_null, not, or, ArrayQuantifier, CmpKind,
    ColumnRef, ScalarExpr,
};

/// Error type for predicate parsing.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("SQL syntax error: {0}")]
    Syntax(#[from] ParserError),

    #[error("Unexpected trailing input: {0}")]
    TrailingInput(String),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    #[error("Unsupported expression: {0}")]
    Unsupported(String),
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Maps column names to [`ColumnRef`]s.
///
/// An open registry assigns ids to new names as it meets them; a closed one
/// only accepts the names it was built with.
#[derive(Debug, Clone, Default)]
pub struct ColumnRegistry {
    columns: HashMap<String, ColumnRef>,
    order: Vec<ColumnRef>,
    closed: bool,
}

impl ColumnRegistry {
    /// An open registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A closed registry holding exactly `names`, ids in order from 1.
    pub fn with_columns<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut registry = Self::new();
        for name in names {
            registry.register(name);
        }
        registry.closed = true;
        registry
    }

    fn register(&mut self, name: &str) -> ColumnRef {
        let key = name.to_lowercase();
        if let Some(column) = self.columns.get(&key) {
            return column.clone();
        }
        let column = ColumnRef::new(self.order.len() as u32 + 1, &key);
        self.columns.insert(key, column.clone());
        self.order.push(column.clone());
        column
    }

    /// Look a column up by name (case-insensitive), registering it when the
    /// registry is open.
    pub fn resolve(&mut self, name: &str) -> ParseResult<ColumnRef> {
        match self.columns.get(&name.to_lowercase()) {
            Some(column) => Ok(column.clone()),
            None if self.closed => Err(ParseError::UnknownColumn(name.to_string())),
            None => Ok(self.register(name)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ColumnRef> {
        self.columns.get(&name.to_lowercase())
    }

    /// Registered columns in id order.
    pub fn columns(&self) -> &[ColumnRef] {
        &self.order
    }
}

/// Parse a SQL predicate, resolving column names through `columns`.
///
/// # Example
///
/// ```
/// use mantis_constraints::sql::{parse_predicate, ColumnRegistry};
///
/// let mut columns = ColumnRegistry::new();
/// let expr = parse_predicate("a > 5 AND a IS NOT NULL", &mut columns).unwrap();
/// assert_eq!(expr.to_string(), "a > 5 AND a IS NOT NULL");
/// ```
pub fn parse_predicate(text: &str, columns: &mut ColumnRegistry) -> ParseResult<ScalarExpr> {
    let dialect = GenericDialect {};
    let mut parser = Parser::new(&dialect).try_with_sql(text)?;
    let expr = parser.parse_expr()?;
    let next = parser.peek_token();
    if next.token != Token::EOF {
        return Err(ParseError::TrailingInput(next.token.to_string()));
    }
    convert_expr(&expr, columns)
}

/// Convert a sqlparser expression to a [`ScalarExpr`].
fn convert_expr(expr: &SqlExpr, columns: &mut ColumnRegistry) -> ParseResult<ScalarExpr> {
    match expr {
        SqlExpr::Identifier(ident) => Ok(col(&columns.resolve(&ident.value)?)),

        // qualified names resolve by their last part
        SqlExpr::CompoundIdentifier(idents) => match idents.last() {
            Some(ident) => Ok(col(&columns.resolve(&ident.value)?)),
            None => Err(ParseError::Unsupported(expr.to_string())),
        },

        SqlExpr::Value(value) => convert_value(value).map(ScalarExpr::Const),

        SqlExpr::Nested(inner) => convert_expr(inner, columns),

        SqlExpr::UnaryOp { op, expr: inner } => match op {
            SqlUnaryOp::Not => Ok(not(convert_expr(inner, columns)?)),
            SqlUnaryOp::Minus => match inner.as_ref() {
                SqlExpr::Value(SqlValue::Number(n, _)) => parse_number(&format!("-{}", n)).map(ScalarExpr::Const),
                _ => Err(ParseError::Unsupported(expr.to_string())),
            },
            SqlUnaryOp::Plus => convert_expr(inner, columns),
            _ => Err(ParseError::Unsupported(expr.to_string())),
        },

        SqlExpr::BinaryOp { left, op, right } => {
            let l = convert_expr(left, columns)?;
            let r = convert_expr(right, columns)?;
            match op {
                SqlBinaryOp::And => Ok(and(vec![l, r])),
                SqlBinaryOp::Or => Ok(or(vec![l, r])),
                other => Ok(cmp(l, convert_cmp_op(other, expr)?, r)),
            }
        }

        SqlExpr::IsNull(inner) => Ok(is_null(convert_expr(inner, columns)?)),
        SqlExpr::IsNotNull(inner) => Ok(is_not_null(convert_expr(inner, columns)?)),

        SqlExpr::IsDistinctFrom(l, r) => Ok(cmp(
            convert_expr(l, columns)?,
            CmpKind::IsDistinctFrom,
            convert_expr(r, columns)?,
        )),
        SqlExpr::IsNotDistinctFrom(l, r) => Ok(cmp(
            convert_expr(l, columns)?,
            CmpKind::IsNotDistinctFrom,
            convert_expr(r, columns)?,
        )),

        SqlExpr::InList {
            expr: inner,
            list,
            negated,
        } => {
            let left = convert_expr(inner, columns)?;
            let elements = list
                .iter()
                .map(|e| convert_expr(e, columns))
                .collect::<ParseResult<Vec<_>>>()?;
            Ok(if *negated {
                array_cmp(left, CmpKind::NotEq, ArrayQuantifier::All, elements)
            } else {
                array_cmp(left, CmpKind::Eq, ArrayQuantifier::Any, elements)
            })
        }

        SqlExpr::AnyOp {
            left,
            compare_op,
            right,
            ..
        } => convert_quantified(left, compare_op, right, ArrayQuantifier::Any, expr, columns),
        SqlExpr::AllOp {
            left,
            compare_op,
            right,
        } => convert_quantified(left, compare_op, right, ArrayQuantifier::All, expr, columns),

        // BETWEEN is expr >= low AND expr <= high
        SqlExpr::Between {
            expr: inner,
            negated,
            low,
            high,
        } => {
            let value = convert_expr(inner, columns)?;
            let bounds = and(vec![
                cmp(value.clone(), CmpKind::GtEq, convert_expr(low, columns)?),
                cmp(value, CmpKind::LtEq, convert_expr(high, columns)?),
            ]);
            Ok(if *negated { not(bounds) } else { bounds })
        }

        // opaque to derivation, kept so its columns stay visible
        SqlExpr::Function(f) => {
            let mut args = Vec::new();
            if let sql::FunctionArguments::List(list) = &f.args {
                for arg in &list.args {
                    if let sql::FunctionArg::Unnamed(sql::FunctionArgExpr::Expr(e)) = arg {
                        args.push(convert_expr(e, columns)?);
                    }
                }
            }
            Ok(func(&f.name.to_string().to_lowercase(), args))
        }

        _ => Err(ParseError::Unsupported(expr.to_string())),
    }
}

fn convert_quantified(
    left: &SqlExpr,
    op: &SqlBinaryOp,
    right: &SqlExpr,
    quantifier: ArrayQuantifier,
    whole: &SqlExpr,
    columns: &mut ColumnRegistry,
) -> ParseResult<ScalarExpr> {
    let elements = match right {
        SqlExpr::Array(array) => &array.elem,
        SqlExpr::Nested(inner) => match inner.as_ref() {
            SqlExpr::Array(array) => &array.elem,
            _ => return Err(ParseError::Unsupported(whole.to_string())),
        },
        _ => return Err(ParseError::Unsupported(whole.to_string())),
    };
    let left = convert_expr(left, columns)?;
    let op = convert_cmp_op(op, whole)?;
    let elements = elements
        .iter()
        .map(|e| convert_expr(e, columns))
        .collect::<ParseResult<Vec<_>>>()?;
    Ok(array_cmp(left, op, quantifier, elements))
}

fn convert_cmp_op(op: &SqlBinaryOp, whole: &SqlExpr) -> ParseResult<CmpKind> {
    match op {
        SqlBinaryOp::Eq => Ok(CmpKind::Eq),
        SqlBinaryOp::NotEq => Ok(CmpKind::NotEq),
        SqlBinaryOp::Lt => Ok(CmpKind::Lt),
        SqlBinaryOp::LtEq => Ok(CmpKind::LtEq),
        SqlBinaryOp::Gt => Ok(CmpKind::Gt),
        SqlBinaryOp::GtEq => Ok(CmpKind::GtEq),
        _ => Err(ParseError::Unsupported(whole.to_string())),
    }
}

/// Convert a SQL literal to a datum.
fn convert_value(value: &SqlValue) -> ParseResult<Datum> {
    match value {
        SqlValue::Number(n, _) => parse_number(n),
        SqlValue::SingleQuotedString(s) => Ok(Datum::text(s)),
        SqlValue::Boolean(b) => Ok(Datum::bool(*b)),
        // an untyped NULL; comparisons with it never hold
        SqlValue::Null => Ok(Datum::null(TypeId::INT4)),
        _ => Err(ParseError::Unsupported(value.to_string())),
    }
}

/// Integers become int4 when they fit and int8 otherwise; anything with a
/// fraction or exponent is float8.
fn parse_number(n: &str) -> ParseResult<Datum> {
    if let Ok(i) = n.parse::<i64>() {
        return Ok(match i32::try_from(i) {
            Ok(small) => Datum::int4(small),
            Err(_) => Datum::int8(i),
        });
    }
    match n.parse::<f64>() {
        Ok(f) => Ok(Datum::float8(f)),
        Err(_) => Err(ParseError::InvalidNumber(n.to_string())),
    }
}
