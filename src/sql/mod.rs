//! SQL frontend.
//!
//! - [`parse`] - predicate text to [`ScalarExpr`](crate::expr::ScalarExpr)
//!
//! Rendering goes the other way through the `Display` impl on
//! `ScalarExpr`, whose output this parser reads back.

pub mod parse;

pub use parse::{parse_predicate, ColumnRegistry, ParseError, ParseResult};
