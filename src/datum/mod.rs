//! Typed scalar values consumed by the constraint core.
//!
//! A [`Datum`] pairs a [`TypeId`] with a possibly-NULL [`Value`]. The core
//! never compares payloads directly; ordering always goes through a
//! [`DatumComparator`](crate::compare::DatumComparator), which consults a
//! [`TypeCatalog`] to decide whether a type can be constrained at all.

use std::fmt;

/// Type identifier assigned by the surrounding type system.
///
/// The associated constants follow the PostgreSQL OIDs for the built-in types
/// understood by [`BuiltinTypes`] and [`BuiltinEvaluator`](crate::eval::BuiltinEvaluator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

impl TypeId {
    pub const BOOL: TypeId = TypeId(16);
    pub const INT8: TypeId = TypeId(20);
    pub const INT2: TypeId = TypeId(21);
    pub const INT4: TypeId = TypeId(23);
    pub const TEXT: TypeId = TypeId(25);
    pub const FLOAT8: TypeId = TypeId(701);
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type#{}", self.0)
    }
}

/// Value payload of a datum.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// A typed, possibly-NULL scalar.
#[derive(Debug, Clone, PartialEq)]
pub struct Datum {
    type_id: TypeId,
    value: Value,
}

impl Datum {
    pub fn new(type_id: TypeId, value: Value) -> Self {
        Self { type_id, value }
    }

    pub fn null(type_id: TypeId) -> Self {
        Self::new(type_id, Value::Null)
    }

    pub fn bool(b: bool) -> Self {
        Self::new(TypeId::BOOL, Value::Bool(b))
    }

    pub fn int2(n: i16) -> Self {
        Self::new(TypeId::INT2, Value::Int(i64::from(n)))
    }

    pub fn int4(n: i32) -> Self {
        Self::new(TypeId::INT4, Value::Int(i64::from(n)))
    }

    pub fn int8(n: i64) -> Self {
        Self::new(TypeId::INT8, Value::Int(n))
    }

    pub fn float8(f: f64) -> Self {
        Self::new(TypeId::FLOAT8, Value::Float(f))
    }

    pub fn text(s: &str) -> Self {
        Self::new(TypeId::TEXT, Value::Text(s.into()))
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn is_null(&self) -> bool {
        matches!(self.value, Value::Null)
    }

    /// Native integer accessor used by the comparator fast path.
    pub fn as_i64(&self) -> Option<i64> {
        match self.value {
            Value::Int(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.value {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }
}

impl From<i64> for Datum {
    fn from(n: i64) -> Self {
        Datum::int8(n)
    }
}

impl From<i32> for Datum {
    fn from(n: i32) -> Self {
        Datum::int4(n)
    }
}

impl From<f64> for Datum {
    fn from(f: f64) -> Self {
        Datum::float8(f)
    }
}

impl From<bool> for Datum {
    fn from(b: bool) -> Self {
        Datum::bool(b)
    }
}

impl From<&str> for Datum {
    fn from(s: &str) -> Self {
        Datum::text(s)
    }
}

/// Renders the datum as a SQL literal.
impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Value::Null => write!(f, "NULL"),
            Value::Bool(true) => write!(f, "TRUE"),
            Value::Bool(false) => write!(f, "FALSE"),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) if x.fract() == 0.0 && x.is_finite() => write!(f, "{:.1}", x),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
        }
    }
}

/// Capability queries answered by the surrounding type system.
///
/// The constraint core never hard-codes a type list; it asks the catalog.
pub trait TypeCatalog {
    /// True when the type is a native fixed-width integer eligible for the
    /// comparator's numeric fast path.
    fn is_native_int(&self, type_id: TypeId) -> bool;

    /// True when the type has an order the constant evaluator can decide.
    fn is_orderable(&self, type_id: TypeId) -> bool;
}

/// Catalog for the built-in types in [`TypeId`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinTypes;

impl TypeCatalog for BuiltinTypes {
    fn is_native_int(&self, type_id: TypeId) -> bool {
        matches!(type_id, TypeId::INT2 | TypeId::INT4 | TypeId::INT8)
    }

    fn is_orderable(&self, type_id: TypeId) -> bool {
        matches!(
            type_id,
            TypeId::INT2 | TypeId::INT4 | TypeId::INT8 | TypeId::FLOAT8 | TypeId::TEXT | TypeId::BOOL
        )
    }
}
