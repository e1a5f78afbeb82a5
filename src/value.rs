//! Scalar value and data type model.
//!
//! Deliberately narrower than the teacher's `value` module: no `Null`, no vector or
//! timestamp types, since NULLs and vector search sit outside this crate's scope.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// A value's type. Closed over exactly the primitives the algebra compares and orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Int,
    Float,
    Str,
    Bool,
}

impl DataType {
    /// Whether this type has a total order usable by `<`, `<=`, `>`, `>=`.
    ///
    /// `Bool` is excluded: the spec's Open Question on type-incompatible ordered
    /// comparisons is resolved by rejecting them at construction time rather than
    /// silently returning `false`, and an ordering over booleans is not something a
    /// predicate author is likely to mean deliberately. See DESIGN.md.
    pub fn ordered(self) -> bool {
        !matches!(self, DataType::Bool)
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DataType::Int => "int",
            DataType::Float => "float",
            DataType::Str => "str",
            DataType::Bool => "bool",
        };
        write!(f, "{s}")
    }
}

/// A single scalar value.
#[derive(Debug, Clone)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
}

impl Value {
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Int(_) => DataType::Int,
            Value::Float(_) => DataType::Float,
            Value::Str(_) => DataType::Str,
            Value::Bool(_) => DataType::Bool,
        }
    }

    /// Ordered comparison. Returns `None` for mismatched or unordered types — callers
    /// that built the predicate through [`crate::predicate::Predicate`] will already
    /// have rejected those combinations at construction time, so this only fires for
    /// ad-hoc predicates that skip that check deliberately.
    pub fn partial_cmp_value(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Str(a), Value::Str(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Str(v) => write!(f, "{v:?}"),
            Value::Bool(v) => write!(f, "{v}"),
        }
    }
}

// `Value` needs `Eq`/`Hash` so tuples can live in seen-sets and hash-join indices.
// Floats have no total `Eq`; we hash/compare them by bit pattern, which makes
// `NaN == NaN` for the purpose of set membership — the same trade every engine that
// puts floats in a hash set makes.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Int(v) => v.hash(state),
            Value::Float(v) => v.to_bits().hash(state),
            Value::Str(v) => v.hash(state),
            Value::Bool(v) => v.hash(state),
        }
    }
}
