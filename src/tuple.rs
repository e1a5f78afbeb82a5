//! Heterogeneous tuple representation.
//!
//! Per the design note in `spec.md` §9: rather than runtime reflection over an
//! arbitrary record type, a tuple is a position-indexed `Vec<Value>` plus a shared
//! [`Heading`] descriptor, so field lookups compiled by an operator at construction
//! time become plain integer indexing at evaluation time.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::heading::Heading;
use crate::value::Value;

#[derive(Debug, Clone)]
pub struct Tuple {
    heading: Heading,
    values: Arc<[Value]>,
}

impl Tuple {
    /// Build a tuple and validate it against `heading`: the value count must match
    /// the heading's degree and every value's type must match its attribute's type.
    pub fn new(heading: Heading, values: Vec<Value>) -> Result<Self> {
        if values.len() != heading.degree() {
            return Err(Error::ElementType {
                heading: heading.to_string(),
                values: format!("{values:?}"),
            });
        }
        for (attr, value) in heading.attrs().iter().zip(values.iter()) {
            if attr.ty != value.data_type() {
                return Err(Error::ElementType {
                    heading: heading.to_string(),
                    values: format!("{values:?}"),
                });
            }
        }
        Ok(Tuple {
            heading,
            values: values.into(),
        })
    }

    /// Build a tuple without re-validating types, trusting the caller (used internally
    /// by operators that already know their output is well-typed by construction).
    pub(crate) fn new_unchecked(heading: Heading, values: Vec<Value>) -> Self {
        Tuple {
            heading,
            values: values.into(),
        }
    }

    pub fn heading(&self) -> &Heading {
        &self.heading
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.heading.index_of(name).and_then(|i| self.values.get(i))
    }

    /// Reattach a different heading carrying the same positional types (used by
    /// rename, which relabels without touching values).
    pub(crate) fn with_heading(&self, heading: Heading) -> Tuple {
        Tuple {
            heading,
            values: Arc::clone(&self.values),
        }
    }

    /// Build a new tuple by selecting `self`'s values at `indices`, attaching `heading`.
    pub(crate) fn select(&self, indices: &[usize], heading: Heading) -> Tuple {
        let values = indices.iter().map(|&i| self.values[i].clone()).collect();
        Tuple::new_unchecked(heading, values)
    }
}

impl PartialEq for Tuple {
    fn eq(&self, other: &Self) -> bool {
        self.values.as_ref() == other.values.as_ref()
    }
}
impl Eq for Tuple {}

impl std::hash::Hash for Tuple {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        for v in self.values.iter() {
            v.hash(state);
        }
    }
}

impl std::fmt::Display for Tuple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        for (i, v) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{v}")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heading::Attribute;
    use crate::value::DataType;

    fn heading() -> Heading {
        Heading::new(vec![
            Attribute::new("x", DataType::Int),
            Attribute::new("y", DataType::Str),
        ])
        .unwrap()
    }

    #[test]
    fn rejects_type_mismatch() {
        let h = heading();
        let err = Tuple::new(h, vec![Value::Int(1), Value::Int(2)]);
        assert!(err.is_err());
    }

    #[test]
    fn equality_is_value_only() {
        let h = heading();
        let t1 = Tuple::new(h.clone(), vec![Value::Int(1), Value::Str("a".into())]).unwrap();
        let t2 = Tuple::new(h, vec![Value::Int(1), Value::Str("a".into())]).unwrap();
        assert_eq!(t1, t2);
    }
}
