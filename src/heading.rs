//! Heading and attribute model (`spec.md` §3, component 1 of §2).

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::value::DataType;

/// A named, typed field of a tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Attribute {
    pub name: Arc<str>,
    pub ty: DataType,
}

impl Attribute {
    pub fn new(name: impl Into<Arc<str>>, ty: DataType) -> Self {
        Attribute {
            name: name.into(),
            ty,
        }
    }
}

/// An ordered sequence of attributes with unique names.
///
/// Two headings are equal iff they carry the same *set* of `(name, type)` pairs,
/// regardless of order (`spec.md` §3) — order only matters for rename's positional
/// correspondence (`spec.md` §4.7) and for the stable, deterministic rendering of a
/// relation's tuples.
#[derive(Debug, Clone)]
pub struct Heading(Arc<[Attribute]>);

impl Heading {
    pub fn new(attrs: Vec<Attribute>) -> Result<Self> {
        let mut seen = std::collections::HashSet::with_capacity(attrs.len());
        for a in &attrs {
            if !seen.insert(a.name.clone()) {
                return Err(Error::DuplicateAttribute(a.name.to_string()));
            }
        }
        Ok(Heading(attrs.into()))
    }

    pub fn empty() -> Self {
        Heading(Arc::from(Vec::new()))
    }

    pub fn attrs(&self) -> &[Attribute] {
        &self.0
    }

    pub fn degree(&self) -> usize {
        self.0.len()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|a| a.name.as_ref())
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|a| a.name.as_ref() == name)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn attr_type(&self, name: &str) -> Option<DataType> {
        self.index_of(name).map(|i| self.0[i].ty)
    }

    fn as_set(&self) -> BTreeSet<(Arc<str>, DataType)> {
        self.0.iter().map(|a| (a.name.clone(), a.ty)).collect()
    }

    /// Whether every `(name, type)` pair of `self` also appears in `target`.
    pub fn is_subset_of_names(&self, target: &[String]) -> bool {
        self.0.iter().all(|a| target.iter().any(|n| n == a.name.as_ref()))
    }

    /// Whether `self`'s attribute names (ignoring type) are a subset of `other`'s names.
    pub fn names_subset_of(&self, other: &Heading) -> bool {
        self.0
            .iter()
            .all(|a| other.contains_name(a.name.as_ref()))
    }

    /// Build the heading that results from projecting onto `target_names`, in the
    /// order given, validating each name exists in `self` with a matching type.
    pub fn project(&self, target_names: &[String]) -> Result<Heading> {
        let mut attrs = Vec::with_capacity(target_names.len());
        let mut missing = Vec::new();
        for name in target_names {
            match self.index_of(name) {
                Some(i) => attrs.push(self.0[i].clone()),
                None => missing.push(name.clone()),
            }
        }
        if !missing.is_empty() {
            return Err(Error::Subset {
                source: self.to_string(),
                target: target_names.join(","),
            });
        }
        Heading::new(attrs)
    }

    /// Index of each of `self`'s attributes within `other`, by name. Used to build
    /// the "field-index map between two headings" utility called out in `spec.md` §2.
    pub fn index_map_into(&self, other: &Heading) -> Option<Vec<usize>> {
        self.0
            .iter()
            .map(|a| other.index_of(a.name.as_ref()))
            .collect()
    }
}

impl PartialEq for Heading {
    fn eq(&self, other: &Self) -> bool {
        self.as_set() == other.as_set()
    }
}
impl Eq for Heading {}

impl std::fmt::Display for Heading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, a) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}:{}", a.name, a.ty)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(attrs: &[(&str, DataType)]) -> Heading {
        Heading::new(
            attrs
                .iter()
                .map(|(n, t)| Attribute::new(*n, *t))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn equality_ignores_order() {
        let a = h(&[("x", DataType::Int), ("y", DataType::Str)]);
        let b = h(&[("y", DataType::Str), ("x", DataType::Int)]);
        assert_eq!(a, b);
    }

    #[test]
    fn duplicate_name_rejected() {
        let res = Heading::new(vec![
            Attribute::new("x", DataType::Int),
            Attribute::new("x", DataType::Int),
        ]);
        assert!(matches!(res, Err(Error::DuplicateAttribute(_))));
    }

    #[test]
    fn project_validates_subset() {
        let src = h(&[("x", DataType::Int), ("y", DataType::Str), ("z", DataType::Bool)]);
        let projected = src.project(&["z".to_string(), "x".to_string()]).unwrap();
        assert_eq!(projected.degree(), 2);
        assert!(src.project(&["w".to_string()]).is_err());
    }
}
