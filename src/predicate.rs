//! Predicate algebra (`spec.md` §2 component 2, §3, §6).
//!
//! A predicate is a pure, total boolean function over a declared attribute domain.
//! Construction never touches a heading; attaching a predicate to a relation (via
//! [`Predicate::check_against`], called by `Restrict::new` and by every push-down
//! rule that needs to know whether a predicate fits inside one side of a join) is
//! where domain and type compatibility are actually verified — resolving the Open
//! Question in `spec.md` §9 in favor of a construction-time check rather than a
//! silent runtime `false`.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::heading::Heading;
use crate::tuple::Tuple;
use crate::value::{DataType, Value};

/// One side of a comparison: either a literal value or a reference to an attribute.
#[derive(Clone)]
pub enum Operand {
    Attr(Arc<str>),
    Lit(Value),
}

impl Operand {
    fn resolve<'t>(&'t self, tuple: &'t Tuple) -> Option<std::borrow::Cow<'t, Value>> {
        match self {
            Operand::Attr(name) => tuple.get_by_name(name).map(std::borrow::Cow::Borrowed),
            Operand::Lit(v) => Some(std::borrow::Cow::Owned(v.clone())),
        }
    }

    fn data_type(&self, heading: &Heading) -> Option<DataType> {
        match self {
            Operand::Attr(name) => heading.attr_type(name),
            Operand::Lit(v) => Some(v.data_type()),
        }
    }

    fn attr_name(&self) -> Option<&str> {
        match self {
            Operand::Attr(name) => Some(name.as_ref()),
            Operand::Lit(_) => None,
        }
    }
}

type AdHocFn = Arc<dyn Fn(&Tuple) -> Result<bool> + Send + Sync>;

/// A composable boolean expression over a tuple's attributes.
#[derive(Clone)]
pub enum Predicate {
    Eq(Operand, Operand),
    Ne(Operand, Operand),
    Lt(Operand, Operand),
    Le(Operand, Operand),
    Gt(Operand, Operand),
    Ge(Operand, Operand),
    Not(Box<Predicate>),
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Xor(Box<Predicate>, Box<Predicate>),
    /// An ad-hoc user function. Rust closures carry no reflectable field list, so —
    /// unlike the reflection-based teacher — the domain must be declared explicitly
    /// by the caller rather than inferred from the closure's shape.
    AdHoc { domain: Vec<Arc<str>>, f: AdHocFn },
    /// Always true — the identity predicate for `σ_true(R) ≡ R` (`spec.md` §8).
    True,
}

impl Predicate {
    pub fn eq(a: Operand, b: Operand) -> Self {
        Predicate::Eq(a, b)
    }
    pub fn ne(a: Operand, b: Operand) -> Self {
        Predicate::Ne(a, b)
    }
    pub fn lt(a: Operand, b: Operand) -> Self {
        Predicate::Lt(a, b)
    }
    pub fn le(a: Operand, b: Operand) -> Self {
        Predicate::Le(a, b)
    }
    pub fn gt(a: Operand, b: Operand) -> Self {
        Predicate::Gt(a, b)
    }
    pub fn ge(a: Operand, b: Operand) -> Self {
        Predicate::Ge(a, b)
    }
    pub fn not(p: Predicate) -> Self {
        Predicate::Not(Box::new(p))
    }
    pub fn and(a: Predicate, b: Predicate) -> Self {
        Predicate::And(Box::new(a), Box::new(b))
    }
    pub fn or(a: Predicate, b: Predicate) -> Self {
        Predicate::Or(Box::new(a), Box::new(b))
    }
    pub fn xor(a: Predicate, b: Predicate) -> Self {
        Predicate::Xor(Box::new(a), Box::new(b))
    }

    pub fn ad_hoc(domain: Vec<impl Into<Arc<str>>>, f: impl Fn(&Tuple) -> Result<bool> + Send + Sync + 'static) -> Self {
        Predicate::AdHoc {
            domain: domain.into_iter().map(Into::into).collect(),
            f: Arc::new(f),
        }
    }

    /// The attribute domain this predicate reads from, used by the engine to decide
    /// whether the predicate can be pushed through an operator (`spec.md` §2 component 2).
    pub fn domain(&self) -> HashSet<Arc<str>> {
        let mut out = HashSet::new();
        self.collect_domain(&mut out);
        out
    }

    fn collect_domain(&self, out: &mut HashSet<Arc<str>>) {
        match self {
            Predicate::Eq(a, b)
            | Predicate::Ne(a, b)
            | Predicate::Lt(a, b)
            | Predicate::Le(a, b)
            | Predicate::Gt(a, b)
            | Predicate::Ge(a, b) => {
                if let Operand::Attr(n) = a {
                    out.insert(n.clone());
                }
                if let Operand::Attr(n) = b {
                    out.insert(n.clone());
                }
            }
            Predicate::Not(p) => p.collect_domain(out),
            Predicate::And(a, b) | Predicate::Or(a, b) | Predicate::Xor(a, b) => {
                a.collect_domain(out);
                b.collect_domain(out);
            }
            Predicate::AdHoc { domain, .. } => out.extend(domain.iter().cloned()),
            Predicate::True => {}
        }
    }

    /// Verify this predicate's domain is a subset of `heading`'s attribute names, and
    /// that every ordered comparison (`<`/`<=`/`>`/`>=`) compares two same, ordered types.
    pub fn check_against(&self, heading: &Heading) -> Result<()> {
        let missing: Vec<String> = self
            .domain()
            .into_iter()
            .filter(|n| !heading.contains_name(n))
            .map(|n| n.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(Error::Domain {
                heading: heading.to_string(),
                missing,
            });
        }
        self.check_types(heading)
    }

    fn check_types(&self, heading: &Heading) -> Result<()> {
        match self {
            Predicate::Eq(a, b) | Predicate::Ne(a, b) => {
                if let (Some(ta), Some(tb)) = (a.data_type(heading), b.data_type(heading)) {
                    if ta != tb {
                        return Err(Error::Unordered(ta, tb));
                    }
                }
                Ok(())
            }
            Predicate::Lt(a, b) | Predicate::Le(a, b) | Predicate::Gt(a, b) | Predicate::Ge(a, b) => {
                let (ta, tb) = (a.data_type(heading), b.data_type(heading));
                if let (Some(ta), Some(tb)) = (ta, tb) {
                    if ta != tb || !ta.ordered() {
                        return Err(Error::Unordered(ta, tb));
                    }
                }
                Ok(())
            }
            Predicate::Not(p) => p.check_types(heading),
            Predicate::And(a, b) | Predicate::Or(a, b) | Predicate::Xor(a, b) => {
                a.check_types(heading)?;
                b.check_types(heading)
            }
            Predicate::AdHoc { .. } | Predicate::True => Ok(()),
        }
    }

    pub fn eval(&self, tuple: &Tuple) -> Result<bool> {
        Ok(match self {
            Predicate::Eq(a, b) => compare(a, b, tuple)? == Some(std::cmp::Ordering::Equal),
            Predicate::Ne(a, b) => compare(a, b, tuple)? != Some(std::cmp::Ordering::Equal),
            Predicate::Lt(a, b) => compare(a, b, tuple)? == Some(std::cmp::Ordering::Less),
            Predicate::Le(a, b) => matches!(
                compare(a, b, tuple)?,
                Some(std::cmp::Ordering::Less) | Some(std::cmp::Ordering::Equal)
            ),
            Predicate::Gt(a, b) => compare(a, b, tuple)? == Some(std::cmp::Ordering::Greater),
            Predicate::Ge(a, b) => matches!(
                compare(a, b, tuple)?,
                Some(std::cmp::Ordering::Greater) | Some(std::cmp::Ordering::Equal)
            ),
            Predicate::Not(p) => !p.eval(tuple)?,
            Predicate::And(a, b) => a.eval(tuple)? && b.eval(tuple)?,
            Predicate::Or(a, b) => a.eval(tuple)? || b.eval(tuple)?,
            Predicate::Xor(a, b) => a.eval(tuple)? ^ b.eval(tuple)?,
            Predicate::AdHoc { f, .. } => f(tuple)?,
            Predicate::True => true,
        })
    }

    /// Decompose a top-level conjunction into its conjuncts (`spec.md` §4.6:
    /// `σ_p(R) ≡ σ_p1(σ_p2(R))` when `p = And(p1, p2)`). Non-conjunctions decompose to
    /// themselves.
    pub fn conjuncts(&self) -> Vec<&Predicate> {
        match self {
            Predicate::And(a, b) => {
                let mut v = a.conjuncts();
                v.extend(b.conjuncts());
                v
            }
            other => vec![other],
        }
    }

    /// Rewrite every attribute reference through `mapping` (old name -> new name),
    /// used by rename push-down (`spec.md` §4.7, §4.9, §4.10).
    pub fn renamed(&self, mapping: &std::collections::HashMap<Arc<str>, Arc<str>>) -> Predicate {
        let ro = |o: &Operand| -> Operand {
            match o {
                Operand::Attr(n) => Operand::Attr(mapping.get(n).cloned().unwrap_or_else(|| n.clone())),
                Operand::Lit(v) => Operand::Lit(v.clone()),
            }
        };
        match self {
            Predicate::Eq(a, b) => Predicate::Eq(ro(a), ro(b)),
            Predicate::Ne(a, b) => Predicate::Ne(ro(a), ro(b)),
            Predicate::Lt(a, b) => Predicate::Lt(ro(a), ro(b)),
            Predicate::Le(a, b) => Predicate::Le(ro(a), ro(b)),
            Predicate::Gt(a, b) => Predicate::Gt(ro(a), ro(b)),
            Predicate::Ge(a, b) => Predicate::Ge(ro(a), ro(b)),
            Predicate::Not(p) => Predicate::Not(Box::new(p.renamed(mapping))),
            Predicate::And(a, b) => Predicate::And(Box::new(a.renamed(mapping)), Box::new(b.renamed(mapping))),
            Predicate::Or(a, b) => Predicate::Or(Box::new(a.renamed(mapping)), Box::new(b.renamed(mapping))),
            Predicate::Xor(a, b) => Predicate::Xor(Box::new(a.renamed(mapping)), Box::new(b.renamed(mapping))),
            Predicate::AdHoc { domain, f } => Predicate::AdHoc {
                domain: domain
                    .iter()
                    .map(|n| mapping.get(n).cloned().unwrap_or_else(|| n.clone()))
                    .collect(),
                f: f.clone(),
            },
            Predicate::True => Predicate::True,
        }
    }
}

fn compare(a: &Operand, b: &Operand, tuple: &Tuple) -> Result<Option<std::cmp::Ordering>> {
    let (va, vb) = (a.resolve(tuple), b.resolve(tuple));
    match (va, vb) {
        (Some(va), Some(vb)) => Ok(va.partial_cmp_value(&vb)),
        _ => {
            let missing = [a.attr_name(), b.attr_name()]
                .into_iter()
                .flatten()
                .map(str::to_string)
                .collect();
            Err(Error::Domain {
                heading: tuple.heading().to_string(),
                missing,
            })
        }
    }
}

/// Fluent attribute-based builder entry point: `attr("x").eq(Value::Int(1))`.
pub fn attr(name: impl Into<Arc<str>>) -> AttrRef {
    AttrRef(name.into())
}

#[derive(Clone)]
pub struct AttrRef(Arc<str>);

impl AttrRef {
    pub fn operand(&self) -> Operand {
        Operand::Attr(self.0.clone())
    }
    pub fn eq(&self, rhs: impl Into<Operand>) -> Predicate {
        Predicate::eq(self.operand(), rhs.into())
    }
    pub fn ne(&self, rhs: impl Into<Operand>) -> Predicate {
        Predicate::ne(self.operand(), rhs.into())
    }
    pub fn lt(&self, rhs: impl Into<Operand>) -> Predicate {
        Predicate::lt(self.operand(), rhs.into())
    }
    pub fn le(&self, rhs: impl Into<Operand>) -> Predicate {
        Predicate::le(self.operand(), rhs.into())
    }
    pub fn gt(&self, rhs: impl Into<Operand>) -> Predicate {
        Predicate::gt(self.operand(), rhs.into())
    }
    pub fn ge(&self, rhs: impl Into<Operand>) -> Predicate {
        Predicate::ge(self.operand(), rhs.into())
    }
}

impl From<Value> for Operand {
    fn from(v: Value) -> Self {
        Operand::Lit(v)
    }
}
impl From<AttrRef> for Operand {
    fn from(a: AttrRef) -> Self {
        a.operand()
    }
}
impl From<&AttrRef> for Operand {
    fn from(a: &AttrRef) -> Self {
        a.operand()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heading::Attribute;
    use crate::value::DataType;

    fn heading() -> Heading {
        Heading::new(vec![
            Attribute::new("pno", DataType::Int),
            Attribute::new("name", DataType::Str),
        ])
        .unwrap()
    }

    #[test]
    fn domain_is_collected_from_attrs_only() {
        let p = attr("pno").eq(Value::Int(1));
        assert_eq!(p.domain().len(), 1);
    }

    #[test]
    fn check_against_rejects_missing_attribute() {
        let p = attr("missing").eq(Value::Int(1));
        assert!(p.check_against(&heading()).is_err());
    }

    #[test]
    fn ordered_comparison_rejects_type_mismatch() {
        let h = Heading::new(vec![
            Attribute::new("a", DataType::Int),
            Attribute::new("b", DataType::Str),
        ])
        .unwrap();
        let p = attr("a").lt(attr("b"));
        assert!(matches!(p.check_against(&h), Err(Error::Unordered(_, _))));
    }

    #[test]
    fn and_decomposes_into_conjuncts() {
        let p = Predicate::and(attr("pno").eq(Value::Int(1)), attr("pno").ne(Value::Int(2)));
        assert_eq!(p.conjuncts().len(), 2);
    }

    #[test]
    fn eval_true_predicate_always_true() {
        let h = heading();
        let t = Tuple::new(h, vec![Value::Int(1), Value::Str("a".into())]).unwrap();
        assert!(Predicate::True.eval(&t).unwrap());
    }
}
