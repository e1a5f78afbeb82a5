//! Canonical text rendering of a relation expression (`spec.md` §6), using the symbols
//! `π σ ρ ∪ − ⋈` plus `.GroupBy(...)` / `.Map(...)` notation. Every operator
//! constructor stamps its own label onto the node at construction time (see each
//! `expr::*::build`), so rendering is just reading it back.

use crate::relation::Relation;

pub fn text(r: &Relation) -> String {
    r.text().to_string()
}
