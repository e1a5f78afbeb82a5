//! Candidate-key tracking.
//!
//! A candidate key is a minimal attribute subset whose values uniquely determine a
//! tuple. Every non-degenerate relation carries at least one (`spec.md` §3); this
//! module is the shared set algebra every operator's key-propagation rule (§4.5-§4.11)
//! is built from.

use std::collections::HashSet;
use std::sync::Arc;

use crate::heading::Heading;

/// A single candidate key: an (unordered, for comparison purposes) set of attribute names.
pub type Key = Vec<Arc<str>>;

#[derive(Debug, Clone)]
pub struct CandidateKeys(Vec<Key>);

impl CandidateKeys {
    /// The whole heading as the sole candidate key — the default for a freshly
    /// deduplicated source relation.
    pub fn full(heading: &Heading) -> Self {
        CandidateKeys(vec![heading.attrs().iter().map(|a| a.name.clone()).collect()])
    }

    pub fn from_keys(keys: Vec<Key>) -> Self {
        CandidateKeys(keys)
    }

    pub fn single(key: Key) -> Self {
        CandidateKeys(vec![key])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Key> {
        self.0.iter()
    }

    fn as_set(key: &Key) -> HashSet<&str> {
        key.iter().map(|n| n.as_ref()).collect()
    }

    /// Keys of `self` that are fully contained in `target_names` — `spec.md` §4.5's
    /// "each source key that is a subset of the target survives".
    pub fn keys_surviving(&self, target_names: &HashSet<&str>) -> Vec<Key> {
        self.0
            .iter()
            .filter(|k| k.iter().all(|n| target_names.contains(n.as_ref())))
            .cloned()
            .collect()
    }

    /// Rename every attribute name appearing in any key via `mapping` (old -> new).
    pub fn rename(&self, mapping: &std::collections::HashMap<Arc<str>, Arc<str>>) -> CandidateKeys {
        let keys = self
            .0
            .iter()
            .map(|k| {
                k.iter()
                    .map(|n| mapping.get(n).cloned().unwrap_or_else(|| n.clone()))
                    .collect()
            })
            .collect();
        CandidateKeys(keys)
    }

    /// Union two key sets, then drop any key that is a strict superset of another
    /// (`spec.md` §4.8: "union of the two key sets, further reduced by any subset
    /// relation" — a superset key carries no extra uniqueness information).
    pub fn union_reduced(a: &CandidateKeys, b: &CandidateKeys) -> CandidateKeys {
        let all: Vec<Key> = a.0.iter().chain(b.0.iter()).cloned().collect();
        Self::reduce(all)
    }

    /// Pairwise composite keys for a natural join (`spec.md` §4.10): every
    /// combination `k1 ∪ (k2 \ shared)` of a left key `k1` and a right key `k2`,
    /// reduced by subset. This is distinct from `union_reduced`, which unions the
    /// two *raw* key sets rather than combining them pairwise.
    pub fn join_composite(left: &CandidateKeys, right: &CandidateKeys, shared: &HashSet<&str>) -> CandidateKeys {
        let mut all: Vec<Key> = Vec::with_capacity(left.0.len() * right.0.len().max(1));
        for k1 in &left.0 {
            for k2 in &right.0 {
                let mut combined: Key = k1.clone();
                for n in k2 {
                    if !shared.contains(n.as_ref()) && !combined.iter().any(|e| e.as_ref() == n.as_ref()) {
                        combined.push(n.clone());
                    }
                }
                all.push(combined);
            }
        }
        Self::reduce(all)
    }

    fn reduce(mut all: Vec<Key>) -> CandidateKeys {
        all.sort_by_key(|k| k.len());
        let mut kept: Vec<Key> = Vec::new();
        'outer: for k in all {
            let ks = Self::as_set(&k);
            for existing in &kept {
                let es = Self::as_set(existing);
                if es.is_subset(&ks) {
                    continue 'outer;
                }
            }
            kept.push(k);
        }
        CandidateKeys(kept)
    }

    /// Whether `names` (as a set) equals one of the stored keys exactly.
    pub fn contains_key_set(&self, names: &HashSet<&str>) -> bool {
        self.0.iter().any(|k| &Self::as_set(k) == names)
    }
}
