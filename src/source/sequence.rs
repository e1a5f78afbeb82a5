//! A fixed, caller-guaranteed-distinct sequence of tuples (`spec.md` §4.2).
//!
//! Unlike `set`, construction does not re-derive distinctness: the caller asserts the
//! sequence holds no duplicate tuples. A heading mismatch among the supplied tuples is
//! still caught at construction and latched, since that's a programming error rather
//! than a distinctness question.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::cancel::CancelHandle;
use crate::error::Error;
use crate::heading::Heading;
use crate::keys::CandidateKeys;
use crate::relation::{Kind, Relation};
use crate::tuple::Tuple;

pub(crate) fn build(
    name: String,
    heading: Heading,
    tuples: Vec<Tuple>,
    keys: Option<Vec<Vec<String>>>,
) -> Relation {
    let label = format!("{name}");
    if let Some(bad) = tuples.iter().find(|t| t.heading() != &heading) {
        let err = Arc::new(Error::HeadingMismatch {
            left: heading.to_string(),
            right: bad.heading().to_string(),
        });
        return Relation::new_errored(
            Kind::Sequence(tuples),
            heading,
            CandidateKeys::from_keys(Vec::new()),
            label,
            err,
        );
    }
    // No supplied keys means the caller's distinctness guarantee doesn't apply
    // (`spec.md` §4.2): fall back to deduplicating, same as `set`, before the full
    // heading is synthesized as the sole candidate key.
    let tuples = if keys.is_none() {
        let mut seen = HashSet::with_capacity(tuples.len());
        tuples.into_iter().filter(|t| seen.insert(t.clone())).collect()
    } else {
        tuples
    };
    let keys = resolve_keys(&heading, keys);
    Relation::new(Kind::Sequence(tuples), heading, keys, label)
}

pub(crate) fn resolve_keys(heading: &Heading, keys: Option<Vec<Vec<String>>>) -> CandidateKeys {
    match keys {
        Some(ks) => CandidateKeys::from_keys(
            ks.into_iter()
                .map(|k| k.into_iter().map(Arc::from).collect())
                .collect(),
        ),
        None => CandidateKeys::full(heading),
    }
}

pub(crate) async fn spawn(tuples: Vec<Tuple>, tx: mpsc::Sender<Tuple>, cancel: CancelHandle) {
    for t in tuples {
        tokio::select! {
            _ = cancel.cancelled() => return,
            res = tx.send(t) => {
                if res.is_err() {
                    return;
                }
            }
        }
    }
}
