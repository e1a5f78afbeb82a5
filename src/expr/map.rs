//! .Map(...) — an arbitrary pure per-tuple transform to a new heading (`spec.md` §4.12).
//!
//! The transform's declared output heading is taken on faith for its shape but not its
//! values: every result is still run back through [`Tuple::new`], so a transform that
//! returns a value of the wrong type for its own declared heading surfaces as a latched
//! error rather than a silently corrupt tuple. Unless the caller asserts injective keys,
//! the operator deduplicates its own output, since an arbitrary map can easily collapse
//! distinct inputs onto the same tuple.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::cancel::CancelHandle;
use crate::error::{Error, Result};
use crate::heading::{Attribute, Heading};
use crate::keys::CandidateKeys;
use crate::relation::{empty_keys, inherited_err, Kind, Relation};
use crate::tuple::Tuple;
use crate::value::{DataType, Value};

pub(crate) type TransformFn = Arc<dyn Fn(&Tuple) -> Result<Vec<Value>> + Send + Sync>;

#[derive(Clone)]
pub(crate) struct MapNode {
    pub(crate) source: Relation,
    pub(crate) transform: TransformFn,
    pub(crate) out_heading: Heading,
    pub(crate) dedup: bool,
}

pub(crate) fn build(
    source: &Relation,
    output_heading: Vec<(String, DataType)>,
    transform: TransformFn,
    keys: Option<Vec<Vec<String>>>,
) -> Relation {
    let label = format!(".Map(...)({})", source.text());

    if let Some(e) = inherited_err(&[source]) {
        return errored(source, &transform, label, e);
    }

    let attrs: Vec<Attribute> = output_heading
        .into_iter()
        .map(|(n, t)| Attribute::new(n, t))
        .collect();
    let out_heading = match Heading::new(attrs) {
        Ok(h) => h,
        Err(e) => return errored(source, &transform, label, Arc::new(e)),
    };

    let (keys, dedup) = match keys {
        Some(ks) => {
            let missing: Vec<String> = ks
                .iter()
                .flatten()
                .filter(|n| !out_heading.contains_name(n))
                .cloned()
                .collect();
            if !missing.is_empty() {
                let e = Arc::new(Error::Domain {
                    heading: out_heading.to_string(),
                    missing,
                });
                return errored(source, &transform, label, e);
            }
            let keys = CandidateKeys::from_keys(
                ks.into_iter()
                    .map(|k| k.into_iter().map(Arc::from).collect())
                    .collect(),
            );
            (keys, false)
        }
        None => (CandidateKeys::full(&out_heading), true),
    };

    Relation::new(
        Kind::Map(MapNode {
            source: source.clone(),
            transform,
            out_heading: out_heading.clone(),
            dedup,
        }),
        out_heading,
        keys,
        label,
    )
}

fn errored(source: &Relation, transform: &TransformFn, label: String, e: Arc<Error>) -> Relation {
    Relation::new_errored(
        Kind::Map(MapNode {
            source: source.clone(),
            transform: transform.clone(),
            out_heading: Heading::empty(),
            dedup: false,
        }),
        Heading::empty(),
        empty_keys(),
        label,
        e,
    )
}

pub(crate) async fn spawn(
    this: &Relation,
    node: MapNode,
    tx: mpsc::Sender<Tuple>,
    cancel: CancelHandle,
    capacity: usize,
    width: usize,
) {
    let child_cancel = cancel.child();
    let rx = node.source.spawn(child_cancel, capacity, width);
    let rx = Arc::new(tokio::sync::Mutex::new(rx));
    let seen: Option<Arc<tokio::sync::Mutex<HashSet<Tuple>>>> = node
        .dedup
        .then(|| Arc::new(tokio::sync::Mutex::new(HashSet::new())));

    let mut handles = Vec::with_capacity(width.max(1));
    for _ in 0..width.max(1) {
        let rx = Arc::clone(&rx);
        let tx = tx.clone();
        let cancel = cancel.clone();
        let transform = node.transform.clone();
        let out_heading = node.out_heading.clone();
        let seen = seen.clone();
        let this = this.clone();
        handles.push(tokio::spawn(async move {
            loop {
                let item = {
                    let mut guard = rx.lock().await;
                    tokio::select! {
                        _ = cancel.cancelled() => None,
                        item = guard.recv() => item,
                    }
                };
                let Some(t) = item else { break };
                let values = match transform(&t) {
                    Ok(v) => v,
                    Err(e) => {
                        this.latch(Arc::new(e));
                        break;
                    }
                };
                let mapped = match Tuple::new(out_heading.clone(), values) {
                    Ok(t) => t,
                    Err(e) => {
                        this.latch(Arc::new(e));
                        break;
                    }
                };
                if let Some(seen) = &seen {
                    let mut seen = seen.lock().await;
                    if !seen.insert(mapped.clone()) {
                        continue;
                    }
                }
                let sent = tokio::select! {
                    _ = cancel.cancelled() => break,
                    res = tx.send(mapped) => res,
                };
                if sent.is_err() {
                    break;
                }
            }
        }));
    }
    for h in handles {
        let _ = h.await;
    }
    this.latch_from(&node.source);
}
