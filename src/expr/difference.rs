//! − — set difference over two same-heading relations (`spec.md` §4.9).
//!
//! The subtrahend must be fully known before any minuend tuple can be judged, so
//! evaluation first drains the right side into a lookup set, then filters the left
//! side against it with `width` concurrent workers.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::cancel::CancelHandle;
use crate::error::Error;
use crate::heading::Heading;
use crate::relation::{empty_keys, inherited_err, Kind, Relation};
use crate::tuple::Tuple;

#[derive(Clone)]
pub(crate) struct DifferenceNode {
    pub(crate) left: Relation,
    pub(crate) right: Relation,
}

pub(crate) fn build(left: &Relation, right: &Relation) -> Relation {
    let label = format!("({}) − ({})", left.text(), right.text());

    if let Some(e) = inherited_err(&[left, right]) {
        return errored(left, right, label, e);
    }
    if left.heading() != right.heading() {
        let e = Arc::new(Error::HeadingMismatch {
            left: left.heading().to_string(),
            right: right.heading().to_string(),
        });
        return errored(left, right, label, e);
    }

    // Removing rows never loses uniqueness, so the minuend's keys survive untouched.
    let keys = left.candidate_keys().clone();

    Relation::new(
        Kind::Difference(DifferenceNode {
            left: left.clone(),
            right: right.clone(),
        }),
        left.heading().clone(),
        keys,
        label,
    )
}

fn errored(left: &Relation, right: &Relation, label: String, e: Arc<Error>) -> Relation {
    Relation::new_errored(
        Kind::Difference(DifferenceNode {
            left: left.clone(),
            right: right.clone(),
        }),
        Heading::empty(),
        empty_keys(),
        label,
        e,
    )
}

pub(crate) async fn spawn(
    this: &Relation,
    node: DifferenceNode,
    tx: mpsc::Sender<Tuple>,
    cancel: CancelHandle,
    capacity: usize,
    width: usize,
) {
    let right_cancel = cancel.child();
    let mut rrx = node.right.spawn(right_cancel, capacity, width);
    let mut excluded: HashSet<Tuple> = HashSet::new();
    loop {
        let item = tokio::select! {
            _ = cancel.cancelled() => {
                this.latch_from(&node.right);
                return;
            }
            item = rrx.recv() => item,
        };
        match item {
            Some(t) => {
                excluded.insert(t);
            }
            None => break,
        }
    }
    this.latch_from(&node.right);
    if this.err().is_some() {
        return;
    }
    let excluded = Arc::new(excluded);

    let left_cancel = cancel.child();
    let lrx = node.left.spawn(left_cancel.clone(), capacity, width);
    let lrx = Arc::new(tokio::sync::Mutex::new(lrx));

    let mut handles = Vec::with_capacity(width.max(1));
    for _ in 0..width.max(1) {
        let lrx = Arc::clone(&lrx);
        let tx = tx.clone();
        let cancel = cancel.clone();
        let excluded = Arc::clone(&excluded);
        handles.push(tokio::spawn(async move {
            loop {
                let item = {
                    let mut guard = lrx.lock().await;
                    tokio::select! {
                        _ = cancel.cancelled() => None,
                        item = guard.recv() => item,
                    }
                };
                let Some(t) = item else { break };
                if excluded.contains(&t) {
                    continue;
                }
                let sent = tokio::select! {
                    _ = cancel.cancelled() => break,
                    res = tx.send(t) => res,
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
    this.latch_from(&node.left);
}
