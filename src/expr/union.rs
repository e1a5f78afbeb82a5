//! ∪ — union of two same-heading relations (`spec.md` §4.8).

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::cancel::CancelHandle;
use crate::error::Error;
use crate::heading::Heading;
use crate::keys::CandidateKeys;
use crate::relation::{empty_keys, inherited_err, Kind, Relation};
use crate::tuple::Tuple;

#[derive(Clone)]
pub(crate) struct UnionNode {
    pub(crate) left: Relation,
    pub(crate) right: Relation,
}

pub(crate) fn build(left: &Relation, right: &Relation) -> Relation {
    let label = format!("({}) ∪ ({})", left.text(), right.text());

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

    // Only the key combinations that hold across *both* sides survive union
    // (`spec.md` §4.8): reduced union of the two key sets.
    let keys = CandidateKeys::union_reduced(left.candidate_keys(), right.candidate_keys());

    Relation::new(
        Kind::Union(UnionNode {
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
        Kind::Union(UnionNode {
            left: left.clone(),
            right: right.clone(),
        }),
        Heading::empty(),
        empty_keys(),
        label,
        e,
    )
}

async fn forward(mut rx: mpsc::Receiver<Tuple>, tx: mpsc::Sender<Tuple>, cancel: CancelHandle) {
    loop {
        let item = tokio::select! {
            _ = cancel.cancelled() => return,
            item = rx.recv() => item,
        };
        let Some(t) = item else { return };
        let sent = tokio::select! {
            _ = cancel.cancelled() => return,
            res = tx.send(t) => res,
        };
        if sent.is_err() {
            return;
        }
    }
}

pub(crate) async fn spawn(
    this: &Relation,
    node: UnionNode,
    tx: mpsc::Sender<Tuple>,
    cancel: CancelHandle,
    capacity: usize,
    width: usize,
) {
    let left_cancel = cancel.child();
    let right_cancel = cancel.child();
    let lrx = node.left.spawn(left_cancel.clone(), capacity, width);
    let rrx = node.right.spawn(right_cancel.clone(), capacity, width);

    let (merge_tx, mut merge_rx) = mpsc::channel::<Tuple>(capacity);
    let lh = tokio::spawn(forward(lrx, merge_tx.clone(), left_cancel));
    let rh = tokio::spawn(forward(rrx, merge_tx.clone(), right_cancel));
    drop(merge_tx);

    let mut seen: HashSet<Tuple> = HashSet::new();
    loop {
        let item = tokio::select! {
            _ = cancel.cancelled() => break,
            item = merge_rx.recv() => item,
        };
        let Some(t) = item else { break };
        if !seen.insert(t.clone()) {
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
    let _ = lh.await;
    let _ = rh.await;
    this.latch_from(&node.left);
    this.latch_from(&node.right);
}
