//! ⋈ — natural join (`spec.md` §4.10), evaluated as a symmetric hash join.
//!
//! Tuples from both sides are routed by the hash of their shared-attribute values to
//! one of `width` partitions; each partition owns a private pair of build indices, so
//! a partition only ever sees one worker and needs no shared/locked state. A tuple is
//! inserted into its own side's index and immediately probed against the opposite
//! side's index in the same partition, which is what lets matches be found regardless
//! of which side arrives first.

use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::cancel::CancelHandle;
use crate::error::Error;
use crate::eval::{combine_tuples, Side};
use crate::heading::{Attribute, Heading};
use crate::keys::CandidateKeys;
use crate::relation::{empty_keys, inherited_err, Kind, Relation};
use crate::tuple::Tuple;
use crate::value::Value;

#[derive(Clone)]
pub(crate) struct JoinNode {
    pub(crate) left: Relation,
    pub(crate) right: Relation,
    pub(crate) left_key_idx: Arc<[usize]>,
    pub(crate) right_key_idx: Arc<[usize]>,
    pub(crate) right_extra_idx: Arc<[usize]>,
    pub(crate) out_heading: Heading,
}

pub(crate) fn build(left: &Relation, right: &Relation) -> Relation {
    let label = format!("({}) ⋈ ({})", left.text(), right.text());

    if let Some(e) = inherited_err(&[left, right]) {
        return errored(left, right, label, e);
    }

    let shared: Vec<&str> = left
        .heading()
        .names()
        .filter(|n| right.heading().contains_name(n))
        .collect();
    for name in &shared {
        let lt = left.heading().attr_type(name).expect("shared name present");
        let rt = right.heading().attr_type(name).expect("shared name present");
        if lt != rt {
            let e = Arc::new(Error::HeadingMismatch {
                left: format!("{name}:{lt}"),
                right: format!("{name}:{rt}"),
            });
            return errored(left, right, label, e);
        }
    }

    let left_key_idx: Vec<usize> = shared
        .iter()
        .map(|n| left.heading().index_of(n).expect("checked above"))
        .collect();
    let right_key_idx: Vec<usize> = shared
        .iter()
        .map(|n| right.heading().index_of(n).expect("checked above"))
        .collect();
    let right_extra_idx: Vec<usize> = right
        .heading()
        .attrs()
        .iter()
        .enumerate()
        .filter(|(_, a)| !shared.contains(&a.name.as_ref()))
        .map(|(i, _)| i)
        .collect();

    let mut out_attrs: Vec<Attribute> = left.heading().attrs().to_vec();
    out_attrs.extend(right_extra_idx.iter().map(|&i| right.heading().attrs()[i].clone()));
    let out_heading = match Heading::new(out_attrs) {
        Ok(h) => h,
        Err(e) => return errored(left, right, label, Arc::new(e)),
    };

    // Each pair (k1 ∪ (k2 \ shared)) of a left key and a right key (`spec.md` §4.10) —
    // not the union of the two raw key sets, which would keep a shorter but
    // non-unique key like the shared attributes alone.
    let shared_set: HashSet<&str> = shared.iter().copied().collect();
    let keys = CandidateKeys::join_composite(left.candidate_keys(), right.candidate_keys(), &shared_set);

    Relation::new(
        Kind::Join(JoinNode {
            left: left.clone(),
            right: right.clone(),
            left_key_idx: Arc::from(left_key_idx),
            right_key_idx: Arc::from(right_key_idx),
            right_extra_idx: Arc::from(right_extra_idx),
            out_heading: out_heading.clone(),
        }),
        out_heading,
        keys,
        label,
    )
}

fn errored(left: &Relation, right: &Relation, label: String, e: Arc<Error>) -> Relation {
    Relation::new_errored(
        Kind::Join(JoinNode {
            left: left.clone(),
            right: right.clone(),
            left_key_idx: Arc::from(Vec::new()),
            right_key_idx: Arc::from(Vec::new()),
            right_extra_idx: Arc::from(Vec::new()),
            out_heading: Heading::empty(),
        }),
        Heading::empty(),
        empty_keys(),
        label,
        e,
    )
}

fn key_of(t: &Tuple, idx: &[usize]) -> Vec<Value> {
    idx.iter().map(|&i| t.values()[i].clone()).collect()
}

fn partition_of(key: &[Value], width: usize) -> usize {
    let mut h = std::collections::hash_map::DefaultHasher::new();
    for v in key {
        v.hash(&mut h);
    }
    (h.finish() as usize) % width
}

#[tracing::instrument(skip_all, fields(width))]
pub(crate) async fn spawn(
    this: &Relation,
    node: JoinNode,
    tx: mpsc::Sender<Tuple>,
    cancel: CancelHandle,
    capacity: usize,
    width: usize,
) {
    let width = width.max(1);
    tracing::Span::current().record("width", width);
    tracing::trace!("starting partitioned symmetric hash join");
    let left_cancel = cancel.child();
    let right_cancel = cancel.child();
    let mut lrx = node.left.spawn(left_cancel.clone(), capacity, width);
    let mut rrx = node.right.spawn(right_cancel.clone(), capacity, width);

    let mut partition_txs = Vec::with_capacity(width);
    let mut handles = Vec::with_capacity(width);
    for _ in 0..width {
        let (ptx, prx) = mpsc::channel::<Side>(capacity);
        partition_txs.push(ptx);
        let tx = tx.clone();
        let cancel = cancel.clone();
        let right_extra_idx = Arc::clone(&node.right_extra_idx);
        let out_heading = node.out_heading.clone();
        let left_key_idx = Arc::clone(&node.left_key_idx);
        let right_key_idx = Arc::clone(&node.right_key_idx);
        handles.push(tokio::spawn(partition_worker(
            prx,
            tx,
            cancel,
            left_key_idx,
            right_key_idx,
            right_extra_idx,
            out_heading,
        )));
    }

    let dispatch_cancel = cancel.child();
    let left_key_idx = Arc::clone(&node.left_key_idx);
    let right_key_idx = Arc::clone(&node.right_key_idx);
    let mut left_done = false;
    let mut right_done = false;
    'dispatch: loop {
        if left_done && right_done {
            break;
        }
        let side = tokio::select! {
            _ = dispatch_cancel.cancelled() => break 'dispatch,
            item = lrx.recv(), if !left_done => {
                match item {
                    Some(t) => Side::Left(t),
                    None => { left_done = true; continue 'dispatch; }
                }
            }
            item = rrx.recv(), if !right_done => {
                match item {
                    Some(t) => Side::Right(t),
                    None => { right_done = true; continue 'dispatch; }
                }
            }
        };
        let key = match &side {
            Side::Left(t) => key_of(t, &left_key_idx),
            Side::Right(t) => key_of(t, &right_key_idx),
        };
        let p = partition_of(&key, width);
        if partition_txs[p].send(side).await.is_err() {
            break;
        }
    }
    partition_txs.clear();
    for h in handles {
        let _ = h.await;
    }
    this.latch_from(&node.left);
    this.latch_from(&node.right);
}

async fn partition_worker(
    mut rx: mpsc::Receiver<Side>,
    tx: mpsc::Sender<Tuple>,
    cancel: CancelHandle,
    left_key_idx: Arc<[usize]>,
    right_key_idx: Arc<[usize]>,
    right_extra_idx: Arc<[usize]>,
    out_heading: Heading,
) {
    let mut left_index: HashMap<Vec<Value>, Vec<Tuple>> = HashMap::new();
    let mut right_index: HashMap<Vec<Value>, Vec<Tuple>> = HashMap::new();
    loop {
        let item = tokio::select! {
            _ = cancel.cancelled() => break,
            item = rx.recv() => item,
        };
        let Some(side) = item else { break };
        match side {
            Side::Left(t) => {
                let key = key_of(&t, &left_key_idx);
                let matches = right_index.get(&key).cloned().unwrap_or_default();
                left_index.entry(key).or_default().push(t.clone());
                for r in matches {
                    let combined = combine_tuples(&t, &r, &right_extra_idx, out_heading.clone());
                    if send_or_stop(&tx, &cancel, combined).await {
                        return;
                    }
                }
            }
            Side::Right(t) => {
                let key = key_of(&t, &right_key_idx);
                let matches = left_index.get(&key).cloned().unwrap_or_default();
                right_index.entry(key.clone()).or_default().push(t.clone());
                for l in matches {
                    let combined = combine_tuples(&l, &t, &right_extra_idx, out_heading.clone());
                    if send_or_stop(&tx, &cancel, combined).await {
                        return;
                    }
                }
            }
        }
    }
}

async fn send_or_stop(tx: &mpsc::Sender<Tuple>, cancel: &CancelHandle, t: Tuple) -> bool {
    let sent = tokio::select! {
        _ = cancel.cancelled() => return true,
        res = tx.send(t) => res,
    };
    sent.is_err()
}
