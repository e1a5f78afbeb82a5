//! .GroupBy(...) — partition by a key, fold each partition independently (`spec.md` §4.11).
//!
//! Each distinct group key gets its own one-shot channel and fold task the moment its
//! first tuple arrives, via a `DashMap<key, Sender>`. A fold task drains its channel to
//! a `Vec<Tuple>`, invokes the user fold once that channel has closed, and emits the
//! combined (key ++ fold result) tuple — so distinct groups fold fully concurrently,
//! and a fold only ever runs once its group's input is known complete.

use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::cancel::CancelHandle;
use crate::error::{Error, Result};
use crate::heading::{Attribute, Heading};
use crate::keys::CandidateKeys;
use crate::relation::{empty_keys, inherited_err, Kind, Relation};
use crate::tuple::Tuple;
use crate::value::{DataType, Value};

pub(crate) type FoldFn = Arc<dyn Fn(&[Tuple]) -> Result<Tuple> + Send + Sync>;

#[derive(Clone)]
pub(crate) struct GroupByNode {
    pub(crate) source: Relation,
    pub(crate) group_idx: Arc<[usize]>,
    pub(crate) value_idx: Arc<[usize]>,
    pub(crate) value_heading: Heading,
    pub(crate) group_heading: Heading,
    pub(crate) result_heading: Heading,
    pub(crate) out_heading: Heading,
    pub(crate) fold: FoldFn,
}

pub(crate) fn build(
    source: &Relation,
    group_attrs: Vec<String>,
    result_heading: Vec<(String, DataType)>,
    fold: FoldFn,
) -> Relation {
    let label = format!(".GroupBy({})({})", group_attrs.join(","), source.text());

    if let Some(e) = inherited_err(&[source]) {
        return errored(source, &fold, label, e);
    }

    let missing: Vec<String> = group_attrs
        .iter()
        .filter(|n| !source.heading().contains_name(n))
        .cloned()
        .collect();
    if !missing.is_empty() {
        let e = Arc::new(Error::Domain {
            heading: source.heading().to_string(),
            missing,
        });
        return errored(source, &fold, label, e);
    }

    let group_idx: Vec<usize> = group_attrs
        .iter()
        .map(|n| source.heading().index_of(n).expect("checked above"))
        .collect();
    let value_idx: Vec<usize> = source
        .heading()
        .attrs()
        .iter()
        .enumerate()
        .filter(|(_, a)| !group_attrs.iter().any(|g| g == a.name.as_ref()))
        .map(|(i, _)| i)
        .collect();

    let group_attrs_typed: Vec<Attribute> = group_idx
        .iter()
        .map(|&i| source.heading().attrs()[i].clone())
        .collect();
    let value_attrs: Vec<Attribute> = value_idx
        .iter()
        .map(|&i| source.heading().attrs()[i].clone())
        .collect();
    let value_heading = match Heading::new(value_attrs) {
        Ok(h) => h,
        Err(e) => return errored(source, &fold, label, Arc::new(e)),
    };
    let group_heading = match Heading::new(group_attrs_typed.clone()) {
        Ok(h) => h,
        Err(e) => return errored(source, &fold, label, Arc::new(e)),
    };
    let result_attrs: Vec<Attribute> = result_heading
        .into_iter()
        .map(|(n, t)| Attribute::new(n, t))
        .collect();
    let result_heading_built = match Heading::new(result_attrs.clone()) {
        Ok(h) => h,
        Err(e) => return errored(source, &fold, label, Arc::new(e)),
    };
    let mut out_attrs = group_attrs_typed;
    out_attrs.extend(result_attrs);
    let out_heading = match Heading::new(out_attrs) {
        Ok(h) => h,
        Err(e) => return errored(source, &fold, label, Arc::new(e)),
    };

    // Every source key that is a subset of the group key survives unchanged — in
    // that case group-by degenerates to a map, and the smaller source key is the
    // minimal candidate key, not the full group key (`spec.md` §4.11). Only when
    // none survive does the group key itself become the sole candidate key.
    let group_names: std::collections::HashSet<&str> = group_attrs.iter().map(String::as_str).collect();
    let surviving = source.candidate_keys().keys_surviving(&group_names);
    let keys = if surviving.is_empty() {
        CandidateKeys::single(group_attrs.iter().map(|n| Arc::from(n.as_str())).collect())
    } else {
        CandidateKeys::from_keys(surviving)
    };

    Relation::new(
        Kind::GroupBy(GroupByNode {
            source: source.clone(),
            group_idx: Arc::from(group_idx),
            value_idx: Arc::from(value_idx),
            value_heading,
            group_heading,
            result_heading: result_heading_built,
            out_heading: out_heading.clone(),
            fold,
        }),
        out_heading,
        keys,
        label,
    )
}

fn errored(source: &Relation, fold: &FoldFn, label: String, e: Arc<Error>) -> Relation {
    Relation::new_errored(
        Kind::GroupBy(GroupByNode {
            source: source.clone(),
            group_idx: Arc::from(Vec::new()),
            value_idx: Arc::from(Vec::new()),
            value_heading: Heading::empty(),
            group_heading: Heading::empty(),
            result_heading: Heading::empty(),
            out_heading: Heading::empty(),
            fold: fold.clone(),
        }),
        Heading::empty(),
        empty_keys(),
        label,
        e,
    )
}

#[tracing::instrument(skip_all)]
pub(crate) async fn spawn(
    this: &Relation,
    node: GroupByNode,
    tx: mpsc::Sender<Tuple>,
    cancel: CancelHandle,
    capacity: usize,
    width: usize,
) {
    let child_cancel = cancel.child();
    let mut rx = node.source.spawn(child_cancel, capacity, width);

    let groups: Arc<DashMap<Vec<Value>, mpsc::Sender<Tuple>>> = Arc::new(DashMap::new());
    let handles: Arc<Mutex<Vec<JoinHandle<()>>>> = Arc::new(Mutex::new(Vec::new()));

    loop {
        let item = tokio::select! {
            _ = cancel.cancelled() => break,
            item = rx.recv() => item,
        };
        let Some(t) = item else { break };
        let key: Vec<Value> = node.group_idx.iter().map(|&i| t.values()[i].clone()).collect();
        let value_tuple = t.select(&node.value_idx, node.value_heading.clone());

        let sender = groups
            .entry(key.clone())
            .or_insert_with(|| {
                let (gtx, grx) = mpsc::channel::<Tuple>(capacity);
                let handle = tokio::spawn(fold_group(
                    grx,
                    key.clone(),
                    node.group_heading.clone(),
                    node.result_heading.clone(),
                    node.out_heading.clone(),
                    node.fold.clone(),
                    tx.clone(),
                    cancel.clone(),
                    this.clone(),
                ));
                handles.lock().expect("handles mutex poisoned").push(handle);
                gtx
            })
            .clone();

        let sent = tokio::select! {
            _ = cancel.cancelled() => break,
            res = sender.send(value_tuple) => res,
        };
        if sent.is_err() {
            // Fold task for this group already gave up (e.g. latched an error).
            continue;
        }
    }
    groups.clear();
    drop(groups);

    tracing::debug!(groups = handles.lock().expect("handles mutex poisoned").len(), "source exhausted, draining fold tasks");
    let handles = std::mem::take(&mut *handles.lock().expect("handles mutex poisoned"));
    for h in handles {
        let _ = h.await;
    }
    this.latch_from(&node.source);
}

#[allow(clippy::too_many_arguments)]
async fn fold_group(
    mut rx: mpsc::Receiver<Tuple>,
    key: Vec<Value>,
    group_heading: Heading,
    result_heading: Heading,
    out_heading: Heading,
    fold: FoldFn,
    tx: mpsc::Sender<Tuple>,
    cancel: CancelHandle,
    this: Relation,
) {
    let mut values = Vec::new();
    loop {
        let item = tokio::select! {
            _ = cancel.cancelled() => return,
            item = rx.recv() => item,
        };
        match item {
            Some(t) => values.push(t),
            None => break,
        }
    }
    let result = match fold(&values) {
        Ok(t) => t,
        Err(e) => {
            this.latch(Arc::new(e));
            return;
        }
    };
    if result.heading() != &result_heading {
        this.latch(Arc::new(Error::HeadingMismatch {
            left: result_heading.to_string(),
            right: result.heading().to_string(),
        }));
        return;
    }
    let mut out_values = key;
    // `group_heading` isn't used for anything but documents the key's type pairing.
    let _ = &group_heading;
    out_values.extend(result.values().iter().cloned());
    let combined = Tuple::new_unchecked(out_heading, out_values);
    let _ = tokio::select! {
        _ = cancel.cancelled() => return,
        res = tx.send(combined) => res,
    };
}
