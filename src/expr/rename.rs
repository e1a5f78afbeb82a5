//! ρ — rename, a purely positional relabeling of the heading (`spec.md` §4.7).
//!
//! Because `Tuple` equality and hashing are defined over values alone (not the
//! heading, see `tuple.rs`), relabeling a heading can never collapse or introduce
//! duplicates — the stream just reattaches a new heading to each tuple unchanged.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::cancel::CancelHandle;
use crate::error::Error;
use crate::heading::{Attribute, Heading};
use crate::relation::{empty_keys, inherited_err, Kind, Relation};
use crate::tuple::Tuple;

#[derive(Clone)]
pub(crate) struct RenameNode {
    pub(crate) source: Relation,
    pub(crate) out_heading: Heading,
    pub(crate) mapping: Arc<HashMap<Arc<str>, Arc<str>>>,
}

impl RenameNode {
    pub(crate) fn target_names(&self) -> Vec<String> {
        self.out_heading.names().map(str::to_string).collect()
    }

    pub(crate) fn inverse_mapping(&self) -> HashMap<Arc<str>, Arc<str>> {
        self.mapping
            .iter()
            .map(|(old, new)| (new.clone(), old.clone()))
            .collect()
    }
}

pub(crate) fn build(source: &Relation, target_names: Vec<String>) -> Relation {
    // ρ_C(ρ_B(R)) = ρ_C(R): a rename of a rename only depends on the original names.
    if let Kind::Rename(inner) = &source.0.kind {
        return build(&inner.source, target_names);
    }

    let label = format!("ρ_{{{}}}({})", target_names.join(","), source.text());

    if let Some(e) = inherited_err(&[source]) {
        return errored(source, label, e);
    }

    // ρ distributes through union, difference, and both sides of join (`spec.md`
    // §4.7). All three require the rename's degree to already match; if it doesn't,
    // fall through so the mismatch is reported the normal way instead of panicking
    // on an out-of-bounds split below.
    if target_names.len() == source.heading().degree() {
        if let Kind::Union(inner) = &source.0.kind {
            let l = build(&inner.left, target_names.clone());
            let r = build(&inner.right, target_names);
            return super::union::build(&l, &r);
        }

        if let Kind::Difference(inner) = &source.0.kind {
            let l = build(&inner.left, target_names.clone());
            let r = build(&inner.right, target_names);
            return super::difference::build(&l, &r);
        }

        if let Kind::Join(inner) = &source.0.kind {
            let left_degree = inner.left.heading().degree();
            let left_targets = target_names[..left_degree].to_vec();
            let right_extra_targets = &target_names[left_degree..];

            // Shared attributes must keep the same new name on both sides so the
            // join key still lines up after the rename (`spec.md` §4.10: "renames
            // distribute componentwise, after remapping shared attributes").
            let mut right_targets = vec![String::new(); inner.right.heading().degree()];
            for (pos, &right_idx) in inner.right_key_idx.iter().enumerate() {
                let left_idx = inner.left_key_idx[pos];
                right_targets[right_idx] = left_targets[left_idx].clone();
            }
            for (pos, &right_idx) in inner.right_extra_idx.iter().enumerate() {
                right_targets[right_idx] = right_extra_targets[pos].clone();
            }

            let l = build(&inner.left, left_targets);
            let r = build(&inner.right, right_targets);
            return super::join::build(&l, &r);
        }
    }

    if target_names.len() != source.heading().degree() {
        let e = Arc::new(Error::DegreeMismatch {
            source_degree: source.heading().degree(),
            target_degree: target_names.len(),
        });
        return errored(source, label, e);
    }

    let mapping: HashMap<Arc<str>, Arc<str>> = source
        .heading()
        .attrs()
        .iter()
        .zip(target_names.iter())
        .map(|(a, new)| (a.name.clone(), Arc::from(new.as_str())))
        .collect();

    let out_attrs: Vec<Attribute> = source
        .heading()
        .attrs()
        .iter()
        .zip(target_names.iter())
        .map(|(a, new)| Attribute::new(new.as_str(), a.ty))
        .collect();
    let out_heading = match Heading::new(out_attrs) {
        Ok(h) => h,
        Err(e) => return errored(source, label, Arc::new(e)),
    };

    let keys = source.candidate_keys().rename(&mapping);

    Relation::new(
        Kind::Rename(RenameNode {
            source: source.clone(),
            out_heading: out_heading.clone(),
            mapping: Arc::new(mapping),
        }),
        out_heading,
        keys,
        label,
    )
}

fn errored(source: &Relation, label: String, e: Arc<Error>) -> Relation {
    Relation::new_errored(
        Kind::Rename(RenameNode {
            source: source.clone(),
            out_heading: Heading::empty(),
            mapping: Arc::new(HashMap::new()),
        }),
        Heading::empty(),
        empty_keys(),
        label,
        e,
    )
}

pub(crate) async fn spawn(
    this: &Relation,
    node: RenameNode,
    tx: mpsc::Sender<Tuple>,
    cancel: CancelHandle,
    capacity: usize,
    width: usize,
) {
    let out_heading = node.out_heading.clone();
    let child_cancel = cancel.child();
    let mut rx = node.source.spawn(child_cancel, capacity, width);

    loop {
        let item = tokio::select! {
            _ = cancel.cancelled() => break,
            item = rx.recv() => item,
        };
        let Some(t) = item else { break };
        let renamed = t.with_heading(out_heading.clone());
        let sent = tokio::select! {
            _ = cancel.cancelled() => break,
            res = tx.send(renamed) => res,
        };
        if sent.is_err() {
            break;
        }
    }
    this.latch_from(&node.source);
}
