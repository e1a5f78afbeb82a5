//! π — projection onto a subset of attributes (`spec.md` §4.5).

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::cancel::CancelHandle;
use crate::keys::CandidateKeys;
use crate::relation::{empty_keys, inherited_err, Kind, Relation};
use crate::tuple::Tuple;

#[derive(Clone)]
pub(crate) struct ProjectNode {
    pub(crate) source: Relation,
    pub(crate) index_map: Arc<[usize]>,
    pub(crate) out_heading: crate::heading::Heading,
    /// Whether no source candidate key survived projection, so distinctness must be
    /// re-established at evaluation time rather than inherited (`spec.md` §4.5).
    pub(crate) dedup: bool,
}

impl ProjectNode {
    pub(crate) fn target_names(&self) -> Vec<String> {
        self.out_heading.names().map(str::to_string).collect()
    }
}

pub(crate) fn build(source: &Relation, target: Vec<String>) -> Relation {
    if let Some(e) = inherited_err(&[source]) {
        let label = format!("π_{{{}}}({})", target.join(","), source.text());
        return Relation::new_errored(
            Kind::Project(ProjectNode {
                source: source.clone(),
                index_map: Arc::from(Vec::new()),
                out_heading: crate::heading::Heading::empty(),
                dedup: false,
            }),
            crate::heading::Heading::empty(),
            empty_keys(),
            label,
            e,
        );
    }

    // π_A(π_B(R)) = π_A(R): fuse consecutive projections rather than nesting nodes.
    // Only valid when A ⊆ B — otherwise the fused build would validate A against
    // R's (possibly wider) heading instead of B's, silently accepting an A that
    // should have been rejected as not a subset of B.
    if let Kind::Project(inner) = &source.0.kind {
        if target.iter().all(|n| source.heading().contains_name(n)) {
            return build(&inner.source, target);
        }
    }

    // π_A(R ∪ S) = π_A(R) ∪ π_A(S) (`spec.md` §4.8), applied only when A leaves at
    // least one surviving candidate key on both sides — otherwise each branch would
    // need its own fresh dedup pass whose result need not match deduplicating the
    // union as a whole.
    if let Kind::Union(inner) = &source.0.kind {
        let target_names: HashSet<&str> = target.iter().map(String::as_str).collect();
        let left_survives = !inner.left.candidate_keys().keys_surviving(&target_names).is_empty();
        let right_survives = !inner.right.candidate_keys().keys_surviving(&target_names).is_empty();
        if left_survives && right_survives {
            let l = build(&inner.left, target.clone());
            let r = build(&inner.right, target);
            return super::union::build(&l, &r);
        }
    }

    let label = format!("π_{{{}}}({})", target.join(","), source.text());
    let out_heading = match source.heading().project(&target) {
        Ok(h) => h,
        Err(e) => {
            return Relation::new_errored(
                Kind::Project(ProjectNode {
                    source: source.clone(),
                    index_map: Arc::from(Vec::new()),
                    out_heading: crate::heading::Heading::empty(),
                    dedup: false,
                }),
                crate::heading::Heading::empty(),
                empty_keys(),
                label,
                Arc::new(e),
            );
        }
    };
    let index_map: Vec<usize> = target
        .iter()
        .map(|n| source.heading().index_of(n).expect("validated by project()"))
        .collect();

    let target_names: HashSet<&str> = target.iter().map(String::as_str).collect();
    let surviving = source.candidate_keys().keys_surviving(&target_names);
    let (keys, dedup) = if surviving.is_empty() {
        (CandidateKeys::full(&out_heading), true)
    } else {
        (CandidateKeys::from_keys(surviving), false)
    };

    Relation::new(
        Kind::Project(ProjectNode {
            source: source.clone(),
            index_map: Arc::from(index_map),
            out_heading: out_heading.clone(),
            dedup,
        }),
        out_heading,
        keys,
        label,
    )
}

pub(crate) async fn spawn(
    this: &Relation,
    node: ProjectNode,
    tx: mpsc::Sender<Tuple>,
    cancel: CancelHandle,
    capacity: usize,
    width: usize,
) {
    let out_heading = this.heading().clone();
    let child_cancel = cancel.child();
    let mut rx = node.source.spawn(child_cancel, capacity, width);

    let mut seen: Option<std::collections::HashSet<Tuple>> =
        node.dedup.then(std::collections::HashSet::new);

    loop {
        let item = tokio::select! {
            _ = cancel.cancelled() => break,
            item = rx.recv() => item,
        };
        let Some(t) = item else { break };
        let projected = t.select(&node.index_map, out_heading.clone());
        if let Some(seen) = seen.as_mut() {
            if !seen.insert(projected.clone()) {
                continue;
            }
        }
        let sent = tokio::select! {
            _ = cancel.cancelled() => break,
            res = tx.send(projected) => res,
        };
        if sent.is_err() {
            break;
        }
    }
    this.latch_from(&node.source);
}
