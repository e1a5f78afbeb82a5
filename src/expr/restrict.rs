//! σ — restriction (selection) by a predicate (`spec.md` §4.6).
//!
//! Construction applies the push-down rewrites named in `spec.md` §4.6 before ever
//! allocating a `Restrict` node: restricts fuse into a conjunction, commute under
//! project and rename, and distribute into union/difference and into whichever side
//! of a join holds the predicate's whole domain.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::cancel::CancelHandle;
use crate::error::Error;
use crate::predicate::Predicate;
use crate::relation::{empty_keys, inherited_err, Kind, Relation};
use crate::tuple::Tuple;

#[derive(Clone)]
pub(crate) struct RestrictNode {
    pub(crate) source: Relation,
    pub(crate) predicate: Arc<Predicate>,
}

pub(crate) fn build(source: &Relation, predicate: Predicate) -> Relation {
    if let Some(e) = inherited_err(&[source]) {
        let label = format!("σ_{{...}}({})", source.text());
        return errored(source, predicate, label, e);
    }

    if let Err(e) = predicate.check_against(source.heading()) {
        let label = format!("σ_{{...}}({})", source.text());
        return errored(source, predicate, label, Arc::new(e));
    }

    // σ_p1(σ_p2(R)) = σ_{p1 ∧ p2}(R)
    if let Kind::Restrict(inner) = &source.0.kind {
        let fused = Predicate::and((*inner.predicate).clone(), predicate);
        return build(&inner.source, fused);
    }

    // σ_p(π_A(R)) = π_A(σ_p(R)) — p's domain is a subset of A by construction.
    if let Kind::Project(inner) = &source.0.kind {
        let pushed = build(&inner.source, predicate);
        return super::project::build(&pushed, inner.target_names());
    }

    // σ_p(ρ_target(R)) = ρ_target(σ_{p renamed back}(R))
    if let Kind::Rename(inner) = &source.0.kind {
        let back = predicate.renamed(&inner.inverse_mapping());
        let pushed = build(&inner.source, back);
        return super::rename::build(&pushed, inner.target_names());
    }

    // σ_p(R ∪ S) = σ_p(R) ∪ σ_p(S)
    if let Kind::Union(inner) = &source.0.kind {
        let l = build(&inner.left, predicate.clone());
        let r = build(&inner.right, predicate);
        return super::union::build(&l, &r);
    }

    // σ_p(R − S) = σ_p(R) − σ_p(S)
    if let Kind::Difference(inner) = &source.0.kind {
        let l = build(&inner.left, predicate.clone());
        let r = build(&inner.right, predicate);
        return super::difference::build(&l, &r);
    }

    // σ_p(R ⋈ S) pushes wholesale into whichever side carries p's entire domain.
    if let Kind::Join(inner) = &source.0.kind {
        let domain = predicate.domain();
        let left_names: std::collections::HashSet<&str> = inner.left.heading().names().collect();
        let right_names: std::collections::HashSet<&str> = inner.right.heading().names().collect();
        if domain.iter().all(|n| left_names.contains(n.as_ref())) {
            let l = build(&inner.left, predicate);
            return super::join::build(&l, &inner.right);
        }
        if domain.iter().all(|n| right_names.contains(n.as_ref())) {
            let r = build(&inner.right, predicate);
            return super::join::build(&inner.left, &r);
        }
    }

    let label = format!("σ_{{...}}({})", source.text());
    Relation::new(
        Kind::Restrict(RestrictNode {
            source: source.clone(),
            predicate: Arc::new(predicate),
        }),
        source.heading().clone(),
        source.candidate_keys().clone(),
        label,
    )
}

fn errored(source: &Relation, predicate: Predicate, label: String, e: Arc<Error>) -> Relation {
    Relation::new_errored(
        Kind::Restrict(RestrictNode {
            source: source.clone(),
            predicate: Arc::new(predicate),
        }),
        crate::heading::Heading::empty(),
        empty_keys(),
        label,
        e,
    )
}

pub(crate) async fn spawn(
    this: &Relation,
    node: RestrictNode,
    tx: mpsc::Sender<Tuple>,
    cancel: CancelHandle,
    capacity: usize,
    width: usize,
) {
    let child_cancel = cancel.child();
    let rx = node.source.spawn(child_cancel, capacity, width);
    let rx = Arc::new(tokio::sync::Mutex::new(rx));

    let mut handles = Vec::with_capacity(width.max(1));
    for _ in 0..width.max(1) {
        let rx = Arc::clone(&rx);
        let tx = tx.clone();
        let cancel = cancel.clone();
        let predicate = Arc::clone(&node.predicate);
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
                match predicate.eval(&t) {
                    Ok(true) => {
                        let sent = tokio::select! {
                            _ = cancel.cancelled() => break,
                            res = tx.send(t) => res,
                        };
                        if sent.is_err() {
                            break;
                        }
                    }
                    Ok(false) => continue,
                    Err(e) => {
                        this.latch(Arc::new(e));
                        break;
                    }
                }
            }
        }));
    }
    for h in handles {
        let _ = h.await;
    }
    drop(tx);
    this.latch_from(&node.source);
}
