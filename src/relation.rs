//! The `Relation` contract (`spec.md` §4.1) and the expression-tree node it's built on.
//!
//! A [`Relation`] is a cheap handle (`Arc`-backed) to a node of the expression tree.
//! Construction computes heading and candidate keys synchronously and never returns a
//! `Result` to the caller — a construction failure instead latches an error on the
//! node and the node behaves like an empty relation from then on (`spec.md` §7, §9:
//! "fluent composition without paired error returns").

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::cancel::CancelHandle;
use crate::config::EngineConfig;
use crate::error::LatchedError;
use crate::expr::{difference, groupby, join, map, project, rename, restrict, union};
use crate::expr::{
    difference::DifferenceNode, groupby::GroupByNode, join::JoinNode, map::MapNode,
    project::ProjectNode, rename::RenameNode, restrict::RestrictNode, union::UnionNode,
};
use crate::heading::Heading;
use crate::keys::CandidateKeys;
use crate::predicate::Predicate;
use crate::source::{sequence, set, stream};
use crate::tuple::Tuple;

pub(crate) enum Kind {
    Sequence(Vec<Tuple>),
    Set(Vec<Tuple>),
    StreamSource(stream::StreamSourceState),
    Project(ProjectNode),
    Restrict(RestrictNode),
    Rename(RenameNode),
    Union(UnionNode),
    Difference(DifferenceNode),
    Join(JoinNode),
    GroupBy(GroupByNode),
    Map(MapNode),
}

impl Clone for Kind {
    fn clone(&self) -> Self {
        match self {
            Kind::Sequence(t) => Kind::Sequence(t.clone()),
            Kind::Set(t) => Kind::Set(t.clone()),
            Kind::StreamSource(s) => Kind::StreamSource(s.clone()),
            Kind::Project(n) => Kind::Project(n.clone()),
            Kind::Restrict(n) => Kind::Restrict(n.clone()),
            Kind::Rename(n) => Kind::Rename(n.clone()),
            Kind::Union(n) => Kind::Union(n.clone()),
            Kind::Difference(n) => Kind::Difference(n.clone()),
            Kind::Join(n) => Kind::Join(n.clone()),
            Kind::GroupBy(n) => Kind::GroupBy(n.clone()),
            Kind::Map(n) => Kind::Map(n.clone()),
        }
    }
}

pub(crate) struct Node {
    pub(crate) kind: Kind,
    heading: Heading,
    keys: CandidateKeys,
    err: Mutex<Option<LatchedError>>,
    label: String,
}

/// A node of the relational expression tree: a duplicate-free set of tuples sharing
/// one heading, plus candidate keys and a possibly-latched first error (`spec.md` §3).
#[derive(Clone)]
pub struct Relation(pub(crate) Arc<Node>);

/// What a streamed relation hands back: the tuple receiver and a handle the caller
/// can close to cancel the pipeline (`spec.md` §4.1, §5).
pub struct RelStream {
    pub rx: mpsc::Receiver<Tuple>,
    pub cancel: CancelHandle,
}

pub(crate) fn empty_keys() -> CandidateKeys {
    CandidateKeys::from_keys(Vec::new())
}

/// Pick the first latched error among `sources`, left-preferred (`spec.md` §7).
pub(crate) fn inherited_err(sources: &[&Relation]) -> Option<LatchedError> {
    sources.iter().find_map(|r| r.err())
}

impl Relation {
    pub(crate) fn new(kind: Kind, heading: Heading, keys: CandidateKeys, label: String) -> Self {
        Relation(Arc::new(Node {
            kind,
            heading,
            keys,
            err: Mutex::new(None),
            label,
        }))
    }

    pub(crate) fn new_errored(
        kind: Kind,
        heading: Heading,
        keys: CandidateKeys,
        label: String,
        err: LatchedError,
    ) -> Self {
        Relation(Arc::new(Node {
            kind,
            heading,
            keys,
            err: Mutex::new(Some(err)),
            label,
        }))
    }

    pub fn heading(&self) -> &Heading {
        &self.0.heading
    }

    pub fn candidate_keys(&self) -> &CandidateKeys {
        &self.0.keys
    }

    pub fn err(&self) -> Option<LatchedError> {
        self.0.err.lock().clone()
    }

    pub fn text(&self) -> &str {
        &self.0.label
    }

    /// Record `err` as this node's first error, unless one is already latched.
    pub(crate) fn latch(&self, err: LatchedError) {
        let mut guard = self.0.err.lock();
        if guard.is_none() {
            *guard = Some(err);
        }
    }

    /// After an upstream's stream has closed, adopt its error if we don't have one
    /// yet (`spec.md` §7: "a source's terminal error is read after the source closes
    /// and assigned to the node's error before the node closes its own sink").
    pub(crate) fn latch_from(&self, upstream: &Relation) {
        if self.err().is_none() {
            if let Some(e) = upstream.err() {
                self.latch(e);
            }
        }
    }

    /// Begin streaming with default engine configuration.
    pub fn stream(&self) -> RelStream {
        self.stream_with(&EngineConfig::default())
    }

    pub fn stream_with(&self, config: &EngineConfig) -> RelStream {
        let cancel = CancelHandle::new();
        let rx = self.spawn(cancel.clone(), config.channel_capacity, config.resolved_worker_width());
        RelStream { rx, cancel }
    }

    /// Internal entry point used both by the top-level `stream()` and by every
    /// operator to pull tuples from its own source(s).
    pub(crate) fn spawn(&self, cancel: CancelHandle, capacity: usize, width: usize) -> mpsc::Receiver<Tuple> {
        let (tx, rx) = mpsc::channel(capacity);
        if let Some(e) = self.err() {
            // A node with a latched error closes its sink immediately and spawns no
            // producers (`spec.md` §7) — dropping `tx` here does exactly that.
            tracing::debug!(error = %e, label = %self.text(), "skipping spawn of already-errored node");
            return rx;
        }
        let this = self.clone();
        let kind = self.0.kind.clone();
        let span = tracing::debug_span!("relation.spawn", label = %self.text());
        tokio::spawn(async move {
            let _enter = span.enter();
            match kind {
                Kind::Sequence(tuples) => sequence::spawn(tuples, tx, cancel).await,
                Kind::Set(tuples) => set::spawn(tuples, tx, cancel).await,
                Kind::StreamSource(state) => stream::spawn(&this, state, tx, cancel).await,
                Kind::Project(n) => project::spawn(&this, n, tx, cancel, capacity, width).await,
                Kind::Restrict(n) => restrict::spawn(&this, n, tx, cancel, capacity, width).await,
                Kind::Rename(n) => rename::spawn(&this, n, tx, cancel, capacity, width).await,
                Kind::Union(n) => union::spawn(&this, n, tx, cancel, capacity, width).await,
                Kind::Difference(n) => difference::spawn(&this, n, tx, cancel, capacity, width).await,
                Kind::Join(n) => join::spawn(&this, n, tx, cancel, capacity, width).await,
                Kind::GroupBy(n) => groupby::spawn(&this, n, tx, cancel, capacity, width).await,
                Kind::Map(n) => map::spawn(&this, n, tx, cancel, capacity, width).await,
            }
        });
        rx
    }

    // ---- operator methods (spec.md §4.5 - §4.12), documented on their modules ----

    pub fn project(&self, target: Vec<String>) -> Relation {
        project::build(self, target)
    }

    pub fn restrict(&self, predicate: Predicate) -> Relation {
        restrict::build(self, predicate)
    }

    pub fn rename(&self, target_names: Vec<String>) -> Relation {
        rename::build(self, target_names)
    }

    pub fn union(&self, other: &Relation) -> Relation {
        union::build(self, other)
    }

    pub fn difference(&self, other: &Relation) -> Relation {
        difference::build(self, other)
    }

    pub fn join(&self, other: &Relation) -> Relation {
        join::build(self, other)
    }

    pub fn group_by(
        &self,
        group_attrs: Vec<String>,
        result_heading: Vec<(String, crate::value::DataType)>,
        fold: impl Fn(&[Tuple]) -> crate::error::Result<Tuple> + Send + Sync + 'static,
    ) -> Relation {
        groupby::build(self, group_attrs, result_heading, Arc::new(fold))
    }

    pub fn map(
        &self,
        output_heading: Vec<(String, crate::value::DataType)>,
        transform: impl Fn(&Tuple) -> crate::error::Result<Vec<crate::value::Value>> + Send + Sync + 'static,
        keys: Option<Vec<Vec<String>>>,
    ) -> Relation {
        map::build(self, output_heading, Arc::new(transform), keys)
    }

    // ---- source constructors (spec.md §4.2 - §4.4) ----

    pub fn from_sequence(name: impl Into<String>, heading: Heading, tuples: Vec<Tuple>, keys: Option<Vec<Vec<String>>>) -> Relation {
        sequence::build(name.into(), heading, tuples, keys)
    }

    pub fn from_set(name: impl Into<String>, heading: Heading, tuples: std::collections::HashSet<Tuple>, keys: Option<Vec<Vec<String>>>) -> Relation {
        set::build(name.into(), heading, tuples, keys)
    }

    pub fn from_stream(
        name: impl Into<String>,
        heading: Heading,
        upstream: mpsc::Receiver<crate::error::Result<Tuple>>,
        source_distinct: bool,
        keys: Option<Vec<Vec<String>>>,
    ) -> Relation {
        stream::build(name.into(), heading, upstream, source_distinct, keys)
    }
}

/// The degree (heading size) of `r` (`spec.md` §6).
pub fn degree(r: &Relation) -> usize {
    r.heading().degree()
}

/// Drain `r`'s stream and count its tuples (`spec.md` §6). Ignores `r.err()` — callers
/// that need to know whether the drain was complete should check `r.err()` themselves
/// after this returns.
pub async fn cardinality(r: &Relation) -> usize {
    let mut s = r.stream();
    let mut n = 0usize;
    while s.rx.recv().await.is_some() {
        n += 1;
    }
    n
}
