//! A relation fed by a caller-driven channel of tuple results (`spec.md` §4.4).
//!
//! Unlike `sequence`/`set`, this source is stateful: the upstream `Receiver` can only
//! be drained once, so the node holds it behind a `Mutex<Option<_>>` and `spawn` takes
//! it out on first use. A second `stream()` call on the same node finds it already
//! taken and latches an error instead of silently returning nothing.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::cancel::CancelHandle;
use crate::error::{Error, Result};
use crate::heading::Heading;
use crate::keys::CandidateKeys;
use crate::relation::{Kind, Relation};
use crate::source::sequence::resolve_keys;
use crate::tuple::Tuple;

pub(crate) struct StreamSourceState {
    inner: Arc<Mutex<Option<mpsc::Receiver<Result<Tuple>>>>>,
    source_distinct: bool,
}

impl Clone for StreamSourceState {
    fn clone(&self) -> Self {
        StreamSourceState {
            inner: Arc::clone(&self.inner),
            source_distinct: self.source_distinct,
        }
    }
}

pub(crate) fn build(
    name: String,
    heading: Heading,
    upstream: mpsc::Receiver<Result<Tuple>>,
    source_distinct: bool,
    keys: Option<Vec<Vec<String>>>,
) -> Relation {
    let keys = resolve_keys(&heading, keys);
    let state = StreamSourceState {
        inner: Arc::new(Mutex::new(Some(upstream))),
        source_distinct,
    };
    Relation::new(Kind::StreamSource(state), heading, keys, name)
}

#[tracing::instrument(skip_all)]
pub(crate) async fn spawn(
    this: &Relation,
    state: StreamSourceState,
    tx: mpsc::Sender<Tuple>,
    cancel: CancelHandle,
) {
    let mut upstream = match state.inner.lock().take() {
        Some(rx) => rx,
        None => {
            tracing::warn!("stream source already consumed by an earlier stream() call");
            this.latch(Arc::new(Error::Upstream(
                "stream source consumed by an earlier stream() call".into(),
            )));
            return;
        }
    };
    let heading = this.heading().clone();
    let mut seen: HashSet<Tuple> = HashSet::new();
    loop {
        let item = tokio::select! {
            _ = cancel.cancelled() => return,
            item = upstream.recv() => item,
        };
        let Some(item) = item else { return };
        match item {
            Ok(tuple) => {
                if tuple.heading() != &heading {
                    this.latch(Arc::new(Error::HeadingMismatch {
                        left: heading.to_string(),
                        right: tuple.heading().to_string(),
                    }));
                    return;
                }
                if !state.source_distinct {
                    if !seen.insert(tuple.clone()) {
                        continue;
                    }
                }
                let sent = tokio::select! {
                    _ = cancel.cancelled() => return,
                    res = tx.send(tuple) => res,
                };
                if sent.is_err() {
                    return;
                }
            }
            Err(e) => {
                this.latch(Arc::new(e));
                return;
            }
        }
    }
}
