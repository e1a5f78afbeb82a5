//! A relation built directly from a native `HashSet` of tuples (`spec.md` §4.3) —
//! distinctness holds by construction, since `HashSet` cannot hold duplicates.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::cancel::CancelHandle;
use crate::error::Error;
use crate::heading::Heading;
use crate::keys::CandidateKeys;
use crate::relation::{Kind, Relation};
use crate::source::sequence::resolve_keys;
use crate::tuple::Tuple;

pub(crate) fn build(
    name: String,
    heading: Heading,
    tuples: HashSet<Tuple>,
    keys: Option<Vec<Vec<String>>>,
) -> Relation {
    let tuples: Vec<Tuple> = tuples.into_iter().collect();
    if let Some(bad) = tuples.iter().find(|t| t.heading() != &heading) {
        let err = Arc::new(Error::HeadingMismatch {
            left: heading.to_string(),
            right: bad.heading().to_string(),
        });
        return Relation::new_errored(
            Kind::Set(tuples),
            heading,
            CandidateKeys::from_keys(Vec::new()),
            name,
            err,
        );
    }
    let keys = resolve_keys(&heading, keys);
    Relation::new(Kind::Set(tuples), heading, keys, name)
}

pub(crate) async fn spawn(tuples: Vec<Tuple>, tx: mpsc::Sender<Tuple>, cancel: CancelHandle) {
    for t in tuples {
        tokio::select! {
            _ = cancel.cancelled() => return,
            res = tx.send(t) => {
                if res.is_err() {
                    return;
                }
            }
        }
    }
}
