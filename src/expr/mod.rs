//! The eight derived operators (`spec.md` §4.5 - §4.12): each module owns its node
//! struct, the construction-time heading/candidate-key/rewrite logic, and the
//! streaming evaluator that actually produces tuples.

pub(crate) mod difference;
pub(crate) mod groupby;
pub(crate) mod join;
pub(crate) mod map;
pub(crate) mod project;
pub(crate) mod rename;
pub(crate) mod restrict;
pub(crate) mod union;
