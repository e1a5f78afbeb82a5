//! Shared utilities for the streaming evaluator (`spec.md` §2 component 5): the
//! field-index map between two headings, subset-checking, candidate-key subsetting,
//! and combine-tuples all live in dedicated modules already (`heading`, `keys`); this
//! module holds the pieces that are genuinely cross-operator: the default channel
//! sizing and the tagged merge used by union and join to read two upstreams
//! concurrently off of one logical work queue.

use crate::heading::Heading;
use crate::tuple::Tuple;

/// Fallback bounded-channel capacity, overridden by [`crate::config::EngineConfig`].
pub(crate) const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// A tuple tagged with which upstream it came from — used by union (dedup merge) and
/// join (symmetric hash join) to multiplex two upstream receivers onto worker tasks
/// without forcing strict left-then-right ordering.
pub(crate) enum Side {
    Left(Tuple),
    Right(Tuple),
}

/// Build the combined tuple for a natural join match: `left`'s full values followed
/// by `right`'s values at the attributes not shared with `left` (`spec.md` §4.10).
pub(crate) fn combine_tuples(
    left: &Tuple,
    right: &Tuple,
    right_extra_idx: &[usize],
    output_heading: Heading,
) -> Tuple {
    let mut values: Vec<_> = left.values().to_vec();
    values.extend(right_extra_idx.iter().map(|&i| right.values()[i].clone()));
    Tuple::new_unchecked(output_heading, values)
}
