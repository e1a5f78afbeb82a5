//! Error taxonomy for the algebra engine.
//!
//! One variant per error *kind*, not per call site — operators latch the first of
//! these they observe and keep composing as if nothing happened (see
//! [`crate::relation::Relation::err`]).

use std::sync::Arc;

use thiserror::Error;

use crate::value::DataType;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while constructing or streaming a relation expression.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// A sink or source collection was the wrong shape (e.g. a stream constructor
    /// handed a single tuple instead of a channel).
    #[error("container error: {0}")]
    Container(String),

    /// A tuple does not match the heading it was asserted to belong to.
    #[error("tuple {values:?} does not match heading {heading}")]
    ElementType { heading: String, values: String },

    /// A fold or map function does not take exactly one input / return exactly one output.
    #[error("arity error in {context}: expected {expected}, got {actual}")]
    Arity {
        context: String,
        expected: usize,
        actual: usize,
    },

    /// A predicate or transform needs attributes the source heading does not supply.
    #[error("domain error: {missing:?} not present in heading {heading}")]
    Domain { heading: String, missing: Vec<String> },

    /// An ordered comparison (`<`, `<=`, `>`, `>=`) was built over a type with no
    /// total order, or over two mismatched types.
    #[error("type {0:?} does not support ordered comparison against {1:?}")]
    Unordered(DataType, DataType),

    /// A projection target is not a subset of the source heading.
    #[error("projection target {target} is not a subset of source heading {source}")]
    Subset { source: String, target: String },

    /// A rename target has a different degree than its source.
    #[error("rename target has degree {target_degree}, source has degree {source_degree}")]
    DegreeMismatch {
        source_degree: usize,
        target_degree: usize,
    },

    /// Union/difference operands have different headings.
    #[error("heading mismatch: {left} vs {right}")]
    HeadingMismatch { left: String, right: String },

    /// A relation (or something it depends on) has no candidate keys.
    #[error("relation has no candidate keys")]
    NoCandidateKeys,

    /// Duplicate attribute names within one heading.
    #[error("duplicate attribute name {0:?} in heading")]
    DuplicateAttribute(String),

    /// An upstream source reported an error mid-stream.
    #[error("upstream failure: {0}")]
    Upstream(String),
}

/// Latched, shareable form of [`Error`] stored on every expression node.
pub type LatchedError = Arc<Error>;
