//! # relalg
//!
//! A library for composing and evaluating expressions of relational algebra over
//! in-memory and streamable tuple sources.
//!
//! ## Pipeline
//!
//! ```text
//! Source (sequence | set | stream)
//!     ↓
//! Relation expression tree (project, restrict, rename, union, difference,
//!                            join, group_by, map — each rewriting itself
//!                            toward its sources at construction time)
//!     ↓
//! stream()                → RelStream { rx, cancel }
//!     ↓
//! Concurrent, cancellable, bounded-channel evaluation
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use relalg::{Relation, Heading, Attribute, DataType, Tuple, Value};
//! use relalg::predicate::attr;
//!
//! let heading = Heading::new(vec![
//!     Attribute::new("sno", DataType::Int),
//!     Attribute::new("city", DataType::Str),
//! ])?;
//! let suppliers = Relation::from_sequence("suppliers", heading, tuples, None);
//!
//! let london = suppliers.restrict(attr("city").eq(Value::Str("London".into())));
//! let stream = london.stream();
//! ```
//!
//! ## Module organization
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `value` | `Value`/`DataType` — the four scalar types a tuple may hold |
//! | `heading` | Attribute lists, heading equality, projection, field-index maps |
//! | `tuple` | Position-indexed tuple representation |
//! | `keys` | Candidate-key tracking and propagation algebra |
//! | `predicate` | The boolean expression language used by `restrict` |
//! | `relation` | The `Relation`/`Node` expression tree and its streaming contract |
//! | `source` | The three literal source kinds: sequence, set, stream |
//! | `expr` | The eight derived operators |
//! | `cancel` | Hierarchical, one-shot cancellation |
//! | `error` | The error taxonomy and first-error latching |
//! | `config` | Engine-wide tuning knobs (channel capacity, worker width) |
//! | `text` | Canonical `π σ ρ ∪ − ⋈` rendering of an expression tree |

pub mod cancel;
pub mod config;
pub(crate) mod eval;
pub mod error;
mod expr;
pub mod heading;
pub mod keys;
pub mod predicate;
mod relation;
mod source;
pub mod text;
pub mod tuple;
pub mod value;

pub use cancel::CancelHandle;
pub use config::EngineConfig;
pub use error::{Error, LatchedError, Result};
pub use heading::{Attribute, Heading};
pub use keys::{CandidateKeys, Key};
pub use predicate::{attr, AttrRef, Operand, Predicate};
pub use relation::{cardinality, degree, RelStream, Relation};
pub use tuple::Tuple;
pub use value::{DataType, Value};
