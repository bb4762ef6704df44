//! # PC-01 Segment State
//!
//! Value-range ownership model and the state engine that tracks it.
//!
//! **Subsystem ID:** 01
//! **Architecture:** Domain model + engine, no I/O
//!
//! ## Purpose
//!
//! The value space of every token is `[0, TOTAL_AMOUNT)`. Ownership is
//! expressed over half-open sub-ranges ("segments"):
//! - A `StateUpdate` says who (which predicate and state) governs a segment
//!   as of a block
//! - A `SignedTransaction` deprecates prior state updates and creates new ones
//! - The state engine keeps the live, ordered, non-overlapping leaf set
//!
//! ## Module Structure
//!
//! ```text
//! pc-01-segment-state/
//! ├── domain/          # Segment, StateUpdate, SignedTransaction, exitable ranges, errors
//! ├── predicates/      # Ownership + PaymentChannel behaviours, PredicatesManager registry
//! └── state/           # LeafState trait, BaseStateManager, StateManager
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod domain;
pub mod predicates;
pub mod state;

// Re-exports
pub use domain::{
    ExitableRange, ExitableRangeManager, Segment, SegmentStateError, SignedTransaction,
    StateUpdate,
};
pub use predicates::{
    ChannelState, NativePredicate, OwnershipPredicate, PaymentChannelPredicate,
    PredicatesManager,
};
pub use state::{BaseStateManager, LeafState, StateManager};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
