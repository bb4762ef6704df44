//! # Domain Layer
//!
//! Value types of the segment model.

pub mod errors;
pub mod exitable;
pub mod segment;
pub mod state_update;
pub mod transaction;

pub use errors::SegmentStateError;
pub use exitable::{ExitableRange, ExitableRangeManager};
pub use segment::Segment;
pub use state_update::StateUpdate;
pub use transaction::SignedTransaction;
