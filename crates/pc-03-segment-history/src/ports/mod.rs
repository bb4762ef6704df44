//! Ports: what the history layer needs from the outside world.

pub mod outbound;

pub use outbound::{ChainClient, SegmentStore};
