//! # State Engine
//!
//! - [`BaseStateManager`]: leaf-set algorithms, generic over [`LeafState`]
//! - [`StateManager`]: transaction-level API over plain state updates

pub mod base;
pub mod manager;

pub use base::{BaseStateManager, LeafState};
pub use manager::StateManager;
