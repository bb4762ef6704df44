//! # Adapters Layer
//!
//! In-process implementations of the outbound ports.

mod memory_store;
mod mock_chain;

pub use memory_store::InMemorySegmentStore;
pub use mock_chain::MockChainClient;
