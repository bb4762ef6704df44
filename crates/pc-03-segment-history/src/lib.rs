//! # PC-03 Segment History
//!
//! Provenance verification for segments received from other users.
//!
//! **Subsystem ID:** 03  
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! A segment is only worth accepting if an unbroken chain of valid
//! transitions leads from its deposit to the current owner. This crate
//! stores, per segment, the inclusion and exclusion proofs of every block,
//! and replays them against the committed block roots:
//! - Deposits seed the replay engine
//! - Inclusion proofs must verify and legally deprecate the previous owner
//! - Exclusion proofs must verify
//! - Missing or stale proofs are refetched from the operator
//!
//! ## Module Structure
//!
//! ```text
//! pc-03-segment-history/
//! ├── domain/          # Headers, reports, exits, wallet state, errors
//! ├── ports/           # ChainClient and SegmentStore traits
//! ├── adapters/        # In-memory store, mock chain client
//! ├── application/     # SegmentHistoryManager, WalletTracker
//! └── config.rs        # HistoryConfig, WalletConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::{InMemorySegmentStore, MockChainClient};
pub use application::{
    history_key, SegmentHistory, SegmentHistoryManager, WalletEvent, WalletNotification,
    WalletTracker,
};
pub use config::{HistoryConfig, WalletConfig};
pub use domain::{
    ChainClientError, Exit, HistoryError, HistoryReport, PlasmaBlockHeader, StoreError,
    WaitingBlock, WalletError, WalletStateManager,
};
pub use ports::{ChainClient, SegmentStore};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
