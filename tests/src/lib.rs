//! # Plasma-Segment Test Suite
//!
//! Unified test crate for scenarios that span several crates.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Keys, predicates, transfers, block builders
//! └── integration/      # Cross-crate flows
//!     ├── merkle_flow.rs
//!     ├── history_replay.rs
//!     └── wallet_flow.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p pc-tests
//!
//! # By flow
//! cargo test -p pc-tests integration::history_replay::
//!
//! # Benchmarks
//! cargo bench -p pc-tests
//! ```

#![allow(dead_code)]

pub mod fixtures;
pub mod integration;
