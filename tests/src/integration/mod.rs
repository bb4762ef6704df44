//! Cross-crate flows.

pub mod history_replay;
pub mod merkle_flow;
pub mod wallet_flow;
