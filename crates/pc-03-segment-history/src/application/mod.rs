//! Application layer: history replay and wallet event handling.

pub mod history_manager;
pub mod segment_history;
pub mod wallet_tracker;

pub use history_manager::SegmentHistoryManager;
pub use segment_history::SegmentHistory;
pub use wallet_tracker::{history_key, WalletEvent, WalletNotification, WalletTracker};
