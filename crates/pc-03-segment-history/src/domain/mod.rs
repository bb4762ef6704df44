//! Domain layer: header records, reports, wallet state and errors.

pub mod errors;
pub mod header;
pub mod report;
pub mod wallet_state;

pub use errors::{ChainClientError, HistoryError, StoreError, WalletError};
pub use header::{PlasmaBlockHeader, WaitingBlock};
pub use report::{Exit, HistoryReport};
pub use wallet_state::WalletStateManager;
