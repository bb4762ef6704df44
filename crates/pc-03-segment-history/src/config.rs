//! # Segment History Configuration
//!
//! Replay windowing, refetch budget and wallet identity.

use serde::{Deserialize, Serialize};
use shared_types::{Address, ZERO_ADDRESS};

/// Default number of blocks loaded per replay window.
pub const DEFAULT_WINDOW_SIZE: u64 = 100;

/// Default number of remote refetches per block.
pub const DEFAULT_MAX_REFETCH_ATTEMPTS: u32 = 2;

/// History replay configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Blocks per header window.
    pub window_size: u64,

    /// Remote refetches allowed for one block before giving up.
    pub max_refetch_attempts: u32,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            max_refetch_attempts: DEFAULT_MAX_REFETCH_ATTEMPTS,
        }
    }
}

impl HistoryConfig {
    /// Create a config for testing (small windows).
    pub fn for_testing() -> Self {
        Self {
            window_size: 4,
            max_refetch_attempts: 1,
        }
    }
}

/// Wallet identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Address whose segments the wallet tracks.
    #[serde(with = "shared_types::hex_array")]
    pub owner: Address,

    /// Address of the ownership predicate used for deposits.
    #[serde(with = "shared_types::hex_array")]
    pub ownership_predicate: Address,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            owner: ZERO_ADDRESS,
            ownership_predicate: ZERO_ADDRESS,
        }
    }
}

impl WalletConfig {
    /// Create a config for testing.
    pub fn for_testing(owner: Address) -> Self {
        Self {
            owner,
            ownership_predicate: [0xaa; 20],
        }
    }
}
