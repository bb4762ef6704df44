//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Invalid private key
    #[error("Invalid private key")]
    InvalidPrivateKey,

    /// Invalid signature format (r/s out of range)
    #[error("Invalid signature format")]
    InvalidSignatureFormat,

    /// Recovery id (v) is not 27 or 28
    #[error("Invalid recovery id: {0}")]
    InvalidRecoveryId(u8),

    /// Public key recovery failed
    #[error("Public key recovery failed")]
    RecoveryFailed,

    /// Signing failed
    #[error("Signing failed: {0}")]
    SigningFailed(String),

    /// Signature had the wrong length
    #[error("Invalid signature length: expected 65, got {0}")]
    InvalidSignatureLength(usize),
}
