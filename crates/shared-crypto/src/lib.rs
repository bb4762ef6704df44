//! # Shared Crypto
//!
//! Ethereum-compatible secp256k1 signing and signer recovery.
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `ecdsa` | secp256k1 + Keccak-256 | Transaction witnesses, confirmation signatures |
//!
//! ## Security Properties
//!
//! - RFC 6979 deterministic nonces, low-S normalization (EIP-2)
//! - Signer identity is the recovered address; public keys never travel

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ecdsa;
pub mod errors;

// Re-exports
pub use ecdsa::{address_from_pubkey, recover_address, EthSignature, Secp256k1KeyPair};
pub use errors::CryptoError;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
