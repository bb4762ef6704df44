//! # Shared Types Crate
//!
//! Primitive aliases, protocol constants and byte-level helpers used across
//! the Plasma segment client.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: `Hash`, `Address`, `TOTAL_AMOUNT` and the
//!   Keccak-256 helper are defined here and nowhere else.
//! - **Fixed-width words**: every on-chain field is a 32-byte big-endian,
//!   left-padded word; helpers in [`encoding`] build and read them.

pub mod encoding;
pub mod entities;
pub mod errors;
pub mod hashing;

pub use encoding::*;
pub use entities::*;
pub use errors::*;
pub use hashing::*;
