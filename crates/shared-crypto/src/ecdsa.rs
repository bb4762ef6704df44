//! # ECDSA Signatures (secp256k1)
//!
//! Ethereum-style recoverable signatures: 65 bytes `r ‖ s ‖ v` with
//! `v ∈ {27, 28}`, produced over a 32-byte prehash (a Keccak-256 digest).
//!
//! ## Security Properties
//!
//! - RFC 6979 deterministic nonces (no RNG dependency for signing)
//! - Low-S normalization (EIP-2)
//!
//! ## Use Cases
//!
//! - Transaction witnesses (deprecation of prior state updates)
//! - Operator confirmation signatures over `merkle_hash`

use crate::CryptoError;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use shared_types::{keccak256, to_hex, Address, Hash};
use std::fmt;
use zeroize::Zeroize;

/// Length of a recoverable signature.
pub const SIGNATURE_LENGTH: usize = 65;

/// Recoverable ECDSA signature (65 bytes, r||s||v).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EthSignature(#[serde(with = "shared_types::hex_array")] [u8; SIGNATURE_LENGTH]);

impl EthSignature {
    /// Create from raw bytes.
    pub fn from_bytes(bytes: [u8; SIGNATURE_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Create from a slice, which must be exactly 65 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != SIGNATURE_LENGTH {
            return Err(CryptoError::InvalidSignatureLength(bytes.len()));
        }
        let mut out = [0u8; SIGNATURE_LENGTH];
        out.copy_from_slice(bytes);
        Ok(Self(out))
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.0
    }

    /// Recovery byte.
    pub fn v(&self) -> u8 {
        self.0[64]
    }

    /// Recover the signer of `hash`.
    pub fn recover(&self, hash: &Hash) -> Result<Address, CryptoError> {
        recover_address(hash, &self.0)
    }
}

impl fmt::Debug for EthSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EthSignature({})", to_hex(&self.0))
    }
}

/// secp256k1 ECDSA keypair with an Ethereum address.
pub struct Secp256k1KeyPair {
    signing_key: SigningKey,
}

impl Secp256k1KeyPair {
    /// Generate random keypair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::random(&mut rand::thread_rng());
        Self { signing_key }
    }

    /// Create from secret key bytes (32 bytes).
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, CryptoError> {
        let signing_key =
            SigningKey::from_bytes((&bytes).into()).map_err(|_| CryptoError::InvalidPrivateKey)?;
        Ok(Self { signing_key })
    }

    /// Address of this key.
    pub fn address(&self) -> Address {
        address_from_pubkey(self.signing_key.verifying_key())
    }

    /// Sign a 32-byte digest, returning `r ‖ s ‖ v` with `v ∈ {27, 28}`.
    pub fn sign_hash(&self, hash: &Hash) -> Result<EthSignature, CryptoError> {
        let (sig, recid) = self
            .signing_key
            .sign_prehash_recoverable(hash)
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;

        // Flip the recovery id when S is moved to the lower half
        let (sig, recid) = match sig.normalize_s() {
            Some(normalized) => (
                normalized,
                RecoveryId::new(!recid.is_y_odd(), recid.is_x_reduced()),
            ),
            None => (sig, recid),
        };

        let mut bytes = [0u8; SIGNATURE_LENGTH];
        bytes[..64].copy_from_slice(&sig.to_bytes());
        bytes[64] = recid.to_byte() + 27;
        Ok(EthSignature(bytes))
    }

    /// Get secret key bytes (for serialization).
    pub fn to_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes().into()
    }
}

impl Drop for Secp256k1KeyPair {
    fn drop(&mut self) {
        // Zeroize secret key material
        let mut bytes: [u8; 32] = self.signing_key.to_bytes().into();
        bytes.zeroize();
    }
}

/// Recover the signer's address from a 65-byte signature over `hash`.
///
/// Accepts `v` as 27/28 or as a raw 0/1 recovery id.
pub fn recover_address(hash: &Hash, signature: &[u8]) -> Result<Address, CryptoError> {
    if signature.len() != SIGNATURE_LENGTH {
        return Err(CryptoError::InvalidSignatureLength(signature.len()));
    }
    let v = signature[64];
    let recovery_byte = match v {
        27 | 28 => v - 27,
        0 | 1 => v,
        other => return Err(CryptoError::InvalidRecoveryId(other)),
    };
    let recovery_id =
        RecoveryId::from_byte(recovery_byte).ok_or(CryptoError::InvalidRecoveryId(v))?;
    let sig =
        Signature::from_slice(&signature[..64]).map_err(|_| CryptoError::InvalidSignatureFormat)?;

    let recovered_key = VerifyingKey::recover_from_prehash(hash, &sig, recovery_id)
        .map_err(|_| CryptoError::RecoveryFailed)?;

    Ok(address_from_pubkey(&recovered_key))
}

/// Derive Ethereum address from public key.
pub fn address_from_pubkey(public_key: &VerifyingKey) -> Address {
    let pubkey_bytes = public_key.to_encoded_point(false);
    let pubkey_slice = pubkey_bytes.as_bytes();

    // Keccak256 hash of public key (without 0x04 prefix)
    let hash = keccak256(&pubkey_slice[1..]);

    // Take last 20 bytes as address
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_recover() {
        let keypair = Secp256k1KeyPair::generate();
        let hash = keccak256(b"Hello, secp256k1!");

        let signature = keypair.sign_hash(&hash).unwrap();
        assert!(signature.v() == 27 || signature.v() == 28);
        assert_eq!(signature.recover(&hash).unwrap(), keypair.address());
    }

    #[test]
    fn test_wrong_hash_recovers_other_address() {
        let keypair = Secp256k1KeyPair::generate();
        let signature = keypair.sign_hash(&keccak256(b"a")).unwrap();

        let recovered = recover_address(&keccak256(b"b"), signature.as_bytes());
        assert!(recovered.map(|a| a != keypair.address()).unwrap_or(true));
    }

    #[test]
    fn test_known_address() {
        // Hardhat/anvil account #0
        let secret: [u8; 32] = {
            let bytes = shared_types::from_hex(
                "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
            )
            .unwrap();
            bytes.try_into().unwrap()
        };
        let keypair = Secp256k1KeyPair::from_bytes(secret).unwrap();
        assert_eq!(
            to_hex(&keypair.address()),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn test_invalid_recovery_id() {
        let keypair = Secp256k1KeyPair::generate();
        let hash = keccak256(b"msg");
        let mut bytes = *keypair.sign_hash(&hash).unwrap().as_bytes();
        bytes[64] = 5;
        assert_eq!(
            recover_address(&hash, &bytes),
            Err(CryptoError::InvalidRecoveryId(5))
        );
    }

    #[test]
    fn test_invalid_length() {
        assert_eq!(
            recover_address(&[0u8; 32], &[0u8; 64]),
            Err(CryptoError::InvalidSignatureLength(64))
        );
        assert!(EthSignature::from_slice(&[0u8; 10]).is_err());
    }

    #[test]
    fn test_signature_serde() {
        let keypair = Secp256k1KeyPair::generate();
        let signature = keypair.sign_hash(&keccak256(b"serde")).unwrap();
        let json = serde_json::to_string(&signature).unwrap();
        assert!(json.starts_with("\"0x"));
        let back: EthSignature = serde_json::from_str(&json).unwrap();
        assert_eq!(back, signature);
    }

    #[test]
    fn test_deterministic_signing() {
        let keypair = Secp256k1KeyPair::generate();
        let hash = keccak256(b"rfc6979");
        assert_eq!(keypair.sign_hash(&hash).unwrap(), keypair.sign_hash(&hash).unwrap());
    }
}
