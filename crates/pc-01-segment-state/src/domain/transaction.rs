//! # Signed Transaction
//!
//! Ordered outputs plus the witness signatures that deprecate the inputs.

use super::errors::SegmentStateError;
use super::segment::Segment;
use super::state_update::StateUpdate;
use serde::{Deserialize, Serialize};
use shared_crypto::{EthSignature, Secp256k1KeyPair};
use shared_types::{keccak256, Address, Hash};

/// A transaction and its signatures.
///
/// JSON form: `{"states": [<state update hex>], "tw": [<signature hex>]}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    /// Outputs.
    #[serde(rename = "states")]
    pub state_updates: Vec<StateUpdate>,
    /// Transaction witness.
    #[serde(rename = "tw")]
    pub witness: Vec<EthSignature>,
}

impl SignedTransaction {
    /// Unsigned transaction over `state_updates`.
    pub fn new(state_updates: Vec<StateUpdate>) -> Self {
        Self {
            state_updates,
            witness: Vec::new(),
        }
    }

    /// Attach signatures.
    pub fn with_signatures(mut self, witness: Vec<EthSignature>) -> Self {
        self.witness = witness;
        self
    }

    /// Output at `index`.
    pub fn state_update(&self, index: usize) -> Option<&StateUpdate> {
        self.state_updates.get(index)
    }

    /// Concatenated output encodings.
    pub fn tx_bytes(&self) -> Vec<u8> {
        self.state_updates.iter().flat_map(|s| s.encode()).collect()
    }

    /// Transaction hash.
    pub fn tx_hash(&self) -> Hash {
        keccak256(&self.tx_bytes())
    }

    /// Alias of [`SignedTransaction::tx_hash`].
    pub fn hash(&self) -> Hash {
        self.tx_hash()
    }

    /// Sign the hash and append the signature.
    pub fn sign(&mut self, keypair: &Secp256k1KeyPair) -> Result<(), SegmentStateError> {
        let signature = keypair.sign_hash(&self.tx_hash())?;
        self.witness.push(signature);
        Ok(())
    }

    /// Output segments sorted by start.
    pub fn get_segments(&self) -> Vec<Segment> {
        let mut segments: Vec<Segment> = self.state_updates.iter().map(|s| s.segment).collect();
        segments.sort_by_key(|s| s.start());
        segments
    }

    /// Index of the output of `segment`'s token starting where `segment` starts.
    pub fn get_index(&self, segment: &Segment) -> Result<usize, SegmentStateError> {
        self.state_updates
            .iter()
            .rposition(|s| {
                s.segment.token_id() == segment.token_id() && s.segment.start() == segment.start()
            })
            .ok_or(SegmentStateError::OutputNotFound {
                token_id: segment.token_id(),
                start: segment.start(),
            })
    }

    /// Deprecation witness: every signature concatenated.
    pub fn transaction_witness(&self) -> Vec<u8> {
        self.witness
            .iter()
            .flat_map(|s| s.as_bytes().iter().copied())
            .collect()
    }

    /// Recovered signer addresses. Unrecoverable signatures are skipped.
    pub fn signers(&self) -> Vec<Address> {
        let hash = self.tx_hash();
        self.witness
            .iter()
            .filter_map(|s| s.recover(&hash).ok())
            .collect()
    }
}
