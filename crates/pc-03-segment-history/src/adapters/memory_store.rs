//! In-memory `SegmentStore`.

use crate::domain::StoreError;
use crate::ports::outbound::SegmentStore;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::RwLock;

/// Proof and header store kept in process memory.
#[derive(Debug, Default)]
pub struct InMemorySegmentStore {
    proofs: RwLock<BTreeMap<(String, u64), String>>,
    headers: RwLock<BTreeMap<u64, String>>,
}

impl InMemorySegmentStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored proofs.
    pub fn proof_count(&self) -> Result<usize, StoreError> {
        Ok(self.proofs.read().map_err(|_| StoreError::LockPoisoned)?.len())
    }
}

#[async_trait]
impl SegmentStore for InMemorySegmentStore {
    async fn add_proof(&self, key: &str, blk_num: u64, serialized: String) -> Result<(), StoreError> {
        self.proofs
            .write()
            .map_err(|_| StoreError::LockPoisoned)?
            .insert((key.to_string(), blk_num), serialized);
        Ok(())
    }

    async fn get_proof(&self, key: &str, blk_num: u64) -> Result<Option<String>, StoreError> {
        Ok(self
            .proofs
            .read()
            .map_err(|_| StoreError::LockPoisoned)?
            .get(&(key.to_string(), blk_num))
            .cloned())
    }

    async fn add_block_header(&self, blk_num: u64, serialized: String) -> Result<(), StoreError> {
        self.headers
            .write()
            .map_err(|_| StoreError::LockPoisoned)?
            .insert(blk_num, serialized);
        Ok(())
    }

    async fn search_block_header(&self, from: u64, to: u64) -> Result<Vec<(u64, String)>, StoreError> {
        if from >= to {
            return Ok(Vec::new());
        }
        Ok(self
            .headers
            .read()
            .map_err(|_| StoreError::LockPoisoned)?
            .range(from..to)
            .map(|(n, s)| (*n, s.clone()))
            .collect())
    }
}
