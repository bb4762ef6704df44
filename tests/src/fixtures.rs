//! Shared fixtures: deterministic keys, the ownership predicate registry and
//! block builders.

use pc_01_segment_state::{NativePredicate, OwnershipPredicate, PredicatesManager, Segment, SignedTransaction};
use pc_02_sum_merkle::Block;
use pc_03_segment_history::{
    HistoryConfig, InMemorySegmentStore, MockChainClient, SegmentHistoryManager, WaitingBlock,
};
use shared_crypto::Secp256k1KeyPair;
use shared_types::Address;
use std::sync::Arc;

/// Address of the ownership predicate in every fixture.
pub const OWNERSHIP: Address = [0xaa; 20];

/// History manager over the in-memory adapters.
pub type TestHistoryManager = SegmentHistoryManager<InMemorySegmentStore, MockChainClient>;

/// Alice's key.
pub fn alice() -> Secp256k1KeyPair {
    Secp256k1KeyPair::from_bytes([0x11; 32]).unwrap()
}

/// Bob's key.
pub fn bob() -> Secp256k1KeyPair {
    Secp256k1KeyPair::from_bytes([0x22; 32]).unwrap()
}

/// Registry with the ownership predicate at [`OWNERSHIP`].
pub fn predicates() -> Arc<PredicatesManager> {
    let mut p = PredicatesManager::new();
    p.add_predicate(OWNERSHIP, NativePredicate::Ownership);
    Arc::new(p)
}

/// ETH segment `[start, end)`.
pub fn eth(start: u64, end: u64) -> Segment {
    Segment::eth(start, end).unwrap()
}

/// `from` transfers `segment` to `to` at `blk_num`.
pub fn transfer(from: &Secp256k1KeyPair, segment: Segment, blk_num: u64, to: Address) -> SignedTransaction {
    let mut tx = SignedTransaction::new(vec![OwnershipPredicate::create(segment, blk_num, OWNERSHIP, to)]);
    tx.sign(from).unwrap();
    tx
}

/// Sealed single-token block `blk_num` holding `txs`.
pub fn sealed_block(blk_num: u64, txs: Vec<SignedTransaction>) -> Block {
    let mut block = Block::new(1).unwrap();
    block.set_block_number(blk_num);
    for tx in txs {
        block.append_tx(tx);
    }
    block.seal(1_700_000_000 + blk_num).unwrap();
    block
}

/// Header for a sealed block.
pub fn header(block: &Block) -> WaitingBlock {
    WaitingBlock::new(block.number(), block.get_root().unwrap())
}

/// History manager with default windows, refetching from `client`.
pub fn history_manager(client: Arc<MockChainClient>) -> TestHistoryManager {
    SegmentHistoryManager::new(
        HistoryConfig::default(),
        Arc::new(InMemorySegmentStore::new()),
        client,
        predicates(),
    )
}
