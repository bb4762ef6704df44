//! Domain layer: blocks, proofs and the objects a client receives for a range.

pub mod block;
pub mod errors;
pub mod exclusion_proof;
pub mod proof;
pub mod segmented_block;
pub mod signed_tx_with_proof;

pub use block::Block;
pub use errors::BlockError;
pub use exclusion_proof::ExclusionProof;
pub use proof::{encode_element, SumMerkleProof, FLAG_LEFT, FLAG_RIGHT, PROOF_ELEMENT_SIZE};
pub use segmented_block::{SegmentedBlock, SegmentedBlockItem};
pub use signed_tx_with_proof::SignedTransactionWithProof;
