//! # Plasma-Segment Benchmarks
//!
//! | Area | Operation |
//! |------|-----------|
//! | pc-02 Sum-Merkle | block tree construction, proof verification |
//! | pc-01 Segment State | spend on a large leaf set |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pc_01_segment_state::{NativePredicate, OwnershipPredicate, PredicatesManager, Segment, SignedTransaction, StateManager};
use pc_02_sum_merkle::{Block, SumMerkleTree};
use shared_crypto::Secp256k1KeyPair;
use shared_types::TOTAL_AMOUNT;
use std::sync::Arc;
use std::time::Duration;

const OWNERSHIP: [u8; 20] = [0xaa; 20];

fn block_with(key: &Secp256k1KeyPair, num_tokens: u64, per_token: u64) -> Block {
    let mut block = Block::new(num_tokens).unwrap();
    for token in 0..num_tokens {
        for i in 0..per_token {
            let segment = Segment::new(token, i * 1_000, i * 1_000 + 500).unwrap();
            let mut tx = SignedTransaction::new(vec![OwnershipPredicate::create(segment, 1, OWNERSHIP, [1; 20])]);
            tx.sign(key).unwrap();
            block.append_tx(tx);
        }
    }
    block
}

// ============================================================================
// PC-02: Sum-Merkle Benchmarks
// ============================================================================

fn bench_tree_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("pc-02-sum-merkle");
    group.measurement_time(Duration::from_secs(10));
    let key = Secp256k1KeyPair::generate();

    for num_tokens in [1u64, 4, 16] {
        let block = block_with(&key, num_tokens, 64);
        group.throughput(Throughput::Elements(num_tokens * 64));
        group.bench_with_input(BenchmarkId::new("build_tree", num_tokens), &block, |b, block| {
            b.iter(|| {
                // appending invalidates the cached tree
                let mut fresh = block.clone();
                fresh.append_tx(SignedTransaction::new(vec![]));
                black_box(fresh.get_root().unwrap())
            })
        });
    }

    let mut block = block_with(&key, 4, 64);
    block.seal(1).unwrap();
    let root = block.get_root().unwrap();
    let tx = block.txs()[100].clone();
    let proof = block.get_proof(&tx.tx_hash()).unwrap().remove(0);
    let start = proof.segment.global_start();
    let end = proof.segment.global_end();
    group.bench_function("verify_proof", |b| {
        b.iter(|| {
            black_box(SumMerkleTree::verify(
                start,
                end,
                &tx.tx_hash(),
                TOTAL_AMOUNT * 4,
                &root,
                &proof.proof,
            ))
        })
    });

    group.finish();
}

// ============================================================================
// PC-01: Segment State Benchmarks
// ============================================================================

fn bench_spend(c: &mut Criterion) {
    let mut group = c.benchmark_group("pc-01-segment-state");
    let key = Secp256k1KeyPair::generate();
    let mut predicates = PredicatesManager::new();
    predicates.add_predicate(OWNERSHIP, NativePredicate::Ownership);
    let predicates = Arc::new(predicates);

    for leaves in [16u64, 256, 1024] {
        let mut engine = StateManager::new(predicates.clone());
        for i in 0..leaves {
            engine.insert_deposit_tx(OwnershipPredicate::create(
                Segment::eth(i * 1_000, i * 1_000 + 1_000).unwrap(),
                1,
                OWNERSHIP,
                key.address(),
            ));
        }
        let target = leaves / 2;
        let mut tx = SignedTransaction::new(vec![OwnershipPredicate::create(
            Segment::eth(target * 1_000 + 250, target * 1_000 + 750).unwrap(),
            2,
            OWNERSHIP,
            [2; 20],
        )]);
        tx.sign(&key).unwrap();

        group.bench_with_input(BenchmarkId::new("spend_middle", leaves), &engine, |b, engine| {
            b.iter(|| {
                let mut scratch = engine.clone();
                black_box(scratch.spend(&tx).len())
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_tree_construction, bench_spend);
criterion_main!(benches);
