//! Signing benchmark suite.
//!
//! Benchmarks the in-process work behind one submission:
//! - Development key derivation
//! - Signing payload construction and sr25519 signing
//! - Extrinsic assembly at different call sizes
//!
//! Run with: cargo bench --bench signing
//! Results saved to: target/criterion/

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use tokio::runtime::Runtime;

use substrate_session::chain::{ExtrinsicParams, SigningPayload};
use substrate_session::wallet::{AccountRegistry, Signer, dev};
use substrate_session::{Call, MultiSignature, SignedExtrinsic};

// ============================================================================
// Benchmark Parameters
// ============================================================================

/// Remark sizes in bytes; 256+ crosses the hashed-payload threshold.
const CALL_SIZES: &[usize] = &[32, 200, 1024, 16 * 1024];

fn params() -> ExtrinsicParams {
    ExtrinsicParams {
        spec_version: 100,
        transaction_version: 1,
        genesis_hash: [0x11; 32],
        nonce: 7,
        tip: 0,
        metadata_hash_check: false,
    }
}

fn remark(size: usize) -> Call {
    Call::new(0, 0).arg(&vec![0xab_u8; size])
}

// ============================================================================
// Benchmark: Key Derivation
// ============================================================================

fn bench_derivation(c: &mut Criterion) {
    let mut group = c.benchmark_group("derivation");

    group.bench_function("keypair_alice", |b| {
        b.iter(|| dev::keypair(black_box("//Alice")).expect("derive"));
    });

    group.bench_function("registry_new", |b| {
        b.iter(|| AccountRegistry::new(black_box(42)).expect("registry"));
    });

    group.finish();
}

// ============================================================================
// Benchmark: Signing
// ============================================================================

fn bench_signing(c: &mut Criterion) {
    let rt = Runtime::new().expect("runtime");
    let alice = dev::account("//Alice", 42).expect("alice");
    let signer = Signer::for_account(&alice, None, 42).expect("signer");
    let params = params();

    let mut group = c.benchmark_group("signing");

    for &size in CALL_SIZES {
        let call = remark(size);

        group.bench_with_input(BenchmarkId::new("payload", size), &call, |b, call| {
            b.iter(|| SigningPayload::new(black_box(call), &params).message());
        });

        group.bench_with_input(BenchmarkId::new("sign", size), &call, |b, call| {
            b.to_async(&rt)
                .iter(|| async { signer.sign(black_box(call), &params).await.expect("sign") });
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Extrinsic Assembly
// ============================================================================

fn bench_assembly(c: &mut Criterion) {
    let alice = dev::account("//Alice", 42).expect("alice");
    let signature = MultiSignature::Sr25519([0x5a; 64]);
    let params = params();

    let mut group = c.benchmark_group("assembly");

    for &size in CALL_SIZES {
        let call = remark(size);
        group.bench_with_input(BenchmarkId::new("signed_extrinsic", size), &call, |b, call| {
            b.iter(|| {
                let extrinsic =
                    SignedExtrinsic::new(&alice.public_key, &signature, black_box(call), &params);
                extrinsic.hash()
            });
        });
    }

    group.finish();
}

// ============================================================================
// Main
// ============================================================================

criterion_group!(benches, bench_derivation, bench_signing, bench_assembly);
criterion_main!(benches);
