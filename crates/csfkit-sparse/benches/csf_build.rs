//! Benchmarks for CSF construction
//!
//! Measures COO → CSF tree construction across tensor ranks and sizes, and
//! compares the sequential and parallel builders.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use csfkit_sparse::parallel::par_coo_to_csf;
use csfkit_sparse::{CooTensor, CsfBuilder, CsfTensor};
use std::hint::black_box;

/// Generate a random sorted COO tensor with roughly `nnz` distinct entries
fn random_sorted_coo(shape: &[usize], nnz: usize) -> CooTensor<f64> {
    let mut entries = Vec::with_capacity(nnz);
    let mut values = Vec::with_capacity(nnz);

    // Simple pseudo-random generation for reproducibility
    let mut seed = 12345u64;
    for _ in 0..nnz {
        let entry: Vec<usize> = shape
            .iter()
            .map(|&extent| {
                seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
                ((seed >> 16) % extent as u64) as usize
            })
            .collect();
        seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
        entries.push(entry);
        values.push((seed % 10000) as f64 / 10000.0);
    }

    let mut coo =
        CooTensor::from_entries(entries, values, shape.to_vec()).expect("Failed to create COO");
    coo.deduplicate();
    coo
}

/// Benchmark construction for increasing nnz at fixed rank
fn bench_build_by_nnz(c: &mut Criterion) {
    let mut group = c.benchmark_group("csf_build_nnz");
    let shape = [200, 200, 200];

    for nnz in [1_000, 10_000, 100_000].iter() {
        let coo = random_sorted_coo(&shape, *nnz);
        group.throughput(Throughput::Elements(coo.nnz() as u64));

        group.bench_with_input(BenchmarkId::from_parameter(nnz), &coo, |b, coo| {
            b.iter(|| {
                let csf = CsfTensor::from_coo(black_box(coo)).expect("build failed");
                black_box(csf)
            });
        });
    }

    group.finish();
}

/// Benchmark construction for increasing rank at fixed nnz
fn bench_build_by_rank(c: &mut Criterion) {
    let mut group = c.benchmark_group("csf_build_rank");

    for ndim in [2, 3, 4, 5, 6].iter() {
        let shape = vec![32; *ndim];
        let coo = random_sorted_coo(&shape, 50_000);
        group.throughput(Throughput::Elements(coo.nnz() as u64));

        group.bench_with_input(BenchmarkId::from_parameter(ndim), &coo, |b, coo| {
            b.iter(|| black_box(CsfTensor::from_coo(black_box(coo)).expect("build failed")));
        });
    }

    group.finish();
}

/// Compare validated, unchecked and parallel construction
fn bench_build_variants(c: &mut Criterion) {
    let mut group = c.benchmark_group("csf_build_variants");
    let coo = random_sorted_coo(&[64, 64, 64, 64], 200_000);
    group.throughput(Throughput::Elements(coo.nnz() as u64));

    group.bench_function("validated", |b| {
        b.iter(|| black_box(CsfBuilder::new().build(black_box(&coo)).expect("build failed")));
    });

    group.bench_function("unchecked", |b| {
        b.iter(|| {
            black_box(
                CsfBuilder::unchecked()
                    .build(black_box(&coo))
                    .expect("build failed"),
            )
        });
    });

    group.bench_function("parallel", |b| {
        b.iter(|| black_box(par_coo_to_csf(black_box(&coo)).expect("build failed")));
    });

    group.finish();
}

/// Benchmark leaf-order traversal
fn bench_iterate(c: &mut Criterion) {
    let coo = random_sorted_coo(&[100, 100, 100, 10], 100_000);
    let csf: CsfTensor<f64> = CsfTensor::from_coo(&coo).expect("build failed");

    c.bench_function("csf_iter", |b| {
        b.iter(|| {
            let sum: f64 = csf.iter().map(|(_, &v)| v).sum();
            black_box(sum)
        });
    });
}

criterion_group!(
    benches,
    bench_build_by_nnz,
    bench_build_by_rank,
    bench_build_variants,
    bench_iterate,
);
criterion_main!(benches);
