//! Criterion benches for the BN254-scalar NTT/INTT and coset LDE.
//!
//! Input vectors are deterministic across runs (LCG-based) so results are
//! comparable over time. Throughput is reported in elements.

use criterion::{
    black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput,
};
use zkwasm_field::{
    coset::evaluate_on_coset_pow2,
    ntt::{forward_ntt_in_place, inverse_ntt_in_place},
    Scalar,
};

fn det_vec(n: usize, seed: u64) -> Vec<Scalar> {
    const A: u64 = 1_664_525;
    const C: u64 = 1_013_904_223;
    const M: u64 = 1u64 << 32;

    let mut a = A.wrapping_mul(seed).wrapping_add(C);
    (0..n)
        .map(|i| {
            a = a.wrapping_mul(A).wrapping_add(C) % M;
            Scalar::from_u64(a ^ (i as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
        })
        .collect()
}

fn bench_ntt(c: &mut Criterion) {
    let mut group = c.benchmark_group("ntt_bn254_pow2");

    for &k in &[12usize, 14usize] {
        let n = 1usize << k;
        group.throughput(Throughput::Elements(n as u64));

        let base = det_vec(n, 2024);

        group.bench_function(
            BenchmarkId::new("forward_ntt_in_place", format!("2^{k}")),
            |b| {
                b.iter_batched(
                    || black_box(base.clone()),
                    |mut v| {
                        forward_ntt_in_place(black_box(&mut v));
                        black_box(v);
                    },
                    BatchSize::LargeInput,
                )
            },
        );

        let mut evals = base.clone();
        forward_ntt_in_place(&mut evals);

        group.bench_function(
            BenchmarkId::new("inverse_ntt_in_place", format!("2^{k}")),
            |b| {
                b.iter_batched(
                    || black_box(evals.clone()),
                    |mut v| {
                        inverse_ntt_in_place(black_box(&mut v));
                        black_box(v);
                    },
                    BatchSize::LargeInput,
                )
            },
        );

        group.bench_function(
            BenchmarkId::new("evaluate_on_coset_pow2", format!("2^{k}")),
            |b| {
                b.iter_batched(
                    || black_box(base.clone()),
                    |coeffs| {
                        black_box(evaluate_on_coset_pow2(
                            black_box(&coeffs),
                            k,
                            Scalar::from_u64(3),
                        ));
                    },
                    BatchSize::LargeInput,
                )
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_ntt);
criterion_main!(benches);
