use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use wavefront_linalg::matrix::Matrix;
use wavefront_linalg::svd::svd;

fn random_matrix(rows: usize, cols: usize, seed: u64) -> Matrix {
    let mut rng = StdRng::seed_from_u64(seed);
    Matrix::from_fn(rows, cols, |_, _| rng.random_range(-1.0..1.0))
}

fn bench_svd(c: &mut Criterion) {
    let mut group = c.benchmark_group("svd");

    for &(rows, cols) in &[(16, 8), (64, 32), (128, 64)] {
        let a = random_matrix(rows, cols, 7);
        group.bench_function(BenchmarkId::new("svd", format!("{rows}x{cols}")), |b| {
            b.iter(|| {
                let decomposition = svd(&a).expect("decomposition failed");
                black_box(decomposition);
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_svd);
criterion_main!(benches);
