//! Benchmark for correlation matrix computation and correlated-feature removal
//!
//! Run with: cargo bench --bench correlation_benchmark

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use polars::prelude::*;
use rand::prelude::*;
use rand::SeedableRng;

use chaff::pipeline::{CorrelatedFeatureRemover, CorrelationMatrix, FeatureRemover};

/// Generate synthetic data with controlled characteristics
fn generate_test_dataframe(n_rows: usize, n_features: usize, seed: u64) -> DataFrame {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);

    let mut columns: Vec<Column> = Vec::with_capacity(n_features);

    for i in 0..n_features {
        let feature_type = i % 4; // Cycle through different distributions

        let values: Vec<f64> = match feature_type {
            0 => {
                // Uniform
                (0..n_rows).map(|_| rng.gen::<f64>() * 100.0).collect()
            }
            1 => {
                // Right-skewed
                (0..n_rows)
                    .map(|_| {
                        let v = rng.gen::<f64>();
                        (v * v * v) * 100.0
                    })
                    .collect()
            }
            2 => {
                // Bimodal
                (0..n_rows)
                    .map(|_| {
                        if rng.gen::<bool>() {
                            rng.gen::<f64>() * 30.0
                        } else {
                            70.0 + rng.gen::<f64>() * 30.0
                        }
                    })
                    .collect()
            }
            _ => {
                // Near-duplicate of an earlier column, creating removable pairs
                let base_idx = i.saturating_sub(3);
                if base_idx < columns.len() {
                    columns[base_idx]
                        .f64()
                        .unwrap()
                        .into_iter()
                        .map(|v| v.unwrap_or(50.0) + rng.gen::<f64>() * 2.0 - 1.0)
                        .collect()
                } else {
                    (0..n_rows).map(|_| rng.gen::<f64>() * 100.0).collect()
                }
            }
        };

        columns.push(Column::new(format!("feature_{}", i).into(), values));
    }

    DataFrame::new(columns).expect("Failed to create DataFrame")
}

fn feature_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|n| n.to_string()).collect()
}

/// Benchmark matrix computation for varying column counts at a fixed row count
fn benchmark_matrix_by_columns(c: &mut Criterion) {
    let mut group = c.benchmark_group("matrix_by_columns");
    group.sample_size(30);

    let n_rows = 10_000;
    let column_counts = [10, 25, 50, 100, 200];

    for n_cols in column_counts {
        let df = generate_test_dataframe(n_rows, n_cols, 42);
        let candidates = feature_names(&df);

        group.throughput(Throughput::Elements(((n_cols * (n_cols - 1)) / 2) as u64));

        group.bench_with_input(
            BenchmarkId::new("compute", n_cols),
            &(&df, &candidates),
            |b, (df, candidates)| {
                b.iter(|| {
                    let _ = CorrelationMatrix::compute(black_box(df), black_box(candidates));
                });
            },
        );
    }

    group.finish();
}

/// Benchmark matrix computation for varying row counts at a fixed column count
fn benchmark_matrix_by_rows(c: &mut Criterion) {
    let mut group = c.benchmark_group("matrix_by_rows");
    group.sample_size(30);

    let n_cols = 50;
    let row_counts = [1_000, 10_000, 100_000];

    for n_rows in row_counts {
        let df = generate_test_dataframe(n_rows, n_cols, 42);
        let candidates = feature_names(&df);

        group.throughput(Throughput::Elements(n_rows as u64));

        group.bench_with_input(
            BenchmarkId::new("compute", n_rows),
            &(&df, &candidates),
            |b, (df, candidates)| {
                b.iter(|| {
                    let _ = CorrelationMatrix::compute(black_box(df), black_box(candidates));
                });
            },
        );
    }

    group.finish();
}

/// Benchmark the full remover fit, including the upper-triangular scan
fn benchmark_remover_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("remover_fit");
    group.sample_size(30);

    let n_rows = 10_000;
    let column_counts = [25, 100];

    for n_cols in column_counts {
        let df = generate_test_dataframe(n_rows, n_cols, 42);
        let candidates = feature_names(&df);

        group.bench_with_input(
            BenchmarkId::new("fit", n_cols),
            &(&df, &candidates),
            |b, (df, candidates)| {
                b.iter(|| {
                    let mut remover = CorrelatedFeatureRemover::new(0.95);
                    let _ = remover.fit(black_box(df), black_box(candidates));
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_matrix_by_columns,
    benchmark_matrix_by_rows,
    benchmark_remover_fit
);
criterion_main!(benches);
