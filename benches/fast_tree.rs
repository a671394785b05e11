use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sentiment_analysis::featurize::SparseVector;
use sentiment_analysis::ml::fast_tree::{FastTreeOptions, TrainDataset, train_fast_tree};

const ROW_COUNT: usize = 2_000;
const FEATURE_COUNT: u32 = 5_000;
const TERMS_PER_ROW: usize = 24;

fn synthetic_dataset() -> TrainDataset {
    let mut rng = StdRng::seed_from_u64(7);
    let mut rows = Vec::with_capacity(ROW_COUNT);
    let mut labels = Vec::with_capacity(ROW_COUNT);
    for _ in 0..ROW_COUNT {
        let mut indices: Vec<u32> = (0..TERMS_PER_ROW)
            .map(|_| rng.random_range(0..FEATURE_COUNT))
            .collect();
        indices.sort_unstable();
        indices.dedup();
        let positive = indices.iter().filter(|idx| **idx % 2 == 0).count() * 2 > indices.len();
        let weight = 1.0 / (indices.len() as f32).sqrt();
        rows.push(SparseVector::from_sorted(
            indices.into_iter().map(|idx| (idx, weight)),
        ));
        labels.push(positive);
    }
    TrainDataset {
        feature_count: FEATURE_COUNT as usize,
        rows,
        labels,
    }
}

fn bench_train(c: &mut Criterion) {
    let dataset = synthetic_dataset();
    let mut group = c.benchmark_group("fast_tree_train");
    group.sample_size(10);
    for num_trees in [5usize, 50] {
        let options = FastTreeOptions {
            num_trees,
            ..FastTreeOptions::default()
        };
        group.bench_with_input(
            BenchmarkId::from_parameter(num_trees),
            &options,
            |b, options| b.iter(|| train_fast_tree(black_box(&dataset), options).expect("train")),
        );
    }
    group.finish();
}

fn bench_predict(c: &mut Criterion) {
    let dataset = synthetic_dataset();
    let model = train_fast_tree(&dataset, &FastTreeOptions::default()).expect("train");
    c.bench_function("fast_tree_predict_raw", |b| {
        b.iter(|| {
            dataset
                .rows
                .iter()
                .map(|row| model.predict_raw(black_box(row)))
                .sum::<f32>()
        })
    });
}

criterion_group!(benches, bench_train, bench_predict);
criterion_main!(benches);
