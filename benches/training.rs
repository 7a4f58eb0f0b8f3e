use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use loan_default_api::inference::{FeatureVector, InferenceEngine};
use loan_default_api::preprocessing::LoanDataset;
use loan_default_api::training::{Classifier, ModelKind, TrainEngine, TrainedModel, TrainingConfig};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

fn create_loan_data(n_rows: usize) -> LoanDataset {
    let mut rng = ChaCha8Rng::seed_from_u64(0);

    let x = Array2::from_shape_fn((n_rows, 4), |(_, j)| match j {
        0 => rng.gen_range(18.0..70.0),
        1 => rng.gen_range(15_000.0..150_000.0),
        2 => rng.gen_range(1_000.0..40_000.0),
        _ => rng.gen_range(450.0..850.0),
    });

    // Default risk rises with debt-to-income and falls with credit score
    let y = Array1::from_shape_fn(n_rows, |i| {
        let dti = x[[i, 2]] / x[[i, 1]];
        let score = 3.0 * dti - (x[[i, 3]] - 650.0) / 60.0 + rng.gen_range(-1.0..1.0);
        if score > 0.5 { 1.0 } else { 0.0 }
    });

    LoanDataset::from_arrays(x, y).unwrap()
}

fn bench_training(c: &mut Criterion) {
    let mut group = c.benchmark_group("training");
    group.sample_size(10); // Fewer samples for training benchmarks

    for n_rows in [1000, 5000, 20000].iter() {
        let dataset = create_loan_data(*n_rows);

        group.bench_with_input(BenchmarkId::new("fit_both", n_rows), &dataset, |b, ds| {
            b.iter(|| TrainEngine::new(TrainingConfig::default()).fit(black_box(ds)).unwrap())
        });

        for kind in ModelKind::ALL {
            group.bench_with_input(BenchmarkId::new(kind.as_str(), n_rows), &dataset, |b, ds| {
                b.iter(|| {
                    let mut model = TrainedModel::untrained(kind);
                    model.fit(black_box(ds.features()), &ds.labels()).unwrap();
                    model
                })
            });
        }
    }

    group.finish();
}

fn bench_prediction(c: &mut Criterion) {
    let mut group = c.benchmark_group("prediction");

    // Train models once
    let dataset = create_loan_data(5000);
    let outcome = TrainEngine::new(TrainingConfig::default()).fit(&dataset).unwrap();
    let features = FeatureVector::new(35.0, 50_000.0, 15_000.0, 680.0);

    for (model, _) in &outcome.models {
        group.bench_function(BenchmarkId::new("single", model.kind().as_str()), |b| {
            b.iter(|| InferenceEngine::predict_with(model, black_box(&features), 0.5).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_training, bench_prediction);
criterion_main!(benches);
