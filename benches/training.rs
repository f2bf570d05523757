use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use mlstage::ml::gbdt_stump::{TrainDataset, TrainOptions, train_gbdt_stump};

const SAMPLE_COUNT: usize = 2_000;
const FEATURE_COUNT: usize = 8;

fn synthetic_dataset() -> TrainDataset {
    let mut x = Vec::with_capacity(SAMPLE_COUNT);
    let mut y = Vec::with_capacity(SAMPLE_COUNT);
    for i in 0..SAMPLE_COUNT {
        let row: Vec<f32> = (0..FEATURE_COUNT)
            .map(|j| ((i * 31 + j * 17) % 97) as f32 / 97.0)
            .collect();
        y.push(usize::from(row[1] + row[5] > 1.0));
        x.push(row);
    }
    TrainDataset {
        feature_names: (0..FEATURE_COUNT).map(|j| format!("f{j}")).collect(),
        label_column: "Outcome".to_string(),
        classes: vec!["0".to_string(), "1".to_string()],
        x,
        y,
    }
}

fn bench_train(c: &mut Criterion) {
    let dataset = synthetic_dataset();
    for rounds in [10usize, 50] {
        let options = TrainOptions {
            rounds,
            ..TrainOptions::default()
        };
        c.bench_with_input(
            BenchmarkId::new("train_gbdt_stump", rounds),
            &options,
            |b, options| {
                b.iter(|| {
                    let model = train_gbdt_stump(black_box(&dataset), options).expect("train");
                    black_box(model);
                })
            },
        );
    }
}

fn bench_predict(c: &mut Criterion) {
    let dataset = synthetic_dataset();
    let model = train_gbdt_stump(&dataset, &TrainOptions::default()).expect("train");
    c.bench_function("predict_labels", |b| {
        b.iter(|| black_box(model.predict_labels(black_box(&dataset.x))).len())
    });
}

criterion_group!(benches, bench_train, bench_predict);
criterion_main!(benches);
