use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use deep_time_series::prelude::*;
use polars::prelude::*;
use rand::prelude::*;

fn create_panel(n_series: usize, series_length: usize) -> DataFrame {
    let mut rng = StdRng::seed_from_u64(42);
    let n_rows = n_series * series_length;

    let time_index: Vec<i64> = (0..n_rows).map(|i| (i % series_length) as i64).collect();
    let ids: Vec<String> = (0..n_rows).map(|i| format!("series_{}", i / series_length)).collect();
    let target: Vec<f64> = (0..n_rows).map(|_| rng.gen::<f64>() * 10.0).collect();
    let covariate: Vec<f64> = (0..n_rows).map(|_| rng.gen::<f64>()).collect();

    df!(
        "time_index" => time_index,
        "time_series_id" => ids,
        "target" => target,
        "covariate" => covariate,
    )
    .unwrap()
}

fn build_dataset(df: &DataFrame) -> TimeSeriesDataset {
    let specs = vec![
        ChunkSpec::encoding("target", ["target", "covariate"], ChunkDtype::Float32).with_shift(24),
        ChunkSpec::decoding("covariate", ["covariate"], ChunkDtype::Float32),
        ChunkSpec::label("target", ["target"], ChunkDtype::Float32),
    ];
    let transformers = FeatureTransformers::new()
        .with_transformer("target", Scaler::standard())
        .with_transformer("covariate", Scaler::min_max());

    TimeSeriesDataset::new(df, DatasetConfig::new(24, 12), &specs, transformers).unwrap()
}

fn bench_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("construction");
    group.sample_size(10);

    for n_series in [10, 100].iter() {
        let df = create_panel(*n_series, 500);
        group.bench_with_input(BenchmarkId::new("dataset", n_series), &df, |b, df| {
            b.iter(|| build_dataset(black_box(df)))
        });
    }

    group.finish();
}

fn bench_get_item(c: &mut Criterion) {
    let ds = build_dataset(&create_panel(50, 500));
    let mut rng = StdRng::seed_from_u64(7);
    let indices: Vec<usize> = (0..1000).map(|_| rng.gen_range(0..ds.len())).collect();

    c.bench_function("get_item", |b| {
        b.iter(|| {
            for &i in &indices {
                black_box(ds.get_item(i).unwrap());
            }
        })
    });
}

fn bench_batching(c: &mut Criterion) {
    let mut group = c.benchmark_group("batching");
    let ds = build_dataset(&create_panel(50, 500));

    for batch_size in [32, 256].iter() {
        let loader = DataLoader::new(&ds, *batch_size).unwrap().with_shuffle(0);
        let indices: Vec<usize> = loader.indices().into_iter().take(*batch_size).collect();
        group.bench_with_input(BenchmarkId::new("load", batch_size), &indices, |b, indices| {
            b.iter(|| loader.load(black_box(indices)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_construction, bench_get_item, bench_batching);
criterion_main!(benches);
