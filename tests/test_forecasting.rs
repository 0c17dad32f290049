//! Integration tests for the forecasting contract driven by a data loader

use deep_time_series::prelude::*;
use ndarray::{s, Array3, Axis};
use polars::prelude::*;
use std::collections::HashMap;

/// Repeats the last encoded value over the forecast horizon
struct Persistence {
    horizon: usize,
    training: bool,
}

impl ForecastingModule for Persistence {
    type Tensor = Array3<f64>;
    type Loss = f64;

    fn encode(&self, inputs: &TensorMap<Array3<f64>>) -> Result<TensorMap<Array3<f64>>> {
        let history = inputs
            .get("encoding.target")
            .ok_or_else(|| DeepTimeSeriesError::UnknownTag("encoding.target".to_string()))?;
        let last = history.slice(s![.., -1.., ..]).to_owned();
        Ok(HashMap::from([("last".to_string(), last)]))
    }

    fn decode_train(&self, inputs: &TensorMap<Array3<f64>>) -> Result<TensorMap<Array3<f64>>> {
        self.decode_eval(inputs)
    }

    fn decode_eval(&self, inputs: &TensorMap<Array3<f64>>) -> Result<TensorMap<Array3<f64>>> {
        let last = &inputs["last"];
        let views = vec![last.view(); self.horizon];
        let forecast = ndarray::concatenate(Axis(1), &views)?;
        Ok(HashMap::from([("label.target".to_string(), forecast)]))
    }

    fn evaluate_loss(&self, batch: &TensorMap<Array3<f64>>) -> Result<f64> {
        let outputs = self.forward(batch)?;
        let error = &outputs["label.target"] - &batch["label.target"];
        Ok(error.mapv(|e| e * e).mean().unwrap_or(0.0))
    }

    fn loss_value(&self, loss: &f64) -> f64 {
        *loss
    }

    fn is_training(&self) -> bool {
        self.training
    }

    fn set_training(&mut self, training: bool) {
        self.training = training;
    }
}

fn linear_dataset() -> TimeSeriesDataset {
    let n = 20;
    let df = df!(
        "time_index" => (0..n as i64).collect::<Vec<_>>(),
        "time_series_id" => vec!["line"; n],
        "target" => (0..n).map(|t| t as f64).collect::<Vec<_>>(),
    )
    .unwrap();

    let specs = vec![
        ChunkSpec::encoding("target", ["target"], ChunkDtype::Float64).with_shift(2),
        ChunkSpec::label("target", ["target"], ChunkDtype::Float64),
    ];
    let transformers = FeatureTransformers::new().with_transformer("target", Scaler::identity());
    TimeSeriesDataset::new(&df, DatasetConfig::new(4, 2), &specs, transformers).unwrap()
}

fn as_f64_map(batch: Batch) -> TensorMap<Array3<f64>> {
    batch
        .into_map()
        .into_iter()
        .map(|(tag, array)| (tag, array.to_f64()))
        .collect()
}

#[test]
fn test_run_stage_over_loader() {
    let ds = linear_dataset();
    // history covers rows 2..4 of each window, the label rows 4..6
    assert_eq!(ds.chunk_length(), 6);
    assert_eq!(ds.len(), 14);

    let loader = DataLoader::new(&ds, 4).unwrap();
    let mut model = Persistence { horizon: 2, training: false };
    let mut history = LossHistory::new();

    let batches = loader.iter().map(|b| b.map(as_f64_map));
    let mean = run_stage(&mut model, Stage::Training, batches, &mut history).unwrap();

    assert!(model.is_training());
    assert_eq!(history.count(Stage::Training.loss_key()), loader.len() as u64);
    // the forecast trails the label by 1 then 2 steps
    assert!((mean - 2.5).abs() < 1e-12);
}

#[test]
fn test_validation_and_test_keys() {
    let ds = linear_dataset();
    let loader = DataLoader::new(&ds, 5).unwrap().with_shuffle(11);
    let mut model = Persistence { horizon: 2, training: true };
    let mut history = LossHistory::new();

    let batches = loader.iter().map(|b| b.map(as_f64_map));
    run_stage(&mut model, Stage::Validation, batches, &mut history).unwrap();
    assert!(!model.is_training());

    let batches = loader.iter().map(|b| b.map(as_f64_map));
    run_stage(&mut model, Stage::Test, batches, &mut history).unwrap();

    assert_eq!(history.count("loss/validation"), 3);
    assert_eq!(history.count("loss/test"), 3);
    assert_eq!(history.count("loss/training"), 0);
}

#[test]
fn test_forward_merges_inputs() {
    let ds = linear_dataset();
    let loader = DataLoader::new(&ds, 2).unwrap();
    let batch = as_f64_map(loader.load(&[0, 1]).unwrap());

    let model = Persistence { horizon: 2, training: false };
    let outputs = model.forward(&batch).unwrap();
    let forecast = &outputs["label.target"];

    assert_eq!(forecast.dim(), (2, 2, 1));
    assert_eq!(forecast[[0, 0, 0]], 3.0);
    assert_eq!(forecast[[1, 1, 0]], 4.0);
}
