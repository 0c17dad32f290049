//! Forecasting model contract
//!
//! Models implement encode, decode and loss evaluation over named tensors.
//! The provided methods wire those into forward passes and per-step hooks;
//! parameter updates stay with the caller.

mod logger;

pub use logger::{LossHistory, LossRecord, StepLogger, TracingLogger};

use crate::error::{DeepTimeSeriesError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

/// Named tensors passed between encoder, decoder and loss
pub type TensorMap<T> = HashMap<String, T>;

/// Phase of a training run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Training,
    Validation,
    Test,
}

impl Stage {
    /// Key the step loss is logged under
    pub fn loss_key(&self) -> &'static str {
        match self {
            Stage::Training => "loss/training",
            Stage::Validation => "loss/validation",
            Stage::Test => "loss/test",
        }
    }
}

/// Merge maps left to right; later maps override earlier keys
pub fn merge_maps<T, I>(maps: I) -> TensorMap<T>
where
    I: IntoIterator<Item = TensorMap<T>>,
{
    let mut merged = HashMap::new();
    for map in maps {
        merged.extend(map);
    }
    merged
}

/// Sequence-to-sequence forecasting model
pub trait ForecastingModule {
    type Tensor: Clone;
    type Loss;

    /// Encode the history part of the inputs
    fn encode(&self, inputs: &TensorMap<Self::Tensor>) -> Result<TensorMap<Self::Tensor>>;

    /// Decode with the ground-truth targets available
    fn decode_train(&self, inputs: &TensorMap<Self::Tensor>) -> Result<TensorMap<Self::Tensor>>;

    /// Decode autoregressively
    fn decode_eval(&self, inputs: &TensorMap<Self::Tensor>) -> Result<TensorMap<Self::Tensor>>;

    fn evaluate_loss(&self, batch: &TensorMap<Self::Tensor>) -> Result<Self::Loss>;

    /// Scalar value of a loss, used for logging
    fn loss_value(&self, loss: &Self::Loss) -> f64;

    fn is_training(&self) -> bool;

    fn set_training(&mut self, training: bool);

    fn decode(&self, inputs: &TensorMap<Self::Tensor>) -> Result<TensorMap<Self::Tensor>> {
        if self.is_training() {
            self.decode_train(inputs)
        } else {
            self.decode_eval(inputs)
        }
    }

    fn forward(&self, inputs: &TensorMap<Self::Tensor>) -> Result<TensorMap<Self::Tensor>> {
        let encoder_outputs = self.encode(inputs)?;
        let decoder_inputs = merge_maps([inputs.clone(), encoder_outputs]);
        self.decode(&decoder_inputs)
    }

    /// Returns the loss for the caller to optimize
    fn training_step(
        &self,
        batch: &TensorMap<Self::Tensor>,
        logger: &mut dyn StepLogger,
    ) -> Result<Self::Loss> {
        let loss = self.evaluate_loss(batch)?;
        logger.log(Stage::Training.loss_key(), self.loss_value(&loss));
        Ok(loss)
    }

    fn validation_step(
        &self,
        batch: &TensorMap<Self::Tensor>,
        logger: &mut dyn StepLogger,
    ) -> Result<f64> {
        let loss = self.loss_value(&self.evaluate_loss(batch)?);
        logger.log(Stage::Validation.loss_key(), loss);
        Ok(loss)
    }

    fn test_step(&self, batch: &TensorMap<Self::Tensor>, logger: &mut dyn StepLogger) -> Result<f64> {
        let loss = self.loss_value(&self.evaluate_loss(batch)?);
        logger.log(Stage::Test.loss_key(), loss);
        Ok(loss)
    }
}

/// Run one pass of `stage` over `batches` and return the mean loss.
///
/// The module is put in training mode for [`Stage::Training`] and in
/// evaluation mode otherwise.
pub fn run_stage<M, I>(
    module: &mut M,
    stage: Stage,
    batches: I,
    logger: &mut dyn StepLogger,
) -> Result<f64>
where
    M: ForecastingModule + ?Sized,
    I: IntoIterator<Item = Result<TensorMap<M::Tensor>>>,
{
    module.set_training(stage == Stage::Training);

    let mut total = 0.0;
    let mut steps = 0usize;
    for batch in batches {
        let batch = batch?;
        let loss = match stage {
            Stage::Training => {
                let loss = module.training_step(&batch, logger)?;
                module.loss_value(&loss)
            }
            Stage::Validation => module.validation_step(&batch, logger)?,
            Stage::Test => module.test_step(&batch, logger)?,
        };
        total += loss;
        steps += 1;
    }

    if steps == 0 {
        return Err(DeepTimeSeriesError::DataError(format!(
            "no batches for {:?} stage",
            stage
        )));
    }

    let mean = total / steps as f64;
    info!(stage = ?stage, steps, mean_loss = mean, "Stage finished");
    Ok(mean)
}
