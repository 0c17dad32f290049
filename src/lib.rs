//! deep-time-series - Sequence-to-sequence windowing for multi-series tables
//!
//! This crate turns a table of many time series into fixed-length encoder /
//! decoder examples for forecasting models:
//! - Chunk specifications that place named windows relative to the encoding boundary
//! - Per-series sliding-window extraction into dtype-tagged arrays
//! - Reversible per-feature scaling and encoding fitted once across all series
//! - A flat-indexed dataset with mini-batch loading
//!
//! # Modules
//!
//! - [`chunk`] - Chunk specs, chunk buffers and window extraction
//! - [`preprocessing`] - Feature transformers and their registry
//! - [`dataset`] - Windowed dataset, configuration and batch loading
//! - [`forecasting`] - Forecasting model contract and step logging

// Core error handling
pub mod error;

// Windowing
pub mod chunk;
pub mod dataset;

// Feature processing
pub mod preprocessing;

// Model contract
pub mod forecasting;

pub use error::{DeepTimeSeriesError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{DeepTimeSeriesError, Result};

    // Chunks
    pub use crate::chunk::{ChunkArray, ChunkDtype, ChunkExtractor, ChunkRole, ChunkSpec, Chunks, RangeChunkSpec};

    // Preprocessing
    pub use crate::preprocessing::{FeatureTransformer, FeatureTransformers, Fitted, LabelEncoder, Scaler, ScalerType};

    // Dataset
    pub use crate::dataset::{Batch, BatchArray, ChunkFrames, DataLoader, DatasetConfig, TimeSeriesDataset};

    // Forecasting
    pub use crate::forecasting::{
        merge_maps, run_stage, ForecastingModule, LossHistory, Stage, StepLogger, TensorMap,
    };
}
