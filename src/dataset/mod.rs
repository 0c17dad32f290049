//! Windowed datasets over multi-series tables
//!
//! A [`TimeSeriesDataset`] flattens every admissible window of every series
//! into one index space; a [`DataLoader`] walks it in stacked mini-batches.

mod config;
#[allow(clippy::module_inception)]
mod dataset;
mod loader;

pub use config::DatasetConfig;
pub use dataset::{ChunkFrames, TimeSeriesDataset};
pub use loader::{Batch, BatchArray, DataLoader};
