//! Dataset configuration

use crate::error::{DeepTimeSeriesError, Result};
use crate::preprocessing::{TIME_INDEX, TIME_SERIES_ID};
use serde::{Deserialize, Serialize};

/// Configuration for windowing a multi-series table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Number of time steps before the encoding boundary
    pub encoding_length: usize,

    /// Number of time steps after the encoding boundary
    pub decoding_length: usize,

    /// Fit the feature transformers on the pooled, sorted table
    pub fit_feature_transformers: bool,

    /// Column used to order rows
    pub time_index_column: String,

    /// Column used to split rows into series
    pub time_series_id_column: String,

    /// Drop series shorter than one window instead of failing
    pub skip_short_series: bool,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            encoding_length: 1,
            decoding_length: 1,
            fit_feature_transformers: true,
            time_index_column: TIME_INDEX.to_string(),
            time_series_id_column: TIME_SERIES_ID.to_string(),
            skip_short_series: false,
        }
    }
}

impl DatasetConfig {
    /// Create a new configuration with the given window lengths
    pub fn new(encoding_length: usize, decoding_length: usize) -> Self {
        Self {
            encoding_length,
            decoding_length,
            ..Self::default()
        }
    }

    /// Builder method to toggle fitting of the feature transformers
    pub fn with_fit_feature_transformers(mut self, fit: bool) -> Self {
        self.fit_feature_transformers = fit;
        self
    }

    /// Builder method to set the time index column
    pub fn with_time_index_column(mut self, name: impl Into<String>) -> Self {
        self.time_index_column = name.into();
        self
    }

    /// Builder method to set the series identifier column
    pub fn with_time_series_id_column(mut self, name: impl Into<String>) -> Self {
        self.time_series_id_column = name.into();
        self
    }

    /// Builder method to skip series shorter than one window
    pub fn with_skip_short_series(mut self, skip: bool) -> Self {
        self.skip_short_series = skip;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.encoding_length == 0 {
            return Err(DeepTimeSeriesError::InvalidParameter {
                name: "encoding_length".to_string(),
                value: "0".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        if self.decoding_length == 0 {
            return Err(DeepTimeSeriesError::InvalidParameter {
                name: "decoding_length".to_string(),
                value: "0".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        if self.time_index_column == self.time_series_id_column {
            return Err(DeepTimeSeriesError::InvalidParameter {
                name: "time_series_id_column".to_string(),
                value: self.time_series_id_column.clone(),
                reason: "must differ from time_index_column".to_string(),
            });
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
