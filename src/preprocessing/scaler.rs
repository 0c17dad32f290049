//! Feature scaling implementations

use super::transformer::FeatureTransformer;
use crate::error::{DeepTimeSeriesError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Type of scaler to use
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScalerType {
    /// Standard scaling (z-score normalization): (x - mean) / std
    Standard,
    /// Min-Max scaling: (x - min) / (max - min)
    MinMax,
    /// Robust scaling using median and IQR
    Robust,
    /// Max absolute scaling: x / max(|x|)
    MaxAbs,
    /// No scaling
    None,
}

/// Parameters for a fitted scaler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    pub center: f64, // mean, min, or median
    pub scale: f64,  // std, range, or IQR
}

/// Single-column numeric scaler. Output is always `Float64`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaler {
    scaler_type: ScalerType,
    params: Option<ScalerParams>,
}

impl Scaler {
    /// Create a new scaler
    pub fn new(scaler_type: ScalerType) -> Self {
        Self {
            scaler_type,
            params: None,
        }
    }

    /// Zero mean, unit (population) variance
    pub fn standard() -> Self {
        Self::new(ScalerType::Standard)
    }

    pub fn min_max() -> Self {
        Self::new(ScalerType::MinMax)
    }

    /// Pass-through that still converts to `Float64`
    pub fn identity() -> Self {
        Self::new(ScalerType::None)
    }

    /// Create a scaler with known parameters
    pub fn with_params(scaler_type: ScalerType, params: ScalerParams) -> Self {
        Self {
            scaler_type,
            params: Some(params),
        }
    }

    pub fn scaler_type(&self) -> &ScalerType {
        &self.scaler_type
    }

    pub fn params(&self) -> Option<&ScalerParams> {
        self.params.as_ref()
    }

    fn fitted_params(&self, series: &Series) -> Result<&ScalerParams> {
        self.params
            .as_ref()
            .ok_or_else(|| DeepTimeSeriesError::NotFitted(series.name().to_string()))
    }

    fn compute_params(&self, ca: &Float64Chunked) -> Result<ScalerParams> {
        match self.scaler_type {
            ScalerType::Standard => {
                let mean = ca.mean().unwrap_or(0.0);
                let std = ca.std(0).unwrap_or(1.0);
                Ok(ScalerParams {
                    center: mean,
                    scale: if std == 0.0 { 1.0 } else { std },
                })
            }
            ScalerType::MinMax => {
                let min = ca.min().unwrap_or(0.0);
                let max = ca.max().unwrap_or(1.0);
                let range = max - min;
                Ok(ScalerParams {
                    center: min,
                    scale: if range == 0.0 { 1.0 } else { range },
                })
            }
            ScalerType::Robust => {
                let median = ca.median().unwrap_or(0.0);
                let q1 = ca.quantile(0.25, QuantileMethod::Linear)?.unwrap_or(0.0);
                let q3 = ca.quantile(0.75, QuantileMethod::Linear)?.unwrap_or(1.0);
                let iqr = q3 - q1;
                Ok(ScalerParams {
                    center: median,
                    scale: if iqr == 0.0 { 1.0 } else { iqr },
                })
            }
            ScalerType::MaxAbs => {
                let max_abs = ca
                    .into_iter()
                    .filter_map(|v| v.map(|x| x.abs()))
                    .fold(0.0f64, |a, b| a.max(b));
                Ok(ScalerParams {
                    center: 0.0,
                    scale: if max_abs == 0.0 { 1.0 } else { max_abs },
                })
            }
            ScalerType::None => Ok(ScalerParams {
                center: 0.0,
                scale: 1.0,
            }),
        }
    }
}

fn to_f64(series: &Series) -> Result<Float64Chunked> {
    let casted = series.cast(&DataType::Float64)?;
    Ok(casted.f64()?.clone())
}

impl FeatureTransformer for Scaler {
    fn fit(&mut self, series: &Series) -> Result<()> {
        let ca = to_f64(series)?;
        self.params = Some(self.compute_params(&ca)?);
        Ok(())
    }

    fn transform(&self, series: &Series) -> Result<Series> {
        let params = self.fitted_params(series)?;
        let ca = to_f64(series)?;

        let scaled: Float64Chunked = ca
            .into_iter()
            .map(|opt| opt.map(|v| (v - params.center) / params.scale))
            .collect();

        Ok(scaled.with_name(series.name().clone()).into_series())
    }

    fn inverse_transform(&self, series: &Series) -> Result<Series> {
        let params = self.fitted_params(series)?;
        let ca = to_f64(series)?;

        let unscaled: Float64Chunked = ca
            .into_iter()
            .map(|opt| opt.map(|v| v * params.scale + params.center))
            .collect();

        Ok(unscaled.with_name(series.name().clone()).into_series())
    }

    fn is_fitted(&self) -> bool {
        self.params.is_some()
    }

    fn name(&self) -> &str {
        match self.scaler_type {
            ScalerType::Standard => "standard_scaler",
            ScalerType::MinMax => "min_max_scaler",
            ScalerType::Robust => "robust_scaler",
            ScalerType::MaxAbs => "max_abs_scaler",
            ScalerType::None => "identity",
        }
    }
}
