//! Categorical index encoding

use super::transformer::FeatureTransformer;
use crate::error::{DeepTimeSeriesError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Maps each category to its index in first-appearance order.
///
/// Categories are compared by their string form, so integer codes work as well.
/// The encoded column is `Int64`; the inverse accepts any numeric column and
/// rounds to the nearest index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
    mapping: HashMap<String, i64>,
    is_fitted: bool,
}

impl LabelEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Categories in index order
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    fn check_fitted(&self, series: &Series) -> Result<()> {
        if self.is_fitted {
            Ok(())
        } else {
            Err(DeepTimeSeriesError::NotFitted(series.name().to_string()))
        }
    }
}

fn to_str(series: &Series) -> Result<StringChunked> {
    let casted = series.cast(&DataType::String)?;
    Ok(casted.str()?.clone())
}

impl FeatureTransformer for LabelEncoder {
    fn fit(&mut self, series: &Series) -> Result<()> {
        let ca = to_str(series)?;

        self.classes.clear();
        self.mapping.clear();
        for val in ca.into_iter().flatten() {
            if !self.mapping.contains_key(val) {
                self.mapping.insert(val.to_string(), self.classes.len() as i64);
                self.classes.push(val.to_string());
            }
        }

        self.is_fitted = true;
        Ok(())
    }

    fn transform(&self, series: &Series) -> Result<Series> {
        self.check_fitted(series)?;
        let ca = to_str(series)?;

        let values = ca
            .into_iter()
            .map(|opt| match opt {
                Some(s) => self.mapping.get(s).copied().map(Some).ok_or_else(|| {
                    DeepTimeSeriesError::UnknownCategory {
                        column: series.name().to_string(),
                        category: s.to_string(),
                    }
                }),
                None => Ok(None),
            })
            .collect::<Result<Vec<Option<i64>>>>()?;

        Ok(Series::new(series.name().clone(), values))
    }

    fn inverse_transform(&self, series: &Series) -> Result<Series> {
        self.check_fitted(series)?;
        let casted = series.cast(&DataType::Float64)?;
        let ca = casted.f64()?;

        let values = ca
            .into_iter()
            .map(|opt| match opt {
                Some(v) => {
                    let index = v.round();
                    if !index.is_finite() || index < 0.0 || index as usize >= self.classes.len() {
                        return Err(DeepTimeSeriesError::TransformError(format!(
                            "index {} out of range for '{}' with {} classes",
                            v,
                            series.name(),
                            self.classes.len()
                        )));
                    }
                    Ok(Some(self.classes[index as usize].clone()))
                }
                None => Ok(None),
            })
            .collect::<Result<Vec<Option<String>>>>()?;

        Ok(Series::new(series.name().clone(), values))
    }

    fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    fn name(&self) -> &str {
        "label_encoder"
    }
}
