//! Per-column transformer contract and the fitted-state wrapper

use crate::error::Result;
use polars::prelude::*;
use std::ops::Deref;

/// A reversible transformation over a single feature column.
///
/// Implementations must keep the input column name and length.
pub trait FeatureTransformer: Send + Sync + std::fmt::Debug {
    /// Learn parameters from the column
    fn fit(&mut self, series: &Series) -> Result<()>;

    /// Apply the learned transformation
    fn transform(&self, series: &Series) -> Result<Series>;

    /// Undo [`FeatureTransformer::transform`]
    fn inverse_transform(&self, series: &Series) -> Result<Series>;

    /// Fit and transform in one step
    fn fit_transform(&mut self, series: &Series) -> Result<Series> {
        self.fit(series)?;
        self.transform(series)
    }

    /// Whether parameters have been learned
    fn is_fitted(&self) -> bool;

    /// Name of this transformer
    fn name(&self) -> &str;
}

/// Marker wrapper for a value whose fit phase has completed.
///
/// Only produced by fitting (or by an explicit check that everything inside is
/// already fitted), so operations defined on `Fitted<T>` cannot observe unfitted
/// state.
#[derive(Debug)]
pub struct Fitted<T> {
    inner: T,
}

impl<T> Fitted<T> {
    pub(crate) fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Give up the fitted guarantee and recover the wrapped value
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T> Deref for Fitted<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}
