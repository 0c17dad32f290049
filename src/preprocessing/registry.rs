//! Registry of per-feature transformers

use super::transformer::{FeatureTransformer, Fitted};
use crate::error::{DeepTimeSeriesError, Result};
use polars::prelude::*;
use tracing::debug;

/// Default name of the time index column
pub const TIME_INDEX: &str = "time_index";
/// Default name of the series identifier column
pub const TIME_SERIES_ID: &str = "time_series_id";

/// Maps feature names to transformers.
///
/// Every operation walks the table's columns in order, keeps those with a
/// registered transformer and drops the rest. The time index and series
/// identifier columns are copied through untouched.
#[derive(Debug)]
pub struct FeatureTransformers {
    transformers: Vec<(String, Box<dyn FeatureTransformer>)>,
    time_index_column: String,
    time_series_id_column: String,
}

impl Default for FeatureTransformers {
    fn default() -> Self {
        Self {
            transformers: Vec::new(),
            time_index_column: TIME_INDEX.to_string(),
            time_series_id_column: TIME_SERIES_ID.to_string(),
        }
    }
}

impl FeatureTransformers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to register a transformer for `name`
    pub fn with_transformer<T>(mut self, name: impl Into<String>, transformer: T) -> Self
    where
        T: FeatureTransformer + 'static,
    {
        self.insert(name, Box::new(transformer));
        self
    }

    /// Builder method to rename the pass-through index columns
    pub fn with_index_columns(
        mut self,
        time_index: impl Into<String>,
        time_series_id: impl Into<String>,
    ) -> Self {
        self.time_index_column = time_index.into();
        self.time_series_id_column = time_series_id.into();
        self
    }

    /// Register a transformer, replacing any previous one for `name`
    pub fn insert(&mut self, name: impl Into<String>, transformer: Box<dyn FeatureTransformer>) {
        let name = name.into();
        match self.transformers.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = transformer,
            None => self.transformers.push((name, transformer)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn FeatureTransformer> {
        self.transformers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Registered feature names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.transformers.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.transformers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transformers.is_empty()
    }

    pub fn time_index_column(&self) -> &str {
        &self.time_index_column
    }

    pub fn time_series_id_column(&self) -> &str {
        &self.time_series_id_column
    }

    /// Fit every registered transformer whose column is in `df`
    pub fn fit(mut self, df: &DataFrame) -> Result<Fitted<Self>> {
        self.fit_columns(df)?;
        Ok(Fitted::new(self))
    }

    /// Fit and transform in one step
    pub fn fit_transform(mut self, df: &DataFrame) -> Result<(Fitted<Self>, DataFrame)> {
        let mut columns = Vec::new();
        for name in self.valid_names(df) {
            let series = df.column(&name)?.as_materialized_series();
            let transformer = self.transformer_mut(&name)?;
            columns.push(transformer.fit_transform(series)?);
            debug!(feature = %name, transformer = transformer.name(), "Fitted feature transformer");
        }

        let result = self.assemble(df, columns)?;
        Ok((Fitted::new(self), result))
    }

    fn fit_columns(&mut self, df: &DataFrame) -> Result<()> {
        for name in self.valid_names(df) {
            let series = df.column(&name)?.as_materialized_series();
            let transformer = self.transformer_mut(&name)?;
            transformer.fit(series)?;
            debug!(feature = %name, transformer = transformer.name(), "Fitted feature transformer");
        }
        Ok(())
    }

    fn transformer_mut(&mut self, name: &str) -> Result<&mut Box<dyn FeatureTransformer>> {
        self.transformers
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t)
            .ok_or_else(|| DeepTimeSeriesError::FeatureNotFound(name.to_string()))
    }

    fn is_index_column(&self, name: &str) -> bool {
        name == self.time_index_column || name == self.time_series_id_column
    }

    /// Registered names present in `df`, in the table's column order.
    /// Index columns are never transformed, even when registered.
    fn valid_names(&self, df: &DataFrame) -> Vec<String> {
        df.get_columns()
            .iter()
            .map(|c| c.name().to_string())
            .filter(|name| self.contains(name) && !self.is_index_column(name))
            .collect()
    }

    fn apply<F>(&self, df: &DataFrame, func: F) -> Result<DataFrame>
    where
        F: Fn(&dyn FeatureTransformer, &Series) -> Result<Series>,
    {
        let columns = self
            .valid_names(df)
            .iter()
            .map(|name| {
                let series = df.column(name)?.as_materialized_series();
                let transformer = self
                    .get(name)
                    .ok_or_else(|| DeepTimeSeriesError::FeatureNotFound(name.clone()))?;
                func(transformer, series)
            })
            .collect::<Result<Vec<_>>>()?;

        self.assemble(df, columns)
    }

    /// Build the output table and append the pass-through index columns
    fn assemble(&self, df: &DataFrame, transformed: Vec<Series>) -> Result<DataFrame> {
        let mut columns: Vec<Column> = transformed.into_iter().map(Into::into).collect();

        for name in [&self.time_index_column, &self.time_series_id_column] {
            if let Ok(column) = df.column(name) {
                columns.push(column.clone());
            }
        }

        Ok(DataFrame::new(columns)?)
    }
}

impl Fitted<FeatureTransformers> {
    /// Wrap a registry whose transformers were fitted elsewhere
    pub fn from_prefitted(transformers: FeatureTransformers) -> Result<Self> {
        if let Some((name, _)) = transformers
            .transformers
            .iter()
            .find(|(name, t)| !t.is_fitted() && !transformers.is_index_column(name))
        {
            return Err(DeepTimeSeriesError::NotFitted(name.clone()));
        }
        Ok(Fitted::new(transformers))
    }

    /// Transform every registered column of `df`
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        self.apply(df, |transformer, series| transformer.transform(series))
    }

    /// Undo [`Fitted::transform`] for every registered column of `df`
    pub fn inverse_transform(&self, df: &DataFrame) -> Result<DataFrame> {
        self.apply(df, |transformer, series| transformer.inverse_transform(series))
    }

    /// Refit on new data
    pub fn refit(self, df: &DataFrame) -> Result<Self> {
        self.into_inner().fit(df)
    }

    /// Rename the pass-through index columns; learned state is untouched
    pub(crate) fn with_index_columns(self, time_index: &str, time_series_id: &str) -> Self {
        Fitted::new(self.into_inner().with_index_columns(time_index, time_series_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::{LabelEncoder, Scaler};

    fn sample_df() -> DataFrame {
        df!(
            "time_index" => &[0i64, 1, 2, 3],
            "x" => &[1.0, 2.0, 3.0, 4.0],
            "unused" => &[9.0, 9.0, 9.0, 9.0],
            "y" => &[10.0, 20.0, 30.0, 40.0],
            "time_series_id" => &["a", "a", "b", "b"],
        )
        .unwrap()
    }

    fn registry() -> FeatureTransformers {
        FeatureTransformers::new()
            .with_transformer("y", Scaler::min_max())
            .with_transformer("x", Scaler::standard())
            .with_transformer("missing", Scaler::standard())
    }

    fn column_names(df: &DataFrame) -> Vec<String> {
        df.get_columns().iter().map(|c| c.name().to_string()).collect()
    }

    #[test]
    fn test_table_column_order_and_filter() {
        let (_, out) = registry().fit_transform(&sample_df()).unwrap();
        assert_eq!(
            column_names(&out),
            vec!["x", "y", "time_index", "time_series_id"]
        );
        assert!(out.column("unused").is_err());
    }

    #[test]
    fn test_index_columns_pass_through() {
        let df = sample_df();
        let fitted = registry().fit(&df).unwrap();
        let out = fitted.transform(&df).unwrap();

        for name in ["time_index", "time_series_id"] {
            let before = df.column(name).unwrap().as_materialized_series();
            let after = out.column(name).unwrap().as_materialized_series();
            assert!(after.equals(before));
        }
    }

    #[test]
    fn test_registered_index_column_copied_verbatim() {
        let df = df!(
            "time_index" => &[10i64, 20, 30],
            "x" => &[1.0, 2.0, 3.0],
        )
        .unwrap();

        let (fitted, out) = FeatureTransformers::new()
            .with_transformer("x", Scaler::identity())
            .with_transformer("time_index", Scaler::min_max())
            .fit_transform(&df)
            .unwrap();

        let before = df.column("time_index").unwrap().as_materialized_series();
        assert!(out.column("time_index").unwrap().as_materialized_series().equals(before));
        assert!(!fitted.get("time_index").unwrap().is_fitted());

        let restored = fitted.inverse_transform(&out).unwrap();
        assert!(restored.column("time_index").unwrap().as_materialized_series().equals(before));
        assert_eq!(column_names(&out), vec!["x", "time_index"]);
    }

    #[test]
    fn test_roundtrip() {
        let df = sample_df();
        let (fitted, scaled) = registry().fit_transform(&df).unwrap();
        let restored = fitted.inverse_transform(&scaled).unwrap();

        for name in ["x", "y"] {
            let original = df.column(name).unwrap().f64().unwrap();
            let back = restored.column(name).unwrap().f64().unwrap();
            for (o, r) in original.into_iter().zip(back.into_iter()) {
                assert!((o.unwrap() - r.unwrap()).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn test_fit_then_transform_matches_fit_transform() {
        let df = sample_df();
        let (_, direct) = registry().fit_transform(&df).unwrap();
        let two_step = registry().fit(&df).unwrap().transform(&df).unwrap();
        assert!(direct.equals(&two_step));
    }

    #[test]
    fn test_from_prefitted_requires_fit() {
        let err = Fitted::from_prefitted(registry()).unwrap_err();
        assert!(matches!(err, DeepTimeSeriesError::NotFitted(ref n) if n == "y"));

        let mut scaler = Scaler::standard();
        scaler
            .fit(&Series::new("x".into(), &[1.0, 2.0]))
            .unwrap();
        let prefitted = FeatureTransformers::new().with_transformer("x", scaler);
        assert!(Fitted::from_prefitted(prefitted).is_ok());
    }

    #[test]
    fn test_transformer_error_propagates() {
        let df = df!("day" => &["mon", "tue"]).unwrap();
        let fitted = FeatureTransformers::new()
            .with_transformer("day", LabelEncoder::new())
            .fit(&df)
            .unwrap();

        let unseen = df!("day" => &["sun"]).unwrap();
        let err = fitted.transform(&unseen).unwrap_err();
        assert!(matches!(err, DeepTimeSeriesError::UnknownCategory { .. }));
    }

    #[test]
    fn test_insert_replaces() {
        let mut transformers = registry();
        transformers.insert("x", Box::new(Scaler::identity()));
        assert_eq!(transformers.len(), 3);
        assert_eq!(transformers.get("x").unwrap().name(), "identity");
        assert_eq!(transformers.names(), vec!["y", "x", "missing"]);
    }
}
