//! Flat-indexed windowed dataset over many series

use super::config::DatasetConfig;
use crate::chunk::{check_unique_tags, to_range_chunk_specs, ChunkExtractor, ChunkSpec, Chunks, RangeChunkSpec};
use crate::error::{DeepTimeSeriesError, Result};
use crate::preprocessing::{FeatureTransformers, Fitted};
use polars::prelude::*;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Per-chunk tables in original feature units, in item order
pub type ChunkFrames = Vec<(String, DataFrame)>;

/// Windowed examples drawn from every series of a table.
///
/// Construction is eager: the table is sorted by time, scaled once with
/// transformers fitted on all series pooled together, and split per series.
/// Example `i` addresses series `k` at start offset `i - offsets[k]`, where
/// `offsets` are the cumulative usable lengths.
#[derive(Debug)]
pub struct TimeSeriesDataset {
    config: DatasetConfig,
    df: DataFrame,
    scaled_df: DataFrame,
    range_chunk_specs: Vec<RangeChunkSpec>,
    chunk_length: usize,
    chunk_extractors: Vec<ChunkExtractor>,
    series_ids: Vec<String>,
    lengths: Vec<usize>,
    offsets: Vec<usize>,
    feature_transformers: Fitted<FeatureTransformers>,
}

impl TimeSeriesDataset {
    /// Build a dataset from unfitted transformers.
    ///
    /// With `fit_feature_transformers` unset every registered transformer must
    /// already be fitted.
    pub fn new(
        df: &DataFrame,
        config: DatasetConfig,
        chunk_specs: &[ChunkSpec],
        feature_transformers: FeatureTransformers,
    ) -> Result<Self> {
        config.validate()?;
        let range_chunk_specs =
            to_range_chunk_specs(chunk_specs, config.encoding_length, config.decoding_length)?;
        let df = sort_by_time(df, &config.time_index_column)?;

        let feature_transformers = feature_transformers
            .with_index_columns(config.time_index_column.clone(), config.time_series_id_column.clone());
        let feature_transformers = if config.fit_feature_transformers {
            feature_transformers.fit(&df)?
        } else {
            Fitted::from_prefitted(feature_transformers)?
        };

        Self::build(df, config, range_chunk_specs, feature_transformers)
    }

    /// Build a dataset from transformers fitted elsewhere, typically on the
    /// training split. They are refitted only if `fit_feature_transformers` is set.
    pub fn with_fitted(
        df: &DataFrame,
        config: DatasetConfig,
        chunk_specs: &[ChunkSpec],
        feature_transformers: Fitted<FeatureTransformers>,
    ) -> Result<Self> {
        config.validate()?;
        let range_chunk_specs =
            to_range_chunk_specs(chunk_specs, config.encoding_length, config.decoding_length)?;
        let df = sort_by_time(df, &config.time_index_column)?;

        let feature_transformers = feature_transformers
            .with_index_columns(&config.time_index_column, &config.time_series_id_column);
        let feature_transformers = if config.fit_feature_transformers {
            feature_transformers.refit(&df)?
        } else {
            feature_transformers
        };

        Self::build(df, config, range_chunk_specs, feature_transformers)
    }

    fn build(
        df: DataFrame,
        config: DatasetConfig,
        range_chunk_specs: Vec<RangeChunkSpec>,
        feature_transformers: Fitted<FeatureTransformers>,
    ) -> Result<Self> {
        check_unique_tags(&range_chunk_specs)?;
        let chunk_length = range_chunk_specs
            .iter()
            .map(|spec| spec.range.end)
            .max()
            .ok_or(DeepTimeSeriesError::EmptyChunkSpecs)?;

        let scaled_df = feature_transformers.transform(&df)?;

        let mut series_ids = Vec::new();
        let mut chunk_extractors = Vec::new();
        let mut lengths = Vec::new();

        for (series_id, rows) in group_rows(&scaled_df, &config.time_series_id_column)? {
            if rows.len() < chunk_length {
                if config.skip_short_series {
                    warn!(
                        series_id = %series_id,
                        length = rows.len(),
                        required = chunk_length,
                        "Skipping series shorter than one window"
                    );
                    continue;
                }
                return Err(DeepTimeSeriesError::SeriesTooShort {
                    series_id,
                    length: rows.len(),
                    required: chunk_length,
                });
            }

            let series_df = scaled_df.take(&IdxCa::from_vec("rows".into(), rows))?;
            let extractor = ChunkExtractor::new(&series_df, &range_chunk_specs)?;
            let length = series_df.height() - chunk_length;
            debug!(series_id = %series_id, rows = series_df.height(), examples = length, "Prepared series");

            series_ids.push(series_id);
            chunk_extractors.push(extractor);
            lengths.push(length);
        }

        let offsets: Vec<usize> = lengths
            .iter()
            .scan(0usize, |acc, &len| {
                let start = *acc;
                *acc += len;
                Some(start)
            })
            .collect();

        info!(
            series = series_ids.len(),
            examples = lengths.iter().sum::<usize>(),
            chunk_length,
            "Built time series dataset"
        );

        Ok(Self {
            config,
            df,
            scaled_df,
            range_chunk_specs,
            chunk_length,
            chunk_extractors,
            series_ids,
            lengths,
            offsets,
            feature_transformers,
        })
    }

    /// Total number of examples over all series
    pub fn len(&self) -> usize {
        self.lengths.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Map a flat index to `(series index, start time index within that series)`
    pub fn locate(&self, index: usize) -> Result<(usize, usize)> {
        let len = self.len();
        if index >= len {
            return Err(DeepTimeSeriesError::IndexOutOfBounds { index, len });
        }

        // last series whose first example is at or before `index`
        let series_index = self.offsets.partition_point(|&start| start <= index) - 1;
        Ok((series_index, index - self.offsets[series_index]))
    }

    /// Chunks of example `index`
    pub fn get_item(&self, index: usize) -> Result<Chunks> {
        let (series_index, start_time_index) = self.locate(index)?;
        self.chunk_extractors[series_index].extract(start_time_index)
    }

    /// Iterate over all examples in index order
    pub fn iter(&self) -> impl Iterator<Item = Result<Chunks>> + '_ {
        (0..self.len()).map(move |i| self.get_item(i))
    }

    /// Rebuild one table per chunk and undo the feature scaling.
    ///
    /// Features without a registered transformer are dropped, as in every
    /// transformer output.
    pub fn convert_item_to_df(&self, item: &Chunks) -> Result<ChunkFrames> {
        item.iter()
            .map(|(tag, array)| {
                let spec = self
                    .range_chunk_specs
                    .iter()
                    .find(|spec| spec.tag == tag)
                    .ok_or_else(|| DeepTimeSeriesError::UnknownTag(tag.to_string()))?;

                let scaled = array.to_frame(&spec.names)?;
                let frame = self.feature_transformers.inverse_transform(&scaled)?;
                Ok((tag.to_string(), frame))
            })
            .collect()
    }

    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    pub fn encoding_length(&self) -> usize {
        self.config.encoding_length
    }

    pub fn decoding_length(&self) -> usize {
        self.config.decoding_length
    }

    /// Window length shared by every series
    pub fn chunk_length(&self) -> usize {
        self.chunk_length
    }

    pub fn range_chunk_specs(&self) -> &[RangeChunkSpec] {
        &self.range_chunk_specs
    }

    /// Series identifiers in first-appearance order after sorting by time
    pub fn series_ids(&self) -> &[String] {
        &self.series_ids
    }

    /// Usable example count per series
    pub fn series_lengths(&self) -> &[usize] {
        &self.lengths
    }

    pub fn chunk_extractors(&self) -> &[ChunkExtractor] {
        &self.chunk_extractors
    }

    /// Input table sorted by time
    pub fn df(&self) -> &DataFrame {
        &self.df
    }

    /// Transformer output for the sorted table
    pub fn scaled_df(&self) -> &DataFrame {
        &self.scaled_df
    }

    pub fn feature_transformers(&self) -> &Fitted<FeatureTransformers> {
        &self.feature_transformers
    }

    /// Give back the fitted transformers, e.g. to build a validation dataset
    pub fn into_feature_transformers(self) -> Fitted<FeatureTransformers> {
        self.feature_transformers
    }
}

/// Stable sort by the time index column
fn sort_by_time(df: &DataFrame, time_index_column: &str) -> Result<DataFrame> {
    if df.column(time_index_column).is_err() {
        return Err(DeepTimeSeriesError::FeatureNotFound(time_index_column.to_string()));
    }

    Ok(df.sort(
        [time_index_column],
        SortMultipleOptions::default().with_maintain_order(true),
    )?)
}

/// Row positions per series identifier, in first-appearance order
fn group_rows(df: &DataFrame, id_column: &str) -> Result<Vec<(String, Vec<IdxSize>)>> {
    let column = df
        .column(id_column)
        .map_err(|_| DeepTimeSeriesError::FeatureNotFound(id_column.to_string()))?;
    let ids = column.as_materialized_series().cast(&DataType::String)?;
    let ids = ids.str()?;

    let null_count = ids.null_count();
    if null_count > 0 {
        return Err(DeepTimeSeriesError::NullValues {
            column: id_column.to_string(),
            count: null_count,
        });
    }

    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<IdxSize>)> = Vec::new();

    for (row, id) in ids.into_no_null_iter().enumerate() {
        let slot = *positions.entry(id).or_insert_with(|| {
            groups.push((id.to_string(), Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(row as IdxSize);
    }

    Ok(groups)
}
