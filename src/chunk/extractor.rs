//! Sliding-window chunk extraction for a single series

use super::array::{ChunkArray, Chunks};
use super::spec::RangeChunkSpec;
use crate::error::{DeepTimeSeriesError, Result};
use polars::prelude::*;
use std::collections::HashSet;

/// Extracts fixed-length chunks from one series.
///
/// Every extraction reads a window of `chunk_length` rows starting at the
/// requested time index; each spec then takes its own `range` out of that window.
#[derive(Debug, Clone)]
pub struct ChunkExtractor {
    range_chunk_specs: Vec<RangeChunkSpec>,
    chunk_length: usize,
    series_length: usize,
    data: Vec<ChunkArray>,
}

impl ChunkExtractor {
    /// Build an extractor over `df`, one precomputed array per spec
    pub fn new(df: &DataFrame, range_chunk_specs: &[RangeChunkSpec]) -> Result<Self> {
        check_unique_tags(range_chunk_specs)?;

        let chunk_length = range_chunk_specs
            .iter()
            .map(|spec| spec.range.end)
            .max()
            .ok_or(DeepTimeSeriesError::EmptyChunkSpecs)?;

        let data = range_chunk_specs
            .iter()
            .map(|spec| ChunkArray::from_frame(df, &spec.names, spec.dtype))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            range_chunk_specs: range_chunk_specs.to_vec(),
            chunk_length,
            series_length: df.height(),
            data,
        })
    }

    /// Extract every chunk for the window starting at `start_time_index`
    pub fn extract(&self, start_time_index: usize) -> Result<Chunks> {
        let in_bounds = start_time_index
            .checked_add(self.chunk_length)
            .filter(|&end| end <= self.series_length);
        if in_bounds.is_none() {
            return Err(DeepTimeSeriesError::WindowOutOfBounds {
                start: start_time_index,
                end: start_time_index.saturating_add(self.chunk_length),
                series_length: self.series_length,
            });
        }

        let mut chunks = Chunks::with_capacity(self.range_chunk_specs.len());
        for (spec, array) in self.range_chunk_specs.iter().zip(&self.data) {
            let rows = start_time_index + spec.range.start..start_time_index + spec.range.end;
            chunks.insert(spec.tag.clone(), array.slice_rows(rows))?;
        }

        Ok(chunks)
    }

    /// Length of the shared window, the largest range end over all specs
    pub fn chunk_length(&self) -> usize {
        self.chunk_length
    }

    pub fn series_length(&self) -> usize {
        self.series_length
    }

    pub fn range_chunk_specs(&self) -> &[RangeChunkSpec] {
        &self.range_chunk_specs
    }

    /// Number of windows that fit entirely inside the series
    pub fn n_windows(&self) -> usize {
        (self.series_length + 1).saturating_sub(self.chunk_length)
    }
}

pub(crate) fn check_unique_tags(specs: &[RangeChunkSpec]) -> Result<()> {
    let mut seen = HashSet::with_capacity(specs.len());
    for spec in specs {
        if !seen.insert(spec.tag.as_str()) {
            return Err(DeepTimeSeriesError::DuplicateTag(spec.tag.clone()));
        }
    }
    Ok(())
}
