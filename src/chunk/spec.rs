//! Chunk specifications
//!
//! A [`ChunkSpec`] names a group of feature columns, the numeric type they are
//! extracted as, and a time shift. Given the encoding and decoding lengths of a
//! dataset it resolves into a [`RangeChunkSpec`] carrying an absolute range inside
//! the per-example window.

use crate::error::{DeepTimeSeriesError, Result};
use polars::prelude::DataType;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Role of a chunk inside a sequence-to-sequence example
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChunkRole {
    /// Input history fed to the encoder
    Encoding,
    /// Future inputs fed to the decoder
    Decoding,
    /// Future targets
    Label,
}

impl ChunkRole {
    /// Tag prefix for this role, including the trailing dot
    pub fn prefix(&self) -> &'static str {
        match self {
            ChunkRole::Encoding => "encoding.",
            ChunkRole::Decoding => "decoding.",
            ChunkRole::Label => "label.",
        }
    }

    /// Recover the role from a prefixed tag
    pub fn from_tag(tag: &str) -> Option<Self> {
        [ChunkRole::Encoding, ChunkRole::Decoding, ChunkRole::Label]
            .into_iter()
            .find(|role| tag.starts_with(role.prefix()))
    }
}

/// Numeric type a chunk is extracted as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChunkDtype {
    Float32,
    Float64,
    Int32,
    Int64,
}

impl ChunkDtype {
    /// Matching polars data type
    pub fn to_polars(&self) -> DataType {
        match self {
            ChunkDtype::Float32 => DataType::Float32,
            ChunkDtype::Float64 => DataType::Float64,
            ChunkDtype::Int32 => DataType::Int32,
            ChunkDtype::Int64 => DataType::Int64,
        }
    }
}

/// Relative chunk descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkSpec {
    tag: String,
    names: Vec<String>,
    dtype: ChunkDtype,
    shift: i64,
}

impl ChunkSpec {
    /// Create a spec for `role`; the tag gets the role prefix
    pub fn new<S: Into<String>>(
        role: ChunkRole,
        tag: &str,
        names: impl IntoIterator<Item = S>,
        dtype: ChunkDtype,
    ) -> Self {
        Self {
            tag: format!("{}{}", role.prefix(), tag),
            names: names.into_iter().map(Into::into).collect(),
            dtype,
            shift: 0,
        }
    }

    /// Encoding chunk, tagged `encoding.<tag>`
    pub fn encoding<S: Into<String>>(
        tag: &str,
        names: impl IntoIterator<Item = S>,
        dtype: ChunkDtype,
    ) -> Self {
        Self::new(ChunkRole::Encoding, tag, names, dtype)
    }

    /// Decoding chunk, tagged `decoding.<tag>`
    pub fn decoding<S: Into<String>>(
        tag: &str,
        names: impl IntoIterator<Item = S>,
        dtype: ChunkDtype,
    ) -> Self {
        Self::new(ChunkRole::Decoding, tag, names, dtype)
    }

    /// Label chunk, tagged `label.<tag>`
    pub fn label<S: Into<String>>(
        tag: &str,
        names: impl IntoIterator<Item = S>,
        dtype: ChunkDtype,
    ) -> Self {
        Self::new(ChunkRole::Label, tag, names, dtype)
    }

    /// Set the time shift
    pub fn with_shift(mut self, shift: i64) -> Self {
        self.shift = shift;
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn dtype(&self) -> ChunkDtype {
        self.dtype
    }

    pub fn shift(&self) -> i64 {
        self.shift
    }

    pub fn role(&self) -> Option<ChunkRole> {
        ChunkRole::from_tag(&self.tag)
    }

    /// Resolve into an absolute range within the per-example window.
    ///
    /// Every role uses `[encoding_length - shift, encoding_length + decoding_length - shift)`.
    /// A negative or unrepresentable range is rejected.
    pub fn to_range_chunk_spec(
        &self,
        encoding_length: usize,
        decoding_length: usize,
    ) -> Result<RangeChunkSpec> {
        let start = i64::try_from(encoding_length)
            .ok()
            .and_then(|e| e.checked_sub(self.shift));
        let end = start.and_then(|s| {
            i64::try_from(decoding_length)
                .ok()
                .and_then(|d| s.checked_add(d))
        });

        let range = match (start, end) {
            (Some(start), Some(end)) if start >= 0 => {
                usize::try_from(start).ok().zip(usize::try_from(end).ok())
            }
            _ => None,
        };

        match range {
            Some((start, end)) => Ok(RangeChunkSpec {
                tag: self.tag.clone(),
                names: self.names.clone(),
                range: start..end,
                dtype: self.dtype,
            }),
            None => Err(DeepTimeSeriesError::InvalidChunkRange {
                tag: self.tag.clone(),
                start: (encoding_length as i64).saturating_sub(self.shift),
                encoding_length,
                shift: self.shift,
            }),
        }
    }
}

/// Chunk descriptor with an absolute `[start, end)` range inside the window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeChunkSpec {
    pub tag: String,
    pub names: Vec<String>,
    pub range: Range<usize>,
    pub dtype: ChunkDtype,
}

impl RangeChunkSpec {
    pub fn new<S: Into<String>>(
        tag: impl Into<String>,
        names: impl IntoIterator<Item = S>,
        range: Range<usize>,
        dtype: ChunkDtype,
    ) -> Self {
        Self {
            tag: tag.into(),
            names: names.into_iter().map(Into::into).collect(),
            range,
            dtype,
        }
    }

    /// Number of time steps in this chunk
    pub fn length(&self) -> usize {
        self.range.len()
    }
}

/// Resolve a list of specs, failing on the first invalid range
pub fn to_range_chunk_specs(
    specs: &[ChunkSpec],
    encoding_length: usize,
    decoding_length: usize,
) -> Result<Vec<RangeChunkSpec>> {
    specs
        .iter()
        .map(|spec| spec.to_range_chunk_spec(encoding_length, decoding_length))
        .collect()
}
