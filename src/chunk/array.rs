//! Chunk buffers and the tag-ordered chunk map

use super::spec::ChunkDtype;
use crate::error::{DeepTimeSeriesError, Result};
use ndarray::{s, Array2, ShapeBuilder};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Dense `[time, feature]` buffer in the dtype requested by its chunk spec
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChunkArray {
    Float32(Array2<f32>),
    Float64(Array2<f64>),
    Int32(Array2<i32>),
    Int64(Array2<i64>),
}

impl ChunkArray {
    /// Gather `names` from `df` as a contiguous row-major array cast to `dtype`.
    ///
    /// Columns are taken in the order of `names`. Nulls (including values the
    /// cast could not represent) are rejected.
    pub fn from_frame(df: &DataFrame, names: &[String], dtype: ChunkDtype) -> Result<Self> {
        let n_rows = df.height();
        let target = dtype.to_polars();

        let columns = names
            .iter()
            .map(|name| {
                let column = df
                    .column(name)
                    .map_err(|_| DeepTimeSeriesError::FeatureNotFound(name.clone()))?;
                let casted = column.as_materialized_series().cast(&target)?;
                let count = casted.null_count();
                if count > 0 {
                    return Err(DeepTimeSeriesError::NullValues {
                        column: name.clone(),
                        count,
                    });
                }
                Ok(casted)
            })
            .collect::<Result<Vec<Series>>>()?;

        let array = match dtype {
            ChunkDtype::Float32 => ChunkArray::Float32(stack_columns(&columns, n_rows, |s| {
                Ok(s.f32()?.into_no_null_iter().collect())
            })?),
            ChunkDtype::Float64 => ChunkArray::Float64(stack_columns(&columns, n_rows, |s| {
                Ok(s.f64()?.into_no_null_iter().collect())
            })?),
            ChunkDtype::Int32 => ChunkArray::Int32(stack_columns(&columns, n_rows, |s| {
                Ok(s.i32()?.into_no_null_iter().collect())
            })?),
            ChunkDtype::Int64 => ChunkArray::Int64(stack_columns(&columns, n_rows, |s| {
                Ok(s.i64()?.into_no_null_iter().collect())
            })?),
        };

        Ok(array)
    }

    pub fn dtype(&self) -> ChunkDtype {
        match self {
            ChunkArray::Float32(_) => ChunkDtype::Float32,
            ChunkArray::Float64(_) => ChunkDtype::Float64,
            ChunkArray::Int32(_) => ChunkDtype::Int32,
            ChunkArray::Int64(_) => ChunkDtype::Int64,
        }
    }

    /// `(time steps, features)`
    pub fn shape(&self) -> (usize, usize) {
        match self {
            ChunkArray::Float32(a) => a.dim(),
            ChunkArray::Float64(a) => a.dim(),
            ChunkArray::Int32(a) => a.dim(),
            ChunkArray::Int64(a) => a.dim(),
        }
    }

    pub fn nrows(&self) -> usize {
        self.shape().0
    }

    pub fn ncols(&self) -> usize {
        self.shape().1
    }

    /// Copy of the rows in `rows`
    pub fn slice_rows(&self, rows: Range<usize>) -> Self {
        let (start, end) = (rows.start, rows.end);
        match self {
            ChunkArray::Float32(a) => ChunkArray::Float32(a.slice(s![start..end, ..]).to_owned()),
            ChunkArray::Float64(a) => ChunkArray::Float64(a.slice(s![start..end, ..]).to_owned()),
            ChunkArray::Int32(a) => ChunkArray::Int32(a.slice(s![start..end, ..]).to_owned()),
            ChunkArray::Int64(a) => ChunkArray::Int64(a.slice(s![start..end, ..]).to_owned()),
        }
    }

    /// Lossy widening to `f64`
    pub fn to_f64(&self) -> Array2<f64> {
        match self {
            ChunkArray::Float32(a) => a.mapv(f64::from),
            ChunkArray::Float64(a) => a.clone(),
            ChunkArray::Int32(a) => a.mapv(f64::from),
            ChunkArray::Int64(a) => a.mapv(|v| v as f64),
        }
    }

    pub fn as_f32(&self) -> Option<&Array2<f32>> {
        match self {
            ChunkArray::Float32(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<&Array2<f64>> {
        match self {
            ChunkArray::Float64(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<&Array2<i32>> {
        match self {
            ChunkArray::Int32(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<&Array2<i64>> {
        match self {
            ChunkArray::Int64(a) => Some(a),
            _ => None,
        }
    }

    /// Feature column `j` as a named series
    pub fn column_series(&self, j: usize, name: &str) -> Series {
        match self {
            ChunkArray::Float32(a) => Series::new(name.into(), a.column(j).to_vec()),
            ChunkArray::Float64(a) => Series::new(name.into(), a.column(j).to_vec()),
            ChunkArray::Int32(a) => Series::new(name.into(), a.column(j).to_vec()),
            ChunkArray::Int64(a) => Series::new(name.into(), a.column(j).to_vec()),
        }
    }

    /// Rebuild a table with one column per feature, named by `names`
    pub fn to_frame(&self, names: &[String]) -> Result<DataFrame> {
        if names.len() != self.ncols() {
            return Err(DeepTimeSeriesError::ShapeError {
                expected: format!("{} feature columns", names.len()),
                actual: format!("{} columns", self.ncols()),
            });
        }

        let columns: Vec<Column> = names
            .iter()
            .enumerate()
            .map(|(j, name)| self.column_series(j, name).into())
            .collect();

        Ok(DataFrame::new(columns)?)
    }
}

fn stack_columns<T, F>(columns: &[Series], n_rows: usize, values: F) -> Result<Array2<T>>
where
    T: Clone,
    F: Fn(&Series) -> Result<Vec<T>>,
{
    let mut flat = Vec::with_capacity(n_rows * columns.len());
    for series in columns {
        flat.extend(values(series)?);
    }

    // column-major gather, row-major result
    let array = Array2::from_shape_vec((n_rows, columns.len()).f(), flat)?;
    Ok(array.as_standard_layout().into_owned())
}

/// Ordered mapping from chunk tag to array. Tags are unique.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Chunks {
    entries: Vec<(String, ChunkArray)>,
}

impl Chunks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Append a chunk; a tag may only appear once
    pub fn insert(&mut self, tag: impl Into<String>, array: ChunkArray) -> Result<()> {
        let tag = tag.into();
        if self.contains(&tag) {
            return Err(DeepTimeSeriesError::DuplicateTag(tag));
        }
        self.entries.push((tag, array));
        Ok(())
    }

    pub fn get(&self, tag: &str) -> Option<&ChunkArray> {
        self.entries
            .iter()
            .find(|(t, _)| t == tag)
            .map(|(_, array)| array)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.entries.iter().any(|(t, _)| t == tag)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(t, _)| t.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ChunkArray)> {
        self.entries.iter().map(|(t, a)| (t.as_str(), a))
    }
}

impl IntoIterator for Chunks {
    type Item = (String, ChunkArray);
    type IntoIter = std::vec::IntoIter<(String, ChunkArray)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_from_frame_column_order() {
        let df = df!(
            "a" => &[1.0, 2.0, 3.0],
            "b" => &[10.0, 20.0, 30.0],
        )
        .unwrap();

        let array = ChunkArray::from_frame(&df, &names(&["b", "a"]), ChunkDtype::Float64).unwrap();
        let a = array.as_f64().unwrap();
        assert_eq!(a.dim(), (3, 2));
        assert_eq!(a[[0, 0]], 10.0);
        assert_eq!(a[[2, 1]], 3.0);
        assert!(a.is_standard_layout());
    }

    #[test]
    fn test_from_frame_casts() {
        let df = df!("a" => &[1i64, 2, 3]).unwrap();
        let array = ChunkArray::from_frame(&df, &names(&["a"]), ChunkDtype::Float32).unwrap();
        assert_eq!(array.dtype(), ChunkDtype::Float32);
        assert_eq!(array.as_f32().unwrap()[[1, 0]], 2.0f32);
    }

    #[test]
    fn test_from_frame_missing_column() {
        let df = df!("a" => &[1.0]).unwrap();
        let err = ChunkArray::from_frame(&df, &names(&["z"]), ChunkDtype::Float32).unwrap_err();
        assert!(matches!(err, DeepTimeSeriesError::FeatureNotFound(ref n) if n == "z"));
    }

    #[test]
    fn test_from_frame_nulls() {
        let df = df!("a" => &[Some(1.0), None, Some(3.0)]).unwrap();
        let err = ChunkArray::from_frame(&df, &names(&["a"]), ChunkDtype::Float64).unwrap_err();
        assert!(matches!(err, DeepTimeSeriesError::NullValues { count: 1, .. }));
    }

    #[test]
    fn test_slice_rows() {
        let array = ChunkArray::Int64(Array2::from_shape_vec((4, 1), vec![0, 1, 2, 3]).unwrap());
        let sliced = array.slice_rows(1..3);
        assert_eq!(sliced.shape(), (2, 1));
        assert_eq!(sliced.as_i64().unwrap()[[0, 0]], 1);
    }

    #[test]
    fn test_to_frame_roundtrip_names() {
        let array = ChunkArray::Float32(
            Array2::from_shape_vec((2, 2), vec![1.0, 2.0, 3.0, 4.0]).unwrap(),
        );
        let df = array.to_frame(&names(&["x", "y"])).unwrap();
        assert_eq!(df.width(), 2);
        let y = df.column("y").unwrap().f32().unwrap();
        assert_eq!(y.get(1), Some(4.0));

        assert!(array.to_frame(&names(&["x"])).is_err());
    }

    #[test]
    fn test_chunks_unique_tags() {
        let mut chunks = Chunks::new();
        let array = ChunkArray::Float64(Array2::zeros((1, 1)));
        chunks.insert("encoding.x", array.clone()).unwrap();
        chunks.insert("label.y", array.clone()).unwrap();

        let err = chunks.insert("encoding.x", array).unwrap_err();
        assert!(matches!(err, DeepTimeSeriesError::DuplicateTag(_)));
        assert_eq!(chunks.tags().collect::<Vec<_>>(), vec!["encoding.x", "label.y"]);
    }
}
