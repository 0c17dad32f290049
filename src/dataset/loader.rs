//! Mini-batch loading

use super::dataset::TimeSeriesDataset;
use crate::chunk::{ChunkArray, ChunkDtype, Chunks};
use crate::error::{DeepTimeSeriesError, Result};
use crate::forecasting::TensorMap;
use ndarray::{Array2, Array3, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Stacked chunks, shape `(batch, time, feature)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BatchArray {
    Float32(Array3<f32>),
    Float64(Array3<f64>),
    Int32(Array3<i32>),
    Int64(Array3<i64>),
}

impl BatchArray {
    pub fn dtype(&self) -> ChunkDtype {
        match self {
            BatchArray::Float32(_) => ChunkDtype::Float32,
            BatchArray::Float64(_) => ChunkDtype::Float64,
            BatchArray::Int32(_) => ChunkDtype::Int32,
            BatchArray::Int64(_) => ChunkDtype::Int64,
        }
    }

    pub fn shape(&self) -> (usize, usize, usize) {
        match self {
            BatchArray::Float32(a) => a.dim(),
            BatchArray::Float64(a) => a.dim(),
            BatchArray::Int32(a) => a.dim(),
            BatchArray::Int64(a) => a.dim(),
        }
    }

    pub fn as_f32(&self) -> Option<&Array3<f32>> {
        match self {
            BatchArray::Float32(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<&Array3<f64>> {
        match self {
            BatchArray::Float64(a) => Some(a),
            _ => None,
        }
    }

    /// Lossy widening to `f64`
    pub fn to_f64(&self) -> Array3<f64> {
        match self {
            BatchArray::Float32(a) => a.mapv(f64::from),
            BatchArray::Float64(a) => a.clone(),
            BatchArray::Int32(a) => a.mapv(f64::from),
            BatchArray::Int64(a) => a.mapv(|v| v as f64),
        }
    }

    /// Example `i` of the batch
    pub fn item(&self, i: usize) -> ChunkArray {
        match self {
            BatchArray::Float32(a) => ChunkArray::Float32(a.index_axis(Axis(0), i).to_owned()),
            BatchArray::Float64(a) => ChunkArray::Float64(a.index_axis(Axis(0), i).to_owned()),
            BatchArray::Int32(a) => ChunkArray::Int32(a.index_axis(Axis(0), i).to_owned()),
            BatchArray::Int64(a) => ChunkArray::Int64(a.index_axis(Axis(0), i).to_owned()),
        }
    }
}

/// Ordered mapping from chunk tag to stacked array
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    entries: Vec<(String, BatchArray)>,
}

impl Batch {
    /// Stack items tag by tag. Every item must carry the tags of the first one
    /// with matching dtypes and shapes.
    pub fn stack(items: &[Chunks]) -> Result<Self> {
        let first = match items.first() {
            Some(first) => first,
            None => return Ok(Self::default()),
        };

        let mut entries = Vec::with_capacity(first.len());
        for (tag, head) in first.iter() {
            let arrays = items
                .iter()
                .map(|item| {
                    item.get(tag)
                        .ok_or_else(|| DeepTimeSeriesError::UnknownTag(tag.to_string()))
                })
                .collect::<Result<Vec<_>>>()?;

            let stacked = match head.dtype() {
                ChunkDtype::Float32 => BatchArray::Float32(stack_arrays(&arrays, tag, ChunkArray::as_f32)?),
                ChunkDtype::Float64 => BatchArray::Float64(stack_arrays(&arrays, tag, ChunkArray::as_f64)?),
                ChunkDtype::Int32 => BatchArray::Int32(stack_arrays(&arrays, tag, ChunkArray::as_i32)?),
                ChunkDtype::Int64 => BatchArray::Int64(stack_arrays(&arrays, tag, ChunkArray::as_i64)?),
            };
            entries.push((tag.to_string(), stacked));
        }

        Ok(Self { entries })
    }

    pub fn get(&self, tag: &str) -> Option<&BatchArray> {
        self.entries
            .iter()
            .find(|(t, _)| t == tag)
            .map(|(_, array)| array)
    }

    /// Number of examples in the batch
    pub fn batch_size(&self) -> usize {
        self.entries.first().map(|(_, a)| a.shape().0).unwrap_or(0)
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

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BatchArray)> {
        self.entries.iter().map(|(t, a)| (t.as_str(), a))
    }

    /// Keyed by tag, as consumed by a forecasting module
    pub fn into_map(self) -> TensorMap<BatchArray> {
        self.entries.into_iter().collect()
    }
}

impl IntoIterator for Batch {
    type Item = (String, BatchArray);
    type IntoIter = std::vec::IntoIter<(String, BatchArray)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

fn stack_arrays<'a, T, F>(arrays: &[&'a ChunkArray], tag: &str, view: F) -> Result<Array3<T>>
where
    T: Clone + 'a,
    F: Fn(&'a ChunkArray) -> Option<&'a Array2<T>>,
{
    let views = arrays
        .iter()
        .map(|array| {
            view(*array).map(|a| a.view()).ok_or_else(|| DeepTimeSeriesError::ShapeError {
                expected: format!("uniform dtype for '{}'", tag),
                actual: format!("{:?}", array.dtype()),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ndarray::stack(Axis(0), &views)?)
}

/// Iterates a dataset in mini-batches.
///
/// Items of a batch are fetched in parallel. With a shuffle seed the example
/// order is a seeded permutation that changes with [`DataLoader::set_epoch`].
#[derive(Debug, Clone)]
pub struct DataLoader<'a> {
    dataset: &'a TimeSeriesDataset,
    batch_size: usize,
    shuffle_seed: Option<u64>,
    epoch: u64,
    drop_last: bool,
}

impl<'a> DataLoader<'a> {
    pub fn new(dataset: &'a TimeSeriesDataset, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(DeepTimeSeriesError::InvalidParameter {
                name: "batch_size".to_string(),
                value: "0".to_string(),
                reason: "must be positive".to_string(),
            });
        }

        Ok(Self {
            dataset,
            batch_size,
            shuffle_seed: None,
            epoch: 0,
            drop_last: false,
        })
    }

    /// Builder method to shuffle with a fixed seed
    pub fn with_shuffle(mut self, seed: u64) -> Self {
        self.shuffle_seed = Some(seed);
        self
    }

    /// Builder method to drop a trailing partial batch
    pub fn with_drop_last(mut self, drop_last: bool) -> Self {
        self.drop_last = drop_last;
        self
    }

    pub fn set_epoch(&mut self, epoch: u64) {
        self.epoch = epoch;
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Number of batches per pass
    pub fn len(&self) -> usize {
        let n = self.dataset.len();
        if self.drop_last {
            n / self.batch_size
        } else {
            n.div_ceil(self.batch_size)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Example order for the current epoch
    pub fn indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..self.dataset.len()).collect();
        if let Some(seed) = self.shuffle_seed {
            let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(self.epoch));
            indices.shuffle(&mut rng);
        }
        indices
    }

    /// Load the examples at `indices` as one batch
    pub fn load(&self, indices: &[usize]) -> Result<Batch> {
        let items = indices
            .par_iter()
            .map(|&i| self.dataset.get_item(i))
            .collect::<Result<Vec<_>>>()?;
        Batch::stack(&items)
    }

    pub fn iter(&self) -> impl Iterator<Item = Result<Batch>> + '_ {
        let indices = self.indices();
        let batch_size = self.batch_size;

        (0..self.len()).map(move |b| {
            let start = b * batch_size;
            let end = (start + batch_size).min(indices.len());
            self.load(&indices[start..end])
        })
    }
}
