//! Chunk windowing
//!
//! Provides the building blocks for turning a single time-indexed series into
//! fixed-length sequence-to-sequence examples:
//! - Chunk specifications (encoding, decoding and label roles)
//! - Dtype-tagged chunk buffers
//! - Sliding-window extraction

mod array;
mod extractor;
mod spec;

pub use array::{ChunkArray, Chunks};
pub use extractor::ChunkExtractor;
pub(crate) use extractor::check_unique_tags;
pub use spec::{to_range_chunk_specs, ChunkDtype, ChunkRole, ChunkSpec, RangeChunkSpec};
