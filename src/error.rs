//! Error types for deep-time-series

use thiserror::Error;

/// Result type alias for deep-time-series operations
pub type Result<T> = std::result::Result<T, DeepTimeSeriesError>;

/// Main error type for dataset construction, extraction and transformation
#[derive(Error, Debug)]
pub enum DeepTimeSeriesError {
    #[error("Duplicate chunk tag: {0}")]
    DuplicateTag(String),

    #[error("At least one chunk spec is required")]
    EmptyChunkSpecs,

    #[error("Invalid range for chunk '{tag}': start {start} is out of range (encoding_length = {encoding_length}, shift = {shift})")]
    InvalidChunkRange {
        tag: String,
        start: i64,
        encoding_length: usize,
        shift: i64,
    },

    #[error("Window [{start}, {end}) exceeds series length {series_length}")]
    WindowOutOfBounds {
        start: usize,
        end: usize,
        series_length: usize,
    },

    #[error("Index {index} out of bounds for dataset of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("Series '{series_id}' has {length} rows, but a chunk needs {required}")]
    SeriesTooShort {
        series_id: String,
        length: usize,
        required: usize,
    },

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Column '{column}' contains {count} null values")]
    NullValues { column: String, count: usize },

    #[error("Transformer for '{0}' is not fitted")]
    NotFitted(String),

    #[error("Unknown category '{category}' in column '{column}'")]
    UnknownCategory { column: String, category: String },

    #[error("Unknown chunk tag: {0}")]
    UnknownTag(String),

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Transformation failed: {0}")]
    TransformError(String),
}

impl From<polars::error::PolarsError> for DeepTimeSeriesError {
    fn from(err: polars::error::PolarsError) -> Self {
        DeepTimeSeriesError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for DeepTimeSeriesError {
    fn from(err: serde_json::Error) -> Self {
        DeepTimeSeriesError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for DeepTimeSeriesError {
    fn from(err: ndarray::ShapeError) -> Self {
        DeepTimeSeriesError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DeepTimeSeriesError::DuplicateTag("encoding.x".to_string());
        assert_eq!(err.to_string(), "Duplicate chunk tag: encoding.x");
    }

    #[test]
    fn test_error_from_shape() {
        let shape_err = ndarray::Array2::<f64>::from_shape_vec((2, 2), vec![1.0]).unwrap_err();
        let err: DeepTimeSeriesError = shape_err.into();
        assert!(matches!(err, DeepTimeSeriesError::ShapeError { .. }));
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err: DeepTimeSeriesError = json_err.into();
        assert!(matches!(err, DeepTimeSeriesError::SerializationError(_)));
    }
}
