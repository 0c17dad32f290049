//! Feature preprocessing module
//!
//! Provides reversible per-feature transformations for model-ready tables:
//! - The single-column transformer contract and the fitted-state wrapper
//! - Feature scaling (Standard, MinMax, Robust, MaxAbs)
//! - Categorical index encoding
//! - A registry applying one transformer per named feature

mod encoder;
mod registry;
mod scaler;
mod transformer;

pub use encoder::LabelEncoder;
pub use registry::{FeatureTransformers, TIME_INDEX, TIME_SERIES_ID};
pub use scaler::{Scaler, ScalerParams, ScalerType};
pub use transformer::{FeatureTransformer, Fitted};
