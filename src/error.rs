//! Error types for training, persistence and inference

use thiserror::Error;

/// Errors raised by the crop recommendation pipeline
#[derive(Error, Debug)]
pub enum CropError {
    /// Dataset could not be read or has invalid contents
    #[error("Data error: {0}")]
    DataError(String),

    /// A required column is absent from the dataset
    #[error("Column not found: {0}")]
    FeatureNotFound(String),

    /// Input failed a precondition
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Array dimensions do not line up
    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Model has not been fitted")]
    ModelNotFitted,

    /// Label was not part of the training vocabulary
    #[error("Unknown label: '{0}'")]
    UnknownLabel(String),

    /// Class code outside `[0, n_classes)`
    #[error("Label code {code} out of range for {n_classes} classes")]
    CodeOutOfRange { code: usize, n_classes: usize },

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}

impl From<serde_json::Error> for CropError {
    fn from(e: serde_json::Error) -> Self {
        CropError::SerializationError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CropError>;
