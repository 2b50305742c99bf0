//! Crop recommender - environmental crop classification
//!
//! Trains a random forest that maps temperature, humidity, soil pH and
//! rainfall to a crop label, persists it as a single artifact, and serves
//! predictions over HTTP.
//!
//! # Modules
//!
//! - [`preprocessing`] - Label encoding between crop names and class codes
//! - [`training`] - Decision trees, random forest, stratified split, metrics
//! - [`export`] - Model artifact persistence
//! - [`inference`] - Predictor over a loaded artifact
//! - [`utils`] - CSV loading and column extraction
//! - [`server`] - HTTP server with the prediction API
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Core ML modules
pub mod preprocessing;
pub mod training;
pub mod inference;

// Utilities
pub mod export;
pub mod utils;

// Services
pub mod server;
pub mod cli;

pub use error::{CropError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{CropError, Result};

    // Preprocessing
    pub use crate::preprocessing::LabelEncoder;

    // Training
    pub use crate::training::{
        train_and_save, RandomForest, TrainEngine, TrainingConfig, TrainingReport, FEATURE_COLUMNS,
    };

    // Export
    pub use crate::export::ModelArtifact;

    // Inference
    pub use crate::inference::{CropFeatures, Predictor};

    // Server
    pub use crate::server::{AppState, RetrainPolicy, ServerConfig};
}
