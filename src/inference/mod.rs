//! Inference module
//!
//! Loads a persisted artifact once and maps feature vectors to crop labels.
//! The loaded predictor is immutable and cheap to clone, so any number of
//! request handlers can share it without locking.

mod engine;

pub use engine::{CropFeatures, Predictor};
