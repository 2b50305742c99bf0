//! Application state shared across handlers

use crate::inference::Predictor;

/// Immutable service context built once at startup
#[derive(Debug, Clone)]
pub struct AppState {
    pub predictor: Predictor,
}

impl AppState {
    pub fn new(predictor: Predictor) -> Self {
        Self { predictor }
    }
}
