//! Training configuration

use serde::{Deserialize, Serialize};

/// Feature columns in the order the model consumes them
pub const FEATURE_COLUMNS: [&str; 4] = ["temperature", "humidity", "ph", "rainfall"];

/// Name of the crop label column
pub const LABEL_COLUMN: &str = "label";

/// Configuration for a training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Feature columns, in model order
    pub feature_columns: Vec<String>,
    /// Label column
    pub label_column: String,
    /// Fraction of rows held out for evaluation
    pub test_size: f64,
    /// Seed for the split and the forest
    pub random_seed: u64,
    /// Number of trees
    pub n_estimators: usize,
    /// Maximum tree depth
    pub max_depth: Option<usize>,
    /// Minimum samples to split an internal node
    pub min_samples_split: usize,
    /// Minimum samples per leaf
    pub min_samples_leaf: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            feature_columns: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            label_column: LABEL_COLUMN.to_string(),
            test_size: 0.2,
            random_seed: 42,
            n_estimators: 100,
            max_depth: Some(10),
            min_samples_split: 5,
            min_samples_leaf: 2,
        }
    }
}

impl TrainingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }

    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_label_column(mut self, column: impl Into<String>) -> Self {
        self.label_column = column.into();
        self
    }
}
