//! Model training module
//!
//! Provides training functionality for the crop classifier:
//! - Decision trees and Random Forests
//! - Stratified train/holdout splitting
//! - Holdout classification metrics

mod config;
mod engine;
mod models;
pub mod decision_tree;
pub mod random_forest;

pub use config::{TrainingConfig, FEATURE_COLUMNS, LABEL_COLUMN};
pub use engine::{stratified_split, train_and_save, SplitIndices, TrainEngine, TrainingReport};
pub use models::ModelMetrics;
pub use decision_tree::{Criterion, DecisionTree, TreeNode};
pub use random_forest::{MaxFeatures, RandomForest};
