//! Training engine implementation

use crate::error::{CropError, Result};
use crate::export::ModelArtifact;
use crate::preprocessing::LabelEncoder;
use crate::utils::{column_to_strings, columns_to_array2, DataLoader};
use super::random_forest::{MaxFeatures, RandomForest};
use super::{ModelMetrics, TrainingConfig};
use ndarray::{Array1, Array2, Axis};
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Summary of a completed training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    /// Holdout accuracy and macro metrics
    pub metrics: ModelMetrics,
    pub n_train: usize,
    pub n_holdout: usize,
    /// Label vocabulary in code order
    pub classes: Vec<String>,
    /// Feature name and normalized importance, in model order
    pub feature_importances: Vec<(String, f64)>,
    pub training_time_secs: f64,
}

impl TrainingReport {
    pub fn accuracy(&self) -> f64 {
        self.metrics.accuracy
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }
}

/// Row indices of a train/holdout partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub holdout: Vec<usize>,
}

/// Fits the label encoder and the forest on a dataset
#[derive(Debug, Clone)]
pub struct TrainEngine {
    config: TrainingConfig,
    model: Option<RandomForest>,
    label_encoder: Option<LabelEncoder>,
    report: Option<TrainingReport>,
}

impl TrainEngine {
    /// Create a new training engine
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            config,
            model: None,
            label_encoder: None,
            report: None,
        }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Fit the encoder and the forest, then score the holdout partition
    pub fn fit(&mut self, df: &DataFrame) -> Result<&TrainingReport> {
        let start = Instant::now();

        if df.height() == 0 {
            return Err(CropError::DataError("Dataset has no rows".to_string()));
        }

        let x = columns_to_array2(df, &self.config.feature_columns)?;
        let labels = column_to_strings(df, &self.config.label_column)?;

        let (encoder, codes) = LabelEncoder::fit_transform(&labels)?;
        let y = Array1::from_vec(codes);

        info!(
            rows = x.nrows(),
            features = x.ncols(),
            classes = encoder.n_classes(),
            "Prepared training data"
        );

        let split = stratified_split(&y, self.config.test_size, self.config.random_seed)?;
        let (x_train, y_train) = select_rows(&x, &y, &split.train);
        let (x_holdout, y_holdout) = select_rows(&x, &y, &split.holdout);

        let mut model = RandomForest::new(self.config.n_estimators)
            .with_min_samples_split(self.config.min_samples_split)
            .with_min_samples_leaf(self.config.min_samples_leaf)
            .with_max_features(MaxFeatures::Sqrt)
            .with_random_state(self.config.random_seed);
        if let Some(depth) = self.config.max_depth {
            model = model.with_max_depth(depth);
        }

        model.fit(&x_train, &y_train)?;

        if model.n_classes() != encoder.n_classes() {
            return Err(CropError::TrainingError(format!(
                "Forest saw {} classes but the encoder has {}",
                model.n_classes(),
                encoder.n_classes()
            )));
        }

        let y_pred = model.predict(&x_holdout)?;
        let metrics = ModelMetrics::compute_classification(&y_holdout, &y_pred, encoder.n_classes());

        let feature_importances = match model.feature_importances() {
            Some(imp) => self
                .config
                .feature_columns
                .iter()
                .cloned()
                .zip(imp.iter().copied())
                .collect(),
            None => Vec::new(),
        };

        let report = TrainingReport {
            metrics,
            n_train: split.train.len(),
            n_holdout: split.holdout.len(),
            classes: encoder.classes().to_vec(),
            feature_importances,
            training_time_secs: start.elapsed().as_secs_f64(),
        };

        info!(
            accuracy = report.metrics.accuracy,
            f1_macro = report.metrics.f1_score,
            n_train = report.n_train,
            n_holdout = report.n_holdout,
            trees = model.n_trees(),
            elapsed_secs = report.training_time_secs,
            "Model trained"
        );

        self.model = Some(model);
        self.label_encoder = Some(encoder);
        Ok(self.report.insert(report))
    }

    /// Report of the last fit
    pub fn report(&self) -> Option<&TrainingReport> {
        self.report.as_ref()
    }

    /// Pair the fitted forest with its label encoder
    pub fn into_artifact(self) -> Result<ModelArtifact> {
        match (self.model, self.label_encoder) {
            (Some(model), Some(label_encoder)) => ModelArtifact::new(model, label_encoder),
            _ => Err(CropError::ModelNotFitted),
        }
    }
}

/// Train on a CSV dataset and write the artifact, overwriting any existing file.
///
/// Holdout accuracy is reported but never blocks persistence.
pub fn train_and_save(
    config: TrainingConfig,
    dataset_path: impl AsRef<Path>,
    artifact_path: impl AsRef<Path>,
) -> Result<TrainingReport> {
    let dataset_path = dataset_path.as_ref();
    let artifact_path = artifact_path.as_ref();

    info!(dataset = %dataset_path.display(), "Loading training data");
    let df = DataLoader::new().load_csv(dataset_path)?;

    let mut engine = TrainEngine::new(config);
    let report = engine.fit(&df)?.clone();

    engine.into_artifact()?.save(artifact_path)?;
    info!(
        artifact = %artifact_path.display(),
        accuracy = report.metrics.accuracy,
        "Artifact written"
    );

    Ok(report)
}

/// Stratified train/holdout split over class codes.
///
/// Each class contributes `round(n_c * test_size)` holdout rows, clamped to
/// `[1, n_c - 1]`, picked by a seeded shuffle inside the class. Classes are
/// visited in code order so the split depends only on `y` and `seed`.
pub fn stratified_split(y: &Array1<usize>, test_size: f64, seed: u64) -> Result<SplitIndices> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(CropError::ValidationError(format!(
            "test_size must be in (0, 1), got {}",
            test_size
        )));
    }

    let mut class_indices: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (i, &label) in y.iter().enumerate() {
        class_indices.entry(label).or_default().push(i);
    }

    if class_indices.len() < 2 {
        return Err(CropError::ValidationError(format!(
            "Label column needs at least 2 distinct classes, found {}",
            class_indices.len()
        )));
    }

    if let Some((class, indices)) = class_indices.iter().find(|(_, idx)| idx.len() < 2) {
        return Err(CropError::ValidationError(format!(
            "Class {} has only {} member(s); stratified split needs at least 2",
            class,
            indices.len()
        )));
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut holdout = Vec::new();

    for indices in class_indices.values_mut() {
        indices.shuffle(&mut rng);

        let n_class = indices.len();
        let n_holdout = ((n_class as f64) * test_size).round() as usize;
        let n_holdout = n_holdout.clamp(1, n_class - 1);

        holdout.extend_from_slice(&indices[..n_holdout]);
        train.extend_from_slice(&indices[n_holdout..]);
    }

    Ok(SplitIndices { train, holdout })
}

fn select_rows(x: &Array2<f64>, y: &Array1<usize>, rows: &[usize]) -> (Array2<f64>, Array1<usize>) {
    let x_sel = x.select(Axis(0), rows);
    let y_sel = rows.iter().map(|&i| y[i]).collect();
    (x_sel, y_sel)
}
