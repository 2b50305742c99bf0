//! Prediction over a loaded artifact

use std::path::Path;
use std::sync::Arc;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{CropError, Result};
use crate::export::ModelArtifact;
use crate::training::FEATURE_COLUMNS;

/// Environmental measurements for one prediction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropFeatures {
    pub temperature: f64,
    pub humidity: f64,
    pub ph: f64,
    pub rainfall: f64,
}

impl CropFeatures {
    pub fn new(temperature: f64, humidity: f64, ph: f64, rainfall: f64) -> Self {
        Self { temperature, humidity, ph, rainfall }
    }

    /// Values in model order: temperature, humidity, ph, rainfall
    pub fn to_vector(&self) -> [f64; 4] {
        [self.temperature, self.humidity, self.ph, self.rainfall]
    }

    /// Build from values in model order
    pub fn from_vector(values: [f64; 4]) -> Self {
        let [temperature, humidity, ph, rainfall] = values;
        Self { temperature, humidity, ph, rainfall }
    }

    fn check_finite(&self) -> Result<()> {
        for (name, value) in FEATURE_COLUMNS.iter().zip(self.to_vector()) {
            if !value.is_finite() {
                return Err(CropError::ValidationError(format!(
                    "Field '{}' must be a finite number",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// Read-only predictor shared by every request.
///
/// Cloning shares the same loaded artifact.
#[derive(Debug, Clone)]
pub struct Predictor {
    artifact: Arc<ModelArtifact>,
}

impl Predictor {
    /// Wrap an in-memory artifact
    pub fn new(artifact: ModelArtifact) -> Self {
        Self {
            artifact: Arc::new(artifact),
        }
    }

    /// Load the artifact from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let artifact = ModelArtifact::load(path)?;
        info!(
            path = %path.display(),
            classes = artifact.label_encoder().n_classes(),
            trees = artifact.model().n_trees(),
            "Model loaded"
        );
        Ok(Self::new(artifact))
    }

    /// Predict the crop label for one feature vector
    pub fn predict(&self, features: &CropFeatures) -> Result<String> {
        let mut labels = self.predict_batch(std::slice::from_ref(features))?;
        labels
            .pop()
            .ok_or_else(|| CropError::ValidationError("Empty prediction".to_string()))
    }

    /// Predict crop labels for several feature vectors
    pub fn predict_batch(&self, features: &[CropFeatures]) -> Result<Vec<String>> {
        if features.is_empty() {
            return Ok(Vec::new());
        }
        for f in features {
            f.check_finite()?;
        }

        let x = Array2::from_shape_fn((features.len(), FEATURE_COLUMNS.len()), |(r, c)| {
            features[r].to_vector()[c]
        });

        let codes = self.artifact.model().predict(&x)?;
        let encoder = self.artifact.label_encoder();
        codes
            .iter()
            .map(|&code| encoder.decode(code).map(str::to_string))
            .collect()
    }

    /// Label vocabulary the model can return
    pub fn classes(&self) -> &[String] {
        self.artifact.label_encoder().classes()
    }

    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::LabelEncoder;
    use crate::training::RandomForest;
    use ndarray::array;

    fn predictor() -> Predictor {
        let x = array![
            [10.0, 20.0, 5.0, 50.0],
            [11.0, 21.0, 5.1, 55.0],
            [12.0, 22.0, 5.2, 60.0],
            [30.0, 80.0, 7.0, 250.0],
            [31.0, 82.0, 7.1, 260.0],
            [32.0, 84.0, 7.2, 270.0],
        ];
        let y = array![0, 0, 0, 1, 1, 1];
        let mut model = RandomForest::new(10).with_random_state(42);
        model.fit(&x, &y).unwrap();
        let encoder = LabelEncoder::fit(&["chickpea", "rice"]).unwrap();
        Predictor::new(ModelArtifact::new(model, encoder).unwrap())
    }

    #[test]
    fn test_vector_order() {
        let f = CropFeatures::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(f.to_vector(), [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(CropFeatures::from_vector(f.to_vector()), f);
    }

    #[test]
    fn test_predict_decodes_label() {
        let p = predictor();
        assert_eq!(p.predict(&CropFeatures::new(11.0, 21.0, 5.1, 52.0)).unwrap(), "chickpea");
        assert_eq!(p.predict(&CropFeatures::new(31.0, 83.0, 7.1, 265.0)).unwrap(), "rice");
    }

    #[test]
    fn test_predict_batch_matches_single() {
        let p = predictor();
        let inputs = [
            CropFeatures::new(10.5, 20.5, 5.0, 51.0),
            CropFeatures::new(31.5, 81.0, 7.0, 255.0),
        ];
        let batch = p.predict_batch(&inputs).unwrap();
        let single: Vec<String> = inputs.iter().map(|f| p.predict(f).unwrap()).collect();
        assert_eq!(batch, single);
        assert!(p.predict_batch(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_non_finite_rejected() {
        let p = predictor();
        let result = p.predict(&CropFeatures::new(f64::NAN, 20.0, 6.0, 100.0));
        assert!(matches!(result, Err(CropError::ValidationError(_))));
    }

    #[test]
    fn test_clone_shares_artifact() {
        let p = predictor();
        let q = p.clone();
        assert!(std::ptr::eq(p.artifact(), q.artifact()));
        assert_eq!(q.classes(), &["chickpea", "rice"]);
    }
}
