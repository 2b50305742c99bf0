//! Persisted model artifact

use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{CropError, Result};
use crate::preprocessing::LabelEncoder;
use crate::training::RandomForest;

/// The fitted forest and the label encoder it was trained against.
///
/// The forest outputs class codes; they only mean something through the
/// encoder they were produced with, so the two are always stored and
/// loaded as one unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    model: RandomForest,
    label_encoder: LabelEncoder,
}

impl ModelArtifact {
    /// Pair a fitted forest with its encoder
    pub fn new(model: RandomForest, label_encoder: LabelEncoder) -> Result<Self> {
        let artifact = Self { model, label_encoder };
        artifact.validate()?;
        Ok(artifact)
    }

    pub fn model(&self) -> &RandomForest {
        &self.model
    }

    pub fn label_encoder(&self) -> &LabelEncoder {
        &self.label_encoder
    }

    fn validate(&self) -> Result<()> {
        if self.model.n_trees() == 0 {
            return Err(CropError::ModelNotFitted);
        }
        if self.model.n_classes() != self.label_encoder.n_classes() {
            return Err(CropError::SerializationError(format!(
                "Model predicts {} classes but the label encoder has {}",
                self.model.n_classes(),
                self.label_encoder.n_classes()
            )));
        }
        Ok(())
    }

    /// Write the artifact as JSON, replacing any existing file.
    ///
    /// The bytes go to a sibling temp file first and are renamed into place.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = temp_path(path);
        {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(&mut writer, self)?;
            writer.flush()?;
        }
        fs::rename(&tmp_path, path)?;

        debug!(path = %path.display(), classes = self.label_encoder.n_classes(), "Saved model artifact");
        Ok(())
    }

    /// Read an artifact written by [`ModelArtifact::save`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let file = File::open(path)?;
        let artifact: Self = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| CropError::SerializationError(format!("{}: {}", path.display(), e)))?;
        artifact.validate()?;

        debug!(path = %path.display(), trees = artifact.model.n_trees(), "Loaded model artifact");
        Ok(artifact)
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
