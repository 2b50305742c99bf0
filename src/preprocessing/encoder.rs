//! Label encoding for the target column

use crate::error::{CropError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Bijection between label strings and contiguous integer codes `[0, K)`.
///
/// The vocabulary is kept in sorted order, so the code assigned to a label
/// depends only on the set of labels seen during `fit`, never on row order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Fit the encoder on a label column
    pub fn fit<S: AsRef<str>>(labels: &[S]) -> Result<Self> {
        if labels.is_empty() {
            return Err(CropError::ValidationError(
                "Cannot fit label encoder on an empty label column".to_string(),
            ));
        }

        let classes: Vec<String> = labels
            .iter()
            .map(|l| l.as_ref().to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        Ok(Self { classes })
    }

    /// Fit the encoder and encode the same labels in one pass
    pub fn fit_transform<S: AsRef<str>>(labels: &[S]) -> Result<(Self, Vec<usize>)> {
        let encoder = Self::fit(labels)?;
        let codes = encoder.transform(labels)?;
        Ok((encoder, codes))
    }

    /// Code for a single label
    pub fn encode(&self, label: &str) -> Result<usize> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(label))
            .map_err(|_| CropError::UnknownLabel(label.to_string()))
    }

    /// Label for a single code
    pub fn decode(&self, code: usize) -> Result<&str> {
        self.classes
            .get(code)
            .map(String::as_str)
            .ok_or(CropError::CodeOutOfRange {
                code,
                n_classes: self.classes.len(),
            })
    }

    pub fn transform<S: AsRef<str>>(&self, labels: &[S]) -> Result<Vec<usize>> {
        labels.iter().map(|l| self.encode(l.as_ref())).collect()
    }

    pub fn inverse_transform(&self, codes: &[usize]) -> Result<Vec<String>> {
        codes
            .iter()
            .map(|&c| self.decode(c).map(str::to_string))
            .collect()
    }

    /// Sorted label vocabulary; a label's index is its code
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }
}
