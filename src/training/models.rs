//! Evaluation metrics

use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Holdout metrics for a multiclass classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetrics {
    /// Fraction of correctly classified samples
    pub accuracy: f64,
    /// Macro-averaged precision
    pub precision: f64,
    /// Macro-averaged recall
    pub recall: f64,
    /// Macro-averaged F1 score
    pub f1_score: f64,
    /// Number of evaluated samples
    pub n_samples: usize,
}

impl ModelMetrics {
    /// Compute classification metrics over `n_classes` codes.
    ///
    /// Classes absent from both `y_true` and `y_pred` are left out of the
    /// macro averages.
    pub fn compute_classification(
        y_true: &Array1<usize>,
        y_pred: &Array1<usize>,
        n_classes: usize,
    ) -> Self {
        let n_samples = y_true.len();

        let correct = y_true
            .iter()
            .zip(y_pred.iter())
            .filter(|(t, p)| t == p)
            .count();
        let accuracy = if n_samples > 0 {
            correct as f64 / n_samples as f64
        } else {
            0.0
        };

        let (tp, fp, fn_) = Self::confusion_counts(y_true, y_pred, n_classes);

        let mut precision_sum = 0.0;
        let mut recall_sum = 0.0;
        let mut f1_sum = 0.0;
        let mut n_present = 0usize;

        for c in 0..n_classes {
            if tp[c] + fp[c] + fn_[c] == 0 {
                continue;
            }
            n_present += 1;

            let precision = ratio(tp[c], tp[c] + fp[c]);
            let recall = ratio(tp[c], tp[c] + fn_[c]);
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };

            precision_sum += precision;
            recall_sum += recall;
            f1_sum += f1;
        }

        let denom = n_present.max(1) as f64;
        Self {
            accuracy,
            precision: precision_sum / denom,
            recall: recall_sum / denom,
            f1_score: f1_sum / denom,
            n_samples,
        }
    }

    /// Per-class true positive, false positive and false negative counts
    fn confusion_counts(
        y_true: &Array1<usize>,
        y_pred: &Array1<usize>,
        n_classes: usize,
    ) -> (Vec<usize>, Vec<usize>, Vec<usize>) {
        let mut tp = vec![0; n_classes];
        let mut fp = vec![0; n_classes];
        let mut fn_ = vec![0; n_classes];

        for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
            if t == p {
                tp[t] += 1;
            } else {
                fp[p] += 1;
                fn_[t] += 1;
            }
        }

        (tp, fp, fn_)
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}
