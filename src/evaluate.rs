//! Held-out evaluation of a fitted [`PredictionModel`].

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::{DataLoadError, TextLoader};
use crate::ml::metrics::{self, BinaryConfusionMatrix};
use crate::pipeline::PredictionModel;

#[derive(Debug, Error)]
pub enum EvaluateError {
    #[error(transparent)]
    Data(#[from] DataLoadError),
    #[error("No evaluation records in {0}")]
    Empty(PathBuf),
    #[error("Evaluation data in {0} contains a single class; AUC is undefined")]
    SingleClass(PathBuf),
}

/// Quality metrics for a binary classifier over one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryClassificationMetrics {
    /// Share of correct predictions.
    pub accuracy: f64,
    /// Area under the ROC curve.
    pub auc: f64,
    /// Harmonic mean of positive precision and recall.
    pub f1_score: f64,
    pub positive_precision: f64,
    pub positive_recall: f64,
    pub negative_precision: f64,
    pub negative_recall: f64,
    /// Mean negative log-likelihood of the labels.
    pub log_loss: f64,
    pub confusion: BinaryConfusionMatrix,
}

/// Scores a model against labeled held-out data.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryClassificationEvaluator;

impl BinaryClassificationEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Predict every record from `data` and aggregate against its labels.
    ///
    /// Read-only with respect to the model; records are streamed, not buffered.
    pub fn evaluate(
        &self,
        model: &PredictionModel,
        data: &TextLoader,
    ) -> Result<BinaryClassificationMetrics, EvaluateError> {
        let mut confusion = BinaryConfusionMatrix::default();
        let mut scores = Vec::new();
        let mut probabilities = Vec::new();
        let mut labels = Vec::new();

        for record in data.records()? {
            let record = record?;
            let truth = record.is_positive();
            let prediction = model.predict_text(&record.text);
            confusion.add(truth, prediction.sentiment);
            scores.push(prediction.score);
            probabilities.push(prediction.probability);
            labels.push(truth);
        }

        if labels.is_empty() {
            return Err(EvaluateError::Empty(data.path().to_path_buf()));
        }
        let auc = metrics::auc(&scores, &labels)
            .ok_or_else(|| EvaluateError::SingleClass(data.path().to_path_buf()))?;

        tracing::info!(
            "Evaluated {} records from {}",
            labels.len(),
            data.path().display()
        );
        Ok(BinaryClassificationMetrics {
            accuracy: confusion.accuracy(),
            auc,
            f1_score: confusion.f1(),
            positive_precision: confusion.positive_precision(),
            positive_recall: confusion.positive_recall(),
            negative_precision: confusion.negative_precision(),
            negative_recall: confusion.negative_recall(),
            log_loss: metrics::log_loss(&probabilities, &labels),
            confusion,
        })
    }
}
