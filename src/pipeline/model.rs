use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::TextRecord;
use crate::featurize::TextVectorizer;
use crate::ml::fast_tree::FastTreeModel;

/// Version of the on-disk model layout.
const MODEL_FORMAT_VERSION: i64 = 1;

#[derive(Debug, Error)]
pub enum ModelIoError {
    #[error("Failed to read model {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write model {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid model JSON at {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Model at {path} failed validation: {reason}")]
    Invalid { path: PathBuf, reason: String },
}

/// Sentiment decision for one input text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentPrediction {
    /// `true` for positive sentiment.
    pub sentiment: bool,
    /// Raw log-odds score.
    pub score: f32,
    /// Probability of positive sentiment.
    pub probability: f32,
}

/// Fitted featurizer plus classifier, produced by training.
///
/// Immutable once built; predictors and evaluators borrow it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionModel {
    format_version: i64,
    vectorizer: TextVectorizer,
    classifier: FastTreeModel,
}

impl PredictionModel {
    pub fn new(vectorizer: TextVectorizer, classifier: FastTreeModel) -> Self {
        Self {
            format_version: MODEL_FORMAT_VERSION,
            vectorizer,
            classifier,
        }
    }

    pub fn vectorizer(&self) -> &TextVectorizer {
        &self.vectorizer
    }

    pub fn classifier(&self) -> &FastTreeModel {
        &self.classifier
    }

    /// Predict one text.
    pub fn predict_text(&self, text: &str) -> SentimentPrediction {
        let features = self.vectorizer.transform(text);
        let score = self.classifier.predict_raw(&features);
        SentimentPrediction {
            sentiment: score > 0.0,
            score,
            probability: crate::ml::fast_tree::sigmoid(score),
        }
    }

    /// Predict every record; output `i` belongs to input `i`.
    pub fn predict<R: TextRecord>(&self, records: &[R]) -> Vec<SentimentPrediction> {
        records
            .iter()
            .map(|record| self.predict_text(record.text()))
            .collect()
    }

    /// Structural checks shared by load and tooling.
    pub fn validate(&self) -> Result<(), String> {
        if self.format_version != MODEL_FORMAT_VERSION {
            return Err(format!(
                "Unsupported format_version {} (expected {MODEL_FORMAT_VERSION})",
                self.format_version
            ));
        }
        self.vectorizer.validate()?;
        self.classifier.validate()?;
        if self.classifier.feature_count != self.vectorizer.feature_count() {
            return Err(format!(
                "Classifier expects {} features but vectorizer produces {}",
                self.classifier.feature_count,
                self.vectorizer.feature_count()
            ));
        }
        Ok(())
    }

    /// Write the model as pretty JSON, creating parent directories.
    pub fn save_json(&self, path: &Path) -> Result<(), ModelIoError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| ModelIoError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
        let bytes = serde_json::to_vec_pretty(self).map_err(|source| ModelIoError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, bytes).map_err(|source| ModelIoError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load and validate a model written by [`PredictionModel::save_json`].
    pub fn load_json(path: &Path) -> Result<Self, ModelIoError> {
        let bytes = std::fs::read(path).map_err(|source| ModelIoError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let model: Self = serde_json::from_slice(&bytes).map_err(|source| ModelIoError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        model.validate().map_err(|reason| ModelIoError::Invalid {
            path: path.to_path_buf(),
            reason,
        })?;
        Ok(model)
    }
}
