//! Bag-of-n-grams text featurizer.
//!
//! [`TextFeaturizer`] is the unfitted stage descriptor. Fitting it over a corpus
//! yields a [`TextVectorizer`] that owns a frozen vocabulary and maps any text to a
//! L2-normalized [`SparseVector`].
//!
//! Terms are word n-grams (lengths `1..=word_ngram_length`) and character
//! n-grams of exactly `char_ngram_length`, counted per text and optionally
//! re-weighted by inverse document frequency.

mod sparse;
mod tokenize;

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use sparse::SparseVector;

#[derive(Debug, Error)]
pub enum FeaturizeError {
    #[error("Cannot fit a featurizer on an empty corpus")]
    EmptyCorpus,
    #[error("No terms survived the document frequency filter (min_document_frequency = {0})")]
    EmptyVocabulary(usize),
    #[error("Invalid featurizer options: {0}")]
    InvalidOptions(String),
}

/// Per-term weighting applied before normalization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TermWeighting {
    /// Raw term counts.
    #[default]
    Tf,
    /// Term counts scaled by smoothed inverse document frequency.
    TfIdf,
}

/// Featurizer hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturizerOptions {
    pub lowercase: bool,
    /// Longest word n-gram; all shorter lengths are included too.
    pub word_ngram_length: usize,
    /// Character n-gram length; `0` disables character grams.
    pub char_ngram_length: usize,
    pub weighting: TermWeighting,
    /// Keep only the most frequent terms when set.
    pub max_features: Option<usize>,
    /// Drop terms seen in fewer training texts than this.
    pub min_document_frequency: usize,
}

impl Default for FeaturizerOptions {
    fn default() -> Self {
        Self {
            lowercase: true,
            word_ngram_length: 1,
            char_ngram_length: 3,
            weighting: TermWeighting::Tf,
            max_features: None,
            min_document_frequency: 1,
        }
    }
}

impl FeaturizerOptions {
    pub fn validate(&self) -> Result<(), FeaturizeError> {
        if self.word_ngram_length == 0 {
            return Err(FeaturizeError::InvalidOptions(
                "word_ngram_length must be at least 1".to_string(),
            ));
        }
        if self.min_document_frequency == 0 {
            return Err(FeaturizeError::InvalidOptions(
                "min_document_frequency must be at least 1".to_string(),
            ));
        }
        if self.max_features == Some(0) {
            return Err(FeaturizeError::InvalidOptions(
                "max_features must be at least 1 when set".to_string(),
            ));
        }
        Ok(())
    }
}

/// Unfitted featurizer stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextFeaturizer {
    options: FeaturizerOptions,
}

impl TextFeaturizer {
    pub fn new(options: FeaturizerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &FeaturizerOptions {
        &self.options
    }

    /// Build the vocabulary from the training texts.
    ///
    /// Term order is deterministic: descending document frequency, then term.
    pub fn fit<S: AsRef<str>>(&self, texts: &[S]) -> Result<TextVectorizer, FeaturizeError> {
        self.options.validate()?;
        if texts.is_empty() {
            return Err(FeaturizeError::EmptyCorpus);
        }

        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        for text in texts {
            let unique: HashSet<String> =
                tokenize::extract_terms(text.as_ref(), &self.options).into_iter().collect();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(String, usize)> = doc_freq
            .into_iter()
            .filter(|(_, df)| *df >= self.options.min_document_frequency)
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        if let Some(max) = self.options.max_features {
            ranked.truncate(max);
        }
        if ranked.is_empty() {
            return Err(FeaturizeError::EmptyVocabulary(
                self.options.min_document_frequency,
            ));
        }

        let n_docs = texts.len() as f32;
        let mut vocabulary = BTreeMap::new();
        let mut idf = Vec::with_capacity(ranked.len());
        for (idx, (term, df)) in ranked.into_iter().enumerate() {
            vocabulary.insert(term, idx as u32);
            idf.push(((1.0 + n_docs) / (1.0 + df as f32)).ln() + 1.0);
        }

        tracing::debug!(
            "Featurizer fitted on {} texts; vocabulary size {}",
            texts.len(),
            vocabulary.len()
        );
        Ok(TextVectorizer {
            options: self.options.clone(),
            vocabulary,
            idf,
        })
    }
}

/// Fitted featurizer holding a frozen vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextVectorizer {
    pub options: FeaturizerOptions,
    /// Term to feature index.
    pub vocabulary: BTreeMap<String, u32>,
    /// Inverse document frequency per feature index.
    pub idf: Vec<f32>,
}

impl TextVectorizer {
    /// Number of features produced by [`TextVectorizer::transform`].
    pub fn feature_count(&self) -> usize {
        self.vocabulary.len()
    }

    /// Map a text to its normalized term vector; unknown terms are ignored.
    pub fn transform(&self, text: &str) -> SparseVector {
        let mut counts: BTreeMap<u32, f32> = BTreeMap::new();
        for term in tokenize::extract_terms(text, &self.options) {
            if let Some(&idx) = self.vocabulary.get(&term) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }
        if self.options.weighting == TermWeighting::TfIdf {
            for (idx, value) in counts.iter_mut() {
                *value *= self.idf.get(*idx as usize).copied().unwrap_or(1.0);
            }
        }
        let norm = counts.values().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in counts.values_mut() {
                *value /= norm;
            }
        }
        SparseVector::from_sorted(counts)
    }

    /// Check that the vocabulary and idf table agree.
    pub fn validate(&self) -> Result<(), String> {
        if self.idf.len() != self.vocabulary.len() {
            return Err(format!(
                "idf has {} entries but vocabulary has {}",
                self.idf.len(),
                self.vocabulary.len()
            ));
        }
        let n = self.vocabulary.len() as u32;
        if let Some((term, idx)) = self.vocabulary.iter().find(|(_, idx)| **idx >= n) {
            return Err(format!("term {term:?} has out-of-range index {idx}"));
        }
        Ok(())
    }
}
