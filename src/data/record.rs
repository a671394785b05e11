use serde::{Deserialize, Serialize};

/// Anything that carries a sentiment text to classify.
pub trait TextRecord {
    /// Raw text of the record.
    fn text(&self) -> &str;
}

/// A text with its ground-truth label, as read from the training and test files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledRecord {
    /// Sentence to classify.
    pub text: String,
    /// Label column value; `0` negative, `1` positive by convention.
    pub label: f32,
}

impl LabeledRecord {
    pub fn new(text: impl Into<String>, label: f32) -> Self {
        Self {
            text: text.into(),
            label,
        }
    }

    /// Whether the label counts as the positive class (`label > 0`).
    pub fn is_positive(&self) -> bool {
        self.label > 0.0
    }
}

impl TextRecord for LabeledRecord {
    fn text(&self) -> &str {
        &self.text
    }
}

/// A text with no label, used for inference only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlabeledRecord {
    pub text: String,
}

impl UnlabeledRecord {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl TextRecord for UnlabeledRecord {
    fn text(&self) -> &str {
        &self.text
    }
}
