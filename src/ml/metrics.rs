//! Evaluation metrics for binary classifiers.

use serde::{Deserialize, Serialize};

/// Probabilities are clamped into `[EPS, 1 - EPS]` before taking logs.
const LOG_LOSS_EPS: f64 = 1e-15;

/// Confusion counts for a positive/negative classifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryConfusionMatrix {
    pub true_positive: u32,
    pub false_positive: u32,
    pub true_negative: u32,
    pub false_negative: u32,
}

impl BinaryConfusionMatrix {
    pub fn add(&mut self, truth: bool, predicted: bool) {
        let slot = match (truth, predicted) {
            (true, true) => &mut self.true_positive,
            (false, true) => &mut self.false_positive,
            (false, false) => &mut self.true_negative,
            (true, false) => &mut self.false_negative,
        };
        *slot = slot.saturating_add(1);
    }

    pub fn total(&self) -> u32 {
        self.true_positive + self.false_positive + self.true_negative + self.false_negative
    }

    /// Share of rows predicted correctly.
    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positive + self.true_negative, self.total())
    }

    /// `TP / (TP + FP)`.
    pub fn positive_precision(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_positive)
    }

    /// `TP / (TP + FN)`.
    pub fn positive_recall(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_negative)
    }

    /// `TN / (TN + FN)`.
    pub fn negative_precision(&self) -> f64 {
        ratio(self.true_negative, self.true_negative + self.false_negative)
    }

    /// `TN / (TN + FP)`.
    pub fn negative_recall(&self) -> f64 {
        ratio(self.true_negative, self.true_negative + self.false_positive)
    }

    /// Harmonic mean of positive precision and recall; `0` when both are zero.
    pub fn f1(&self) -> f64 {
        let precision = self.positive_precision();
        let recall = self.positive_recall();
        if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        }
    }
}

fn ratio(numerator: u32, denominator: u32) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Area under the ROC curve from scores and truth labels.
///
/// Uses the rank-sum form with average ranks for tied scores, so the result is
/// the probability that a random positive outscores a random negative (ties
/// count half). Returns `None` unless both classes are present.
pub fn auc(scores: &[f32], labels: &[bool]) -> Option<f64> {
    let n = scores.len().min(labels.len());
    let positives = labels[..n].iter().filter(|&&y| y).count();
    let negatives = n - positives;
    if positives == 0 || negatives == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut positive_rank_sum = 0f64;
    let mut start = 0usize;
    while start < n {
        let mut end = start + 1;
        while end < n && scores[order[end]] == scores[order[start]] {
            end += 1;
        }
        // Ranks are 1-based; tied block shares the mean of ranks start+1..=end.
        let mean_rank = (start + 1 + end) as f64 / 2.0;
        let tied_positives = order[start..end].iter().filter(|&&i| labels[i]).count();
        positive_rank_sum += mean_rank * tied_positives as f64;
        start = end;
    }

    let p = positives as f64;
    let u = positive_rank_sum - p * (p + 1.0) / 2.0;
    Some(u / (p * negatives as f64))
}

/// Mean negative log-likelihood of the truth labels.
pub fn log_loss(probabilities: &[f32], labels: &[bool]) -> f64 {
    let n = probabilities.len().min(labels.len());
    if n == 0 {
        return 0.0;
    }
    let total: f64 = probabilities
        .iter()
        .zip(labels)
        .map(|(&p, &y)| {
            let p = (p as f64).clamp(LOG_LOSS_EPS, 1.0 - LOG_LOSS_EPS);
            if y { -p.ln() } else { -(1.0 - p).ln() }
        })
        .sum();
    total / n as f64
}
