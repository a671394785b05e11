//! Human-readable report blocks printed by the tutorial.

use std::io::{self, Write};

use crate::evaluate::BinaryClassificationMetrics;
use crate::pipeline::SentimentPrediction;

/// Write the `Sentiment Predictions` block, one line per (text, prediction) pair.
pub fn write_predictions<'a, W, I>(out: &mut W, pairs: I) -> io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = (&'a str, &'a SentimentPrediction)>,
{
    writeln!(out)?;
    write_heading(out, "Sentiment Predictions")?;
    for (text, prediction) in pairs {
        writeln!(
            out,
            "Sentiment: {text} | Prediction: {}",
            sentiment_label(prediction.sentiment)
        )?;
    }
    writeln!(out)
}

/// Write the quality metrics block with percentages.
pub fn write_metrics<W: Write>(out: &mut W, metrics: &BinaryClassificationMetrics) -> io::Result<()> {
    writeln!(out)?;
    write_heading(out, "PredictionModel quality metrics evaluation")?;
    writeln!(out, "Accuracy: {}", percent(metrics.accuracy))?;
    writeln!(out, "Auc: {}", percent(metrics.auc))?;
    writeln!(out, "F1Score: {}", percent(metrics.f1_score))
}

pub fn sentiment_label(positive: bool) -> &'static str {
    if positive { "Positive" } else { "Negative" }
}

/// Format a `[0, 1]` rate as a percentage with two decimals.
pub fn percent(rate: f64) -> String {
    format!("{:.2}%", rate * 100.0)
}

fn write_heading<W: Write>(out: &mut W, title: &str) -> io::Result<()> {
    writeln!(out, "{title}")?;
    writeln!(out, "{}", "-".repeat(title.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::metrics::BinaryConfusionMatrix;

    fn prediction(sentiment: bool) -> SentimentPrediction {
        SentimentPrediction {
            sentiment,
            score: if sentiment { 1.0 } else { -1.0 },
            probability: if sentiment { 0.73 } else { 0.27 },
        }
    }

    #[test]
    fn predictions_block_layout() {
        let positive = prediction(true);
        let negative = prediction(false);
        let mut out = Vec::new();
        write_predictions(
            &mut out,
            [("Lovely", &positive), ("Dreadful", &negative)],
        )
        .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "\nSentiment Predictions\n---------------------\n\
             Sentiment: Lovely | Prediction: Positive\n\
             Sentiment: Dreadful | Prediction: Negative\n\n"
        );
    }

    #[test]
    fn metrics_block_uses_two_decimal_percentages() {
        let metrics = BinaryClassificationMetrics {
            accuracy: 0.7,
            auc: 0.81234,
            f1_score: 2.0 / 3.0,
            positive_precision: 0.0,
            positive_recall: 0.0,
            negative_precision: 0.0,
            negative_recall: 0.0,
            log_loss: 0.5,
            confusion: BinaryConfusionMatrix::default(),
        };
        let mut out = Vec::new();
        write_metrics(&mut out, &metrics).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with(
            "\nPredictionModel quality metrics evaluation\n------------------------------------------\n"
        ));
        assert!(text.contains("Accuracy: 70.00%\n"));
        assert!(text.contains("Auc: 81.23%\n"));
        assert!(text.contains("F1Score: 66.67%\n"));
    }
}
