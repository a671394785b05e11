//! The linear tutorial script: train, predict the sample sentences, evaluate.

use std::io::Write;

use thiserror::Error;

use crate::config::AppConfig;
use crate::data::UnlabeledRecord;
use crate::evaluate::{BinaryClassificationEvaluator, BinaryClassificationMetrics, EvaluateError};
use crate::featurize::TextFeaturizer;
use crate::pipeline::{LearningPipeline, ModelIoError, PipelineError, PredictionModel};
use crate::report;

/// Sentences classified after training.
pub const SAMPLE_SENTIMENTS: [&str; 3] = [
    "Contoso's 11 is a wonderful experience",
    "The acting in this movie is very bad",
    "Joe versus the Volcano Coffee Company is a great film.",
];

#[derive(Debug, Error)]
pub enum TutorialError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Evaluate(#[from] EvaluateError),
    #[error(transparent)]
    ModelIo(#[from] ModelIoError),
    #[error("Failed to write report: {0}")]
    Output(#[from] std::io::Error),
}

/// Loader, featurizer and learner stages as configured.
pub fn build_pipeline(config: &AppConfig) -> LearningPipeline {
    let mut pipeline = LearningPipeline::new();
    pipeline
        .add(config.data.train_loader())
        .add(TextFeaturizer::new(config.featurizer.clone()))
        .add(config.trainer.clone());
    pipeline
}

/// Train the pipeline, print predictions for the sample sentences and return the model.
///
/// The model is also written to `output.model_path` when configured.
pub fn train_and_predict<W: Write>(
    config: &AppConfig,
    out: &mut W,
) -> Result<PredictionModel, TutorialError> {
    let model = build_pipeline(config).train()?;

    let sentiments: Vec<UnlabeledRecord> = SAMPLE_SENTIMENTS
        .iter()
        .map(|text| UnlabeledRecord::new(*text))
        .collect();
    let predictions = model.predict(&sentiments);
    report::write_predictions(
        out,
        sentiments
            .iter()
            .map(|record| record.text.as_str())
            .zip(predictions.iter()),
    )?;

    if let Some(path) = &config.output.model_path {
        model.save_json(path)?;
        tracing::info!("Saved model to {}", path.display());
    }
    Ok(model)
}

/// Score the model on the configured test file and print the metrics block.
pub fn evaluate<W: Write>(
    model: &PredictionModel,
    config: &AppConfig,
    out: &mut W,
) -> Result<BinaryClassificationMetrics, TutorialError> {
    let test_data = config.data.test_loader();
    let metrics = BinaryClassificationEvaluator::new().evaluate(model, &test_data)?;
    report::write_metrics(out, &metrics)?;
    Ok(metrics)
}

/// Full run: [`train_and_predict`] followed by [`evaluate`].
pub fn run<W: Write>(
    config: &AppConfig,
    out: &mut W,
) -> Result<BinaryClassificationMetrics, TutorialError> {
    let model = train_and_predict(config, out)?;
    evaluate(&model, config, out)
}
