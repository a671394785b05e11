//! Ordered learning pipelines.
//!
//! A [`LearningPipeline`] is a list of stage descriptors: a source, a text
//! featurizer and a learner. Adding stages runs nothing. [`LearningPipeline::train`]
//! checks the stage order, executes the stages in sequence and returns an
//! immutable [`PredictionModel`]; any stage failure aborts the whole run.

mod model;

use std::path::PathBuf;
use std::time::Instant;

use thiserror::Error;

use crate::data::{DataLoadError, LabeledRecord, TextLoader};
use crate::featurize::{FeaturizeError, TextFeaturizer};
use crate::ml::fast_tree::{FastTreeOptions, TrainDataset, TrainError, train_fast_tree};

pub use model::{ModelIoError, PredictionModel, SentimentPrediction};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Pipeline has no {0} stage")]
    MissingStage(&'static str),
    #[error("Pipeline has more than one {0} stage")]
    DuplicateStage(&'static str),
    #[error("Stage {position} ({stage}) is out of order: {reason}")]
    StageOrder {
        stage: &'static str,
        position: usize,
        reason: &'static str,
    },
    #[error("No training records in {0}")]
    NoTrainingData(PathBuf),
    #[error(transparent)]
    Data(#[from] DataLoadError),
    #[error(transparent)]
    Featurize(#[from] FeaturizeError),
    #[error(transparent)]
    Train(#[from] TrainError),
}

/// One step of a learning pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    /// Source of labeled training records.
    TextLoader(TextLoader),
    /// Text to feature vector transform.
    TextFeaturizer(TextFeaturizer),
    /// Boosted-tree binary learner and its hyperparameters.
    FastTreeBinaryClassifier(FastTreeOptions),
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::TextLoader(_) => "TextLoader",
            Stage::TextFeaturizer(_) => "TextFeaturizer",
            Stage::FastTreeBinaryClassifier(_) => "FastTreeBinaryClassifier",
        }
    }
}

impl From<TextLoader> for Stage {
    fn from(loader: TextLoader) -> Self {
        Stage::TextLoader(loader)
    }
}

impl From<TextFeaturizer> for Stage {
    fn from(featurizer: TextFeaturizer) -> Self {
        Stage::TextFeaturizer(featurizer)
    }
}

impl From<FastTreeOptions> for Stage {
    fn from(options: FastTreeOptions) -> Self {
        Stage::FastTreeBinaryClassifier(options)
    }
}

/// Unexecuted, ordered list of pipeline stages.
#[derive(Debug, Clone, Default)]
pub struct LearningPipeline {
    stages: Vec<Stage>,
}

struct ResolvedStages<'a> {
    loader: &'a TextLoader,
    featurizer: &'a TextFeaturizer,
    learner: &'a FastTreeOptions,
}

impl LearningPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage.
    pub fn add(&mut self, stage: impl Into<Stage>) -> &mut Self {
        self.stages.push(stage.into());
        self
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Execute every stage in order and return the fitted model.
    pub fn train(&self) -> Result<PredictionModel, PipelineError> {
        let stages = self.resolve()?;
        let started = Instant::now();

        tracing::info!(
            "[stage 0] TextLoader: reading {}",
            stages.loader.path().display()
        );
        let records = stages.loader.load_all()?;
        if records.is_empty() {
            return Err(PipelineError::NoTrainingData(
                stages.loader.path().to_path_buf(),
            ));
        }
        let texts: Vec<&str> = records.iter().map(|r| r.text.as_str()).collect();

        tracing::info!("[stage 1] TextFeaturizer: fitting on {} records", texts.len());
        let vectorizer = stages.featurizer.fit(&texts)?;
        let dataset = TrainDataset {
            feature_count: vectorizer.feature_count(),
            rows: texts.iter().map(|text| vectorizer.transform(text)).collect(),
            labels: records.iter().map(LabeledRecord::is_positive).collect(),
        };

        tracing::info!(
            "[stage 2] FastTreeBinaryClassifier: {} trees, {} leaves, {} min docs per leaf over {} features",
            stages.learner.num_trees,
            stages.learner.num_leaves,
            stages.learner.min_docs_per_leaf,
            dataset.feature_count
        );
        let classifier = train_fast_tree(&dataset, stages.learner)?;

        tracing::info!(
            "Training finished in {:.2}s",
            started.elapsed().as_secs_f64()
        );
        Ok(PredictionModel::new(vectorizer, classifier))
    }

    /// Check that there is exactly one loader, featurizer and learner, in that order.
    fn resolve(&self) -> Result<ResolvedStages<'_>, PipelineError> {
        let mut loader = None;
        let mut featurizer = None;
        let mut learner = None;
        for (position, stage) in self.stages.iter().enumerate() {
            let out_of_order = |reason| PipelineError::StageOrder {
                stage: stage.name(),
                position,
                reason,
            };
            match stage {
                Stage::TextLoader(inner) => {
                    if loader.is_some() {
                        return Err(PipelineError::DuplicateStage(stage.name()));
                    }
                    if position != 0 {
                        return Err(out_of_order("the loader must be the first stage"));
                    }
                    loader = Some(inner);
                }
                Stage::TextFeaturizer(inner) => {
                    if featurizer.is_some() {
                        return Err(PipelineError::DuplicateStage(stage.name()));
                    }
                    if learner.is_some() {
                        return Err(out_of_order("the featurizer must come before the learner"));
                    }
                    featurizer = Some(inner);
                }
                Stage::FastTreeBinaryClassifier(inner) => {
                    if learner.is_some() {
                        return Err(PipelineError::DuplicateStage(stage.name()));
                    }
                    if featurizer.is_none() {
                        return Err(out_of_order("the learner needs a featurizer before it"));
                    }
                    learner = Some(inner);
                }
            }
        }
        Ok(ResolvedStages {
            loader: loader.ok_or(PipelineError::MissingStage("TextLoader"))?,
            featurizer: featurizer.ok_or(PipelineError::MissingStage("TextFeaturizer"))?,
            learner: learner.ok_or(PipelineError::MissingStage("FastTreeBinaryClassifier"))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::UnlabeledRecord;
    use crate::featurize::FeaturizerOptions;
    use std::path::Path;
    use tempfile::tempdir;

    const CORPUS: &str = "\
The movie was wonderful and moving.\t1
A great film with a great cast.\t1
I loved the acting, truly wonderful.\t1
Beautiful story, great direction.\t1
An excellent and wonderful experience.\t1
Terrible plot and very bad acting.\t0
The worst movie I have ever seen.\t0
Boring, bad and far too long.\t0
Awful dialogue, bad pacing.\t0
A terrible waste of time.\t0
";

    fn write_corpus(dir: &Path) -> PathBuf {
        let path = dir.join("train.txt");
        std::fs::write(&path, CORPUS).unwrap();
        path
    }

    fn tutorial_options() -> FastTreeOptions {
        FastTreeOptions {
            num_trees: 5,
            num_leaves: 5,
            min_docs_per_leaf: 2,
            ..FastTreeOptions::default()
        }
    }

    fn build(path: &Path) -> LearningPipeline {
        let mut pipeline = LearningPipeline::new();
        pipeline
            .add(TextLoader::new(path))
            .add(TextFeaturizer::default())
            .add(tutorial_options());
        pipeline
    }

    #[test]
    fn building_keeps_stage_order() {
        let pipeline = build(Path::new("unused.txt"));
        let names: Vec<&str> = pipeline.stages().iter().map(Stage::name).collect();
        assert_eq!(
            names,
            vec!["TextLoader", "TextFeaturizer", "FastTreeBinaryClassifier"]
        );
    }

    #[test]
    fn train_produces_model_that_predicts_in_order() {
        let dir = tempdir().unwrap();
        let model = build(&write_corpus(dir.path())).train().unwrap();

        let inputs = vec![
            UnlabeledRecord::new("a wonderful, great film"),
            UnlabeledRecord::new("bad and terrible acting"),
            UnlabeledRecord::new("great cast"),
        ];
        let predictions = model.predict(&inputs);
        assert_eq!(predictions.len(), inputs.len());
        for (input, prediction) in inputs.iter().zip(&predictions) {
            assert_eq!(*prediction, model.predict_text(&input.text));
            assert!((0.0..=1.0).contains(&prediction.probability));
            assert_eq!(prediction.sentiment, prediction.score > 0.0);
        }
        assert!(predictions[0].sentiment);
        assert!(!predictions[1].sentiment);
    }

    #[test]
    fn labeled_records_are_predicted_ignoring_labels() {
        let dir = tempdir().unwrap();
        let model = build(&write_corpus(dir.path())).train().unwrap();
        let relabeled = vec![
            LabeledRecord::new("great film", 0.0),
            LabeledRecord::new("great film", 1.0),
        ];
        let predictions = model.predict(&relabeled);
        assert_eq!(predictions[0], predictions[1]);
    }

    #[test]
    fn saved_model_loads_back_identically() {
        let dir = tempdir().unwrap();
        let model = build(&write_corpus(dir.path())).train().unwrap();
        let path = dir.path().join("models").join("sentiment.json");
        model.save_json(&path).unwrap();
        let loaded = PredictionModel::load_json(&path).unwrap();
        assert_eq!(loaded, model);
    }

    #[test]
    fn corrupt_model_file_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, "{\"format_version\": 1}").unwrap();
        assert!(matches!(
            PredictionModel::load_json(&path),
            Err(ModelIoError::Json { .. })
        ));
    }

    #[test]
    fn stage_order_is_enforced() {
        let path = Path::new("train.txt");

        let mut missing = LearningPipeline::new();
        missing.add(TextLoader::new(path)).add(TextFeaturizer::default());
        assert!(matches!(
            missing.train(),
            Err(PipelineError::MissingStage("FastTreeBinaryClassifier"))
        ));

        let mut loader_late = LearningPipeline::new();
        loader_late
            .add(TextFeaturizer::default())
            .add(TextLoader::new(path))
            .add(tutorial_options());
        assert!(matches!(
            loader_late.train(),
            Err(PipelineError::StageOrder { position: 1, .. })
        ));

        let mut learner_first = LearningPipeline::new();
        learner_first
            .add(TextLoader::new(path))
            .add(tutorial_options())
            .add(TextFeaturizer::default());
        assert!(matches!(
            learner_first.train(),
            Err(PipelineError::StageOrder {
                stage: "FastTreeBinaryClassifier",
                ..
            })
        ));

        let mut doubled = build(path);
        doubled.add(TextFeaturizer::new(FeaturizerOptions::default()));
        assert!(matches!(
            doubled.train(),
            Err(PipelineError::DuplicateStage("TextFeaturizer"))
        ));
    }

    #[test]
    fn stage_failures_abort_training() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            build(&dir.path().join("missing.txt")).train(),
            Err(PipelineError::Data(DataLoadError::Open { .. }))
        ));

        let malformed = dir.path().join("malformed.txt");
        std::fs::write(&malformed, "fine\t1\nno label here\n").unwrap();
        assert!(matches!(
            build(&malformed).train(),
            Err(PipelineError::Data(DataLoadError::Malformed { line: 2, .. }))
        ));

        let one_class = dir.path().join("positive.txt");
        std::fs::write(&one_class, "good\t1\ngreat\t1\n").unwrap();
        assert!(matches!(
            build(&one_class).train(),
            Err(PipelineError::Train(TrainError::SingleClass))
        ));

        let empty = dir.path().join("empty.txt");
        std::fs::write(&empty, "\n\n").unwrap();
        assert!(matches!(
            build(&empty).train(),
            Err(PipelineError::NoTrainingData(_))
        ));
    }
}
