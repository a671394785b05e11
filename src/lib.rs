//! Library exports for the sentiment tutorial binaries, benchmarks and tests.
/// Application directory resolution.
pub mod app_dirs;
/// TOML configuration for data paths and hyperparameters.
pub mod config;
/// Delimited text readers producing labeled records.
pub mod data;
/// Held-out evaluation of trained models.
pub mod evaluate;
/// Text to sparse feature vector transforms.
pub mod featurize;
/// Logging setup.
pub mod logging;
/// Learners and metrics.
pub mod ml;
/// Ordered stage pipelines and the fitted prediction model.
pub mod pipeline;
/// Console report blocks.
pub mod report;
/// The train, predict and evaluate walkthrough.
pub mod tutorial;
