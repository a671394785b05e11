//! TOML configuration for the tutorial run.
//!
//! Every section is optional; missing keys fall back to the tutorial defaults
//! (IMDB for training, Yelp for evaluation, 5 trees of 5 leaves with at least 2
//! documents per leaf).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app_dirs::{self, AppDirError};
use crate::data::{MalformedRows, TextLoader};
use crate::featurize::FeaturizerOptions;
use crate::ml::fast_tree::FastTreeOptions;

/// Config file looked up in the application root when no path is given.
pub const CONFIG_FILE_NAME: &str = "sentiment.toml";

const DEFAULT_TRAIN_PATH: &str = "data/sentiment labelled sentences/imdb_labelled.txt";
const DEFAULT_TEST_PATH: &str = "data/sentiment labelled sentences/yelp_labelled.txt";

/// Errors that may occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a config file.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to parse TOML config.
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// Failed to render built-in defaults as TOML.
    #[error("Failed to serialize default settings: {0}")]
    SerializeDefaults(#[from] toml::ser::Error),
    #[error(transparent)]
    AppDir(#[from] AppDirError),
}

/// Full configuration for a tutorial run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataSettings,
    pub featurizer: FeaturizerOptions,
    pub trainer: FastTreeOptions,
    pub output: OutputSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data: DataSettings::default(),
            featurizer: FeaturizerOptions::default(),
            trainer: tutorial_trainer_options(),
            output: OutputSettings::default(),
        }
    }
}

/// Input files and how to parse them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub train_path: PathBuf,
    pub test_path: PathBuf,
    /// Column separator.
    pub separator: char,
    pub has_header: bool,
    pub malformed_rows: MalformedRows,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            train_path: PathBuf::from(DEFAULT_TRAIN_PATH),
            test_path: PathBuf::from(DEFAULT_TEST_PATH),
            separator: '\t',
            has_header: false,
            malformed_rows: MalformedRows::Abort,
        }
    }
}

impl DataSettings {
    pub fn train_loader(&self) -> TextLoader {
        self.loader(&self.train_path)
    }

    pub fn test_loader(&self) -> TextLoader {
        self.loader(&self.test_path)
    }

    fn loader(&self, path: &Path) -> TextLoader {
        TextLoader::new(path)
            .with_separator(self.separator)
            .with_header(self.has_header)
            .with_malformed_rows(self.malformed_rows)
    }
}

/// Where to write artifacts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Save the trained model as JSON here when set.
    pub model_path: Option<PathBuf>,
}

/// Hyperparameters used by the tutorial learner.
pub fn tutorial_trainer_options() -> FastTreeOptions {
    FastTreeOptions {
        num_trees: 5,
        num_leaves: 5,
        min_docs_per_leaf: 2,
        ..FastTreeOptions::default()
    }
}

/// Resolve the default config file path inside the application root.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(app_dirs::app_root_dir()?.join(CONFIG_FILE_NAME))
}

/// Load `explicit` if given, else the app-root config file if present, else defaults.
pub fn load_or_default(explicit: Option<&Path>) -> Result<AppConfig, ConfigError> {
    if let Some(path) = explicit {
        tracing::info!("Loading config from {}", path.display());
        return load_from(path);
    }
    let path = config_path()?;
    if path.is_file() {
        tracing::info!("Loading config from {}", path.display());
        load_from(&path)
    } else {
        tracing::debug!("No config at {}; using defaults", path.display());
        Ok(AppConfig::default())
    }
}

/// Parse a TOML config file.
pub fn load_from(path: &Path) -> Result<AppConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&text).map_err(|err| match err {
        ParseFailure::Toml(source) => ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        },
        ParseFailure::Defaults(source) => ConfigError::SerializeDefaults(source),
    })
}

enum ParseFailure {
    Toml(toml::de::Error),
    Defaults(toml::ser::Error),
}

fn parse(text: &str) -> Result<AppConfig, ParseFailure> {
    let mut value: toml::Value = toml::from_str(text).map_err(ParseFailure::Toml)?;
    if let Some(root) = value.as_table_mut() {
        // A partial [trainer] table keeps the tutorial values for keys it omits.
        let defaults = toml::Value::try_from(tutorial_trainer_options())
            .map_err(ParseFailure::Defaults)?;
        if let (Some(trainer), Some(defaults)) = (
            root.entry("trainer")
                .or_insert_with(|| toml::Value::Table(toml::Table::new()))
                .as_table_mut(),
            defaults.as_table(),
        ) {
            for (key, value) in defaults {
                trainer.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }
    }
    value.try_into().map_err(ParseFailure::Toml)
}
