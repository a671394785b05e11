//! Where the tutorial keeps its per-user files.
//!
//! Everything lives under one `.sentiment` folder: the optional
//! `sentiment.toml` and a `logs/` folder with one file per run. The folder sits
//! in the OS config directory unless `SENTIMENT_CONFIG_HOME` names another base.

use std::path::PathBuf;

use directories::BaseDirs;
use thiserror::Error;

/// Folder created under the base directory.
pub const APP_DIR_NAME: &str = ".sentiment";

/// Environment variable that replaces the OS config directory as the base.
pub const CONFIG_HOME_ENV: &str = "SENTIMENT_CONFIG_HOME";

const LOGS_DIR_NAME: &str = "logs";

#[derive(Debug, Error)]
pub enum AppDirError {
    #[error("Cannot locate a config directory; set {CONFIG_HOME_ENV} to choose one")]
    NoBaseDir,
    #[error("Failed to create {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// The `.sentiment` folder, created on first use.
pub fn app_root_dir() -> Result<PathBuf, AppDirError> {
    ensure_dir(base_dir()?.join(APP_DIR_NAME))
}

/// Folder holding the per-run log files, created on first use.
pub fn logs_dir() -> Result<PathBuf, AppDirError> {
    ensure_dir(app_root_dir()?.join(LOGS_DIR_NAME))
}

fn ensure_dir(path: PathBuf) -> Result<PathBuf, AppDirError> {
    match std::fs::create_dir_all(&path) {
        Ok(()) => Ok(path),
        Err(source) => Err(AppDirError::CreateDir { path, source }),
    }
}

fn base_dir() -> Result<PathBuf, AppDirError> {
    #[cfg(test)]
    if let Some(path) = test_support::current_override() {
        return Ok(path);
    }
    if let Some(path) = std::env::var_os(CONFIG_HOME_ENV).filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    BaseDirs::new()
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or(AppDirError::NoBaseDir)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::cell::RefCell;
    use std::path::PathBuf;

    thread_local! {
        static BASE_OVERRIDE: RefCell<Option<PathBuf>> = const { RefCell::new(None) };
    }

    pub(super) fn current_override() -> Option<PathBuf> {
        BASE_OVERRIDE.with(|slot| slot.borrow().clone())
    }

    /// Redirects the base directory for the current test thread until dropped.
    pub(crate) struct OverrideGuard {
        previous: Option<PathBuf>,
    }

    impl OverrideGuard {
        pub(crate) fn set(path: PathBuf) -> Self {
            let previous = BASE_OVERRIDE.with(|slot| slot.replace(Some(path)));
            Self { previous }
        }
    }

    impl Drop for OverrideGuard {
        fn drop(&mut self) {
            let previous = self.previous.take();
            BASE_OVERRIDE.with(|slot| *slot.borrow_mut() = previous);
        }
    }
}
