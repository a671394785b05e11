//! Tracing setup for the command-line tools.
//!
//! Stdout carries the report blocks, so console diagnostics go to stderr. Each
//! run also writes a plain-text copy to its own file in the app logs folder, and
//! only the newest [`KEPT_RUN_LOGS`] of those files are kept.

use std::fs::{self, File, OpenOptions};
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use thiserror::Error;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::{self, MakeWriter, time::OffsetTime};
use tracing_subscriber::{EnvFilter, Registry, prelude::*};

use crate::app_dirs::{self, AppDirError};

/// Run logs kept after pruning, newest first.
pub const KEPT_RUN_LOGS: usize = 10;

const RUN_LOG_PREFIX: &str = "sentiment_";
const RUN_LOG_EXTENSION: &str = "log";
/// Filter used when `RUST_LOG` is unset or unparsable.
const DEFAULT_DIRECTIVE: &str = "info";

/// Sorts lexically in chronological order.
const RUN_STAMP: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]_[hour]-[minute]-[second]");
const LINE_STAMP: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Keeps the background file writer alive for the whole process.
static FILE_WRITER_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error(transparent)]
    AppDir(#[from] AppDirError),
    #[error("Failed to open run log {path}: {source}")]
    OpenRunLog { path: PathBuf, source: io::Error },
    #[error("Failed to prune run logs in {path}: {source}")]
    Prune { path: PathBuf, source: io::Error },
    #[error("Failed to timestamp the run log name: {0}")]
    Timestamp(#[from] time::error::Format),
    #[error("Another tracing subscriber is already installed: {0}")]
    AlreadyInstalled(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Route tracing to stderr and to a fresh run log. Later calls do nothing.
///
/// On error nothing is installed and the caller may carry on without logs.
pub fn init() -> Result<(), LoggingError> {
    if FILE_WRITER_GUARD.get().is_some() {
        return Ok(());
    }

    let dir = app_dirs::logs_dir()?;
    let (path, file) = open_run_log(&dir, OffsetDateTime::now_utc().to_offset(local_offset()))?;
    prune_run_logs(&dir, KEPT_RUN_LOGS)?;

    let (file_writer, guard) = tracing_appender::non_blocking(file);
    let stderr_is_terminal = io::stderr().is_terminal();
    tracing::subscriber::set_global_default(build_subscriber(
        env_filter(),
        io::stderr,
        stderr_is_terminal,
        file_writer,
    ))?;
    let _ = FILE_WRITER_GUARD.set(guard);

    tracing::debug!("Run log: {}", path.display());
    Ok(())
}

/// Filter, console layer and plain-text file layer.
///
/// Colors are only emitted on the console, and only when `console_ansi` is set.
fn build_subscriber<C, F>(
    filter: EnvFilter,
    console: C,
    console_ansi: bool,
    file: F,
) -> impl Subscriber + Send + Sync
where
    C: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    F: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let timer = OffsetTime::new(local_offset(), LINE_STAMP);
    let console_layer = fmt::layer()
        .with_writer(console)
        .with_ansi(console_ansi)
        .with_target(false)
        .with_timer(timer.clone());
    let file_layer = fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_timer(timer);
    Registry::default()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

fn run_log_name(started: OffsetDateTime) -> Result<String, LoggingError> {
    let stamp = started.format(RUN_STAMP)?;
    Ok(format!("{RUN_LOG_PREFIX}{stamp}.{RUN_LOG_EXTENSION}"))
}

fn open_run_log(dir: &Path, started: OffsetDateTime) -> Result<(PathBuf, File), LoggingError> {
    let path = dir.join(run_log_name(started)?);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|source| LoggingError::OpenRunLog {
            path: path.clone(),
            source,
        })?;
    Ok((path, file))
}

fn is_run_log(path: &Path) -> bool {
    let named_like_a_run = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(RUN_LOG_PREFIX));
    named_like_a_run
        && path.extension().is_some_and(|ext| ext == RUN_LOG_EXTENSION)
        && path.is_file()
}

/// Delete all but the `keep` newest run logs; other files are left alone.
fn prune_run_logs(dir: &Path, keep: usize) -> Result<(), LoggingError> {
    let prune_error = |source| LoggingError::Prune {
        path: dir.to_path_buf(),
        source,
    };
    let mut runs = Vec::new();
    for entry in fs::read_dir(dir).map_err(prune_error)? {
        let path = entry.map_err(prune_error)?.path();
        if is_run_log(&path) {
            runs.push(path);
        }
    }
    runs.sort();
    let excess = runs.len().saturating_sub(keep);
    for path in &runs[..excess] {
        fs::remove_file(path).map_err(prune_error)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;

    /// In-memory writer shared between a layer and the test.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn started_at(unix: i64) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(unix).unwrap()
    }

    #[test]
    fn events_reach_console_and_file_above_the_filter() {
        let console = Captured::default();
        let file = Captured::default();
        let subscriber =
            build_subscriber(EnvFilter::new("info"), console.clone(), true, file.clone());
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("[stage 1] fitting");
            tracing::debug!("vocabulary details");
        });

        let console = console.text();
        let file = file.text();
        assert!(console.contains("[stage 1] fitting"));
        assert!(file.contains("[stage 1] fitting"));
        assert!(!console.contains("vocabulary details"));
        assert!(!file.contains("vocabulary details"));
        assert!(console.contains('\u{1b}'));
        assert!(!file.contains('\u{1b}'));
    }

    #[test]
    fn run_log_names_carry_a_sortable_stamp() {
        assert_eq!(
            run_log_name(started_at(1_700_000_000)).unwrap(),
            "sentiment_2023-11-14_22-13-20.log"
        );
        let earlier = run_log_name(started_at(1_699_999_999)).unwrap();
        let later = run_log_name(started_at(1_700_086_400)).unwrap();
        assert!(earlier < later);
    }

    #[test]
    fn pruning_keeps_the_newest_runs_and_ignores_other_files() {
        let dir = tempdir().unwrap();
        let mut paths = Vec::new();
        for hour in 0..12 {
            let (path, _) = open_run_log(dir.path(), started_at(1_700_000_000 + hour * 3600)).unwrap();
            paths.push(path);
        }
        std::fs::write(dir.path().join("notes.log"), "keep").unwrap();
        std::fs::write(dir.path().join("sentiment_report.txt"), "keep").unwrap();

        prune_run_logs(dir.path(), KEPT_RUN_LOGS).unwrap();

        assert!(!paths[0].exists());
        assert!(!paths[1].exists());
        assert!(paths[2..].iter().all(|path| path.exists()));
        assert!(dir.path().join("notes.log").exists());
        assert!(dir.path().join("sentiment_report.txt").exists());
    }

    #[test]
    fn reopening_the_same_second_appends() {
        let dir = tempdir().unwrap();
        let (path, mut first) = open_run_log(dir.path(), started_at(1_700_000_000)).unwrap();
        first.write_all(b"one\n").unwrap();
        let (same, mut second) = open_run_log(dir.path(), started_at(1_700_000_000)).unwrap();
        second.write_all(b"two\n").unwrap();
        assert_eq!(path, same);
        assert_eq!(std::fs::read_to_string(path).unwrap(), "one\ntwo\n");
    }
}
