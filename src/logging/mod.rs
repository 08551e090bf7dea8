//! Per-worker log sinks.
//!
//! Each worker owns a dedicated sink writing informational-and-above
//! records to `<log_folder>/<label>.log` while mirroring every record,
//! debug included, to the shared console stream via `tracing`. Sinks are
//! registered process-wide by label: re-requesting a label returns the
//! existing sink without reopening the file.

use chrono::Utc;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

/// Record severity. File output starts at `Info`; `Debug` reaches the
/// console only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    /// Console-only diagnostic detail.
    Debug,
    /// Normal progress records.
    Info,
    /// Failure records.
    Error,
}

impl Level {
    fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Error => "ERROR",
        }
    }
}

/// A log sink dedicated to one worker.
pub struct WorkerLog {
    label: String,
    path: PathBuf,
    file: Mutex<BufWriter<File>>,
}

static REGISTRY: OnceLock<Mutex<HashMap<String, Arc<WorkerLog>>>> = OnceLock::new();

impl WorkerLog {
    /// Fetch the sink registered under `label`, creating it (and the log
    /// folder) on first request.
    pub fn get_or_create(label: &str, folder: &Path) -> std::io::Result<Arc<WorkerLog>> {
        let registry = REGISTRY.get_or_init(|| Mutex::new(HashMap::new()));
        let mut map = registry.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(existing) = map.get(label) {
            return Ok(Arc::clone(existing));
        }

        std::fs::create_dir_all(folder)?;
        let path = folder.join(format!("{label}.log"));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        let sink = Arc::new(WorkerLog {
            label: label.to_string(),
            path,
            file: Mutex::new(BufWriter::new(file)),
        });
        map.insert(label.to_string(), Arc::clone(&sink));
        Ok(sink)
    }

    /// Label this sink was registered under.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Path of the backing log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Console-only record.
    pub fn debug(&self, message: impl AsRef<str>) {
        self.record(Level::Debug, message.as_ref());
    }

    /// Informational record (file + console).
    pub fn info(&self, message: impl AsRef<str>) {
        self.record(Level::Info, message.as_ref());
    }

    /// Failure record (file + console).
    pub fn error(&self, message: impl AsRef<str>) {
        self.record(Level::Error, message.as_ref());
    }

    fn record(&self, level: Level, message: &str) {
        match level {
            Level::Debug => tracing::debug!(worker = %self.label, "{message}"),
            Level::Info => tracing::info!(worker = %self.label, "{message}"),
            Level::Error => tracing::error!(worker = %self.label, "{message}"),
        }

        if level < Level::Info {
            return;
        }

        let line = format!(
            "{} | {:<8} | [{}] {}\n",
            Utc::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            level.as_str(),
            self.label,
            message
        );
        // A sink write failure must never take the worker down.
        if let Ok(mut file) = self.file.lock() {
            let _ = file.write_all(line.as_bytes());
            let _ = file.flush();
        }
    }
}

impl std::fmt::Debug for WorkerLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerLog")
            .field("label", &self.label)
            .field("path", &self.path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_or_create_is_idempotent_per_label() {
        let dir = tempfile::tempdir().unwrap();
        let first = WorkerLog::get_or_create("t-log-idem", dir.path()).unwrap();
        let second = WorkerLog::get_or_create("t-log-idem", dir.path()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn file_receives_info_and_above_but_not_debug() {
        let dir = tempfile::tempdir().unwrap();
        let log = WorkerLog::get_or_create("t-log-levels", dir.path()).unwrap();

        log.debug("console only");
        log.info("made it to the file");
        log.error("broke something");

        let contents = std::fs::read_to_string(log.path()).unwrap();
        assert!(!contents.contains("console only"));
        assert!(contents.contains("made it to the file"));
        assert!(contents.contains("broke something"));
    }

    #[test]
    fn file_lines_carry_severity_and_label() {
        let dir = tempfile::tempdir().unwrap();
        let log = WorkerLog::get_or_create("t-log-format", dir.path()).unwrap();

        log.info("hello");
        log.error("oops");

        let contents = std::fs::read_to_string(log.path()).unwrap();
        let mut lines = contents.lines();
        let info_line = lines.next().unwrap();
        let error_line = lines.next().unwrap();
        assert!(info_line.contains("INFO"));
        assert!(info_line.contains("[t-log-format] hello"));
        assert!(error_line.contains("ERROR"));
        assert!(error_line.contains("[t-log-format] oops"));
    }

    #[test]
    fn log_file_is_named_after_the_label() {
        let dir = tempfile::tempdir().unwrap();
        let log = WorkerLog::get_or_create("t-log-name", dir.path()).unwrap();
        assert_eq!(log.path(), dir.path().join("t-log-name.log"));
    }
}
