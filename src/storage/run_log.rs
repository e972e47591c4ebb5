//! Append-only run log.
//!
//! Every write opens the file in append mode, writes, flushes and closes it
//! again. No handle or file position survives between calls, so lines from
//! the orchestrator and output forwarded from a stage's child process land in
//! the order they were produced.
//!
//! ## Layout of one run
//!
//! ```text
//! ==========================================
//! PIPELINE STARTED AT: 2026-10-16 08:00:01
//! ==========================================
//! [2026-10-16 08:00:01] Starting crawlers...
//! <crawler output>
//! [2026-10-16 08:03:12] crawlers finished successfully.
//! [2026-10-16 08:03:12] Starting news analyzer...
//! <analyzer output>
//! [2026-10-16 08:09:40] ERROR: news analyzer exited with a failure code.
//! ==========================================
//! PIPELINE FINISHED AT: 2026-10-16 08:09:40
//! ==========================================
//!
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};
use crate::utils;

/// Delimiter line around run banners.
pub const DELIMITER: &str = "==========================================";

/// Handle to the shared append-only log file.
#[derive(Debug, Clone)]
pub struct RunLog {
    path: PathBuf,
}

impl RunLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open for appending, creating the file and its parent directory if needed.
    fn open(&self) -> Result<File> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| AppError::log(&self.path, e))?;
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| AppError::log(&self.path, e))
    }

    fn write_all(&self, text: &str) -> Result<()> {
        let mut file = self.open()?;
        file.write_all(text.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|e| AppError::log(&self.path, e))
    }

    /// Append one line.
    pub fn append(&self, line: &str) -> Result<()> {
        self.write_all(&format!("{line}\n"))
    }

    /// Append a line prefixed with the current timestamp in brackets.
    pub fn append_stamped(&self, message: &str) -> Result<()> {
        self.append(&format!("[{}] {}", utils::timestamp(), message))
    }

    /// Best-effort [`Self::append_stamped`]; a failed write is reported on the
    /// console and otherwise ignored.
    pub fn record(&self, message: &str) {
        if let Err(e) = self.append_stamped(message) {
            log::error!("{e}");
        }
    }

    /// Append a delimited `<LABEL> AT: <timestamp>` block.
    pub fn append_banner(&self, label: &str, timestamp: &str) -> Result<()> {
        self.write_all(&format!(
            "{DELIMITER}\n{label} AT: {timestamp}\n{DELIMITER}\n"
        ))
    }

    /// Append an empty separator line.
    pub fn blank(&self) -> Result<()> {
        self.write_all("\n")
    }

    /// A fresh append-mode handle for a child's combined stdout/stderr.
    pub fn output_sink(&self) -> Result<File> {
        self.open()
    }
}
