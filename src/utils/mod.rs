//! Utility functions and helpers.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

/// Timestamp format used in every run log line.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format a local time for the run log.
pub fn format_timestamp(at: &DateTime<Local>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Current local time, formatted for the run log.
pub fn timestamp() -> String {
    format_timestamp(&Local::now())
}

/// Resolve a stage program against the working directory.
///
/// Bare names (`python3`) are left for PATH lookup; relative paths with a
/// separator (`./bin/crawl`, `venv/bin/python`) are joined onto `working_dir`.
pub fn resolve_program(program: &Path, working_dir: &Path) -> PathBuf {
    if program.is_absolute() || program.components().count() < 2 {
        program.to_path_buf()
    } else {
        working_dir.join(program)
    }
}
