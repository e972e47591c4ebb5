//! Pipeline configuration structures.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{AppError, Result};

/// Root pipeline configuration.
///
/// Resolved once when a run starts; nothing is reloaded while stages execute.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Directory the stages run in
    #[serde(default = "defaults::working_directory")]
    pub working_directory: PathBuf,

    /// Append-only run log, relative to the launch directory when not absolute
    #[serde(default = "defaults::log_path")]
    pub log_path: PathBuf,

    /// Maximum number of articles fetched (and analyzed) per source
    #[serde(default = "defaults::limit")]
    pub limit: u32,

    /// Trailing days of fetched articles the analyzer considers
    #[serde(default = "defaults::day_window")]
    pub day_window: u32,

    /// Crawl stage command
    #[serde(default = "defaults::crawl_stage")]
    pub crawl: StageConfig,

    /// Analyze stage command
    #[serde(default = "defaults::analyze_stage")]
    pub analyze: StageConfig,

    /// Console diagnostics
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.working_directory.as_os_str().is_empty() {
            return Err(AppError::validation("working_directory is empty"));
        }
        if self.log_path.as_os_str().is_empty() {
            return Err(AppError::validation("log_path is empty"));
        }
        if self.limit == 0 {
            return Err(AppError::validation("limit must be > 0"));
        }
        if self.day_window == 0 {
            return Err(AppError::validation("day_window must be > 0"));
        }
        self.crawl.validate("crawl")?;
        self.analyze.validate("analyze")?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            working_directory: defaults::working_directory(),
            log_path: defaults::log_path(),
            limit: defaults::limit(),
            day_window: defaults::day_window(),
            crawl: defaults::crawl_stage(),
            analyze: defaults::analyze_stage(),
            logging: LoggingConfig::default(),
        }
    }
}

/// How to launch one external stage.
#[derive(Debug, Clone, Deserialize)]
pub struct StageConfig {
    /// Label used in run log lines (e.g. "Starting crawlers...")
    pub name: String,

    /// Executable, looked up on PATH unless it contains a path separator
    pub program: String,

    /// Leading arguments placed before the pipeline parameters
    #[serde(default)]
    pub args: Vec<String>,

    /// Positional source names appended after the parameters; empty means all
    #[serde(default)]
    pub sources: Vec<String>,

    /// Extra environment for the child process
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Kill the stage after this many seconds; unset waits forever
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl StageConfig {
    fn validate(&self, section: &str) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation(format!("{section}.name is empty")));
        }
        if self.program.trim().is_empty() {
            return Err(AppError::validation(format!("{section}.program is empty")));
        }
        if self.timeout_secs == Some(0) {
            return Err(AppError::validation(format!(
                "{section}.timeout_secs must be > 0"
            )));
        }
        Ok(())
    }
}

/// Console logging settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    use super::StageConfig;

    pub fn working_directory() -> PathBuf {
        PathBuf::from(".")
    }
    pub fn log_path() -> PathBuf {
        PathBuf::from("logs/pipeline.log")
    }
    pub fn limit() -> u32 {
        50
    }
    pub fn day_window() -> u32 {
        1
    }
    pub fn log_level() -> String {
        "info".into()
    }

    pub fn crawl_stage() -> StageConfig {
        StageConfig {
            name: "crawlers".into(),
            program: "python3".into(),
            args: vec!["main_crawler.py".into()],
            sources: Vec::new(),
            env: BTreeMap::new(),
            timeout_secs: None,
        }
    }

    pub fn analyze_stage() -> StageConfig {
        StageConfig {
            name: "news analyzer".into(),
            program: "python3".into(),
            args: vec!["news_analyzer.py".into()],
            sources: Vec::new(),
            env: BTreeMap::new(),
            timeout_secs: None,
        }
    }
}
