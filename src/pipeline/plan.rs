// src/pipeline/plan.rs

//! Named pipeline configurations.
//!
//! - `full`: crawl with `--limit`, then analyze with `--days` and `--limit`
//! - `analyze-only`: analyze with `--days`
//!
//! Neither passes a morning/evening flag. The analyzer picks its own variant
//! from the time of day.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;
use crate::models::{Config, StageConfig, StageSpec};

/// Which deployment the run performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineKind {
    /// Crawl, then analyze
    #[default]
    Full,
    /// Analyze only, relying on the analyzer's time-of-day variant
    AnalyzeOnly,
}

impl PipelineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineKind::Full => "full",
            PipelineKind::AnalyzeOnly => "analyze-only",
        }
    }
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PipelineKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "full" => Ok(PipelineKind::Full),
            "analyze-only" | "analyze_only" | "analyze" => Ok(PipelineKind::AnalyzeOnly),
            other => Err(AppError::config(format!(
                "unknown pipeline '{other}' (expected 'full' or 'analyze-only')"
            ))),
        }
    }
}

/// Build the ordered stage list for a pipeline.
pub fn plan(kind: PipelineKind, config: &Config) -> Vec<StageSpec> {
    match kind {
        PipelineKind::Full => vec![
            base_stage(&config.crawl)
                .param("limit", config.limit)
                .args(config.crawl.sources.iter().cloned()),
            base_stage(&config.analyze)
                .param("days", config.day_window)
                .param("limit", config.limit),
        ],
        PipelineKind::AnalyzeOnly => {
            vec![base_stage(&config.analyze).param("days", config.day_window)]
        }
    }
}

fn base_stage(stage: &StageConfig) -> StageSpec {
    StageSpec::new(&stage.name, &stage.program)
        .args(stage.args.iter().cloned())
        .envs(stage.env.clone())
        .timeout(stage.timeout_secs.map(Duration::from_secs))
}
