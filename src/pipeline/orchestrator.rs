// src/pipeline/orchestrator.rs

//! Top-level run driver.
//!
//! Sequencing per run:
//!
//! 1. Resolve the working directory (the only fatal failure)
//! 2. Start banner
//! 3. Each stage in order: starting line, stage output, outcome line
//! 4. End banner and a blank separator line
//!
//! A failing stage is logged and the next one still runs.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::error::{AppError, Result};
use crate::models::{Config, Run, RunOutcome, StageSpec};
use crate::storage::RunLog;
use crate::utils;

use super::invoke::{ProcessInvoker, StageInvoker};
use super::plan::{PipelineKind, plan};

/// Everything one run needs, resolved before the first stage starts.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub working_directory: PathBuf,
    pub log_path: PathBuf,
    pub stages: Vec<StageSpec>,
}

impl RunConfig {
    /// Resolve a named pipeline from file configuration.
    pub fn from_config(config: &Config, kind: PipelineKind) -> Self {
        Self {
            working_directory: config.working_directory.clone(),
            log_path: config.log_path.clone(),
            stages: plan(kind, config),
        }
    }
}

/// Check that `path` is an existing directory and return its canonical form.
pub fn resolve_working_directory(path: &Path) -> Result<PathBuf> {
    let wrap = |source| AppError::WorkingDirectory {
        path: path.to_path_buf(),
        source,
    };

    let resolved = fs::canonicalize(path).map_err(wrap)?;
    if !resolved.is_dir() {
        return Err(wrap(io::Error::new(
            io::ErrorKind::NotADirectory,
            "not a directory",
        )));
    }
    Ok(resolved)
}

/// Drives stages in order through a [`StageInvoker`].
pub struct Orchestrator<I = ProcessInvoker> {
    invoker: I,
}

impl Default for Orchestrator<ProcessInvoker> {
    fn default() -> Self {
        Self::new(ProcessInvoker::new())
    }
}

impl<I: StageInvoker> Orchestrator<I> {
    pub fn new(invoker: I) -> Self {
        Self { invoker }
    }

    /// Execute one run.
    ///
    /// Returns [`RunOutcome::Fatal`] only when the working directory cannot be
    /// resolved; in that case no stage is invoked and no banner is written.
    pub async fn run(&self, config: &RunConfig) -> RunOutcome {
        let run_log = RunLog::new(&config.log_path);

        let working_directory = match resolve_working_directory(&config.working_directory) {
            Ok(dir) => dir,
            Err(e) => {
                log::error!("{e}");
                run_log.record(&format!("ERROR: {e}"));
                return RunOutcome::Fatal {
                    error: e.to_string(),
                };
            }
        };

        let started_at = Local::now();
        log::info!(
            "Pipeline starting in {} with {} stage(s)",
            working_directory.display(),
            config.stages.len()
        );
        banner(&run_log, "PIPELINE STARTED", &utils::format_timestamp(&started_at));

        let mut results = Vec::with_capacity(config.stages.len());
        for (i, stage) in config.stages.iter().enumerate() {
            log::info!(
                "[STEP {}/{}] {}: {}",
                i + 1,
                config.stages.len(),
                stage.name(),
                stage
            );
            run_log.record(&format!("Starting {}...", stage.name()));

            let result = self
                .invoker
                .invoke(stage, &working_directory, &run_log)
                .await;

            if result.succeeded {
                log::info!("{} finished successfully", stage.name());
                run_log.record(&format!("{} finished successfully.", stage.name()));
            } else {
                log::error!(
                    "{} failed (exit code {})",
                    stage.name(),
                    result
                        .exit_code
                        .map_or_else(|| "none".to_string(), |c| c.to_string())
                );
                run_log.record(&format!(
                    "ERROR: {} exited with a failure code.",
                    stage.name()
                ));
            }
            results.push(result);
        }

        let finished_at = Local::now();
        banner(&run_log, "PIPELINE FINISHED", &utils::format_timestamp(&finished_at));
        if let Err(e) = run_log.blank() {
            log::error!("{e}");
        }

        let run = Run {
            started_at,
            finished_at,
            working_directory,
            results,
        };
        log::info!(
            "Pipeline finished: {} succeeded, {} failed",
            run.succeeded_count(),
            run.failed_count()
        );

        RunOutcome::Completed(run)
    }
}

fn banner(run_log: &RunLog, label: &str, timestamp: &str) {
    if let Err(e) = run_log.append_banner(label, timestamp) {
        log::error!("{e}");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use tempfile::TempDir;

    use super::*;
    use crate::models::StageResult;
    use crate::storage::DELIMITER;

    /// Records invocations and fails the stages named in `failing`.
    #[derive(Default)]
    struct FakeInvoker {
        failing: Vec<&'static str>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeInvoker {
        fn failing(names: &[&'static str]) -> Self {
            Self {
                failing: names.to_vec(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl StageInvoker for FakeInvoker {
        async fn invoke(&self, stage: &StageSpec, _: &Path, run_log: &RunLog) -> StageResult {
            self.calls.lock().unwrap().push(stage.name().to_string());
            let _ = run_log.append(&format!("output of {}", stage.name()));
            if self.failing.iter().any(|n| *n == stage.name()) {
                StageResult::failure(stage.name(), Some(1), Duration::ZERO)
            } else {
                StageResult::success(stage.name(), Duration::ZERO)
            }
        }
    }

    fn run_config(tmp: &TempDir, names: &[&str]) -> RunConfig {
        RunConfig {
            working_directory: tmp.path().to_path_buf(),
            log_path: tmp.path().join("logs/pipeline.log"),
            stages: names
                .iter()
                .map(|n| StageSpec::new(*n, "true"))
                .collect(),
        }
    }

    /// Log lines with the `[timestamp] ` prefix removed.
    fn log_lines(config: &RunConfig) -> Vec<String> {
        fs::read_to_string(&config.log_path)
            .unwrap()
            .lines()
            .map(|line| match line.strip_prefix('[') {
                Some(rest) => rest.split_once("] ").map_or(line, |(_, msg)| msg).to_string(),
                None => line.to_string(),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_missing_working_directory_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let mut config = run_config(&tmp, &["crawlers", "news analyzer"]);
        config.working_directory = tmp.path().join("does-not-exist");
        let invoker = FakeInvoker::default();

        let outcome = Orchestrator::new(invoker).run(&config).await;

        assert!(outcome.is_fatal());
        assert_eq!(outcome.exit_code(), 1);
        let lines = log_lines(&config);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("ERROR: cannot enter working directory"));
    }

    #[tokio::test]
    async fn test_fatal_setup_invokes_no_stage() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("not-a-dir");
        fs::write(&file, "").unwrap();
        let mut config = run_config(&tmp, &["crawlers"]);
        config.working_directory = file;

        let orchestrator = Orchestrator::new(FakeInvoker::default());
        let outcome = orchestrator.run(&config).await;

        assert!(outcome.is_fatal());
        assert!(orchestrator.invoker.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failed_stage_does_not_stop_the_run() {
        let tmp = TempDir::new().unwrap();
        let config = run_config(&tmp, &["first", "second", "third"]);

        let orchestrator = Orchestrator::new(FakeInvoker::failing(&["second"]));
        let outcome = orchestrator.run(&config).await;

        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(orchestrator.invoker.calls(), ["first", "second", "third"]);

        let run = outcome.run().unwrap();
        let succeeded: Vec<bool> = run.results.iter().map(|r| r.succeeded).collect();
        assert_eq!(succeeded, [true, false, true]);
    }

    #[tokio::test]
    async fn test_unwritable_log_does_not_stop_the_run() {
        let tmp = TempDir::new().unwrap();
        let mut config = run_config(&tmp, &["crawlers", "news analyzer"]);
        config.log_path = tmp.path().to_path_buf();

        let orchestrator = Orchestrator::new(FakeInvoker::default());
        let outcome = orchestrator.run(&config).await;

        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(orchestrator.invoker.calls(), ["crawlers", "news analyzer"]);
        assert_eq!(outcome.run().unwrap().results.len(), 2);
    }

    #[tokio::test]
    async fn test_log_is_ordered_per_stage() {
        let tmp = TempDir::new().unwrap();
        let config = run_config(&tmp, &["crawlers", "news analyzer"]);

        Orchestrator::new(FakeInvoker::failing(&["news analyzer"]))
            .run(&config)
            .await;

        let lines = log_lines(&config);
        assert_eq!(lines[0], DELIMITER);
        assert!(lines[1].starts_with("PIPELINE STARTED AT: "));
        assert_eq!(lines[2], DELIMITER);
        assert_eq!(
            &lines[3..9],
            [
                "Starting crawlers...",
                "output of crawlers",
                "crawlers finished successfully.",
                "Starting news analyzer...",
                "output of news analyzer",
                "ERROR: news analyzer exited with a failure code.",
            ]
        );
        assert_eq!(lines[9], DELIMITER);
        assert!(lines[10].starts_with("PIPELINE FINISHED AT: "));
        assert_eq!(lines[11], DELIMITER);
        assert_eq!(lines[12], "");
        assert_eq!(lines.len(), 13);
    }

    #[tokio::test]
    async fn test_runs_append_to_the_same_log() {
        let tmp = TempDir::new().unwrap();
        let config = run_config(&tmp, &["crawlers"]);
        let orchestrator = Orchestrator::new(FakeInvoker::default());

        orchestrator.run(&config).await;
        let first = fs::read_to_string(&config.log_path).unwrap();
        orchestrator.run(&config).await;
        orchestrator.run(&config).await;
        let after = fs::read_to_string(&config.log_path).unwrap();

        assert!(after.starts_with(&first));
        assert_eq!(after.matches("PIPELINE STARTED AT").count(), 3);
    }

    #[tokio::test]
    async fn test_empty_stage_list_still_writes_banners() {
        let tmp = TempDir::new().unwrap();
        let config = run_config(&tmp, &[]);

        let outcome = Orchestrator::new(FakeInvoker::default()).run(&config).await;

        assert_eq!(outcome.exit_code(), 0);
        let lines = log_lines(&config);
        assert_eq!(lines.len(), 7);
        assert!(lines[4].starts_with("PIPELINE FINISHED AT: "));
    }

    #[test]
    fn test_run_config_from_named_pipeline() {
        let config = Config::default();

        let full = RunConfig::from_config(&config, PipelineKind::Full);
        let analyze = RunConfig::from_config(&config, PipelineKind::AnalyzeOnly);

        assert_eq!(full.stages.len(), 2);
        assert_eq!(analyze.stages.len(), 1);
        assert_eq!(full.log_path, config.log_path);
    }
}
