// src/models/run.rs

use std::path::PathBuf;

use chrono::{DateTime, Local};

use super::StageResult;

/// One end-to-end execution, from start banner to end banner.
#[derive(Debug, Clone)]
pub struct Run {
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub working_directory: PathBuf,
    /// Stage results in invocation order
    pub results: Vec<StageResult>,
}

impl Run {
    pub fn succeeded_count(&self) -> usize {
        self.results.iter().filter(|r| r.succeeded).count()
    }

    pub fn failed_count(&self) -> usize {
        self.results.len() - self.succeeded_count()
    }
}

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// Orchestration finished; individual stages may still have failed.
    Completed(Run),
    /// Setup failed before any stage ran.
    Fatal { error: String },
}

impl RunOutcome {
    /// Process exit status for the scheduler.
    ///
    /// Stage failures are reported in the log only and never change this.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Completed(_) => 0,
            RunOutcome::Fatal { .. } => 1,
        }
    }

    pub fn run(&self) -> Option<&Run> {
        match self {
            RunOutcome::Completed(run) => Some(run),
            RunOutcome::Fatal { .. } => None,
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, RunOutcome::Fatal { .. })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn failed_stage_does_not_change_exit_code() {
        let now = Local::now();
        let outcome = RunOutcome::Completed(Run {
            started_at: now,
            finished_at: now,
            working_directory: PathBuf::from("/srv/news"),
            results: vec![
                StageResult::success("crawlers", Duration::ZERO),
                StageResult::failure("news analyzer", Some(1), Duration::ZERO),
            ],
        });

        assert_eq!(outcome.exit_code(), 0);
        let run = outcome.run().unwrap();
        assert_eq!(run.succeeded_count(), 1);
        assert_eq!(run.failed_count(), 1);
    }

    #[test]
    fn fatal_exits_non_zero() {
        let outcome = RunOutcome::Fatal {
            error: "missing".into(),
        };
        assert_eq!(outcome.exit_code(), 1);
        assert!(outcome.run().is_none());
    }
}
