//! Durable output of the pipeline runner.
//!
//! The only thing a run persists is its append-only text log. There is no
//! rotation and no locking; the scheduler is trusted not to overlap runs.

pub mod run_log;

// Re-export for convenience
pub use run_log::{DELIMITER, RunLog};
