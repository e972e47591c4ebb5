// src/models/mod.rs

//! Domain models for the pipeline runner.
//!
//! Everything here lives for one process; only the run log outlives a run.

mod config;
mod run;
mod stage;

// Re-export all public types
pub use config::{Config, LoggingConfig, StageConfig};
pub use run::{Run, RunOutcome};
pub use stage::{StageResult, StageSpec};
