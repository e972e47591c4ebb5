//! Pipeline entry points.
//!
//! - `plan`: Resolve a named pipeline into ordered stage specs
//! - `invoke`: Run one stage as a child process
//! - `orchestrator`: Sequence stages with per-stage failure isolation

pub mod invoke;
pub mod orchestrator;
pub mod plan;

pub use invoke::{ProcessInvoker, StageInvoker};
pub use orchestrator::{Orchestrator, RunConfig, resolve_working_directory};
pub use plan::{PipelineKind, plan};
