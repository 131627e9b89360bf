//! covgate - coverage gate for CI pipelines
//!
//! Runs a project's build, test, lint and coverage tooling, then decides whether
//! the build passes:
//! - Aggregate line coverage parsed from a Cobertura or LCOV report
//! - Minimum coverage floor (integer percent, truncated)
//! - Maximum allowed drop against the stored baseline
//! - Baseline persisted as a single decimal ratio

pub mod baseline;
pub mod config;
pub mod coverage;
pub mod error;
pub mod gate;
pub mod step;
pub mod summary;

pub use baseline::{BaselineError, BaselineStore};
pub use config::{BaselinePolicy, Config, GateSettings};
pub use coverage::{parse_report, CoverageRatio, ReportError, ReportFormat};
pub use error::GateError;
pub use gate::{Gate, GateOutcome, GateState, GateVerdict};
pub use step::{CommandRunner, Step, StepResult, SystemRunner};
