//! Pipeline orchestration for drift runs.
//!
//! This module provides the shared orchestration logic for
//! load index → compute drift → report workflows used by the CLI handlers.

mod drift_stage;
mod index_stage;
mod output;
mod report_stage;

pub use drift_stage::{build_engine, compute_drift};
pub use index_stage::load_index;
pub use output::{OutputTarget, should_use_color, write_output};
pub use report_stage::{output_report, report_config};

/// Structured pipeline error types for better diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The run configuration was rejected before any diffing
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Failed to read or parse the content index
    #[error("Index load failed for {path}: {source}")]
    IndexLoadFailed {
        path: String,
        #[source]
        source: anyhow::Error,
    },

    /// Drift computation failed
    #[error("Drift computation failed: {source}")]
    DriftFailed {
        #[source]
        source: anyhow::Error,
    },

    /// Report generation or output failed
    #[error("Report failed: {source}")]
    ReportFailed {
        #[source]
        source: anyhow::Error,
    },
}

/// Exit codes for CI/CD integration
pub mod exit_codes {
    /// Success - no drift detected (or drift without --fail-on-drift)
    pub const SUCCESS: i32 = 0;
    /// Drift was detected and --fail-on-drift was set
    pub const DRIFT_DETECTED: i32 = 1;
    /// An error occurred
    pub const ERROR: i32 = 2;
}
