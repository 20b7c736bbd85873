//! CLI command handlers.
//!
//! This module provides testable command handlers that are invoked by main.rs.
//! Each handler implements the business logic for a specific CLI subcommand.

mod classify;
mod drift;

pub use classify::{ClassifiedPath, classify_paths, run_classify};
pub use drift::run_drift;

// Re-export config types used by handlers
pub use crate::config::DriftConfig;
