//! Drift computation stage.
//!
//! Validates the run configuration, builds the engine from it and computes
//! the drift aggregate.

use super::PipelineError;
use crate::config::{DriftConfig, Validatable};
use crate::diff::{Drift, DriftEngine};
use crate::index::ContentIndex;
use crate::utils::CancellationToken;
use anyhow::Context;
use std::sync::Arc;

/// Build a [`DriftEngine`] configured from `config`.
pub fn build_engine(config: &DriftConfig, index: Arc<ContentIndex>) -> anyhow::Result<DriftEngine> {
    let fields = config
        .fields
        .to_policy()
        .context("invalid field allow-list")?;
    Ok(DriftEngine::from_index(index)
        .with_field_policy(fields)
        .with_differ(config.tree.differ())
        .with_ignore_names(config.tree.ignore_names.iter().cloned())
        .with_max_workers(config.parallelism.max_workers))
}

/// Run the drift computation for one configured run.
///
/// Configuration problems are reported before any repository is touched.
pub fn compute_drift(
    config: &DriftConfig,
    index: Arc<ContentIndex>,
    cancel: &CancellationToken,
) -> Result<Drift, PipelineError> {
    let errors = config.validate();
    if !errors.is_empty() {
        let reason = errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ");
        return Err(PipelineError::InvalidConfig { reason });
    }

    let quiet = config.behavior.quiet;
    let request = config.request();
    if !quiet {
        let scope = if config.all { "all".to_string() } else { config.libraries.len().to_string() };
        tracing::info!(
            baseline = %config.paths.baseline.display(),
            target = %config.paths.target.display(),
            libraries = %scope,
            uncommitted = config.uncommitted,
            "computing content drift"
        );
    }

    let engine = build_engine(config, index).map_err(|source| PipelineError::InvalidConfig {
        reason: format!("{source:#}"),
    })?;
    let drift = engine
        .compute(&request, cancel)
        .map_err(|e| PipelineError::DriftFailed { source: e.into() })?;

    if !drift.skipped.is_empty() {
        tracing::warn!(skipped = drift.skipped.len(), "some documents could not be read and were skipped");
    }
    if !quiet {
        tracing::info!(
            total_changes = drift.summary.total_changes,
            added = drift.summary.libraries_added,
            deleted = drift.summary.libraries_deleted,
            modified = drift.summary.libraries_modified,
            "drift complete"
        );
    }

    Ok(drift)
}
