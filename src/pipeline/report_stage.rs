//! Report output stage.

use super::{OutputTarget, PipelineError, should_use_color, write_output};
use crate::config::DriftConfig;
use crate::diff::Drift;
use crate::reports::{ReportConfig, ReportMetadata, create_reporter_with_options};

const WORKING_TREE: &str = "working-tree";

/// Report settings for a run.
#[must_use]
pub fn report_config(config: &DriftConfig, colored: bool) -> ReportConfig {
    let revision = |revision: &str| {
        if config.uncommitted {
            WORKING_TREE.to_string()
        } else {
            revision.to_string()
        }
    };
    ReportConfig {
        pretty: config.output.pretty,
        colored,
        metadata: ReportMetadata {
            baseline_root: Some(config.paths.baseline.clone()),
            target_root: Some(config.paths.target.clone()),
            baseline_revision: Some(revision(&config.baseline_revision)),
            target_revision: Some(revision(&config.target_revision)),
        },
        ..ReportConfig::default()
    }
}

/// Render the drift aggregate and write it to the configured destination.
pub fn output_report(config: &DriftConfig, drift: &Drift) -> Result<(), PipelineError> {
    let target = OutputTarget::from_option(config.output.file.clone());
    let colored = should_use_color(config.output.no_color, &target);
    let reporter = create_reporter_with_options(config.output.format, colored);
    let report = reporter
        .generate_drift_report(drift, &report_config(config, colored))
        .map_err(|e| PipelineError::ReportFailed { source: e.into() })?;

    write_output(&report, &target, config.behavior.quiet)
        .map_err(|source| PipelineError::ReportFailed { source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DriftConfigBuilder;
    use crate::reports::ReportFormat;

    #[test]
    fn test_report_written_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("drift.json");
        let config = DriftConfigBuilder::new()
            .baseline_path(dir.path().to_path_buf())
            .target_path(dir.path().to_path_buf())
            .all_libraries(true)
            .uncommitted(true)
            .output_format(ReportFormat::Json)
            .output_file(Some(out.clone()))
            .quiet(true)
            .build()
            .unwrap();

        output_report(&config, &Drift::new()).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(out).unwrap()).unwrap();
        assert_eq!(value["metadata"]["baseline"]["revision"], "working-tree");
        assert_eq!(value["summary"]["total_changes"], 0);
    }
}
