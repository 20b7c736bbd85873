//! JSON report generator.

use super::{ReportConfig, ReportError, ReportFormat, ReportGenerator};
use crate::diff::Drift;
use chrono::Utc;
use serde::Serialize;
use std::path::PathBuf;

/// JSON report generator.
///
/// The drift aggregate is emitted at the top level; a `metadata` object
/// records the tool, the compared roots and the aggregate fingerprint.
pub struct JsonReporter {
    /// Pretty print output
    pretty: bool,
    /// Omit the `generated_at` timestamp so identical drift renders identically
    reproducible: bool,
}

impl JsonReporter {
    /// Create a new JSON reporter
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pretty: true,
            reproducible: false,
        }
    }

    /// Set pretty printing
    #[must_use]
    pub const fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    #[must_use]
    pub const fn reproducible(mut self, reproducible: bool) -> Self {
        self.reproducible = reproducible;
        self
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportGenerator for JsonReporter {
    fn generate_drift_report(&self, drift: &Drift, config: &ReportConfig) -> Result<String, ReportError> {
        let fingerprint = drift
            .fingerprint()
            .map_err(|e| ReportError::SerializationError(e.to_string()))?;

        let report = JsonDriftReport {
            metadata: JsonReportMetadata {
                tool: ToolInfo {
                    name: "drift-tools",
                    version: env!("CARGO_PKG_VERSION"),
                },
                generated_at: (!self.reproducible).then(|| Utc::now().to_rfc3339()),
                baseline: SideInfo {
                    root: config.metadata.baseline_root.clone(),
                    revision: config.metadata.baseline_revision.clone(),
                },
                target: SideInfo {
                    root: config.metadata.target_root.clone(),
                    revision: config.metadata.target_revision.clone(),
                },
                fingerprint: format!("{fingerprint:016x}"),
            },
            drift,
        };

        let pretty = self.pretty && config.pretty;
        let json = if pretty {
            serde_json::to_string_pretty(&report)
        } else {
            serde_json::to_string(&report)
        }
        .map_err(|e| ReportError::SerializationError(e.to_string()))?;

        Ok(json)
    }

    fn format(&self) -> ReportFormat {
        ReportFormat::Json
    }
}

// JSON report structures

#[derive(Serialize)]
struct JsonDriftReport<'a> {
    metadata: JsonReportMetadata,
    #[serde(flatten)]
    drift: &'a Drift,
}

#[derive(Serialize)]
struct JsonReportMetadata {
    tool: ToolInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    generated_at: Option<String>,
    baseline: SideInfo,
    target: SideInfo,
    fingerprint: String,
}

#[derive(Serialize)]
struct ToolInfo {
    name: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct SideInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    root: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    revision: Option<String>,
}
