//! Report type definitions.

use clap::ValueEnum;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Output format for drift reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// The full drift aggregate as JSON
    #[default]
    Json,
    /// Brief per-library summary for terminals
    Summary,
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Summary => write!(f, "summary"),
        }
    }
}

/// Configuration for report generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Pretty-print structured output
    pub pretty: bool,
    /// Use ANSI colors in terminal output
    pub colored: bool,
    /// Maximum entities listed per library section in the summary
    pub max_items: Option<usize>,
    pub metadata: ReportMetadata,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            pretty: true,
            colored: false,
            max_items: Some(20),
            metadata: ReportMetadata::default(),
        }
    }
}

/// Where the compared content came from
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub baseline_root: Option<PathBuf>,
    pub target_root: Option<PathBuf>,
    /// Revision or `"working-tree"` per side
    pub baseline_revision: Option<String>,
    pub target_revision: Option<String>,
}
