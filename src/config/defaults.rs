//! Default configurations and presets for drift-tools.
//!
//! Provides named presets for common use cases and default values.

use super::types::{AppConfig, BehaviorConfig, FieldPolicyConfig, OutputConfig};
use crate::diff::FieldTable;
use crate::model::{Component, Library, Property, SecurityRequirement, TestCase, Threat};
use crate::reports::ReportFormat;

// ============================================================================
// Configuration Presets
// ============================================================================

/// Named configuration presets for common use cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigPreset {
    /// Default settings suitable for most cases
    Default,
    /// CI/CD: machine-readable output, fail on drift
    CiCd,
    /// Strict: compare every field except identity
    Strict,
}

impl ConfigPreset {
    /// Get the preset name as a string.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::CiCd => "ci-cd",
            Self::Strict => "strict",
        }
    }

    /// Parse a preset from a string name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "default" => Some(Self::Default),
            "ci-cd" | "ci" | "cd" | "pipeline" => Some(Self::CiCd),
            "strict" | "exact" => Some(Self::Strict),
            _ => None,
        }
    }

    /// Get a description of this preset.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Default => "Content fields only; identifiers and timestamps are ignored",
            Self::CiCd => "Compact JSON output that fails the pipeline on drift",
            Self::Strict => "Every field except uuid and id, including timestamps and ownership",
        }
    }

    /// Get all available presets.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Default, Self::CiCd, Self::Strict]
    }
}

impl std::fmt::Display for ConfigPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// Preset Implementations
// ============================================================================

impl AppConfig {
    /// Create an `AppConfig` from a named preset.
    #[must_use]
    pub fn from_preset(preset: ConfigPreset) -> Self {
        match preset {
            ConfigPreset::Default => Self::default(),
            ConfigPreset::CiCd => Self::ci_cd_preset(),
            ConfigPreset::Strict => Self::strict_preset(),
        }
    }

    /// CI/CD pipeline preset.
    ///
    /// - Compact JSON output for machine parsing
    /// - Fail on any drift
    /// - Quiet mode to reduce noise
    #[must_use]
    pub fn ci_cd_preset() -> Self {
        Self {
            output: OutputConfig {
                format: ReportFormat::Json,
                file: None,
                pretty: false,
                no_color: true,
            },
            behavior: BehaviorConfig {
                quiet: true,
                fail_on_drift: true,
            },
            ..Self::default()
        }
    }

    /// Strict preset: every field but `uuid` and `id` is compared.
    #[must_use]
    pub fn strict_preset() -> Self {
        Self {
            fields: FieldPolicyConfig {
                library: Some(comparable_fields::<Library>()),
                component: Some(comparable_fields::<Component>()),
                threat: Some(comparable_fields::<Threat>()),
                security_requirement: Some(comparable_fields::<SecurityRequirement>()),
                test_case: Some(comparable_fields::<TestCase>()),
                property: Some(comparable_fields::<Property>()),
            },
            ..Self::default()
        }
    }
}

fn comparable_fields<T: FieldTable>() -> Vec<String> {
    T::accessors()
        .iter()
        .map(|a| a.name)
        .filter(|name| !IDENTITY_FIELDS.contains(name))
        .map(ToString::to_string)
        .collect()
}

// ============================================================================
// Default Value Constants
// ============================================================================

/// Fields that identify a document rather than describe it.
pub const IDENTITY_FIELDS: &[&str] = &["uuid", "id"];

/// Entry names skipped by whole-repository comparisons.
pub const DEFAULT_IGNORE_NAMES: &[&str] = &[".git", ".gitkeep"];

/// Index file looked up in the baseline root.
pub const DEFAULT_INDEX_FILE: &str = "index.yaml";

/// Revision compared when none is given.
pub const DEFAULT_REVISION: &str = "HEAD";

/// Largest accepted `parallelism.max_workers`.
pub const MAX_WORKERS_LIMIT: usize = 256;

// ============================================================================
// Tests
// ============================================================================
