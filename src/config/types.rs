//! Configuration types for drift-tools operations.
//!
//! Provides structured configuration for drift runs, loadable from config
//! files and overridable from the command line.

use crate::diff::{FieldLists, FieldPolicy};
use crate::reports::ReportFormat;
use crate::scope::ScopedDiffRequest;
use crate::tree::{KindChangePolicy, TreeDiffer};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::defaults::{DEFAULT_IGNORE_NAMES, DEFAULT_INDEX_FILE, DEFAULT_REVISION};

// ============================================================================
// Unified Application Configuration
// ============================================================================

/// Unified application configuration that can be loaded from CLI args or config files.
///
/// This is the top-level configuration struct that aggregates all configuration
/// options. It can be constructed from CLI arguments, config files, or both
/// (with CLI overriding file settings).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AppConfig {
    /// Compared fields per entity kind
    pub fields: FieldPolicyConfig,
    /// Tree comparison settings
    pub tree: TreeDiffConfig,
    /// Worker thread settings
    pub parallelism: ParallelismConfig,
    /// Content index location
    pub index: IndexConfig,
    /// Output configuration (format, file)
    pub output: OutputConfig,
    /// Behavior flags
    pub behavior: BehaviorConfig,
}

impl AppConfig {
    /// Create a new `AppConfig` with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an `AppConfig` builder.
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }
}

// ============================================================================
// Builder for AppConfig
// ============================================================================

/// Builder for constructing `AppConfig` with fluent API.
#[derive(Debug, Default)]
#[must_use]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    /// Set the output format.
    pub const fn output_format(mut self, format: ReportFormat) -> Self {
        self.config.output.format = format;
        self
    }

    /// Set the output file.
    pub fn output_file(mut self, file: Option<PathBuf>) -> Self {
        self.config.output.file = file;
        self
    }

    /// Pretty-print JSON output.
    pub const fn pretty(mut self, pretty: bool) -> Self {
        self.config.output.pretty = pretty;
        self
    }

    /// Enable quiet mode.
    pub const fn quiet(mut self, quiet: bool) -> Self {
        self.config.behavior.quiet = quiet;
        self
    }

    /// Exit with code 1 when drift is found.
    pub const fn fail_on_drift(mut self, fail: bool) -> Self {
        self.config.behavior.fail_on_drift = fail;
        self
    }

    /// Upper bound on worker threads.
    pub const fn max_workers(mut self, max_workers: usize) -> Self {
        self.config.parallelism.max_workers = max_workers;
        self
    }

    /// Set the kind-change policy.
    pub const fn kind_changes(mut self, policy: KindChangePolicy) -> Self {
        self.config.tree.kind_changes = policy;
        self
    }

    /// Set the index file.
    pub fn index_path(mut self, path: Option<PathBuf>) -> Self {
        self.config.index.path = path;
        self
    }

    /// Set the field allow-lists.
    pub fn fields(mut self, fields: FieldPolicyConfig) -> Self {
        self.config.fields = fields;
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> AppConfig {
        self.config
    }
}

// ============================================================================
// Command-specific Configuration Types
// ============================================================================

/// Configuration for one drift run
#[derive(Debug, Clone)]
pub struct DriftConfig {
    /// Repositories to compare
    pub paths: DriftPaths,
    /// Libraries in scope (empty when `all` is set)
    pub libraries: Vec<Uuid>,
    /// Compare every library through a whole-repository diff
    pub all: bool,
    /// Compare working directories instead of revisions
    pub uncommitted: bool,
    pub baseline_revision: String,
    pub target_revision: String,
    pub fields: FieldPolicyConfig,
    pub tree: TreeDiffConfig,
    pub parallelism: ParallelismConfig,
    pub index: IndexConfig,
    pub output: OutputConfig,
    pub behavior: BehaviorConfig,
}

impl DriftConfig {
    /// The scoped diff request this run performs.
    #[must_use]
    pub fn request(&self) -> ScopedDiffRequest {
        let request = if self.all {
            ScopedDiffRequest::all_libraries(&self.paths.baseline, &self.paths.target)
        } else {
            ScopedDiffRequest::new(&self.paths.baseline, &self.paths.target, self.libraries.clone())
        };
        request
            .with_uncommitted(self.uncommitted)
            .with_revisions(&self.baseline_revision, &self.target_revision)
    }

    /// Index file, defaulting to `index.yaml` in the baseline root.
    #[must_use]
    pub fn index_path(&self) -> PathBuf {
        self.index.resolve(&self.paths.baseline)
    }
}

/// Paths for a drift run
#[derive(Debug, Clone)]
pub struct DriftPaths {
    /// Golden (reference) repository root
    pub baseline: PathBuf,
    /// Client repository root
    pub target: PathBuf,
}

// ============================================================================
// Sub-configuration Types
// ============================================================================

/// Allow-list of compared fields per entity kind.
///
/// An absent list keeps the kind's default, which leaves out identifiers,
/// timestamps and ownership fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct FieldPolicyConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threat: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_requirement: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_case: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property: Option<Vec<String>>,
}

impl FieldPolicyConfig {
    #[must_use]
    pub fn lists(&self) -> FieldLists<'_> {
        FieldLists {
            library: self.library.as_deref(),
            component: self.component.as_deref(),
            threat: self.threat.as_deref(),
            security_requirement: self.security_requirement.as_deref(),
            test_case: self.test_case.as_deref(),
            property: self.property.as_deref(),
        }
    }

    /// Build the comparators.
    pub fn to_policy(&self) -> crate::error::Result<FieldPolicy> {
        FieldPolicy::from_lists(&self.lists())
    }
}

/// Tree comparison settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct TreeDiffConfig {
    /// Entry names skipped at any depth when whole repositories are compared
    pub ignore_names: Vec<String>,
    /// Handling of paths that switch between file and folder
    pub kind_changes: KindChangePolicy,
}

impl Default for TreeDiffConfig {
    fn default() -> Self {
        Self {
            ignore_names: DEFAULT_IGNORE_NAMES.iter().map(ToString::to_string).collect(),
            kind_changes: KindChangePolicy::default(),
        }
    }
}

impl TreeDiffConfig {
    #[must_use]
    pub const fn differ(&self) -> TreeDiffer {
        TreeDiffer::new(self.kind_changes)
    }
}

/// Worker thread settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ParallelismConfig {
    /// Maximum worker threads (0 = available parallelism)
    pub max_workers: usize,
}

/// Content index location
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct IndexConfig {
    /// Index file (defaults to `index.yaml` in the baseline root)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl IndexConfig {
    #[must_use]
    pub fn resolve(&self, baseline_root: &Path) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| baseline_root.join(DEFAULT_INDEX_FILE))
    }
}

/// Output-related configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format
    pub format: ReportFormat,
    /// Output file path (None for stdout)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    /// Pretty-print JSON
    pub pretty: bool,
    /// Disable colored output
    pub no_color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: ReportFormat::default(),
            file: None,
            pretty: true,
            no_color: false,
        }
    }
}

/// Behavior flags for drift runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Suppress non-essential output
    pub quiet: bool,
    /// Exit with code 1 if any drift is detected
    pub fail_on_drift: bool,
}

// ============================================================================
// Builder for DriftConfig
// ============================================================================

/// Builder for `DriftConfig`
#[derive(Debug)]
pub struct DriftConfigBuilder {
    baseline: Option<PathBuf>,
    target: Option<PathBuf>,
    libraries: Vec<Uuid>,
    all: bool,
    uncommitted: bool,
    baseline_revision: String,
    target_revision: String,
    app: AppConfig,
}

impl Default for DriftConfigBuilder {
    fn default() -> Self {
        Self {
            baseline: None,
            target: None,
            libraries: Vec::new(),
            all: false,
            uncommitted: false,
            baseline_revision: DEFAULT_REVISION.to_string(),
            target_revision: DEFAULT_REVISION.to_string(),
            app: AppConfig::default(),
        }
    }
}

impl DriftConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed every section from a loaded application config.
    #[must_use]
    pub fn from_app_config(app: AppConfig) -> Self {
        Self {
            app,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn baseline_path(mut self, path: PathBuf) -> Self {
        self.baseline = Some(path);
        self
    }

    #[must_use]
    pub fn target_path(mut self, path: PathBuf) -> Self {
        self.target = Some(path);
        self
    }

    #[must_use]
    pub fn libraries(mut self, libraries: Vec<Uuid>) -> Self {
        self.libraries = libraries;
        self
    }

    #[must_use]
    pub const fn all_libraries(mut self, all: bool) -> Self {
        self.all = all;
        self
    }

    #[must_use]
    pub const fn uncommitted(mut self, uncommitted: bool) -> Self {
        self.uncommitted = uncommitted;
        self
    }

    #[must_use]
    pub fn baseline_revision(mut self, revision: Option<String>) -> Self {
        if let Some(revision) = revision {
            self.baseline_revision = revision;
        }
        self
    }

    #[must_use]
    pub fn target_revision(mut self, revision: Option<String>) -> Self {
        if let Some(revision) = revision {
            self.target_revision = revision;
        }
        self
    }

    #[must_use]
    pub const fn output_format(mut self, format: ReportFormat) -> Self {
        self.app.output.format = format;
        self
    }

    #[must_use]
    pub fn output_file(mut self, file: Option<PathBuf>) -> Self {
        if file.is_some() {
            self.app.output.file = file;
        }
        self
    }

    #[must_use]
    pub const fn no_color(mut self, no_color: bool) -> Self {
        self.app.output.no_color |= no_color;
        self
    }

    #[must_use]
    pub const fn quiet(mut self, quiet: bool) -> Self {
        self.app.behavior.quiet |= quiet;
        self
    }

    #[must_use]
    pub const fn fail_on_drift(mut self, fail: bool) -> Self {
        self.app.behavior.fail_on_drift |= fail;
        self
    }

    #[must_use]
    pub fn index_path(mut self, path: Option<PathBuf>) -> Self {
        if path.is_some() {
            self.app.index.path = path;
        }
        self
    }

    #[must_use]
    pub fn max_workers(mut self, max_workers: Option<usize>) -> Self {
        if let Some(max_workers) = max_workers {
            self.app.parallelism.max_workers = max_workers;
        }
        self
    }

    pub fn build(self) -> anyhow::Result<DriftConfig> {
        let baseline = self
            .baseline
            .ok_or_else(|| anyhow::anyhow!("baseline path is required"))?;
        let target = self
            .target
            .ok_or_else(|| anyhow::anyhow!("target path is required"))?;
        if self.all && !self.libraries.is_empty() {
            anyhow::bail!("--all cannot be combined with explicit libraries");
        }
        if !self.all && self.libraries.is_empty() {
            anyhow::bail!("at least one library is required (or use --all)");
        }

        let AppConfig {
            fields,
            tree,
            parallelism,
            index,
            output,
            behavior,
        } = self.app;

        Ok(DriftConfig {
            paths: DriftPaths { baseline, target },
            libraries: self.libraries,
            all: self.all,
            uncommitted: self.uncommitted,
            baseline_revision: self.baseline_revision,
            target_revision: self.target_revision,
            fields,
            tree,
            parallelism,
            index,
            output,
            behavior,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::LibrarySelection;

    #[test]
    fn test_builder_requires_paths() {
        let err = DriftConfigBuilder::new()
            .libraries(vec![Uuid::from_u128(1)])
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("baseline"));
    }

    #[test]
    fn test_builder_requires_scope() {
        let builder = || {
            DriftConfigBuilder::new()
                .baseline_path("golden".into())
                .target_path("client".into())
        };
        assert!(builder().build().is_err());
        assert!(
            builder()
                .all_libraries(true)
                .libraries(vec![Uuid::from_u128(1)])
                .build()
                .is_err()
        );
        assert!(builder().all_libraries(true).build().is_ok());
    }

    #[test]
    fn test_request_and_index_defaults() {
        let config = DriftConfigBuilder::new()
            .baseline_path("golden".into())
            .target_path("client".into())
            .libraries(vec![Uuid::from_u128(1)])
            .target_revision(Some("release".to_string()))
            .build()
            .unwrap();
        let request = config.request();
        assert_eq!(request.libraries, LibrarySelection::Only(vec![Uuid::from_u128(1)]));
        assert_eq!(request.baseline_revision, "HEAD");
        assert_eq!(request.target_revision, "release");
        assert_eq!(config.index_path(), Path::new("golden").join("index.yaml"));
    }

    #[test]
    fn test_cli_overrides_keep_file_settings() {
        let app = AppConfig::builder().fail_on_drift(true).max_workers(3).build();
        let config = DriftConfigBuilder::from_app_config(app)
            .baseline_path("golden".into())
            .target_path("client".into())
            .all_libraries(true)
            .fail_on_drift(false)
            .max_workers(None)
            .build()
            .unwrap();
        assert!(config.behavior.fail_on_drift);
        assert_eq!(config.parallelism.max_workers, 3);
    }

    #[test]
    fn test_field_policy_lists() {
        let fields = FieldPolicyConfig {
            component: Some(vec!["name".to_string()]),
            ..FieldPolicyConfig::default()
        };
        let policy = fields.to_policy().unwrap();
        assert_eq!(policy.component.field_names(), vec!["name"]);
        assert!(policy.threat.field_names().contains(&"risk_rating"));
    }
}
