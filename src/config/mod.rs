//! Configuration module for drift-tools.
//!
//! This module provides a unified configuration system with:
//! - Type-safe configuration structures
//! - Validation for all configuration values
//! - Named presets for common use cases
//! - YAML config file loading and discovery
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use drift_tools::config::{AppConfig, ConfigPreset, DriftConfigBuilder};
//!
//! // Use a preset
//! let app = AppConfig::from_preset(ConfigPreset::CiCd);
//!
//! // Layer run inputs on top
//! let config = DriftConfigBuilder::from_app_config(app)
//!     .baseline_path("golden".into())
//!     .target_path("client".into())
//!     .all_libraries(true)
//!     .build()?;
//! ```
//!
//! # Configuration File
//!
//! Place a `.drift-tools.yaml` file in your project root or `~/.config/drift-tools/`:
//!
//! ```yaml
//! fields:
//!   component: [name, description, category]
//! tree:
//!   kind_changes: report-only
//! behavior:
//!   fail_on_drift: true
//! ```

mod defaults;
pub mod file;
mod types;
mod validation;

pub use defaults::{
    ConfigPreset, DEFAULT_IGNORE_NAMES, DEFAULT_INDEX_FILE, DEFAULT_REVISION, IDENTITY_FIELDS,
    MAX_WORKERS_LIMIT,
};
pub use types::{
    AppConfig, AppConfigBuilder, BehaviorConfig, DriftConfig, DriftConfigBuilder, DriftPaths,
    FieldPolicyConfig, IndexConfig, OutputConfig, ParallelismConfig, TreeDiffConfig,
};
pub use validation::{ConfigError, Validatable};

pub use file::{
    ConfigFileError, discover_config_file, generate_example_config, load_config_file,
    load_or_default,
};

/// Generate a JSON Schema for the `AppConfig` configuration format.
///
/// This schema documents all configuration options that can be set in
/// `.drift-tools.yaml` config files.
pub fn generate_json_schema() -> serde_json::Result<String> {
    let schema = schemars::schema_for!(AppConfig);
    serde_json::to_string_pretty(&schema)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_lists_sections() {
        let schema = generate_json_schema().unwrap();
        for section in ["fields", "tree", "parallelism", "index", "output", "behavior"] {
            assert!(schema.contains(&format!("\"{section}\"")), "missing {section}");
        }
    }
}
