//! Configuration validation for drift-tools.
//!
//! Provides validation traits and implementations for all configuration types.

use super::defaults::MAX_WORKERS_LIMIT;
use super::types::*;
use crate::diff::FieldTable;
use crate::model::{Component, Library, Property, SecurityRequirement, TestCase, Threat};

// ============================================================================
// Configuration Error
// ============================================================================

/// Error type for configuration validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    /// The field that failed validation
    pub field: String,
    /// Description of the validation error
    pub message: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Validation Trait
// ============================================================================

/// Trait for validatable configuration types.
pub trait Validatable {
    /// Validate the configuration, returning any errors found.
    fn validate(&self) -> Vec<ConfigError>;

    /// Check if the configuration is valid.
    fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

// ============================================================================
// Validation Implementations
// ============================================================================

impl Validatable for AppConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        errors.extend(self.fields.validate());
        errors.extend(self.tree.validate());
        errors.extend(self.parallelism.validate());
        errors.extend(self.output.validate());
        errors
    }
}

fn check_fields<T: FieldTable>(names: Option<&[String]>, errors: &mut Vec<ConfigError>) {
    let Some(names) = names else {
        return;
    };
    let field = format!("fields.{}", T::KIND);
    if names.is_empty() {
        errors.push(ConfigError {
            field: field.clone(),
            message: "allow-list is empty; no changes of this kind would be reported".to_string(),
        });
    }
    let known: Vec<&str> = T::accessors().iter().map(|a| a.name).collect();
    for name in names {
        if !known.contains(&name.as_str()) {
            errors.push(ConfigError {
                field: field.clone(),
                message: format!("Unknown field '{name}'. Valid options: {}", known.join(", ")),
            });
        }
    }
}

impl Validatable for FieldPolicyConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        check_fields::<Library>(self.library.as_deref(), &mut errors);
        check_fields::<Component>(self.component.as_deref(), &mut errors);
        check_fields::<Threat>(self.threat.as_deref(), &mut errors);
        check_fields::<SecurityRequirement>(self.security_requirement.as_deref(), &mut errors);
        check_fields::<TestCase>(self.test_case.as_deref(), &mut errors);
        check_fields::<Property>(self.property.as_deref(), &mut errors);
        errors
    }
}

impl Validatable for TreeDiffConfig {
    fn validate(&self) -> Vec<ConfigError> {
        self.ignore_names
            .iter()
            .filter(|name| name.is_empty() || name.contains('/') || name.contains('\\'))
            .map(|name| ConfigError {
                field: "tree.ignore_names".to_string(),
                message: format!("'{name}' must be a single entry name, not a path"),
            })
            .collect()
    }
}

impl Validatable for ParallelismConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if self.max_workers > MAX_WORKERS_LIMIT {
            errors.push(ConfigError {
                field: "parallelism.max_workers".to_string(),
                message: format!(
                    "max_workers must be at most {MAX_WORKERS_LIMIT}, got {}",
                    self.max_workers
                ),
            });
        }
        errors
    }
}

impl Validatable for OutputConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if let Some(parent) = self.file.as_deref().and_then(std::path::Path::parent)
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            errors.push(ConfigError {
                field: "output.file".to_string(),
                message: format!("Parent directory does not exist: {}", parent.display()),
            });
        }

        errors
    }
}

impl Validatable for DriftConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        for (label, path) in [("baseline", &self.paths.baseline), ("target", &self.paths.target)] {
            if !path.is_dir() {
                errors.push(ConfigError {
                    field: format!("paths.{label}"),
                    message: format!("Directory does not exist: {}", path.display()),
                });
            }
        }

        if !self.uncommitted {
            for (label, revision) in [
                ("baseline_revision", &self.baseline_revision),
                ("target_revision", &self.target_revision),
            ] {
                if revision.trim().is_empty() {
                    errors.push(ConfigError {
                        field: label.to_string(),
                        message: "revision must not be empty".to_string(),
                    });
                }
            }
        }

        errors.extend(self.fields.validate());
        errors.extend(self.tree.validate());
        errors.extend(self.parallelism.validate());
        errors.extend(self.output.validate());
        errors
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_field_is_reported() {
        let config = FieldPolicyConfig {
            threat: Some(vec!["name".to_string(), "severity".to_string()]),
            ..FieldPolicyConfig::default()
        };
        let errors = config.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "fields.threat");
        assert!(errors[0].message.contains("severity"));
    }

    #[test]
    fn test_empty_allow_list_is_reported() {
        let config = FieldPolicyConfig {
            property: Some(Vec::new()),
            ..FieldPolicyConfig::default()
        };
        assert!(!config.is_valid());
    }

    #[test]
    fn test_max_workers_bound() {
        assert!(ParallelismConfig { max_workers: 0 }.is_valid());
        assert!(ParallelismConfig { max_workers: 8 }.is_valid());
        assert!(!ParallelismConfig { max_workers: MAX_WORKERS_LIMIT + 1 }.is_valid());
    }

    #[test]
    fn test_ignore_names_must_be_names() {
        let config = TreeDiffConfig {
            ignore_names: vec![".git".to_string(), "a/b".to_string()],
            ..TreeDiffConfig::default()
        };
        assert_eq!(config.validate().len(), 1);
    }

    #[test]
    fn test_config_error_display() {
        let error = ConfigError {
            field: "parallelism.max_workers".to_string(),
            message: "too many".to_string(),
        };
        assert_eq!(error.to_string(), "parallelism.max_workers: too many");
    }

    #[test]
    fn test_app_config_validation() {
        assert!(AppConfig::default().is_valid());
        assert!(AppConfig::strict_preset().is_valid());
        assert!(AppConfig::ci_cd_preset().is_valid());
    }

    #[test]
    fn test_drift_config_paths() {
        let dir = tempfile::tempdir().unwrap();
        let config = DriftConfigBuilder::new()
            .baseline_path(dir.path().to_path_buf())
            .target_path(dir.path().join("missing"))
            .all_libraries(true)
            .build()
            .unwrap();
        let errors = config.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "paths.target");
    }
}
