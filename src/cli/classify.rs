//! Classify command handler.
//!
//! Prints how repository-relative paths are classified, which is handy when
//! a document unexpectedly shows up as unknown or under the wrong library.

use crate::diff::mappings::{MappingKey, parse_mapping_filename};
use crate::model::RepositoryPathInfo;
use crate::paths::classify_path;
use crate::pipeline::exit_codes;
use anyhow::Result;
use serde::Serialize;
use std::fmt::Write as _;

/// Classification of one input path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedPath {
    pub path: String,
    #[serde(flatten)]
    pub info: RepositoryPathInfo,
    /// Parsed ids for mapping files
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapping: Option<MappingKey>,
    /// Why the mapping filename was rejected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Classify each path. Empty inputs are reported as errors, not skipped.
#[must_use]
pub fn classify_paths(paths: &[String]) -> Vec<ClassifiedPath> {
    paths
        .iter()
        .map(|path| match classify_path(path) {
            Ok(info) => {
                let (mapping, error) = match info.entity_type.mapping_family() {
                    Some(family) => match parse_mapping_filename(family, path) {
                        Ok(key) => (Some(key), None),
                        Err(e) => (None, Some(e.to_string())),
                    },
                    None => (None, None),
                };
                ClassifiedPath {
                    path: path.clone(),
                    info,
                    mapping,
                    error,
                }
            }
            Err(e) => ClassifiedPath {
                path: path.clone(),
                info: RepositoryPathInfo::unknown(),
                mapping: None,
                error: Some(e.to_string()),
            },
        })
        .collect()
}

/// Run the classify command, returning the desired exit code.
///
/// The exit code is non-zero when any path failed to classify.
pub fn run_classify(paths: &[String], json: bool) -> Result<i32> {
    let classified = classify_paths(paths);

    let output = if json {
        serde_json::to_string_pretty(&classified)?
    } else {
        let mut out = String::new();
        for item in &classified {
            write!(out, "{}\t{}", item.path, item.info)?;
            if let Some(key) = &item.mapping {
                write!(out, "\towner={} refs={:?}", key.owner_id(), key.referenced_ids())?;
            }
            if let Some(error) = &item.error {
                write!(out, "\terror: {error}")?;
            }
            out.push('\n');
        }
        out.trim_end().to_string()
    };
    println!("{output}");

    let failed = classified.iter().any(|c| c.error.is_some());
    Ok(if failed { exit_codes::ERROR } else { exit_codes::SUCCESS })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DomainEntityType;

    #[test]
    fn test_classify_paths() {
        let classified = classify_paths(&[
            "7/components/12.yaml".to_string(),
            String::new(),
        ]);
        assert_eq!(classified[0].info.entity_type, DomainEntityType::Components);
        assert_eq!(classified[0].info.library_key.as_deref(), Some("7"));
        assert!(classified[0].error.is_none());
        assert!(classified[1].error.is_some());
    }

    #[test]
    fn test_json_shape() {
        let classified = classify_paths(&["7/threats/3.yaml".to_string()]);
        let value = serde_json::to_value(&classified).unwrap();
        assert_eq!(value[0]["path"], "7/threats/3.yaml");
        assert_eq!(value[0]["library_key"], "7");
    }
}
