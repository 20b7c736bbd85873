//! Path classification.
//!
//! Maps a repository-relative path to the entity type it stores and the
//! library folder that owns it. Unrecognised structure is not an error; it
//! classifies as [`DomainEntityType::Unknown`].

use crate::error::{DriftError, Result};
use crate::model::{DomainEntityType, GLOBAL_FOLDER, MAPPINGS_FOLDER, RepositoryPathInfo};
use crate::utils::split_segments;

/// Classify a repository-relative path (either separator).
///
/// Fails only on empty input.
pub fn classify_path(path: &str) -> Result<RepositoryPathInfo> {
    let segments = split_segments(path);
    if segments.is_empty() {
        return Err(DriftError::validation(format!(
            "cannot classify an empty path ('{path}')"
        )));
    }
    Ok(classify_segments(&segments))
}

fn classify_segments(segments: &[&str]) -> RepositoryPathInfo {
    match segments {
        [MAPPINGS_FOLDER, family, ..] => {
            RepositoryPathInfo::new(DomainEntityType::from_mapping_folder(family), None)
        }
        [GLOBAL_FOLDER, folder, ..] => {
            RepositoryPathInfo::new(DomainEntityType::from_global_folder(folder), None)
        }
        [library, file] if is_library_document(library, file) => {
            RepositoryPathInfo::new(DomainEntityType::Library, Some((*library).to_string()))
        }
        [library, folder, ..] => {
            let entity_type = DomainEntityType::from_library_folder(folder);
            if entity_type == DomainEntityType::Unknown {
                RepositoryPathInfo::unknown()
            } else {
                RepositoryPathInfo::new(entity_type, Some((*library).to_string()))
            }
        }
        _ => RepositoryPathInfo::unknown(),
    }
}

fn is_library_document(library: &str, file: &str) -> bool {
    file.strip_suffix(".yaml")
        .or_else(|| file.strip_suffix(".yml"))
        .is_some_and(|stem| stem == library)
}
