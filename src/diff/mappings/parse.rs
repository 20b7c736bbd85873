//! Mapping filename parsing.
//!
//! `mappings/{family}/{id}_{id}[_...].yaml`: ids are positional and the first
//! one is always the owning entity. Each family has an exact arity.

use crate::error::{DriftError, Result};
use crate::model::MappingFamily;
use crate::utils::file_stem;
use serde::{Deserialize, Serialize};

/// Parsed mapping filename.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MappingKey {
    pub family: MappingFamily,
    pub ids: Vec<i64>,
}

impl MappingKey {
    /// Integer id of the owning component or threat.
    #[must_use]
    pub fn owner_id(&self) -> i64 {
        self.ids[0]
    }

    /// Referenced ids after the owner.
    #[must_use]
    pub fn referenced_ids(&self) -> &[i64] {
        &self.ids[1..]
    }
}

/// Parse a mapping filename (a bare name or a path) for `family`.
pub fn parse_mapping_filename(family: MappingFamily, name: &str) -> Result<MappingKey> {
    let stem = file_stem(name);
    if stem.is_empty() {
        return Err(DriftError::malformed_mapping(name, "empty filename"));
    }

    let ids = stem
        .split('_')
        .map(|part| {
            let not_an_id =
                || DriftError::malformed_mapping(name, format!("segment '{part}' is not an integer id"));
            // `str::parse` accepts a leading sign; ids are bare digits
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(not_an_id());
            }
            part.parse::<i64>().map_err(|_| not_an_id())
        })
        .collect::<Result<Vec<_>>>()?;

    if ids.len() != family.arity() {
        return Err(DriftError::malformed_mapping(
            name,
            format!(
                "{} expects {} ids, found {}",
                family,
                family.arity(),
                ids.len()
            ),
        ));
    }

    Ok(MappingKey { family, ids })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReadErrorKind;

    #[test]
    fn test_parse_component_threat() {
        let key = parse_mapping_filename(MappingFamily::ComponentThreat, "12_40.yaml").unwrap();
        assert_eq!(key.owner_id(), 12);
        assert_eq!(key.referenced_ids(), &[40]);
    }

    #[test]
    fn test_parse_full_path_five_ids() {
        let key = parse_mapping_filename(
            MappingFamily::ComponentPropertyOptionThreatSecurityRequirement,
            "mappings/component-property-option-threat-security-requirements/1_2_3_4_5.yaml",
        )
        .unwrap();
        assert_eq!(key.ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_arity_is_strict() {
        assert!(parse_mapping_filename(MappingFamily::ComponentThreat, "12_40_7.yaml").is_err());
        assert!(parse_mapping_filename(MappingFamily::ComponentThreat, "12.yaml").is_err());
    }

    #[test]
    fn test_non_numeric_segment() {
        let err = parse_mapping_filename(MappingFamily::ComponentThreat, "12_x.yaml").unwrap_err();
        assert!(err.to_string().contains("read entity"));
        assert!(parse_mapping_filename(MappingFamily::ComponentThreat, "12__40.yaml").is_err());
    }

    #[test]
    fn test_signed_segments_are_rejected() {
        for name in ["+12_40.yaml", "-5_3.yaml", "12_+40.yaml", "12_-40.yaml"] {
            let err = parse_mapping_filename(MappingFamily::ComponentThreat, name).unwrap_err();
            let DriftError::Read {
                source: ReadErrorKind::MalformedMappingName { reason, .. },
                ..
            } = err
            else {
                panic!("{name}: unexpected error {err:?}");
            };
            assert!(reason.contains("is not an integer id"), "{name}: {reason}");
        }
    }

    #[test]
    fn test_overflowing_segment_is_rejected() {
        assert!(parse_mapping_filename(MappingFamily::ComponentThreat, "99999999999999999999_40.yaml").is_err());
    }
}
