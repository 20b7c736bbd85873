//! Drift aggregate structures.

use super::traits::{DriftEntity, MappingSet};
use crate::error::Result;
use crate::model::{
    Component, DomainEntityType, Library, Property, SecurityRequirement, TestCase, Threat,
};
use crate::paths::PathChanges;
use crate::reader::SkippedItem;
use crate::tree::KindChange;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Library bucket for owners whose library could not be resolved.
pub const UNASSIGNED_LIBRARY: Uuid = Uuid::from_u128(u128::MAX);

/// Complete result of a drift computation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[must_use]
pub struct Drift {
    /// Summary statistics
    pub summary: DriftSummary,
    /// Libraries present only in the target, with their contents
    pub added_libraries: Vec<LibraryContents>,
    /// Libraries present only in the baseline, with their contents
    pub deleted_libraries: Vec<LibraryContents>,
    /// Libraries present on both sides with changes
    pub modified_libraries: Vec<LibraryDrift>,
    /// Path-level changes of global entities
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub global: BTreeMap<DomainEntityType, PathChanges>,
    /// Entries whose type changed between blob and folder
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub kind_changes: Vec<KindChange>,
    /// Documents left out, with the logged cause
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedItem>,
}

impl Drift {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute summary statistics.
    pub fn calculate_summary(&mut self) {
        let mut summary = DriftSummary {
            libraries_added: self.added_libraries.len(),
            libraries_deleted: self.deleted_libraries.len(),
            libraries_modified: self.modified_libraries.len(),
            global_changes: self.global.values().map(PathChanges::total).sum(),
            kind_changes: self.kind_changes.len(),
            skipped: self.skipped.len(),
            ..DriftSummary::default()
        };

        for library in &self.added_libraries {
            summary.entities_added += library.entity_count();
            summary.mappings_added += library.mapping_count();
        }
        for library in &self.deleted_libraries {
            summary.entities_removed += library.entity_count();
            summary.mappings_removed += library.mapping_count();
        }
        for library in &self.modified_libraries {
            library.accumulate(&mut summary);
        }

        summary.total_changes = summary.libraries_added
            + summary.libraries_deleted
            + summary.libraries_modified
            + summary.global_changes
            + summary.kind_changes;
        self.summary = summary;
    }

    /// Whether anything drifted.
    #[must_use]
    pub fn has_drift(&self) -> bool {
        !self.added_libraries.is_empty()
            || !self.deleted_libraries.is_empty()
            || !self.modified_libraries.is_empty()
            || !self.global.is_empty()
            || !self.kind_changes.is_empty()
    }

    /// Content fingerprint of the aggregate (xxh3 over its JSON encoding).
    pub fn fingerprint(&self) -> Result<u64> {
        let bytes = serde_json::to_vec(self)?;
        Ok(crate::utils::content_hash(&bytes))
    }

    #[must_use]
    pub fn find_modified_library(&self, uuid: Uuid) -> Option<&LibraryDrift> {
        self.modified_libraries.iter().find(|l| l.uuid == uuid)
    }

    #[must_use]
    pub fn find_added_library(&self, uuid: Uuid) -> Option<&LibraryContents> {
        self.added_libraries.iter().find(|l| l.library.uuid == uuid)
    }

    #[must_use]
    pub fn find_deleted_library(&self, uuid: Uuid) -> Option<&LibraryContents> {
        self.deleted_libraries.iter().find(|l| l.library.uuid == uuid)
    }
}

/// Summary statistics for a drift run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftSummary {
    pub total_changes: usize,
    pub libraries_added: usize,
    pub libraries_deleted: usize,
    pub libraries_modified: usize,
    pub entities_added: usize,
    pub entities_removed: usize,
    pub entities_modified: usize,
    pub mappings_added: usize,
    pub mappings_removed: usize,
    pub global_changes: usize,
    pub kind_changes: usize,
    pub skipped: usize,
}

/// Individual field change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

/// An entity together with the mapping delta of its owner slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct EntityRecord<T: DriftEntity> {
    pub entity: T,
    #[serde(default, skip_serializing_if = "MappingSet::is_empty")]
    pub mappings: T::Mappings,
}

impl<T: DriftEntity> EntityRecord<T> {
    pub fn new(entity: T) -> Self {
        Self {
            entity,
            mappings: T::Mappings::default(),
        }
    }

    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.entity.uuid()
    }
}

/// A modified entity keyed by UUID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct ModifiedRecord<T: DriftEntity> {
    /// Entity UUID (never the positional integer id)
    pub key: Uuid,
    /// Target-side entity, or a stub for synthetic records
    pub entity: T,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub field_changes: Vec<FieldChange>,
    #[serde(default, skip_serializing_if = "MappingSet::is_empty")]
    pub mappings_added: T::Mappings,
    #[serde(default, skip_serializing_if = "MappingSet::is_empty")]
    pub mappings_removed: T::Mappings,
    /// Created only to carry a mapping delta
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub synthetic: bool,
}

impl<T: DriftEntity> ModifiedRecord<T> {
    pub fn new(entity: T, field_changes: Vec<FieldChange>) -> Self {
        Self {
            key: entity.uuid(),
            entity,
            field_changes,
            mappings_added: T::Mappings::default(),
            mappings_removed: T::Mappings::default(),
            synthetic: false,
        }
    }

    /// Placeholder record for an owner with no drift of its own.
    pub fn synthetic(uuid: Uuid, library: Uuid) -> Self {
        let mut record = Self::new(T::stub(uuid, library), Vec::new());
        record.synthetic = true;
        record
    }
}

/// Added, removed and modified entities of one kind inside one library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct EntityDiff<T: DriftEntity> {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub added: Vec<EntityRecord<T>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed: Vec<EntityRecord<T>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modified: Vec<ModifiedRecord<T>>,
}

impl<T: DriftEntity> Default for EntityDiff<T> {
    fn default() -> Self {
        Self {
            added: Vec::new(),
            removed: Vec::new(),
            modified: Vec::new(),
        }
    }
}

impl<T: DriftEntity> EntityDiff<T> {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.added.len() + self.removed.len() + self.modified.len()
    }

    /// Whether `uuid` already appears in any of the three lists.
    #[must_use]
    pub fn contains(&self, uuid: Uuid) -> bool {
        self.added.iter().any(|r| r.uuid() == uuid)
            || self.removed.iter().any(|r| r.uuid() == uuid)
            || self.modified.iter().any(|r| r.key == uuid)
    }

    fn mapping_counts(&self) -> (usize, usize) {
        let added = self.added.iter().map(|r| r.mappings.len()).sum::<usize>()
            + self.modified.iter().map(|r| r.mappings_added.len()).sum::<usize>();
        let removed = self.removed.iter().map(|r| r.mappings.len()).sum::<usize>()
            + self.modified.iter().map(|r| r.mappings_removed.len()).sum::<usize>();
        (added, removed)
    }

    /// Deterministic order: by UUID, mappings normalised.
    pub fn normalize(&mut self) {
        self.added.sort_by_key(EntityRecord::uuid);
        self.removed.sort_by_key(EntityRecord::uuid);
        self.modified.sort_by_key(|r| r.key);
        for record in self.added.iter_mut().chain(self.removed.iter_mut()) {
            record.mappings.normalize();
        }
        for record in &mut self.modified {
            record.mappings_added.normalize();
            record.mappings_removed.normalize();
        }
    }
}

/// A whole library that exists on one side only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryContents {
    pub library: Library,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<EntityRecord<Component>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub threats: Vec<EntityRecord<Threat>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security_requirements: Vec<EntityRecord<SecurityRequirement>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub test_cases: Vec<EntityRecord<TestCase>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<EntityRecord<Property>>,
}

impl LibraryContents {
    pub fn new(library: Library) -> Self {
        Self {
            library,
            components: Vec::new(),
            threats: Vec::new(),
            security_requirements: Vec::new(),
            test_cases: Vec::new(),
            properties: Vec::new(),
        }
    }

    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.library.uuid
    }

    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.components.len()
            + self.threats.len()
            + self.security_requirements.len()
            + self.test_cases.len()
            + self.properties.len()
    }

    #[must_use]
    pub fn mapping_count(&self) -> usize {
        self.components.iter().map(|r| r.mappings.len()).sum::<usize>()
            + self.threats.iter().map(|r| r.mappings.len()).sum::<usize>()
    }

    pub fn normalize(&mut self) {
        fn sort<T: DriftEntity>(records: &mut [EntityRecord<T>]) {
            records.sort_by_key(EntityRecord::uuid);
            for record in records.iter_mut() {
                record.mappings.normalize();
            }
        }
        sort(&mut self.components);
        sort(&mut self.threats);
        sort(&mut self.security_requirements);
        sort(&mut self.test_cases);
        sort(&mut self.properties);
    }
}

/// Drift inside a library present on both sides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryDrift {
    pub uuid: Uuid,
    #[serde(default)]
    pub name: String,
    /// Changes of the library document itself
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub field_changes: Vec<FieldChange>,
    #[serde(default, skip_serializing_if = "EntityDiff::is_empty")]
    pub components: EntityDiff<Component>,
    #[serde(default, skip_serializing_if = "EntityDiff::is_empty")]
    pub threats: EntityDiff<Threat>,
    #[serde(default, skip_serializing_if = "EntityDiff::is_empty")]
    pub security_requirements: EntityDiff<SecurityRequirement>,
    #[serde(default, skip_serializing_if = "EntityDiff::is_empty")]
    pub test_cases: EntityDiff<TestCase>,
    #[serde(default, skip_serializing_if = "EntityDiff::is_empty")]
    pub properties: EntityDiff<Property>,
}

impl LibraryDrift {
    pub fn new(uuid: Uuid, name: impl Into<String>) -> Self {
        Self {
            uuid,
            name: name.into(),
            field_changes: Vec::new(),
            components: EntityDiff::default(),
            threats: EntityDiff::default(),
            security_requirements: EntityDiff::default(),
            test_cases: EntityDiff::default(),
            properties: EntityDiff::default(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.field_changes.is_empty()
            && self.components.is_empty()
            && self.threats.is_empty()
            && self.security_requirements.is_empty()
            && self.test_cases.is_empty()
            && self.properties.is_empty()
    }

    pub fn normalize(&mut self) {
        self.components.normalize();
        self.threats.normalize();
        self.security_requirements.normalize();
        self.test_cases.normalize();
        self.properties.normalize();
    }

    fn accumulate(&self, summary: &mut DriftSummary) {
        fn add<T: DriftEntity>(diff: &EntityDiff<T>, summary: &mut DriftSummary) {
            summary.entities_added += diff.added.len();
            summary.entities_removed += diff.removed.len();
            summary.entities_modified += diff.modified.len();
            let (added, removed) = diff.mapping_counts();
            summary.mappings_added += added;
            summary.mappings_removed += removed;
        }
        add(&self.components, summary);
        add(&self.threats, summary);
        add(&self.security_requirements, summary);
        add(&self.test_cases, summary);
        add(&self.properties, summary);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_drift() {
        let mut drift = Drift::new();
        drift.calculate_summary();
        assert!(!drift.has_drift());
        assert_eq!(drift.summary.total_changes, 0);
    }

    #[test]
    fn test_summary_counts_nested_entities() {
        let lib = Uuid::from_u128(1);
        let mut modified = LibraryDrift::new(lib, "Core");
        modified
            .components
            .added
            .push(EntityRecord::new(Component::stub(Uuid::from_u128(2), Some(lib))));
        modified
            .threats
            .modified
            .push(ModifiedRecord::synthetic(Uuid::from_u128(3), lib));

        let mut deleted = LibraryContents::new(Library::stub(Uuid::from_u128(9)));
        deleted
            .components
            .push(EntityRecord::new(Component::stub(Uuid::from_u128(4), None)));

        let mut drift = Drift::new();
        drift.modified_libraries.push(modified);
        drift.deleted_libraries.push(deleted);
        drift.calculate_summary();

        assert_eq!(drift.summary.libraries_modified, 1);
        assert_eq!(drift.summary.libraries_deleted, 1);
        assert_eq!(drift.summary.entities_added, 1);
        assert_eq!(drift.summary.entities_modified, 1);
        assert_eq!(drift.summary.entities_removed, 1);
        assert!(drift.has_drift());
    }

    #[test]
    fn test_entity_diff_contains() {
        let mut diff = EntityDiff::<Threat>::default();
        diff.modified.push(ModifiedRecord::synthetic(Uuid::from_u128(3), Uuid::from_u128(1)));
        assert!(diff.contains(Uuid::from_u128(3)));
        assert!(!diff.contains(Uuid::from_u128(4)));
    }

    #[test]
    fn test_synthetic_record_serializes_flag() {
        let record = ModifiedRecord::<Component>::synthetic(Uuid::from_u128(3), Uuid::from_u128(1));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["synthetic"], serde_json::Value::Bool(true));
        assert!(json.get("field_changes").is_none());

        let plain = ModifiedRecord::new(Component::stub(Uuid::from_u128(3), None), Vec::new());
        let json = serde_json::to_value(&plain).unwrap();
        assert!(json.get("synthetic").is_none());
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let drift = Drift::new();
        assert_eq!(drift.fingerprint().unwrap(), drift.clone().fingerprint().unwrap());
    }
}
