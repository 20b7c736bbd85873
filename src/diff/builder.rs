//! Exclusive builder for the drift aggregate.
//!
//! The engine owns one builder per run and hands it by `&mut` to each
//! processor in turn. Library buckets are created lazily and at most once.

use super::result::{Drift, LibraryContents, LibraryDrift, UNASSIGNED_LIBRARY};
use super::traits::DriftEntity;
use crate::index::LibraryMetadataSource;
use crate::model::DomainEntityType;
use crate::paths::PathChanges;
use crate::reader::SkippedItem;
use crate::tree::KindChange;
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

/// Builds a [`Drift`] aggregate.
pub struct DriftBuilder {
    metadata: Arc<dyn LibraryMetadataSource>,
    added: IndexMap<Uuid, LibraryContents>,
    deleted: IndexMap<Uuid, LibraryContents>,
    modified: IndexMap<Uuid, LibraryDrift>,
    global: BTreeMap<DomainEntityType, PathChanges>,
    kind_changes: Vec<KindChange>,
    skipped: Vec<SkippedItem>,
}

impl DriftBuilder {
    pub fn new(metadata: Arc<dyn LibraryMetadataSource>) -> Self {
        Self {
            metadata,
            added: IndexMap::new(),
            deleted: IndexMap::new(),
            modified: IndexMap::new(),
            global: BTreeMap::new(),
            kind_changes: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Record a library present only in the target. A second insert for the
    /// same UUID is ignored.
    pub fn add_library(&mut self, contents: LibraryContents) {
        let uuid = contents.uuid();
        if self.added.contains_key(&uuid) {
            tracing::warn!(library = %uuid, "library already recorded as added");
            return;
        }
        self.added.insert(uuid, contents);
    }

    /// Record a library present only in the baseline.
    pub fn delete_library(&mut self, contents: LibraryContents) {
        let uuid = contents.uuid();
        if self.deleted.contains_key(&uuid) {
            tracing::warn!(library = %uuid, "library already recorded as deleted");
            return;
        }
        self.deleted.insert(uuid, contents);
    }

    pub fn added_library_mut(&mut self, uuid: Uuid) -> Option<&mut LibraryContents> {
        self.added.get_mut(&uuid)
    }

    pub fn deleted_library_mut(&mut self, uuid: Uuid) -> Option<&mut LibraryContents> {
        self.deleted.get_mut(&uuid)
    }

    pub fn find_modified_library_mut(&mut self, uuid: Uuid) -> Option<&mut LibraryDrift> {
        self.modified.get_mut(&uuid)
    }

    /// Get or create the modified-library bucket for `uuid`.
    pub fn modified_library(&mut self, uuid: Uuid) -> &mut LibraryDrift {
        let metadata = &self.metadata;
        self.modified.entry(uuid).or_insert_with(|| {
            let name = if uuid == UNASSIGNED_LIBRARY {
                "unassigned".to_string()
            } else {
                metadata.library_name(uuid).unwrap_or_default()
            };
            tracing::trace!(library = %uuid, %name, "modified library bucket created");
            LibraryDrift::new(uuid, name)
        })
    }

    pub fn added_libraries_mut(&mut self) -> impl Iterator<Item = &mut LibraryContents> {
        self.added.values_mut()
    }

    pub fn deleted_libraries_mut(&mut self) -> impl Iterator<Item = &mut LibraryContents> {
        self.deleted.values_mut()
    }

    pub fn modified_libraries_mut(&mut self) -> impl Iterator<Item = &mut LibraryDrift> {
        self.modified.values_mut()
    }

    #[must_use]
    pub fn metadata(&self) -> &dyn LibraryMetadataSource {
        self.metadata.as_ref()
    }

    pub fn set_global(&mut self, entity_type: DomainEntityType, changes: PathChanges) {
        if !changes.is_empty() {
            self.global.insert(entity_type, changes);
        }
    }

    pub fn record_kind_changes(&mut self, changes: impl IntoIterator<Item = KindChange>) {
        self.kind_changes.extend(changes);
    }

    pub fn extend_skipped(&mut self, items: impl IntoIterator<Item = SkippedItem>) {
        self.skipped.extend(items);
    }

    /// Finish the aggregate.
    ///
    /// Modified buckets whose library is also recorded as added or deleted are
    /// folded into that whole-library entry, empty buckets are dropped, and
    /// everything is sorted by UUID so equal inputs give equal output.
    pub fn finish(mut self) -> Drift {
        let modified = std::mem::take(&mut self.modified);
        let mut kept = Vec::with_capacity(modified.len());

        for (uuid, library) in modified {
            if let Some(contents) = self.added.get_mut(&uuid) {
                tracing::debug!(library = %uuid, "folding modified bucket into added library");
                fold_into(contents, library, Side::Added);
            } else if let Some(contents) = self.deleted.get_mut(&uuid) {
                tracing::debug!(library = %uuid, "folding modified bucket into deleted library");
                fold_into(contents, library, Side::Deleted);
            } else if !library.is_empty() {
                kept.push(library);
            }
        }

        let mut added: Vec<LibraryContents> = self.added.into_values().collect();
        let mut deleted: Vec<LibraryContents> = self.deleted.into_values().collect();
        added.sort_by_key(LibraryContents::uuid);
        deleted.sort_by_key(LibraryContents::uuid);
        kept.sort_by_key(|l| l.uuid);
        added.iter_mut().for_each(LibraryContents::normalize);
        deleted.iter_mut().for_each(LibraryContents::normalize);
        kept.iter_mut().for_each(LibraryDrift::normalize);

        self.kind_changes.sort_by(|a, b| a.path.cmp(&b.path));
        self.kind_changes.dedup();
        self.skipped.sort_by(|a, b| a.path.cmp(&b.path).then_with(|| a.reason.cmp(&b.reason)));
        self.skipped.dedup();

        let mut drift = Drift {
            added_libraries: added,
            deleted_libraries: deleted,
            modified_libraries: kept,
            global: self.global,
            kind_changes: self.kind_changes,
            skipped: self.skipped,
            ..Drift::default()
        };
        drift.calculate_summary();
        drift
    }
}

#[derive(Clone, Copy)]
enum Side {
    Added,
    Deleted,
}

fn fold_into(contents: &mut LibraryContents, library: LibraryDrift, side: Side) {
    let LibraryDrift {
        components,
        threats,
        security_requirements,
        test_cases,
        properties,
        ..
    } = library;
    fold_kind(contents, components, side);
    fold_kind(contents, threats, side);
    fold_kind(contents, security_requirements, side);
    fold_kind(contents, test_cases, side);
    fold_kind(contents, properties, side);
}

fn fold_kind<T: DriftEntity>(
    contents: &mut LibraryContents,
    diff: super::result::EntityDiff<T>,
    side: Side,
) {
    use super::result::EntityRecord;
    use super::traits::MappingSet;

    let (matching, opposite) = match side {
        Side::Added => (diff.added, diff.removed),
        Side::Deleted => (diff.removed, diff.added),
    };
    if !opposite.is_empty() {
        tracing::warn!(
            count = opposite.len(),
            "dropping entries that contradict a whole-library change"
        );
    }

    let records = T::contents_mut(contents);
    for record in matching {
        merge_record(records, record);
    }
    for modified in diff.modified {
        let mappings = match side {
            Side::Added => modified.mappings_added,
            Side::Deleted => modified.mappings_removed,
        };
        if let Some(existing) = records.iter_mut().find(|r| r.uuid() == modified.key) {
            existing.mappings.merge(mappings);
        } else if !modified.synthetic || !mappings.is_empty() {
            merge_record(
                records,
                EntityRecord {
                    entity: modified.entity,
                    mappings,
                },
            );
        }
    }
}

fn merge_record<T: DriftEntity>(
    records: &mut Vec<super::result::EntityRecord<T>>,
    record: super::result::EntityRecord<T>,
) {
    use super::traits::MappingSet;

    match records.iter_mut().find(|r| r.uuid() == record.uuid()) {
        Some(existing) => existing.mappings.merge(record.mappings),
        None => records.push(record),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::result::{EntityRecord, ModifiedRecord};
    use crate::index::ContentIndex;
    use crate::model::{Component, Library};

    fn builder() -> DriftBuilder {
        let lib = Uuid::from_u128(1);
        let index = ContentIndex::builder().library(lib, 7, "Core").build();
        DriftBuilder::new(Arc::new(index))
    }

    #[test]
    fn test_modified_library_is_get_or_create() {
        let mut builder = builder();
        let lib = Uuid::from_u128(1);
        builder.modified_library(lib).field_changes.push(crate::diff::result::FieldChange {
            field: "name".into(),
            old_value: None,
            new_value: Some("x".into()),
        });
        assert_eq!(builder.modified_library(lib).name, "Core");
        assert_eq!(builder.modified_library(lib).field_changes.len(), 1);

        let drift = builder.finish();
        assert_eq!(drift.modified_libraries.len(), 1);
    }

    #[test]
    fn test_empty_buckets_are_dropped() {
        let mut builder = builder();
        builder.modified_library(Uuid::from_u128(1));
        let drift = builder.finish();
        assert!(drift.modified_libraries.is_empty());
        assert!(!drift.has_drift());
    }

    #[test]
    fn test_partition_repair_folds_into_added_library() {
        let mut builder = builder();
        let lib = Uuid::from_u128(5);
        builder.add_library(LibraryContents::new(Library::stub(lib)));
        builder
            .modified_library(lib)
            .components
            .added
            .push(EntityRecord::new(Component::stub(Uuid::from_u128(6), Some(lib))));
        builder
            .modified_library(lib)
            .components
            .modified
            .push(ModifiedRecord::synthetic(Uuid::from_u128(7), lib));

        let drift = builder.finish();
        assert!(drift.modified_libraries.is_empty());
        assert_eq!(drift.added_libraries.len(), 1);
        // the synthetic record carried no mappings, so only the real entity lands
        assert_eq!(drift.added_libraries[0].components.len(), 1);
    }

    #[test]
    fn test_output_is_sorted() {
        let mut builder = builder();
        for n in [9u128, 3, 5] {
            builder.delete_library(LibraryContents::new(Library::stub(Uuid::from_u128(n))));
        }
        let drift = builder.finish();
        let order: Vec<Uuid> = drift.deleted_libraries.iter().map(LibraryContents::uuid).collect();
        assert_eq!(order, vec![Uuid::from_u128(3), Uuid::from_u128(5), Uuid::from_u128(9)]);
        assert_eq!(drift.summary.libraries_deleted, 3);
    }
}
