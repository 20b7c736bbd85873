//! Generic drift processor for library-owned entity kinds.

use super::{PairRead, owning_library, read_pairs};
use crate::diff::builder::DriftBuilder;
use crate::diff::fields::FieldComparator;
use crate::diff::result::{EntityRecord, ModifiedRecord};
use crate::diff::traits::{DriftEntity, DriftProcessor};
use crate::error::Result;
use crate::index::LibraryMetadataSource;
use crate::paths::EntityPathContext;
use crate::reader::{EntityReader, SkippedItem};
use crate::utils::CancellationToken;
use indexmap::IndexMap;
use uuid::Uuid;

/// An entity together with the library it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct Located<T> {
    pub library: Uuid,
    pub entity: T,
}

/// Collected changes of one kind, ready to be attached.
#[derive(Debug, Clone)]
pub struct EntityChanges<T: DriftEntity> {
    pub added: Vec<Located<T>>,
    pub removed: Vec<Located<T>>,
    pub modified: Vec<Located<ModifiedRecord<T>>>,
    pub skipped: Vec<SkippedItem>,
}

impl<T: DriftEntity> Default for EntityChanges<T> {
    fn default() -> Self {
        Self {
            added: Vec::new(),
            removed: Vec::new(),
            modified: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

impl<T: DriftEntity> EntityChanges<T> {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }
}

/// Computes drift for one entity kind.
pub struct EntityDriftProcessor<'a, T: DriftEntity> {
    reader: &'a dyn EntityReader<T>,
    comparator: &'a FieldComparator<T>,
    metadata: &'a dyn LibraryMetadataSource,
}

impl<'a, T: DriftEntity> EntityDriftProcessor<'a, T> {
    pub fn new(
        reader: &'a dyn EntityReader<T>,
        comparator: &'a FieldComparator<T>,
        metadata: &'a dyn LibraryMetadataSource,
    ) -> Self {
        Self {
            reader,
            comparator,
            metadata,
        }
    }

    fn locate(&self, entity: T, relative: &str) -> Located<T> {
        let library = owning_library(entity.library_uuid(), relative, self.metadata);
        Located { library, entity }
    }

    /// Compare two versions of one entity; `None` when nothing allow-listed changed.
    fn compare(&self, baseline: &T, target: T, library: Uuid) -> Option<Located<ModifiedRecord<T>>> {
        let changes = self.comparator.compare(baseline, &target);
        if changes.is_empty() {
            tracing::debug!(uuid = %target.uuid(), kind = T::KIND, "no allow-listed field changed");
            return None;
        }
        Some(Located {
            library,
            entity: ModifiedRecord::new(target, changes),
        })
    }

    /// Turn same-UUID delete/add pairs inside one library into modifications.
    ///
    /// This happens when a document moves (its integer id was reassigned).
    fn pair_moves(&self, changes: &mut EntityChanges<T>) {
        let mut removed: IndexMap<(Uuid, Uuid), Located<T>> = changes
            .removed
            .drain(..)
            .map(|located| ((located.entity.uuid(), located.library), located))
            .collect();

        let mut added = Vec::with_capacity(changes.added.len());
        for located in changes.added.drain(..) {
            let key = (located.entity.uuid(), located.library);
            match removed.shift_remove(&key) {
                Some(previous) => {
                    tracing::debug!(uuid = %key.0, kind = T::KIND, "document moved, comparing as a modification");
                    if let Some(modified) = self.compare(&previous.entity, located.entity, located.library) {
                        changes.modified.push(modified);
                    }
                }
                None => added.push(located),
            }
        }

        changes.added = added;
        changes.removed = removed.into_values().collect();
    }
}

impl<T: DriftEntity> DriftProcessor for EntityDriftProcessor<'_, T> {
    type Collected = EntityChanges<T>;

    fn collect(&self, ctx: &EntityPathContext, cancel: &CancellationToken) -> Result<EntityChanges<T>> {
        let set = ctx.change_set(T::ENTITY_TYPE);
        let mut changes = EntityChanges::default();
        if set.is_empty() {
            return Ok(changes);
        }

        let added = self.reader.read_many(ctx.target(), &set.added, cancel)?;
        let deleted = self.reader.read_many(ctx.baseline(), &set.deleted, cancel)?;
        changes.skipped.extend(added.skipped);
        changes.skipped.extend(deleted.skipped);
        changes.added = added
            .entities
            .into_iter()
            .map(|(path, entity)| self.locate(entity, &path))
            .collect();
        changes.removed = deleted
            .entities
            .into_iter()
            .map(|(path, entity)| self.locate(entity, &path))
            .collect();

        let pairs = read_pairs(self.reader, ctx, &set.modified, cancel)?;
        for (relative, read) in set.modified.iter().zip(pairs) {
            match read {
                PairRead::Both { baseline, target } if baseline.uuid() != target.uuid() => {
                    tracing::debug!(path = %relative, kind = T::KIND, "identity changed in place");
                    changes.removed.push(self.locate(baseline, relative));
                    changes.added.push(self.locate(target, relative));
                }
                PairRead::Both { baseline, target } => {
                    let library = owning_library(target.library_uuid(), relative, self.metadata);
                    if let Some(modified) = self.compare(&baseline, target, library) {
                        changes.modified.push(modified);
                    }
                }
                PairRead::Missing => {}
                PairRead::Unreadable(skipped) => changes.skipped.push(skipped),
            }
        }

        self.pair_moves(&mut changes);
        cancel.check()?;

        tracing::debug!(
            kind = T::KIND,
            added = changes.added.len(),
            removed = changes.removed.len(),
            modified = changes.modified.len(),
            skipped = changes.skipped.len(),
            "entity drift collected"
        );
        Ok(changes)
    }

    fn apply(&self, collected: EntityChanges<T>, builder: &mut DriftBuilder) {
        builder.extend_skipped(collected.skipped);

        for Located { library, entity } in collected.added {
            if let Some(contents) = builder.added_library_mut(library) {
                push_unique(T::contents_mut(contents), EntityRecord::new(entity));
                continue;
            }
            let diff = T::diff_mut(builder.modified_library(library));
            if diff.contains(entity.uuid()) {
                tracing::warn!(uuid = %entity.uuid(), kind = T::KIND, "duplicate drift key, added entity ignored");
            } else {
                diff.added.push(EntityRecord::new(entity));
            }
        }

        for Located { library, entity } in collected.removed {
            if let Some(contents) = builder.deleted_library_mut(library) {
                push_unique(T::contents_mut(contents), EntityRecord::new(entity));
                continue;
            }
            let diff = T::diff_mut(builder.modified_library(library));
            if diff.contains(entity.uuid()) {
                tracing::warn!(uuid = %entity.uuid(), kind = T::KIND, "duplicate drift key, removed entity ignored");
            } else {
                diff.removed.push(EntityRecord::new(entity));
            }
        }

        for Located { library, entity } in collected.modified {
            let diff = T::diff_mut(builder.modified_library(library));
            if diff.contains(entity.key) {
                tracing::warn!(uuid = %entity.key, kind = T::KIND, "duplicate drift key, modification ignored");
            } else {
                diff.modified.push(entity);
            }
        }
    }

    fn name(&self) -> &str {
        T::KIND
    }
}

fn push_unique<T: DriftEntity>(records: &mut Vec<EntityRecord<T>>, record: EntityRecord<T>) {
    if records.iter().any(|r| r.uuid() == record.uuid()) {
        tracing::warn!(uuid = %record.uuid(), kind = T::KIND, "entity already recorded in library");
    } else {
        records.push(record);
    }
}
