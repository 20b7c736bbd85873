//! Where a mapping delta lands in the aggregate.
//!
//! Attachment is data: an ordered list of strategies tried until one finds a
//! slot, then a terminal fallback that creates a synthetic modified record.

use crate::diff::builder::DriftBuilder;
use crate::diff::result::{ModifiedRecord, UNASSIGNED_LIBRARY};
use crate::diff::traits::DriftEntity;
use crate::index::IndexService;
use serde::Serialize;
use uuid::Uuid;

/// Which side of a mapping delta is being attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Added,
    Removed,
}

/// Finds an existing mapping slot for an owner, if there is one.
pub struct AttachStrategy<T: DriftEntity> {
    pub name: &'static str,
    pub locate: fn(&mut DriftBuilder, Uuid) -> Option<&mut T::Mappings>,
}

impl<T: DriftEntity> Clone for AttachStrategy<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: DriftEntity> Copy for AttachStrategy<T> {}

impl<T: DriftEntity> std::fmt::Debug for AttachStrategy<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

/// Strategies for one direction, in priority order.
#[must_use]
pub fn strategies<T: DriftEntity>(direction: Direction) -> [AttachStrategy<T>; 3] {
    match direction {
        Direction::Added => [
            AttachStrategy {
                name: "added-library",
                locate: in_added_library::<T>,
            },
            AttachStrategy {
                name: "modified-library-added",
                locate: in_modified_added::<T>,
            },
            AttachStrategy {
                name: "modified-library-modified",
                locate: in_modified_record_added::<T>,
            },
        ],
        Direction::Removed => [
            AttachStrategy {
                name: "deleted-library",
                locate: in_deleted_library::<T>,
            },
            AttachStrategy {
                name: "modified-library-removed",
                locate: in_modified_removed::<T>,
            },
            AttachStrategy {
                name: "modified-library-modified",
                locate: in_modified_record_removed::<T>,
            },
        ],
    }
}

/// Name reported when the terminal fallback created the slot.
pub const SYNTHETIC: &str = "synthetic";

/// Name reported when the delta contradicts an existing record and was dropped.
pub const CONFLICT: &str = "conflict";

/// Outcome of attaching one owner's delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attached {
    pub strategy: &'static str,
    pub library: Option<Uuid>,
}

/// Attach `delta` for `owner`, trying each strategy then the fallback.
///
/// `owner_id` is the integer id from the filename; it is used to find the
/// owning library among `batch_libraries` when no strategy matched.
pub fn attach<T: DriftEntity>(
    builder: &mut DriftBuilder,
    index: &dyn IndexService,
    batch_libraries: &[Uuid],
    owner: Uuid,
    owner_id: i64,
    direction: Direction,
    delta: T::Mappings,
) -> Attached {
    use crate::diff::traits::MappingSet;

    for strategy in strategies::<T>(direction) {
        if let Some(slot) = (strategy.locate)(builder, owner) {
            slot.merge(delta);
            return Attached {
                strategy: strategy.name,
                library: None,
            };
        }
    }

    let library = owning_library::<T>(index, batch_libraries, owner_id).unwrap_or_else(|| {
        tracing::error!(
            owner = %owner,
            owner_id,
            kind = T::ENTITY_TYPE.name(),
            "mapping owner is not owned by any library in this batch"
        );
        UNASSIGNED_LIBRARY
    });

    let diff = T::diff_mut(builder.modified_library(library));
    if diff.added.iter().chain(&diff.removed).any(|r| r.uuid() == owner) {
        // keys stay unique within one EntityDiff
        tracing::warn!(
            owner = %owner,
            library = %library,
            ?direction,
            "owner already added or removed in this library, mapping delta dropped"
        );
        return Attached {
            strategy: CONFLICT,
            library: Some(library),
        };
    }

    let mut record = ModifiedRecord::<T>::synthetic(owner, library);
    match direction {
        Direction::Added => record.mappings_added = delta,
        Direction::Removed => record.mappings_removed = delta,
    }
    tracing::debug!(owner = %owner, library = %library, ?direction, "synthetic record created for mapping delta");
    diff.modified.push(record);
    Attached {
        strategy: SYNTHETIC,
        library: Some(library),
    }
}

/// Library in the batch that owns integer id `owner_id` of kind `T`.
fn owning_library<T: DriftEntity>(
    index: &dyn IndexService,
    batch_libraries: &[Uuid],
    owner_id: i64,
) -> Option<Uuid> {
    batch_libraries
        .iter()
        .copied()
        .find(|library| T::owned_ids(index, *library).contains(&owner_id))
}

fn in_added_library<T: DriftEntity>(
    builder: &mut DriftBuilder,
    owner: Uuid,
) -> Option<&mut T::Mappings> {
    builder
        .added_libraries_mut()
        .flat_map(|library| T::contents_mut(library).iter_mut())
        .find(|record| record.uuid() == owner)
        .map(|record| &mut record.mappings)
}

fn in_deleted_library<T: DriftEntity>(
    builder: &mut DriftBuilder,
    owner: Uuid,
) -> Option<&mut T::Mappings> {
    builder
        .deleted_libraries_mut()
        .flat_map(|library| T::contents_mut(library).iter_mut())
        .find(|record| record.uuid() == owner)
        .map(|record| &mut record.mappings)
}

fn in_modified_added<T: DriftEntity>(
    builder: &mut DriftBuilder,
    owner: Uuid,
) -> Option<&mut T::Mappings> {
    builder
        .modified_libraries_mut()
        .flat_map(|library| T::diff_mut(library).added.iter_mut())
        .find(|record| record.uuid() == owner)
        .map(|record| &mut record.mappings)
}

fn in_modified_removed<T: DriftEntity>(
    builder: &mut DriftBuilder,
    owner: Uuid,
) -> Option<&mut T::Mappings> {
    builder
        .modified_libraries_mut()
        .flat_map(|library| T::diff_mut(library).removed.iter_mut())
        .find(|record| record.uuid() == owner)
        .map(|record| &mut record.mappings)
}

fn in_modified_record_added<T: DriftEntity>(
    builder: &mut DriftBuilder,
    owner: Uuid,
) -> Option<&mut T::Mappings> {
    builder
        .modified_libraries_mut()
        .flat_map(|library| T::diff_mut(library).modified.iter_mut())
        .find(|record| record.key == owner)
        .map(|record| &mut record.mappings_added)
}

fn in_modified_record_removed<T: DriftEntity>(
    builder: &mut DriftBuilder,
    owner: Uuid,
) -> Option<&mut T::Mappings> {
    builder
        .modified_libraries_mut()
        .flat_map(|library| T::diff_mut(library).modified.iter_mut())
        .find(|record| record.key == owner)
        .map(|record| &mut record.mappings_removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::mappings::{ComponentMappingCollection, MappingEntry};
    use crate::diff::result::{EntityRecord, LibraryContents};
    use crate::diff::traits::MappingSet;
    use crate::index::ContentIndex;
    use crate::model::{Component, Library, MappingFamily};
    use std::sync::Arc;

    const LIB: Uuid = Uuid::from_u128(1);
    const OWNER: Uuid = Uuid::from_u128(12);

    fn index() -> ContentIndex {
        ContentIndex::builder()
            .library(LIB, 7, "Core")
            .component(LIB, 12, OWNER)
            .build()
    }

    fn delta() -> ComponentMappingCollection {
        let mut delta = ComponentMappingCollection::default();
        delta.insert(
            MappingFamily::ComponentThreat,
            MappingEntry {
                threat: Some(Uuid::from_u128(40)),
                ..MappingEntry::default()
            },
        );
        delta
    }

    #[test]
    fn test_strategy_order_is_fixed() {
        let added: Vec<&str> = strategies::<Component>(Direction::Added).iter().map(|s| s.name).collect();
        assert_eq!(added, ["added-library", "modified-library-added", "modified-library-modified"]);
        let removed: Vec<&str> =
            strategies::<Component>(Direction::Removed).iter().map(|s| s.name).collect();
        assert_eq!(removed, ["deleted-library", "modified-library-removed", "modified-library-modified"]);
    }

    #[test]
    fn test_added_library_wins_over_modified() {
        let index = index();
        let mut builder = DriftBuilder::new(Arc::new(index.clone()));
        let mut contents = LibraryContents::new(Library::stub(LIB));
        contents.components.push(EntityRecord::new(Component::stub(OWNER, Some(LIB))));
        builder.add_library(contents);
        builder
            .modified_library(LIB)
            .components
            .modified
            .push(ModifiedRecord::new(Component::stub(OWNER, Some(LIB)), Vec::new()));

        let attached = attach::<Component>(&mut builder, &index, &[LIB], OWNER, 12, Direction::Added, delta());
        assert_eq!(attached.strategy, "added-library");

        let drift = builder.finish();
        assert_eq!(drift.added_libraries[0].components[0].mappings.threats.len(), 1);
    }

    #[test]
    fn test_fallback_creates_synthetic_record() {
        let index = index();
        let mut builder = DriftBuilder::new(Arc::new(index.clone()));
        let attached =
            attach::<Component>(&mut builder, &index, &[LIB], OWNER, 12, Direction::Removed, delta());
        assert_eq!(attached.strategy, SYNTHETIC);
        assert_eq!(attached.library, Some(LIB));

        let drift = builder.finish();
        let record = &drift.modified_libraries[0].components.modified[0];
        assert!(record.synthetic);
        assert_eq!(record.key, OWNER);
        assert_eq!(record.entity.library_uuid, Some(LIB));
        assert!(record.field_changes.is_empty());
        assert_eq!(record.mappings_removed.len(), 1);
        assert!(record.mappings_added.is_empty());
    }

    #[test]
    fn test_unowned_owner_goes_to_unassigned() {
        let index = index();
        let mut builder = DriftBuilder::new(Arc::new(index.clone()));
        let stranger = Uuid::from_u128(99);
        let attached =
            attach::<Component>(&mut builder, &index, &[LIB], stranger, 99, Direction::Added, delta());
        assert_eq!(attached.library, Some(UNASSIGNED_LIBRARY));
    }

    #[test]
    fn test_second_delta_reuses_synthetic_record() {
        let index = index();
        let mut builder = DriftBuilder::new(Arc::new(index.clone()));
        attach::<Component>(&mut builder, &index, &[LIB], OWNER, 12, Direction::Added, delta());
        let attached =
            attach::<Component>(&mut builder, &index, &[LIB], OWNER, 12, Direction::Removed, delta());
        assert_eq!(attached.strategy, "modified-library-modified");

        let drift = builder.finish();
        let components = &drift.modified_libraries[0].components;
        assert_eq!(components.modified.len(), 1);
        assert_eq!(components.modified[0].mappings_added.len(), 1);
        assert_eq!(components.modified[0].mappings_removed.len(), 1);
    }
}
