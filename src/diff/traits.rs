//! Trait definitions shared by the drift processors.
//!
//! [`DriftEntity`] ties an entity kind to the slots it occupies in the drift
//! aggregate, so one generic processor serves every library-owned kind.

use super::builder::DriftBuilder;
use super::fields::FieldTable;
use super::mappings::MappingEntry;
use super::result::{EntityDiff, EntityRecord, LibraryContents, LibraryDrift};
use crate::error::Result;
use crate::index::IndexService;
use crate::model::{
    Component, DomainEntityType, MappingFamily, Property, SecurityRequirement, TestCase, Threat,
};
use crate::paths::EntityPathContext;
use crate::utils::CancellationToken;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;
use std::fmt::Debug;
use uuid::Uuid;

/// Mapping deltas that can hang off an entity record.
pub trait MappingSet:
    Default + Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync
{
    fn is_empty(&self) -> bool;

    /// Number of mapping entries.
    fn len(&self) -> usize;

    /// Add one entry. Returns `false` when this set has no slot for `family`.
    fn insert(&mut self, family: MappingFamily, entry: MappingEntry) -> bool;

    fn merge(&mut self, other: Self);

    /// Sort and deduplicate every slot.
    fn normalize(&mut self);
}

/// Kinds that carry no mappings.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct NoMappings {}

impl MappingSet for NoMappings {
    fn is_empty(&self) -> bool {
        true
    }

    fn len(&self) -> usize {
        0
    }

    fn insert(&mut self, _family: MappingFamily, _entry: MappingEntry) -> bool {
        false
    }

    fn merge(&mut self, _other: Self) {}

    fn normalize(&mut self) {}
}

/// A library-owned entity kind tracked in the drift aggregate.
pub trait DriftEntity:
    FieldTable + Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync
{
    /// Entity type whose change set this kind consumes
    const ENTITY_TYPE: DomainEntityType;

    type Mappings: MappingSet;

    fn uuid(&self) -> Uuid;

    /// Display name.
    fn name(&self) -> &str;

    /// Owning library as recorded in the document, if present.
    fn library_uuid(&self) -> Option<Uuid>;

    /// Placeholder carrying only identity and owning library.
    fn stub(uuid: Uuid, library: Uuid) -> Self;

    /// Ids of this kind owned by `library`, for kinds that own mappings.
    fn owned_ids(_index: &dyn IndexService, _library: Uuid) -> BTreeSet<i64> {
        BTreeSet::new()
    }

    /// Records of this kind inside a whole added or deleted library.
    fn contents_mut(library: &mut LibraryContents) -> &mut Vec<EntityRecord<Self>>;

    fn contents(library: &LibraryContents) -> &[EntityRecord<Self>];

    /// Diff of this kind inside a modified library.
    fn diff_mut(library: &mut LibraryDrift) -> &mut EntityDiff<Self>;

    fn diff(library: &LibraryDrift) -> &EntityDiff<Self>;
}

macro_rules! drift_entity {
    ($ty:ty, $entity_type:expr, $mappings:ty, $slot:ident $(, owned = $owned:ident)?) => {
        impl DriftEntity for $ty {
            const ENTITY_TYPE: DomainEntityType = $entity_type;

            type Mappings = $mappings;

            fn uuid(&self) -> Uuid {
                self.uuid
            }

            fn name(&self) -> &str {
                &self.name
            }

            fn library_uuid(&self) -> Option<Uuid> {
                self.library_uuid
            }

            fn stub(uuid: Uuid, library: Uuid) -> Self {
                <$ty>::stub(uuid, Some(library))
            }

            $(
                fn owned_ids(index: &dyn IndexService, library: Uuid) -> BTreeSet<i64> {
                    index.$owned(library)
                }
            )?

            fn contents_mut(library: &mut LibraryContents) -> &mut Vec<EntityRecord<Self>> {
                &mut library.$slot
            }

            fn contents(library: &LibraryContents) -> &[EntityRecord<Self>] {
                &library.$slot
            }

            fn diff_mut(library: &mut LibraryDrift) -> &mut EntityDiff<Self> {
                &mut library.$slot
            }

            fn diff(library: &LibraryDrift) -> &EntityDiff<Self> {
                &library.$slot
            }
        }
    };
}

drift_entity!(
    Component,
    DomainEntityType::Components,
    super::mappings::ComponentMappingCollection,
    components,
    owned = owned_component_ids
);
drift_entity!(
    Threat,
    DomainEntityType::Threats,
    super::mappings::ThreatMappingCollection,
    threats,
    owned = owned_threat_ids
);
drift_entity!(
    SecurityRequirement,
    DomainEntityType::SecurityRequirements,
    NoMappings,
    security_requirements
);
drift_entity!(TestCase, DomainEntityType::TestCases, NoMappings, test_cases);
drift_entity!(Property, DomainEntityType::Properties, NoMappings, properties);

/// One stage of drift processing.
///
/// `collect` reads and compares documents without touching the aggregate,
/// so stages can run concurrently. `apply` then mutates the builder on the
/// orchestrating thread.
pub trait DriftProcessor: Send + Sync {
    /// What `collect` hands to `apply`.
    type Collected: Send;

    fn collect(
        &self,
        ctx: &EntityPathContext,
        cancel: &CancellationToken,
    ) -> Result<Self::Collected>;

    fn apply(&self, collected: Self::Collected, builder: &mut DriftBuilder);

    /// Name used in logs.
    fn name(&self) -> &str;
}
