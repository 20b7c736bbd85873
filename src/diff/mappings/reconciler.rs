//! Mapping drift reconciliation.
//!
//! Mapping changes are only seen as added or deleted filenames. The ids in
//! each filename are resolved through the index, bucketed by owning
//! component or threat, and each owner's delta is attached to the aggregate.

use super::attach::{CONFLICT, Direction, SYNTHETIC, attach};
use super::collection::{ComponentMappingCollection, MappingEntry, ThreatMappingCollection};
use super::parse::parse_mapping_filename;
use crate::diff::builder::DriftBuilder;
use crate::diff::result::UNASSIGNED_LIBRARY;
use crate::diff::traits::{DriftEntity, DriftProcessor, MappingSet};
use crate::error::Result;
use crate::index::IndexService;
use crate::model::{Component, DomainEntityType, MappingFamily, MappingOwner, Threat};
use crate::paths::EntityPathContext;
use crate::reader::SkippedItem;
use crate::utils::CancellationToken;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Added and removed mappings of one owner.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OwnerDelta<M> {
    pub added: M,
    pub removed: M,
}

/// Parsed mapping changes, bucketed by owning integer id.
#[derive(Debug, Clone, Default)]
pub struct MappingBatch {
    pub components: BTreeMap<i64, OwnerDelta<ComponentMappingCollection>>,
    pub threats: BTreeMap<i64, OwnerDelta<ThreatMappingCollection>>,
    pub skipped: Vec<SkippedItem>,
    pub parsed: usize,
    pub content_only: usize,
}

impl MappingBatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty() && self.threats.is_empty()
    }

    fn insert(&mut self, family: MappingFamily, owner_id: i64, direction: Direction, entry: MappingEntry) {
        let inserted = match family.owner() {
            MappingOwner::Component => {
                let delta = self.components.entry(owner_id).or_default();
                slot(delta, direction).insert(family, entry)
            }
            MappingOwner::Threat => {
                let delta = self.threats.entry(owner_id).or_default();
                slot(delta, direction).insert(family, entry)
            }
        };
        debug_assert!(inserted, "collection has a slot for every owned family");
    }
}

fn slot<M>(delta: &mut OwnerDelta<M>, direction: Direction) -> &mut M {
    match direction {
        Direction::Added => &mut delta.added,
        Direction::Removed => &mut delta.removed,
    }
}

/// Counters reported after attaching a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    pub parsed: usize,
    pub skipped: usize,
    pub content_only: usize,
    /// Deltas attached per strategy name
    pub attached_by: BTreeMap<&'static str, usize>,
    pub synthetic: usize,
    pub unassigned: usize,
    pub conflicts: usize,
}

/// Turns mapping path changes into mapping deltas on the aggregate.
pub struct MappingReconciler<'a> {
    index: &'a dyn IndexService,
    batch_libraries: &'a [Uuid],
}

impl<'a> MappingReconciler<'a> {
    /// `batch_libraries` are the libraries in scope; owners are looked up
    /// among them when no existing record carries the delta.
    pub fn new(index: &'a dyn IndexService, batch_libraries: &'a [Uuid]) -> Self {
        Self {
            index,
            batch_libraries,
        }
    }

    /// Parse and bucket every mapping change in `ctx`.
    ///
    /// Malformed filenames are logged and skipped. Content-only
    /// modifications carry no id change and are ignored.
    #[must_use]
    pub fn parse_changes(&self, ctx: &EntityPathContext) -> MappingBatch {
        let mut batch = MappingBatch::default();

        for family in MappingFamily::ALL {
            let changes = ctx.relative_changes(DomainEntityType::from(family));
            if changes.is_empty() {
                continue;
            }

            for (paths, direction) in [
                (&changes.added, Direction::Added),
                (&changes.deleted, Direction::Removed),
            ] {
                for path in paths {
                    match parse_mapping_filename(family, path) {
                        Ok(key) => {
                            let entry = MappingEntry::resolve(&key, self.index);
                            batch.insert(family, key.owner_id(), direction, entry);
                            batch.parsed += 1;
                        }
                        Err(err) => {
                            tracing::warn!(path = %path, error = %err, "skipping malformed mapping file");
                            batch.skipped.push(SkippedItem::new(path.clone(), err.to_string()));
                        }
                    }
                }
            }

            for path in &changes.modified {
                tracing::info!(path = %path, "mapping content changed without id change, ignored");
                batch.content_only += 1;
            }
        }

        tracing::debug!(
            parsed = batch.parsed,
            skipped = batch.skipped.len(),
            component_owners = batch.components.len(),
            threat_owners = batch.threats.len(),
            "mapping changes collected"
        );
        batch
    }

    /// Attach every owner's delta to `builder`.
    pub fn attach_all(&self, batch: MappingBatch, builder: &mut DriftBuilder) -> ReconcileStats {
        let mut stats = ReconcileStats {
            parsed: batch.parsed,
            skipped: batch.skipped.len(),
            content_only: batch.content_only,
            ..ReconcileStats::default()
        };
        builder.extend_skipped(batch.skipped);

        for (owner_id, delta) in batch.components {
            self.attach_owner::<Component>(builder, owner_id, delta, &mut stats);
        }
        for (owner_id, delta) in batch.threats {
            self.attach_owner::<Threat>(builder, owner_id, delta, &mut stats);
        }

        tracing::debug!(
            synthetic = stats.synthetic,
            unassigned = stats.unassigned,
            conflicts = stats.conflicts,
            "mapping deltas attached"
        );
        stats
    }

    fn attach_owner<T: DriftEntity>(
        &self,
        builder: &mut DriftBuilder,
        owner_id: i64,
        delta: OwnerDelta<T::Mappings>,
        stats: &mut ReconcileStats,
    ) {
        let owner = self.index.uuid_of(owner_id).unwrap_or_else(|| {
            tracing::error!(owner_id, kind = T::ENTITY_TYPE.name(), "mapping owner id missing from the index");
            Uuid::nil()
        });

        for (mappings, direction) in [(delta.added, Direction::Added), (delta.removed, Direction::Removed)] {
            if mappings.is_empty() {
                continue;
            }
            let attached = attach::<T>(
                builder,
                self.index,
                self.batch_libraries,
                owner,
                owner_id,
                direction,
                mappings,
            );
            *stats.attached_by.entry(attached.strategy).or_default() += 1;
            match attached.strategy {
                SYNTHETIC => stats.synthetic += 1,
                CONFLICT => stats.conflicts += 1,
                _ => {}
            }
            if attached.library == Some(UNASSIGNED_LIBRARY) {
                stats.unassigned += 1;
            }
        }
    }
}

impl DriftProcessor for MappingReconciler<'_> {
    type Collected = MappingBatch;

    fn collect(&self, ctx: &EntityPathContext, cancel: &CancellationToken) -> Result<MappingBatch> {
        cancel.check()?;
        Ok(self.parse_changes(ctx))
    }

    fn apply(&self, collected: MappingBatch, builder: &mut DriftBuilder) {
        self.attach_all(collected, builder);
    }

    fn name(&self) -> &str {
        "mappings"
    }
}
