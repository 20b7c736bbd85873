//! Typed change sets built from a combined tree diff report.

use super::classifier::classify_path;
use crate::model::DomainEntityType;
use crate::reader::DocumentSource;
use crate::tree::TreeDiffReport;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// Relative added/deleted/modified paths for one bucket.
///
/// Set semantics with discovery order preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathChanges {
    #[serde(default, skip_serializing_if = "IndexSet::is_empty")]
    pub added: IndexSet<String>,
    #[serde(default, skip_serializing_if = "IndexSet::is_empty")]
    pub deleted: IndexSet<String>,
    #[serde(default, skip_serializing_if = "IndexSet::is_empty")]
    pub modified: IndexSet<String>,
}

impl PathChanges {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.deleted.is_empty() && self.modified.is_empty()
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.added.len() + self.deleted.len() + self.modified.len()
    }

    fn extend(&mut self, other: &Self) {
        self.added.extend(other.added.iter().cloned());
        self.deleted.extend(other.deleted.iter().cloned());
        self.modified.extend(other.modified.iter().cloned());
    }
}

/// Relative paths of one change set, in discovery order.
///
/// Added entities are read from the target side (where they now exist);
/// deleted entities from the baseline side (where they last existed);
/// modified entities from both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub added: Vec<String>,
    pub deleted: Vec<String>,
    pub modified: Vec<String>,
}

impl ChangeSet {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.deleted.is_empty() && self.modified.is_empty()
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.added.len() + self.deleted.len() + self.modified.len()
    }
}

type BucketKey = (Option<String>, DomainEntityType);

#[derive(Clone, Copy)]
enum Side {
    Added,
    Deleted,
    Modified,
}

/// Changes keyed by (library folder key, entity type).
///
/// Built once per run by classifying every path of the combined report;
/// unknown paths are dropped here.
#[derive(Debug, Clone)]
pub struct EntityPathContext {
    baseline: DocumentSource,
    target: DocumentSource,
    buckets: IndexMap<BucketKey, PathChanges>,
}

impl EntityPathContext {
    pub fn build(
        report: &TreeDiffReport,
        baseline: impl Into<DocumentSource>,
        target: impl Into<DocumentSource>,
    ) -> Self {
        let mut buckets: IndexMap<BucketKey, PathChanges> = IndexMap::new();
        let mut dropped = 0usize;

        let sides = [
            (&report.added, Side::Added),
            (&report.deleted, Side::Deleted),
            (&report.modified, Side::Modified),
        ];
        for (paths, side) in sides {
            for path in paths {
                let info = match classify_path(path) {
                    Ok(info) if info.is_unknown() => {
                        tracing::trace!(path = %path, "unclassified path dropped");
                        dropped += 1;
                        continue;
                    }
                    Ok(info) => info,
                    Err(err) => {
                        tracing::warn!(path = %path, error = %err, "path could not be classified");
                        dropped += 1;
                        continue;
                    }
                };
                let bucket = buckets.entry((info.library_key, info.entity_type)).or_default();
                let set = match side {
                    Side::Added => &mut bucket.added,
                    Side::Deleted => &mut bucket.deleted,
                    Side::Modified => &mut bucket.modified,
                };
                set.insert(path.clone());
            }
        }

        tracing::debug!(buckets = buckets.len(), dropped, "entity path context built");
        Self {
            baseline: baseline.into(),
            target: target.into(),
            buckets,
        }
    }

    /// Where baseline documents are read from.
    #[must_use]
    pub const fn baseline(&self) -> &DocumentSource {
        &self.baseline
    }

    /// Where target documents are read from.
    #[must_use]
    pub const fn target(&self) -> &DocumentSource {
        &self.target
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.values().all(PathChanges::is_empty)
    }

    /// Relative changes for one entity type across every library.
    #[must_use]
    pub fn relative_changes(&self, entity_type: DomainEntityType) -> PathChanges {
        let mut merged = PathChanges::default();
        for ((_, kind), changes) in &self.buckets {
            if *kind == entity_type {
                merged.extend(changes);
            }
        }
        merged
    }

    /// Relative changes for one entity type inside one library folder.
    #[must_use]
    pub fn library_relative_changes(
        &self,
        library_key: &str,
        entity_type: DomainEntityType,
    ) -> PathChanges {
        self.buckets
            .get(&(Some(library_key.to_string()), entity_type))
            .cloned()
            .unwrap_or_default()
    }

    /// Change set for one entity type, aggregated across libraries.
    #[must_use]
    pub fn change_set(&self, entity_type: DomainEntityType) -> ChangeSet {
        self.resolve(&self.relative_changes(entity_type))
    }

    /// Change set for one entity type inside one library folder.
    #[must_use]
    pub fn library_change_set(&self, library_key: &str, entity_type: DomainEntityType) -> ChangeSet {
        self.resolve(&self.library_relative_changes(library_key, entity_type))
    }

    /// Library folder keys that carry at least one change, in discovery order.
    pub fn library_keys(&self) -> impl Iterator<Item = &str> {
        let keys: IndexSet<&str> = self
            .buckets
            .keys()
            .filter_map(|(key, _)| key.as_deref())
            .collect();
        keys.into_iter()
    }

    fn resolve(&self, changes: &PathChanges) -> ChangeSet {
        ChangeSet {
            added: changes.added.iter().cloned().collect(),
            deleted: changes.deleted.iter().cloned().collect(),
            modified: changes.modified.iter().cloned().collect(),
        }
    }
}
