//! Flat path-level diff reports.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Kind of a tree entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Blob,
    Tree,
    /// Gitlinks and anything else we do not descend into
    Other,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blob => f.write_str("blob"),
            Self::Tree => f.write_str("tree"),
            Self::Other => f.write_str("other"),
        }
    }
}

/// A path whose entry type differs between the two sides (e.g. a file
/// replaced by a directory of the same name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KindChange {
    pub path: String,
    pub from: EntryKind,
    pub to: EntryKind,
}

/// What the differ does when it meets a [`KindChange`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum KindChangePolicy {
    /// Record the event and also report the implied delete and add paths
    #[default]
    Decompose,
    /// Record the event only
    ReportOnly,
}

/// Added, deleted and modified blob paths between two trees.
///
/// Paths are repository-relative with `/` separators. Lists keep discovery
/// order and never contain duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[must_use]
pub struct TreeDiffReport {
    pub added: Vec<String>,
    pub deleted: Vec<String>,
    pub modified: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub kind_changed: Vec<KindChange>,
}

impl TreeDiffReport {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.deleted.is_empty()
            && self.modified.is_empty()
            && self.kind_changed.is_empty()
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.added.len() + self.deleted.len() + self.modified.len()
    }

    /// Append another partial report, dropping paths already present.
    pub fn merge(&mut self, other: Self) {
        append_unique(&mut self.added, other.added);
        append_unique(&mut self.deleted, other.deleted);
        append_unique(&mut self.modified, other.modified);
        for change in other.kind_changed {
            if !self.kind_changed.contains(&change) {
                self.kind_changed.push(change);
            }
        }
    }

    /// Merge a sequence of partial reports in order.
    pub fn merge_all(parts: impl IntoIterator<Item = Self>) -> Self {
        parts.into_iter().fold(Self::new(), |mut acc, part| {
            acc.merge(part);
            acc
        })
    }
}

fn append_unique(target: &mut Vec<String>, incoming: Vec<String>) {
    let mut seen: HashSet<String> = target.iter().cloned().collect();
    for path in incoming {
        if seen.insert(path.clone()) {
            target.push(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_deduplicates_and_keeps_order() {
        let mut first = TreeDiffReport::new();
        first.added = vec!["7/components/1.yaml".into(), "7/components/2.yaml".into()];
        let mut second = TreeDiffReport::new();
        second.added = vec!["7/components/2.yaml".into(), "7/threats/3.yaml".into()];
        second.modified = vec!["7/7.yaml".into()];

        let merged = TreeDiffReport::merge_all([first, second]);
        assert_eq!(
            merged.added,
            vec!["7/components/1.yaml", "7/components/2.yaml", "7/threats/3.yaml"]
        );
        assert_eq!(merged.modified, vec!["7/7.yaml"]);
        assert_eq!(merged.total(), 4);
    }

    #[test]
    fn test_empty_report() {
        assert!(TreeDiffReport::new().is_empty());
    }
}
