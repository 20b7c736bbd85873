//! Snapshot resolution and tree-level diffing.
//!
//! This module answers "which files changed" between a baseline and a target
//! snapshot. It knows nothing about entities; classification happens in
//! [`crate::paths`].

mod differ;
mod report;
mod snapshot;

pub use differ::{TreeDiffer, mapping_prefix};
pub use report::{EntryKind, KindChange, KindChangePolicy, TreeDiffReport};
pub use snapshot::{
    OpenSnapshot, SnapshotHandle, SnapshotPair, SnapshotSource, TreeSide, snapshot_directory,
};
