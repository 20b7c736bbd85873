//! Path classification and per-entity change sets.

mod classifier;
mod context;

pub use classifier::classify_path;
pub use context::{ChangeSet, EntityPathContext, PathChanges};
