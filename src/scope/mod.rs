//! Library-scoped diffing.
//!
//! Resolves the requested libraries to folder keys and id prefixes, then runs
//! one tree comparison per library folder and per mapping folder on a bounded
//! worker pool and merges the partial reports.

mod orchestrator;
mod request;

pub use orchestrator::{DiffUnit, LibraryScope, ScopedDiff, ScopedDiffOrchestrator};
pub use request::{LibrarySelection, ScopedDiffRequest};
