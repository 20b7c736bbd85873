//! Drift computation.
//!
//! Turns a merged tree diff report into a nested, per-library [`Drift`]
//! aggregate.
//!
//! # Architecture
//!
//! - [`EntityPathContext`](crate::paths::EntityPathContext) classifies every
//!   changed path once.
//! - One [`DriftProcessor`] per entity kind reads and compares documents
//!   (concurrently), then attaches its records to a [`DriftBuilder`].
//! - The [`MappingReconciler`](mappings::MappingReconciler) parses mapping
//!   filenames and attaches mapping deltas using an ordered strategy list.
//! - [`DriftBuilder::finish`] enforces the library partition and sorts
//!   everything by UUID.
//!
//! # Example
//!
//! ```ignore
//! use drift_tools::diff::DriftEngine;
//! use drift_tools::index::ContentIndex;
//! use drift_tools::scope::ScopedDiffRequest;
//! use drift_tools::utils::CancellationToken;
//!
//! let index = std::sync::Arc::new(ContentIndex::load("golden/index.yaml".as_ref())?);
//! let engine = DriftEngine::from_index(index);
//! let request = ScopedDiffRequest::all_libraries("golden", "client");
//! let drift = engine.compute(&request, &CancellationToken::new())?;
//! println!("{} changes", drift.summary.total_changes);
//! ```

mod builder;
mod engine;
mod fields;
pub mod mappings;
pub mod processors;
mod result;
pub mod traits;

pub use builder::DriftBuilder;
pub use engine::DriftEngine;
pub use fields::{FieldAccessor, FieldComparator, FieldLists, FieldPolicy, FieldTable, FieldValue};
pub use result::{
    Drift, DriftSummary, EntityDiff, EntityRecord, FieldChange, LibraryContents, LibraryDrift,
    ModifiedRecord, UNASSIGNED_LIBRARY,
};
pub use traits::{DriftEntity, DriftProcessor, MappingSet, NoMappings};
