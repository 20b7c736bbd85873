//! **Drift detection and reconciliation for versioned content libraries.**
//!
//! `drift-tools` compares a *golden* (reference) content repository against a
//! *client* repository and reports, per library, which libraries, entities
//! and relationship mappings were added, removed or modified.
//!
//! Both repositories are git repositories holding YAML documents in a fixed
//! folder layout:
//!
//! ```text
//! {root}/{library}/{library}.yaml                  library document
//! {root}/{library}/components/{id}.yaml            library-owned entities
//! {root}/global/{component-types|property-types|property-options}/...
//! {root}/mappings/{family}/{id}_{id}[_...].yaml    relationship mappings
//! ```
//!
//! ## Core Concepts & Modules
//!
//! - **[`tree`]**: compares git object trees (committed revisions, or working
//!   directories snapshotted into a scratch object store) and yields added,
//!   deleted and modified blob paths.
//! - **[`scope`]**: limits a run to selected libraries, or compares whole
//!   repositories, and merges the per-folder reports.
//! - **[`paths`]**: classifies every changed path into an entity type and
//!   owning library folder.
//! - **[`diff`]**: home of the [`DriftEngine`], which reads the changed
//!   documents, compares their fields and attaches mapping deltas to the
//!   [`Drift`] aggregate.
//! - **[`index`]** and **[`reader`]**: the identity index and the document
//!   readers the engine depends on.
//! - **[`pipeline`]** and **[`reports`]**: configured end-to-end runs and
//!   JSON or text output.
//!
//! ## Getting Started
//!
//! ```no_run
//! use std::sync::Arc;
//! use drift_tools::{ContentIndex, DriftEngine, ScopedDiffRequest};
//! use drift_tools::utils::CancellationToken;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let index = Arc::new(ContentIndex::load("golden/index.yaml".as_ref())?);
//!     let engine = DriftEngine::from_index(index);
//!
//!     let request = ScopedDiffRequest::all_libraries("golden", "client");
//!     let drift = engine.compute(&request, &CancellationToken::new())?;
//!
//!     for library in &drift.modified_libraries {
//!         println!(
//!             "{}: {} components changed",
//!             library.name,
//!             library.components.total()
//!         );
//!     }
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod diff;
pub mod error;
pub mod index;
pub mod model;
pub mod paths;
pub mod pipeline;
pub mod reader;
pub mod reports;
pub mod scope;
pub mod tree;
pub mod utils;

// Re-export main types for convenience
pub use config::{AppConfig, AppConfigBuilder, ConfigPreset, DriftConfig, DriftConfigBuilder};
pub use config::{ConfigError, Validatable};
pub use diff::{Drift, DriftEngine, DriftSummary, LibraryContents, LibraryDrift, UNASSIGNED_LIBRARY};
pub use error::{DriftError, ErrorContext, OptionContext, Result};
pub use index::{ContentIndex, IndexService, LibraryMetadataSource};
pub use model::{DomainEntityType, MappingFamily, RepositoryPathInfo};
pub use paths::classify_path;
pub use reader::{EntityReader, EntityReaders, YamlEntityReader};
pub use reports::{ReportFormat, ReportGenerator};
pub use scope::{LibrarySelection, ScopedDiffRequest};
pub use tree::{KindChangePolicy, TreeDiffReport, TreeDiffer};
