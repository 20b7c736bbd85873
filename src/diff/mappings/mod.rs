//! Mapping drift: filename parsing, owner collections, attachment and
//! reconciliation.

pub mod attach;
mod collection;
mod parse;
mod reconciler;

pub use attach::{AttachStrategy, Attached, Direction};
pub use collection::{ComponentMappingCollection, MappingEntry, ThreatMappingCollection};
pub use parse::{MappingKey, parse_mapping_filename};
pub use reconciler::{MappingBatch, MappingReconciler, OwnerDelta, ReconcileStats};
