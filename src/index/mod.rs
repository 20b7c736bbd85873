//! Identity index contracts and the YAML index file.
//!
//! Integer ids are what the content repository uses in filenames; UUIDs are
//! durable identity. The index translates between the two and knows which
//! integer ids each library owns. Callers refresh it before a run.

mod file;

pub use file::{ContentIndex, ContentIndexBuilder, IndexDocument, LibraryEntry};

use std::collections::BTreeSet;
use uuid::Uuid;

/// UUID <-> integer id lookups.
pub trait IndexService: Send + Sync {
    /// Integer id assigned to `uuid`.
    fn int_id_of(&self, uuid: Uuid) -> Option<i64>;

    /// UUID of the entity with integer id `id`.
    fn uuid_of(&self, id: i64) -> Option<Uuid>;

    /// Component ids owned by a library.
    fn owned_component_ids(&self, library: Uuid) -> BTreeSet<i64>;

    /// Threat ids owned by a library.
    fn owned_threat_ids(&self, library: Uuid) -> BTreeSet<i64>;

    /// Security requirement ids owned by a library.
    fn owned_security_requirement_ids(&self, library: Uuid) -> BTreeSet<i64>;
}

/// Library UUID <-> on-disk folder key.
pub trait LibraryMetadataSource: Send + Sync {
    /// Folder key of a library (its integer id rendered as text).
    fn folder_key(&self, library: Uuid) -> Option<String>;

    /// Library stored under a folder key.
    fn library_for_folder(&self, folder_key: &str) -> Option<Uuid>;

    /// Display name of a library.
    fn library_name(&self, library: Uuid) -> Option<String>;

    /// Every library known to the source.
    fn libraries(&self) -> Vec<Uuid>;
}
