//! YAML-backed index.
//!
//! ```yaml
//! entities:
//!   12: 6f1c1f5e-3a53-4c1e-9a3e-0c1b2d3e4f50
//! libraries:
//!   0b6f7c1a-5a0e-4b8e-8f55-1d2c3b4a5e6f:
//!     id: 7
//!     name: Core
//!     components: [12]
//!     threats: [40]
//!     security_requirements: [5]
//! ```

use super::{IndexService, LibraryMetadataSource};
use crate::error::{DriftError, IndexErrorKind, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use uuid::Uuid;

/// One library's entry in the index document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryEntry {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub components: BTreeSet<i64>,
    #[serde(default)]
    pub threats: BTreeSet<i64>,
    #[serde(default)]
    pub security_requirements: BTreeSet<i64>,
}

/// On-disk shape of the index file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDocument {
    #[serde(default)]
    pub entities: BTreeMap<i64, Uuid>,
    #[serde(default)]
    pub libraries: BTreeMap<Uuid, LibraryEntry>,
}

/// In-memory index with lookups in both directions.
#[derive(Debug, Clone, Default)]
pub struct ContentIndex {
    by_id: HashMap<i64, Uuid>,
    by_uuid: HashMap<Uuid, i64>,
    libraries: BTreeMap<Uuid, LibraryEntry>,
    by_folder: HashMap<String, Uuid>,
}

impl ContentIndex {
    /// Load the index from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(DriftError::index(
                "loading index",
                IndexErrorKind::NotFound(path.display().to_string()),
            ));
        }
        let content = std::fs::read_to_string(path).map_err(|e| DriftError::io(path, e))?;
        let index = Self::from_yaml_str(&content).map_err(|err| match err {
            DriftError::Index { source, .. } => {
                DriftError::index(format!("loading {}", path.display()), source)
            }
            other => other,
        })?;
        tracing::debug!(
            path = %path.display(),
            entities = index.by_id.len(),
            libraries = index.libraries.len(),
            "index loaded"
        );
        Ok(index)
    }

    /// Parse the index from YAML text.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let document: IndexDocument = serde_yaml_ng::from_str(content).map_err(|e| {
            DriftError::index("parsing index", IndexErrorKind::InvalidDocument(e.to_string()))
        })?;
        Ok(Self::from_document(document))
    }

    #[must_use]
    pub fn from_document(document: IndexDocument) -> Self {
        let by_uuid = document.entities.iter().map(|(id, uuid)| (*uuid, *id)).collect();
        let by_folder = document
            .libraries
            .iter()
            .map(|(uuid, entry)| (entry.id.to_string(), *uuid))
            .collect();
        Self {
            by_id: document.entities.into_iter().collect(),
            by_uuid,
            libraries: document.libraries,
            by_folder,
        }
    }

    pub fn builder() -> ContentIndexBuilder {
        ContentIndexBuilder::default()
    }

    /// The library entry for a UUID, or an `UnknownLibrary` error.
    pub fn library(&self, library: Uuid) -> Result<&LibraryEntry> {
        self.libraries.get(&library).ok_or_else(|| {
            DriftError::index(
                "resolving library",
                IndexErrorKind::UnknownLibrary(library.to_string()),
            )
        })
    }

    fn owned(&self, library: Uuid, pick: impl Fn(&LibraryEntry) -> &BTreeSet<i64>) -> BTreeSet<i64> {
        self.libraries.get(&library).map(pick).cloned().unwrap_or_default()
    }
}

impl IndexService for ContentIndex {
    fn int_id_of(&self, uuid: Uuid) -> Option<i64> {
        self.by_uuid.get(&uuid).copied()
    }

    fn uuid_of(&self, id: i64) -> Option<Uuid> {
        self.by_id.get(&id).copied()
    }

    fn owned_component_ids(&self, library: Uuid) -> BTreeSet<i64> {
        self.owned(library, |entry| &entry.components)
    }

    fn owned_threat_ids(&self, library: Uuid) -> BTreeSet<i64> {
        self.owned(library, |entry| &entry.threats)
    }

    fn owned_security_requirement_ids(&self, library: Uuid) -> BTreeSet<i64> {
        self.owned(library, |entry| &entry.security_requirements)
    }
}

impl LibraryMetadataSource for ContentIndex {
    fn folder_key(&self, library: Uuid) -> Option<String> {
        self.libraries.get(&library).map(|entry| entry.id.to_string())
    }

    fn library_for_folder(&self, folder_key: &str) -> Option<Uuid> {
        self.by_folder.get(folder_key).copied()
    }

    fn library_name(&self, library: Uuid) -> Option<String> {
        self.libraries
            .get(&library)
            .map(|entry| entry.name.clone())
            .filter(|name| !name.is_empty())
    }

    fn libraries(&self) -> Vec<Uuid> {
        self.libraries.keys().copied().collect()
    }
}

/// Builder for assembling an index in code.
#[derive(Debug, Default)]
#[must_use]
pub struct ContentIndexBuilder {
    document: IndexDocument,
}

impl ContentIndexBuilder {
    /// Register an entity id.
    pub fn entity(mut self, id: i64, uuid: Uuid) -> Self {
        self.document.entities.insert(id, uuid);
        self
    }

    /// Register a library under its integer id.
    pub fn library(mut self, uuid: Uuid, id: i64, name: impl Into<String>) -> Self {
        let entry = self.document.libraries.entry(uuid).or_default();
        entry.id = id;
        entry.name = name.into();
        self
    }

    /// Register a component owned by `library`.
    pub fn component(mut self, library: Uuid, id: i64, uuid: Uuid) -> Self {
        self.document.entities.insert(id, uuid);
        self.document.libraries.entry(library).or_default().components.insert(id);
        self
    }

    /// Register a threat owned by `library`.
    pub fn threat(mut self, library: Uuid, id: i64, uuid: Uuid) -> Self {
        self.document.entities.insert(id, uuid);
        self.document.libraries.entry(library).or_default().threats.insert(id);
        self
    }

    /// Register a security requirement owned by `library`.
    pub fn security_requirement(mut self, library: Uuid, id: i64, uuid: Uuid) -> Self {
        self.document.entities.insert(id, uuid);
        self.document
            .libraries
            .entry(library)
            .or_default()
            .security_requirements
            .insert(id);
        self
    }

    #[must_use]
    pub fn build(self) -> ContentIndex {
        ContentIndex::from_document(self.document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
entities:
  7: 0b6f7c1a-5a0e-4b8e-8f55-1d2c3b4a5e6f
  12: 6f1c1f5e-3a53-4c1e-9a3e-0c1b2d3e4f50
libraries:
  0b6f7c1a-5a0e-4b8e-8f55-1d2c3b4a5e6f:
    id: 7
    name: Core
    components: [12]
"#;

    #[test]
    fn test_parse_and_lookup() {
        let index = ContentIndex::from_yaml_str(SAMPLE).expect("valid index");
        let lib = Uuid::parse_str("0b6f7c1a-5a0e-4b8e-8f55-1d2c3b4a5e6f").unwrap();
        let comp = Uuid::parse_str("6f1c1f5e-3a53-4c1e-9a3e-0c1b2d3e4f50").unwrap();

        assert_eq!(index.uuid_of(12), Some(comp));
        assert_eq!(index.int_id_of(comp), Some(12));
        assert_eq!(index.owned_component_ids(lib), BTreeSet::from([12]));
        assert!(index.owned_threat_ids(lib).is_empty());
        assert_eq!(index.folder_key(lib).as_deref(), Some("7"));
        assert_eq!(index.library_for_folder("7"), Some(lib));
        assert_eq!(index.library_name(lib).as_deref(), Some("Core"));
    }

    #[test]
    fn test_unknown_library() {
        let index = ContentIndex::default();
        let err = index.library(Uuid::from_u128(5)).unwrap_err();
        assert!(matches!(
            err,
            DriftError::Index {
                source: IndexErrorKind::UnknownLibrary(_),
                ..
            }
        ));
        assert!(index.owned_component_ids(Uuid::from_u128(5)).is_empty());
    }

    #[test]
    fn test_invalid_document() {
        let err = ContentIndex::from_yaml_str("entities: [1, 2").unwrap_err();
        assert!(matches!(err, DriftError::Index { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = ContentIndex::load(Path::new("/definitely/not/here/index.yaml")).unwrap_err();
        assert!(err.to_string().contains("Index lookup failed"));
    }

    #[test]
    fn test_builder() {
        let lib = Uuid::from_u128(1);
        let index = ContentIndex::builder()
            .library(lib, 7, "Core")
            .component(lib, 12, Uuid::from_u128(12))
            .threat(lib, 40, Uuid::from_u128(40))
            .build();
        assert_eq!(index.owned_threat_ids(lib), BTreeSet::from([40]));
        assert_eq!(index.uuid_of(40), Some(Uuid::from_u128(40)));
    }
}
