//! Classified repository paths.

use super::DomainEntityType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of classifying a repository-relative path.
///
/// `library_key` is the on-disk folder key of the owning library; it is
/// `None` for global and mapping entities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepositoryPathInfo {
    pub entity_type: DomainEntityType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library_key: Option<String>,
}

impl RepositoryPathInfo {
    #[must_use]
    pub const fn new(entity_type: DomainEntityType, library_key: Option<String>) -> Self {
        Self {
            entity_type,
            library_key,
        }
    }

    #[must_use]
    pub const fn unknown() -> Self {
        Self::new(DomainEntityType::Unknown, None)
    }

    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.entity_type == DomainEntityType::Unknown
    }
}

impl fmt::Display for RepositoryPathInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.library_key {
            Some(key) => write!(f, "{} (library {key})", self.entity_type),
            None => write!(f, "{}", self.entity_type),
        }
    }
}
