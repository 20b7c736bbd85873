//! Scoped diff requests.

use crate::error::{DriftError, Result};
use crate::tree::SnapshotSource;
use std::path::PathBuf;
use uuid::Uuid;

/// Which libraries a run covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibrarySelection {
    /// Every library, via a whole-repository comparison
    All,
    /// Only the listed libraries (must not be empty)
    Only(Vec<Uuid>),
}

impl LibrarySelection {
    #[must_use]
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

/// Inputs of one scoped diff.
#[derive(Debug, Clone)]
pub struct ScopedDiffRequest {
    pub baseline_root: PathBuf,
    pub target_root: PathBuf,
    pub libraries: LibrarySelection,
    /// Compare working directories (uncommitted state) instead of revisions
    pub include_uncommitted: bool,
    pub baseline_revision: String,
    pub target_revision: String,
}

impl ScopedDiffRequest {
    pub fn new(
        baseline_root: impl Into<PathBuf>,
        target_root: impl Into<PathBuf>,
        libraries: Vec<Uuid>,
    ) -> Self {
        Self {
            baseline_root: baseline_root.into(),
            target_root: target_root.into(),
            libraries: LibrarySelection::Only(libraries),
            include_uncommitted: false,
            baseline_revision: "HEAD".to_string(),
            target_revision: "HEAD".to_string(),
        }
    }

    /// Request covering every library.
    pub fn all_libraries(baseline_root: impl Into<PathBuf>, target_root: impl Into<PathBuf>) -> Self {
        let mut request = Self::new(baseline_root, target_root, Vec::new());
        request.libraries = LibrarySelection::All;
        request
    }

    #[must_use]
    pub fn with_uncommitted(mut self, include: bool) -> Self {
        self.include_uncommitted = include;
        self
    }

    #[must_use]
    pub fn with_revisions(mut self, baseline: impl Into<String>, target: impl Into<String>) -> Self {
        self.baseline_revision = baseline.into();
        self.target_revision = target.into();
        self
    }

    /// Fail fast on inputs that cannot produce a result.
    pub fn validate(&self) -> Result<()> {
        for (label, root) in [("baseline", &self.baseline_root), ("target", &self.target_root)] {
            if root.as_os_str().is_empty() {
                return Err(DriftError::validation(format!("{label} root is empty")));
            }
            if !root.is_dir() {
                return Err(DriftError::validation(format!(
                    "{label} root does not exist or is not a directory: {}",
                    root.display()
                )));
            }
        }
        if let LibrarySelection::Only(libraries) = &self.libraries
            && libraries.is_empty()
        {
            return Err(DriftError::validation("library list is empty"));
        }
        if !self.include_uncommitted
            && (self.baseline_revision.trim().is_empty() || self.target_revision.trim().is_empty())
        {
            return Err(DriftError::validation("revision must not be empty"));
        }
        Ok(())
    }

    #[must_use]
    pub fn baseline_source(&self) -> SnapshotSource {
        SnapshotSource::for_root(
            &self.baseline_root,
            &self.baseline_revision,
            self.include_uncommitted,
        )
    }

    #[must_use]
    pub fn target_source(&self) -> SnapshotSource {
        SnapshotSource::for_root(&self.target_root, &self.target_revision, self.include_uncommitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_library_list_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let request = ScopedDiffRequest::new(dir.path(), dir.path(), Vec::new());
        let err = request.validate().unwrap_err();
        assert!(err.to_string().contains("library list is empty"));

        let all = ScopedDiffRequest::all_libraries(dir.path(), dir.path());
        assert!(all.validate().is_ok());
    }

    #[test]
    fn test_missing_root_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let request = ScopedDiffRequest::new(
            dir.path().join("missing"),
            dir.path(),
            vec![Uuid::from_u128(1)],
        );
        assert!(matches!(request.validate(), Err(DriftError::Validation(_))));
    }

    #[test]
    fn test_sources_follow_uncommitted_flag() {
        let request = ScopedDiffRequest::new("/a", "/b", vec![Uuid::from_u128(1)]);
        assert!(matches!(request.baseline_source(), SnapshotSource::Revision { .. }));
        let request = request.with_uncommitted(true);
        assert!(matches!(request.target_source(), SnapshotSource::WorkingDirectory(_)));
    }
}
