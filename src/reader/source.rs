//! Where entity documents are read from.
//!
//! A revision run must read documents from the same trees the differ
//! compared; a working-directory run reads them from disk. Readers address
//! documents by repository-relative path either way.

use crate::error::{DriftError, ReadErrorKind, Result, TreeErrorKind};
use crate::tree::{OpenSnapshot, SnapshotHandle, SnapshotSource};
use crate::utils::join_relative;
use std::path::{Path, PathBuf};

/// One side's documents, shareable across workers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    /// Files under a directory on disk
    Directory(PathBuf),
    /// Blobs of a tree in a git object store
    Snapshot(SnapshotHandle),
}

impl DocumentSource {
    /// Source matching how a side was snapshotted: committed revisions are
    /// read from their tree, working directories from disk.
    #[must_use]
    pub fn for_snapshot(source: &SnapshotSource, handle: &SnapshotHandle) -> Self {
        match source {
            SnapshotSource::Revision { .. } => Self::Snapshot(handle.clone()),
            SnapshotSource::WorkingDirectory(root) => Self::Directory(root.clone()),
        }
    }

    /// Open the source for reading. Snapshot sources get their own
    /// repository handle, so call this once per worker.
    pub fn open(&self) -> Result<OpenDocuments> {
        match self {
            Self::Directory(root) => Ok(OpenDocuments::Directory(root.clone())),
            Self::Snapshot(handle) => handle.open().map(OpenDocuments::Snapshot),
        }
    }
}

impl std::fmt::Display for DocumentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Directory(root) => write!(f, "{}", root.display()),
            Self::Snapshot(handle) => write!(f, "{}@{}", handle.store.display(), handle.tree),
        }
    }
}

impl From<PathBuf> for DocumentSource {
    fn from(root: PathBuf) -> Self {
        Self::Directory(root)
    }
}

impl From<&Path> for DocumentSource {
    fn from(root: &Path) -> Self {
        Self::Directory(root.to_path_buf())
    }
}

impl From<&str> for DocumentSource {
    fn from(root: &str) -> Self {
        Self::Directory(PathBuf::from(root))
    }
}

impl From<SnapshotHandle> for DocumentSource {
    fn from(handle: SnapshotHandle) -> Self {
        Self::Snapshot(handle)
    }
}

/// An opened [`DocumentSource`], owned by one worker.
pub enum OpenDocuments {
    Directory(PathBuf),
    Snapshot(OpenSnapshot),
}

impl OpenDocuments {
    /// Raw text of the document at `relative`; `None` when it does not exist.
    pub fn read_text(&self, relative: &str) -> Result<Option<String>> {
        match self {
            Self::Directory(root) => {
                let path = join_relative(root, relative);
                match std::fs::read(&path) {
                    Ok(bytes) => String::from_utf8(bytes).map(Some).map_err(|e| {
                        DriftError::read(
                            format!("reading {relative}"),
                            ReadErrorKind::InvalidEncoding(e.to_string()),
                        )
                    }),
                    Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
                    // a folder where a document was expected
                    Err(_) if path.is_dir() => Ok(None),
                    Err(err) => Err(DriftError::io(path, err)),
                }
            }
            Self::Snapshot(snapshot) => snapshot.read_text(relative),
        }
    }
}

/// Borrow a per-worker handle opened by rayon's `map_init`.
pub(crate) fn opened(docs: &std::result::Result<OpenDocuments, String>) -> Result<&OpenDocuments> {
    docs.as_ref()
        .map_err(|reason| DriftError::tree("opening document source", TreeErrorKind::SnapshotUnavailable(reason.clone())))
}
