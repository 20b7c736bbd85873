//! Resolving repository roots into comparable tree snapshots.
//!
//! A `git2::Repository` is not `Sync`, so snapshots travel between workers as
//! [`SnapshotHandle`]s (object-store path + tree id) and every worker opens
//! its own repository handle from them.

use crate::error::{DriftError, ErrorContext, OptionContext, ReadErrorKind, Result, TreeErrorKind};
use git2::{Oid, Repository, Tree};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const FILE_MODE_BLOB: i32 = 0o100_644;
const FILE_MODE_TREE: i32 = 0o040_000;

/// Where the content of one side of the comparison comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotSource {
    /// A committed revision (`HEAD`, a branch, a sha) of the repository at `root`
    Revision { root: PathBuf, revision: String },
    /// The working directory at `root`, including uncommitted changes
    WorkingDirectory(PathBuf),
}

impl SnapshotSource {
    /// Pick the source for a root depending on whether uncommitted work is wanted.
    #[must_use]
    pub fn for_root(root: &Path, revision: &str, include_uncommitted: bool) -> Self {
        if include_uncommitted {
            Self::WorkingDirectory(root.to_path_buf())
        } else {
            Self::Revision {
                root: root.to_path_buf(),
                revision: revision.to_string(),
            }
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        match self {
            Self::Revision { root, .. } | Self::WorkingDirectory(root) => root,
        }
    }
}

/// Thread-transferable reference to a tree inside an object store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotHandle {
    pub store: PathBuf,
    pub tree: Oid,
}

impl SnapshotHandle {
    /// Open a fresh repository handle onto the object store.
    pub fn open(&self) -> Result<OpenSnapshot> {
        let repo = Repository::open(&self.store)
            .with_context(|| format!("opening object store {}", self.store.display()))?;
        Ok(OpenSnapshot {
            repo,
            tree: self.tree,
        })
    }
}

/// A snapshot with its own repository handle, owned by one worker.
pub struct OpenSnapshot {
    repo: Repository,
    tree: Oid,
}

impl OpenSnapshot {
    #[must_use]
    pub const fn repo(&self) -> &Repository {
        &self.repo
    }

    /// Root tree of the snapshot.
    pub fn root(&self) -> Result<TreeSide<'_>> {
        let tree = self.repo.find_tree(self.tree)?;
        Ok(TreeSide {
            repo: &self.repo,
            tree,
        })
    }

    /// Text of the blob at `relative`, as recorded in the snapshot.
    ///
    /// Returns `None` when the path is absent or names a folder.
    pub fn read_text(&self, relative: &str) -> Result<Option<String>> {
        let relative = crate::utils::normalize_separators(relative);
        let tree = self.repo.find_tree(self.tree)?;
        let entry = match tree.get_path(Path::new(&relative)) {
            Ok(entry) => entry,
            Err(err) if err.code() == git2::ErrorCode::NotFound => return Ok(None),
            Err(err) => return Err(DriftError::from(err)).context(format!("looking up {relative}")),
        };
        if entry.kind() != Some(git2::ObjectType::Blob) {
            return Ok(None);
        }
        let blob = self.repo.find_blob(entry.id())?;
        let text = std::str::from_utf8(blob.content()).map_err(|e| {
            DriftError::read(
                format!("reading {relative}"),
                ReadErrorKind::InvalidEncoding(e.to_string()),
            )
        })?;
        Ok(Some(text.to_string()))
    }
}

/// A tree together with the repository its objects live in.
///
/// The two sides of a comparison may live in different repositories; object
/// ids are content hashes, so they compare across stores.
pub struct TreeSide<'r> {
    pub repo: &'r Repository,
    pub tree: Tree<'r>,
}

impl<'r> TreeSide<'r> {
    /// Resolve a relative folder path to a subtree. Returns `None` when the
    /// path does not exist or is not a directory.
    pub fn subtree(&self, relative: &str) -> Result<Option<TreeSide<'r>>> {
        let relative = crate::utils::normalize_separators(relative);
        if relative.is_empty() {
            return Ok(Some(TreeSide {
                repo: self.repo,
                tree: self.tree.clone(),
            }));
        }
        let entry = match self.tree.get_path(Path::new(&relative)) {
            Ok(entry) => entry,
            Err(err) if err.code() == git2::ErrorCode::NotFound => return Ok(None),
            Err(err) => return Err(DriftError::from(err)).context(format!("looking up {relative}")),
        };
        if entry.kind() != Some(git2::ObjectType::Tree) {
            tracing::warn!(path = %relative, "expected a folder but found a file; treating as absent");
            return Ok(None);
        }
        let tree = self.repo.find_tree(entry.id())?;
        Ok(Some(TreeSide {
            repo: self.repo,
            tree,
        }))
    }
}

/// Both sides of a comparison, resolved to handles.
///
/// When working directories are snapshotted they are written into one scratch
/// object store that lives as long as this value; the source repositories are
/// only ever read.
#[derive(Debug)]
pub struct SnapshotPair {
    pub baseline: SnapshotHandle,
    pub target: SnapshotHandle,
    _scratch: Option<TempDir>,
}

impl SnapshotPair {
    pub fn resolve(baseline: &SnapshotSource, target: &SnapshotSource) -> Result<Self> {
        let needs_scratch = matches!(baseline, SnapshotSource::WorkingDirectory(_))
            || matches!(target, SnapshotSource::WorkingDirectory(_));

        let scratch = if needs_scratch {
            let dir = tempfile::Builder::new()
                .prefix("drift-snapshot-")
                .tempdir()
                .map_err(|e| DriftError::io(std::env::temp_dir(), e))?;
            Repository::init_bare(dir.path())
                .context("initialising scratch object store")?;
            Some(dir)
        } else {
            None
        };
        let scratch_path = scratch.as_ref().map(|dir| dir.path().to_path_buf());

        let baseline = resolve_source(baseline, scratch_path.as_deref())
            .context("resolving baseline snapshot")?;
        let target = resolve_source(target, scratch_path.as_deref())
            .context("resolving target snapshot")?;

        Ok(Self {
            baseline,
            target,
            _scratch: scratch,
        })
    }
}

fn resolve_source(source: &SnapshotSource, scratch: Option<&Path>) -> Result<SnapshotHandle> {
    match source {
        SnapshotSource::Revision { root, revision } => {
            let repo = Repository::open(root)
                .with_context(|| format!("opening repository {}", root.display()))?;
            let object = repo.revparse_single(revision).map_err(|_| {
                DriftError::tree(
                    format!("in {}", root.display()),
                    TreeErrorKind::RevisionNotFound(revision.clone()),
                )
            })?;
            let tree = object.peel_to_tree()?;
            Ok(SnapshotHandle {
                store: repo.path().to_path_buf(),
                tree: tree.id(),
            })
        }
        SnapshotSource::WorkingDirectory(root) => {
            let store_path =
                scratch.context_none("working-directory snapshot requires a scratch store")?;
            let store = Repository::open(store_path)?;
            let tree = snapshot_directory(&store, root)
                .with_context(|| format!("snapshotting {}", root.display()))?;
            Ok(SnapshotHandle {
                store: store_path.to_path_buf(),
                tree,
            })
        }
    }
}

/// Write the contents of `dir` into `store` as blobs and trees and return the
/// root tree id. `.git` folders, symlinks and non UTF-8 names are skipped.
pub fn snapshot_directory(store: &Repository, dir: &Path) -> Result<Oid> {
    match write_tree(store, dir)? {
        Some(oid) => Ok(oid),
        None => Ok(store.treebuilder(None)?.write()?),
    }
}

fn write_tree(store: &Repository, dir: &Path) -> Result<Option<Oid>> {
    let mut entries: Vec<_> = std::fs::read_dir(dir)
        .map_err(|e| DriftError::io(dir, e))?
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|e| DriftError::io(dir, e))?;
    entries.sort_by_key(std::fs::DirEntry::file_name);

    let mut builder = store.treebuilder(None)?;
    for entry in entries {
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            tracing::warn!(path = %entry.path().display(), "skipping non UTF-8 file name");
            continue;
        };
        if name == ".git" {
            continue;
        }
        let file_type = entry.file_type().map_err(|e| DriftError::io(entry.path(), e))?;
        if file_type.is_dir() {
            if let Some(oid) = write_tree(store, &entry.path())? {
                builder.insert(name, oid, FILE_MODE_TREE)?;
            }
        } else if file_type.is_file() {
            let oid = store.blob_path(&entry.path())?;
            builder.insert(name, oid, FILE_MODE_BLOB)?;
        } else {
            tracing::debug!(path = %entry.path().display(), "skipping non-regular file");
        }
    }

    if builder.is_empty() {
        Ok(None)
    } else {
        Ok(Some(builder.write()?))
    }
}
