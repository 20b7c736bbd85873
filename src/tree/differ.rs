//! Tree-level comparison of two repository snapshots.
//!
//! The differ never checks files out. It walks git tree objects on both sides
//! and relies on object ids being content hashes: equal ids mean equal content,
//! for blobs and for whole subtrees alike.

use super::report::{EntryKind, KindChange, KindChangePolicy, TreeDiffReport};
use super::snapshot::TreeSide;
use crate::error::{ErrorContext, Result};
use git2::{ObjectType, Oid, Repository, Tree};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// One tree entry reduced to what the comparison needs.
#[derive(Debug, Clone, Copy)]
struct Entry {
    id: Oid,
    kind: EntryKind,
}

/// A tree and the repository used to resolve its children.
#[derive(Clone, Copy)]
struct Side<'a, 'r> {
    repo: &'r Repository,
    tree: &'a Tree<'r>,
}

impl<'a, 'r> From<&'a TreeSide<'r>> for Side<'a, 'r> {
    fn from(side: &'a TreeSide<'r>) -> Self {
        Self {
            repo: side.repo,
            tree: &side.tree,
        }
    }
}

/// Compares git trees with one of three strategies.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeDiffer {
    policy: KindChangePolicy,
}

impl TreeDiffer {
    #[must_use]
    pub const fn new(policy: KindChangePolicy) -> Self {
        Self { policy }
    }

    #[must_use]
    pub const fn policy(&self) -> KindChangePolicy {
        self.policy
    }

    /// Full recursive comparison of the subtree at `relative_root`.
    ///
    /// A folder present on one side only is reported wholesale as added or
    /// deleted. Identical subtree ids short-circuit without descending.
    pub fn compare_full(
        &self,
        baseline: &TreeSide<'_>,
        target: &TreeSide<'_>,
        relative_root: &str,
    ) -> Result<TreeDiffReport> {
        self.compare_folder(baseline, target, relative_root, None)
            .with_context(|| format!("comparing folder '{relative_root}'"))
    }

    /// Full recursive comparison that skips every entry whose name is in
    /// `ignore`, at any depth and inside bulk-collected folders too.
    pub fn compare_excluding(
        &self,
        baseline: &TreeSide<'_>,
        target: &TreeSide<'_>,
        relative_root: &str,
        ignore: &HashSet<String>,
    ) -> Result<TreeDiffReport> {
        self.compare_folder(baseline, target, relative_root, Some(ignore))
            .with_context(|| format!("comparing folder '{relative_root}' with exclusions"))
    }

    /// Flat comparison of the blobs directly inside `folder` whose id prefix
    /// (text before the first `_`) is in `prefixes`.
    pub fn compare_prefixed(
        &self,
        baseline: &TreeSide<'_>,
        target: &TreeSide<'_>,
        folder: &str,
        prefixes: &HashSet<String>,
    ) -> Result<TreeDiffReport> {
        let mut report = TreeDiffReport::new();
        if prefixes.is_empty() {
            return Ok(report);
        }
        let folder = crate::utils::normalize_separators(folder);
        let base = baseline.subtree(&folder)?;
        let tgt = target.subtree(&folder)?;

        let base_blobs = prefixed_blobs(base.as_ref(), prefixes);
        let target_blobs = prefixed_blobs(tgt.as_ref(), prefixes);

        let names: BTreeSet<&String> = base_blobs.keys().chain(target_blobs.keys()).collect();
        for name in names {
            let path = join(&folder, name);
            match (base_blobs.get(name), target_blobs.get(name)) {
                (Some(a), Some(b)) if a != b => report.modified.push(path),
                (Some(_), None) => report.deleted.push(path),
                (None, Some(_)) => report.added.push(path),
                _ => {}
            }
        }

        tracing::trace!(
            folder = %folder,
            prefixes = prefixes.len(),
            added = report.added.len(),
            deleted = report.deleted.len(),
            modified = report.modified.len(),
            "prefix-filtered compare"
        );
        Ok(report)
    }

    fn compare_folder(
        &self,
        baseline: &TreeSide<'_>,
        target: &TreeSide<'_>,
        relative_root: &str,
        ignore: Option<&HashSet<String>>,
    ) -> Result<TreeDiffReport> {
        let root = crate::utils::normalize_separators(relative_root);
        let base = baseline.subtree(&root)?;
        let tgt = target.subtree(&root)?;
        let mut report = TreeDiffReport::new();

        match (base.as_ref(), tgt.as_ref()) {
            (None, None) => {}
            (Some(base), None) => {
                collect_blobs(Side::from(base), &root, ignore, &mut report.deleted)?;
            }
            (None, Some(tgt)) => {
                collect_blobs(Side::from(tgt), &root, ignore, &mut report.added)?;
            }
            (Some(base), Some(tgt)) => {
                self.walk(Side::from(base), Side::from(tgt), &root, ignore, &mut report)?;
            }
        }
        Ok(report)
    }

    fn walk(
        &self,
        base: Side<'_, '_>,
        target: Side<'_, '_>,
        prefix: &str,
        ignore: Option<&HashSet<String>>,
        report: &mut TreeDiffReport,
    ) -> Result<()> {
        if base.tree.id() == target.tree.id() {
            return Ok(());
        }

        let base_entries = entries_of(base.tree);
        let target_entries = entries_of(target.tree);
        let names: BTreeSet<&String> = base_entries.keys().chain(target_entries.keys()).collect();

        for name in names {
            if ignore.is_some_and(|set| set.contains(name.as_str())) {
                continue;
            }
            let path = join(prefix, name);
            match (base_entries.get(name), target_entries.get(name)) {
                (Some(a), Some(b)) => self.compare_entry(base, target, &path, *a, *b, ignore, report)?,
                (Some(a), None) => collect_entry(base.repo, *a, &path, ignore, &mut report.deleted)?,
                (None, Some(b)) => collect_entry(target.repo, *b, &path, ignore, &mut report.added)?,
                (None, None) => {}
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn compare_entry(
        &self,
        base: Side<'_, '_>,
        target: Side<'_, '_>,
        path: &str,
        a: Entry,
        b: Entry,
        ignore: Option<&HashSet<String>>,
        report: &mut TreeDiffReport,
    ) -> Result<()> {
        match (a.kind, b.kind) {
            (EntryKind::Blob, EntryKind::Blob) => {
                if a.id != b.id {
                    report.modified.push(path.to_string());
                }
            }
            (EntryKind::Tree, EntryKind::Tree) => {
                if a.id != b.id {
                    let base_tree = base.repo.find_tree(a.id)?;
                    let target_tree = target.repo.find_tree(b.id)?;
                    self.walk(
                        Side {
                            repo: base.repo,
                            tree: &base_tree,
                        },
                        Side {
                            repo: target.repo,
                            tree: &target_tree,
                        },
                        path,
                        ignore,
                        report,
                    )?;
                }
            }
            (EntryKind::Other, _) | (_, EntryKind::Other) => {
                tracing::debug!(path, "skipping submodule or unsupported entry");
            }
            (from, to) => {
                tracing::debug!(path, %from, %to, "entry kind changed");
                report.kind_changed.push(KindChange {
                    path: path.to_string(),
                    from,
                    to,
                });
                if self.policy == KindChangePolicy::Decompose {
                    collect_entry(base.repo, a, path, ignore, &mut report.deleted)?;
                    collect_entry(target.repo, b, path, ignore, &mut report.added)?;
                }
            }
        }
        Ok(())
    }
}

/// Id prefix of a mapping filename: everything before the first `_`, or the
/// whole stem when there is no `_`.
#[must_use]
pub fn mapping_prefix(name: &str) -> &str {
    let stem = crate::utils::file_stem(name);
    stem.split_once('_').map_or(stem, |(head, _)| head)
}

fn prefixed_blobs(side: Option<&TreeSide<'_>>, prefixes: &HashSet<String>) -> BTreeMap<String, Oid> {
    let Some(side) = side else {
        return BTreeMap::new();
    };
    side.tree
        .iter()
        .filter(|entry| entry.kind() == Some(ObjectType::Blob))
        .filter_map(|entry| entry.name().map(|name| (name.to_string(), entry.id())))
        .filter(|(name, _)| prefixes.contains(mapping_prefix(name)))
        .collect()
}

fn entries_of(tree: &Tree<'_>) -> BTreeMap<String, Entry> {
    tree.iter()
        .filter_map(|entry| {
            let name = entry.name()?.to_string();
            let kind = match entry.kind() {
                Some(ObjectType::Blob) => EntryKind::Blob,
                Some(ObjectType::Tree) => EntryKind::Tree,
                _ => EntryKind::Other,
            };
            Some((name, Entry { id: entry.id(), kind }))
        })
        .collect()
}

fn collect_entry(
    repo: &Repository,
    entry: Entry,
    path: &str,
    ignore: Option<&HashSet<String>>,
    out: &mut Vec<String>,
) -> Result<()> {
    match entry.kind {
        EntryKind::Blob => out.push(path.to_string()),
        EntryKind::Tree => {
            let tree = repo.find_tree(entry.id)?;
            collect_blobs(Side { repo, tree: &tree }, path, ignore, out)?;
        }
        EntryKind::Other => {}
    }
    Ok(())
}

/// Every blob beneath `side`, as paths under `prefix`.
fn collect_blobs(
    side: Side<'_, '_>,
    prefix: &str,
    ignore: Option<&HashSet<String>>,
    out: &mut Vec<String>,
) -> Result<()> {
    for (name, entry) in entries_of(side.tree) {
        if ignore.is_some_and(|set| set.contains(name.as_str())) {
            continue;
        }
        collect_entry(side.repo, entry, &join(prefix, &name), ignore, out)?;
    }
    Ok(())
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}/{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::Repository;

    fn blob_tree(repo: &Repository, files: &[(&str, &str)]) -> Oid {
        // files are "dir/name" at most one level deep
        let mut dirs: BTreeMap<&str, Vec<(&str, &str)>> = BTreeMap::new();
        let mut root = repo.treebuilder(None).unwrap();
        for &(path, content) in files {
            match path.split_once('/') {
                Some((dir, name)) => dirs.entry(dir).or_default().push((name, content)),
                None => {
                    let oid = repo.blob(content.as_bytes()).unwrap();
                    root.insert(path, oid, 0o100_644).unwrap();
                }
            }
        }
        for (dir, entries) in dirs {
            let mut builder = repo.treebuilder(None).unwrap();
            for (name, content) in entries {
                let oid = repo.blob(content.as_bytes()).unwrap();
                builder.insert(name, oid, 0o100_644).unwrap();
            }
            let oid = builder.write().unwrap();
            root.insert(dir, oid, 0o040_000).unwrap();
        }
        root.write().unwrap()
    }

    fn side<'r>(repo: &'r Repository, oid: Oid) -> TreeSide<'r> {
        TreeSide {
            repo,
            tree: repo.find_tree(oid).unwrap(),
        }
    }

    #[test]
    fn test_mapping_prefix() {
        assert_eq!(mapping_prefix("5_9.yaml"), "5");
        assert_eq!(mapping_prefix("12.yaml"), "12");
        assert_eq!(mapping_prefix("5_10_3.yaml"), "5");
    }

    #[test]
    fn test_full_compare_detects_each_change() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init_bare(dir.path()).unwrap();
        let a = blob_tree(&repo, &[("lib/a.yaml", "1"), ("lib/b.yaml", "2"), ("lib/c.yaml", "3")]);
        let b = blob_tree(&repo, &[("lib/a.yaml", "1"), ("lib/b.yaml", "22"), ("lib/d.yaml", "4")]);

        let report = TreeDiffer::default()
            .compare_full(&side(&repo, a), &side(&repo, b), "")
            .unwrap();
        assert_eq!(report.added, vec!["lib/d.yaml"]);
        assert_eq!(report.deleted, vec!["lib/c.yaml"]);
        assert_eq!(report.modified, vec!["lib/b.yaml"]);
    }

    #[test]
    fn test_missing_folder_is_bulk_classified() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init_bare(dir.path()).unwrap();
        let a = blob_tree(&repo, &[("other.yaml", "x")]);
        let b = blob_tree(&repo, &[("9/1.yaml", "1"), ("9/2.yaml", "2"), ("other.yaml", "x")]);

        let report = TreeDiffer::default()
            .compare_full(&side(&repo, a), &side(&repo, b), "9")
            .unwrap();
        assert_eq!(report.added, vec!["9/1.yaml", "9/2.yaml"]);
        assert!(report.deleted.is_empty());
    }

    #[test]
    fn test_prefix_filter_only_considers_matching_files() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init_bare(dir.path()).unwrap();
        let empty = repo.treebuilder(None).unwrap().write().unwrap();
        let b = blob_tree(&repo, &[("m/5_9.yaml", ""), ("m/5_10.yaml", ""), ("m/7_1.yaml", "")]);

        let prefixes: HashSet<String> = ["5".to_string()].into_iter().collect();
        let report = TreeDiffer::default()
            .compare_prefixed(&side(&repo, empty), &side(&repo, b), "m", &prefixes)
            .unwrap();
        assert_eq!(report.added, vec!["m/5_10.yaml", "m/5_9.yaml"]);
    }

    #[test]
    fn test_kind_change_policies() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init_bare(dir.path()).unwrap();
        let a = blob_tree(&repo, &[("x", "file")]);
        let b = blob_tree(&repo, &[("x/inner.yaml", "1")]);

        let decomposed = TreeDiffer::new(KindChangePolicy::Decompose)
            .compare_full(&side(&repo, a), &side(&repo, b), "")
            .unwrap();
        assert_eq!(decomposed.deleted, vec!["x"]);
        assert_eq!(decomposed.added, vec!["x/inner.yaml"]);
        assert_eq!(decomposed.kind_changed.len(), 1);

        let reported = TreeDiffer::new(KindChangePolicy::ReportOnly)
            .compare_full(&side(&repo, a), &side(&repo, b), "")
            .unwrap();
        assert!(reported.added.is_empty() && reported.deleted.is_empty());
        assert_eq!(reported.kind_changed[0].from, EntryKind::Blob);
        assert_eq!(reported.kind_changed[0].to, EntryKind::Tree);
    }

    #[test]
    fn test_exclusion_skips_names_in_bulk_folders() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init_bare(dir.path()).unwrap();
        let empty = repo.treebuilder(None).unwrap().write().unwrap();
        let b = blob_tree(&repo, &[("7/.gitkeep", ""), ("7/7.yaml", "lib")]);

        let ignore: HashSet<String> = [".gitkeep".to_string()].into_iter().collect();
        let report = TreeDiffer::default()
            .compare_excluding(&side(&repo, empty), &side(&repo, b), "", &ignore)
            .unwrap();
        assert_eq!(report.added, vec!["7/7.yaml"]);
    }
}
