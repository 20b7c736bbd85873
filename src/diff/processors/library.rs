//! Drift processor for library root documents.

use super::{PairRead, read_pairs};
use crate::diff::builder::DriftBuilder;
use crate::diff::fields::FieldComparator;
use crate::diff::result::{FieldChange, LibraryContents};
use crate::diff::traits::DriftProcessor;
use crate::error::Result;
use crate::model::{DomainEntityType, Library};
use crate::paths::EntityPathContext;
use crate::reader::{EntityReader, SkippedItem};
use crate::utils::CancellationToken;

/// Collected library-level changes.
#[derive(Debug, Clone, Default)]
pub struct LibraryChanges {
    pub added: Vec<Library>,
    pub deleted: Vec<Library>,
    pub modified: Vec<(Library, Vec<FieldChange>)>,
    pub skipped: Vec<SkippedItem>,
}

/// Detects added, deleted and modified libraries.
///
/// Added and deleted libraries become whole-library entries; entity
/// processors later fill them with the entities found beneath.
pub struct LibraryDriftProcessor<'a> {
    reader: &'a dyn EntityReader<Library>,
    comparator: &'a FieldComparator<Library>,
}

impl<'a> LibraryDriftProcessor<'a> {
    pub fn new(reader: &'a dyn EntityReader<Library>, comparator: &'a FieldComparator<Library>) -> Self {
        Self { reader, comparator }
    }

    fn compare(&self, baseline: &Library, target: Library, changes: &mut LibraryChanges) {
        let fields = self.comparator.compare(baseline, &target);
        if fields.is_empty() {
            tracing::debug!(library = %target.uuid, "library document unchanged in compared fields");
        } else {
            changes.modified.push((target, fields));
        }
    }
}

impl DriftProcessor for LibraryDriftProcessor<'_> {
    type Collected = LibraryChanges;

    fn collect(&self, ctx: &EntityPathContext, cancel: &CancellationToken) -> Result<LibraryChanges> {
        let set = ctx.change_set(DomainEntityType::Library);
        let mut changes = LibraryChanges::default();
        if set.is_empty() {
            return Ok(changes);
        }

        let added = self.reader.read_many(ctx.target(), &set.added, cancel)?;
        let deleted = self.reader.read_many(ctx.baseline(), &set.deleted, cancel)?;
        changes.skipped.extend(added.skipped);
        changes.skipped.extend(deleted.skipped);

        let mut deleted: Vec<Library> = deleted.entities.into_iter().map(|(_, l)| l).collect();
        for (_, library) in added.entities {
            // a library folder that was renamed keeps its UUID
            match deleted.iter().position(|d| d.uuid == library.uuid) {
                Some(at) => {
                    let previous = deleted.swap_remove(at);
                    self.compare(&previous, library, &mut changes);
                }
                None => changes.added.push(library),
            }
        }
        changes.deleted = deleted;

        for read in read_pairs(self.reader, ctx, &set.modified, cancel)? {
            match read {
                PairRead::Both { baseline, target } if baseline.uuid != target.uuid => {
                    tracing::debug!(old = %baseline.uuid, new = %target.uuid, "library replaced in place");
                    changes.deleted.push(baseline);
                    changes.added.push(target);
                }
                PairRead::Both { baseline, target } => self.compare(&baseline, target, &mut changes),
                PairRead::Missing => {}
                PairRead::Unreadable(skipped) => changes.skipped.push(skipped),
            }
        }

        tracing::debug!(
            added = changes.added.len(),
            deleted = changes.deleted.len(),
            modified = changes.modified.len(),
            "library drift collected"
        );
        Ok(changes)
    }

    fn apply(&self, collected: LibraryChanges, builder: &mut DriftBuilder) {
        builder.extend_skipped(collected.skipped);
        for library in collected.added {
            builder.add_library(LibraryContents::new(library));
        }
        for library in collected.deleted {
            builder.delete_library(LibraryContents::new(library));
        }
        for (library, field_changes) in collected.modified {
            let bucket = builder.modified_library(library.uuid);
            if !library.name.is_empty() {
                bucket.name = library.name;
            }
            bucket.field_changes.extend(field_changes);
        }
    }

    fn name(&self) -> &str {
        "library"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::ContentIndex;
    use crate::reader::YamlEntityReader;
    use crate::tree::TreeDiffReport;
    use std::sync::Arc;
    use uuid::Uuid;

    fn library_yaml(uuid: u128, name: &str) -> String {
        format!("uuid: {}\nid: 9\nname: {name}\n", Uuid::from_u128(uuid))
    }

    fn collect(baseline: &[(&str, String)], target: &[(&str, String)], report: TreeDiffReport) -> LibraryChanges {
        let dir = tempfile::tempdir().unwrap();
        for (side, files) in [("baseline", baseline), ("target", target)] {
            for (path, content) in files {
                let full = dir.path().join(side).join(path);
                std::fs::create_dir_all(full.parent().unwrap()).unwrap();
                std::fs::write(full, content).unwrap();
            }
        }
        let ctx = EntityPathContext::build(&report, dir.path().join("baseline"), dir.path().join("target"));
        let reader = YamlEntityReader::<Library>::new();
        let comparator = FieldComparator::<Library>::with_defaults();
        LibraryDriftProcessor::new(&reader, &comparator)
            .collect(&ctx, &CancellationToken::new())
            .unwrap()
    }

    #[test]
    fn test_deleted_library() {
        let changes = collect(
            &[("9/9.yaml", library_yaml(9, "Legacy"))],
            &[],
            TreeDiffReport {
                deleted: vec!["9/9.yaml".to_string()],
                ..TreeDiffReport::default()
            },
        );
        assert_eq!(changes.deleted.len(), 1);
        assert!(changes.added.is_empty());

        let mut builder = DriftBuilder::new(Arc::new(ContentIndex::default()));
        let reader = YamlEntityReader::<Library>::new();
        let comparator = FieldComparator::<Library>::with_defaults();
        LibraryDriftProcessor::new(&reader, &comparator).apply(changes, &mut builder);
        let drift = builder.finish();
        assert!(drift.find_deleted_library(Uuid::from_u128(9)).is_some());
    }

    #[test]
    fn test_renamed_library_is_modified() {
        let changes = collect(
            &[("9/9.yaml", library_yaml(9, "Legacy"))],
            &[("9/9.yaml", library_yaml(9, "Current"))],
            TreeDiffReport {
                modified: vec!["9/9.yaml".to_string()],
                ..TreeDiffReport::default()
            },
        );
        assert_eq!(changes.modified.len(), 1);
        assert_eq!(changes.modified[0].1[0].field, "name");
    }

    #[test]
    fn test_moved_library_folder_pairs_by_uuid() {
        let changes = collect(
            &[("9/9.yaml", library_yaml(9, "Legacy"))],
            &[("10/10.yaml", library_yaml(9, "Legacy"))],
            TreeDiffReport {
                added: vec!["10/10.yaml".to_string()],
                deleted: vec!["9/9.yaml".to_string()],
                ..TreeDiffReport::default()
            },
        );
        assert!(changes.added.is_empty());
        assert!(changes.deleted.is_empty());
        assert!(changes.modified.is_empty());
    }
}
