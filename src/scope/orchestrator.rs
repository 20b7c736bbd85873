//! Library-scoped diff orchestration.

use super::request::{LibrarySelection, ScopedDiffRequest};
use crate::error::{DriftError, ErrorContext, Result};
use crate::index::{IndexService, LibraryMetadataSource};
use crate::model::{GLOBAL_FOLDER, MappingFamily, MappingOwner};
use crate::reader::DocumentSource;
use crate::tree::{SnapshotHandle, SnapshotPair, TreeDiffReport, TreeDiffer};
use crate::utils::{CancellationToken, worker_count, worker_pool};
use rayon::prelude::*;
use std::collections::{BTreeSet, HashSet};
use uuid::Uuid;

/// Folders and id prefixes a scoped run compares.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryScope {
    /// Libraries that resolved to a folder key
    pub libraries: Vec<Uuid>,
    /// Library folder keys plus the global folder
    pub folders: Vec<String>,
    pub component_prefixes: HashSet<String>,
    pub threat_prefixes: HashSet<String>,
    pub security_requirement_ids: BTreeSet<i64>,
}

impl LibraryScope {
    /// Comparison units for this scope: one per folder, one per mapping family.
    #[must_use]
    pub fn units(&self) -> Vec<DiffUnit> {
        let mut units: Vec<DiffUnit> = self.folders.iter().cloned().map(DiffUnit::Folder).collect();
        for family in MappingFamily::ALL {
            let prefixes = match family.owner() {
                MappingOwner::Component => &self.component_prefixes,
                MappingOwner::Threat => &self.threat_prefixes,
            };
            if !prefixes.is_empty() {
                units.push(DiffUnit::Prefixed {
                    family,
                    prefixes: prefixes.clone(),
                });
            }
        }
        units
    }
}

/// One independent tree comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffUnit {
    /// Full recursive comparison of one top-level folder
    Folder(String),
    /// Prefix-filtered comparison of one mapping folder
    Prefixed {
        family: MappingFamily,
        prefixes: HashSet<String>,
    },
    /// Whole repository, honouring the exclusion set
    Everything,
}

impl DiffUnit {
    fn label(&self) -> String {
        match self {
            Self::Folder(folder) => format!("folder '{folder}'"),
            Self::Prefixed { family, .. } => format!("mapping folder '{}'", family.relative_folder()),
            Self::Everything => "repository".to_string(),
        }
    }
}

/// Result of a scoped diff: the merged report, the libraries it covers and
/// where each side's documents are read from.
#[derive(Debug, Clone)]
pub struct ScopedDiff {
    pub report: TreeDiffReport,
    pub libraries: Vec<Uuid>,
    pub baseline: DocumentSource,
    pub target: DocumentSource,
}

/// Drives the tree differ across a library scope.
pub struct ScopedDiffOrchestrator<'a> {
    index: &'a dyn IndexService,
    metadata: &'a dyn LibraryMetadataSource,
    differ: TreeDiffer,
    ignore: HashSet<String>,
    max_workers: usize,
}

impl<'a> ScopedDiffOrchestrator<'a> {
    pub fn new(index: &'a dyn IndexService, metadata: &'a dyn LibraryMetadataSource) -> Self {
        Self {
            index,
            metadata,
            differ: TreeDiffer::default(),
            ignore: HashSet::new(),
            max_workers: 0,
        }
    }

    #[must_use]
    pub const fn with_differ(mut self, differ: TreeDiffer) -> Self {
        self.differ = differ;
        self
    }

    /// Names skipped at any depth by folder comparisons.
    #[must_use]
    pub fn with_ignore_names(mut self, ignore: HashSet<String>) -> Self {
        self.ignore = ignore;
        self
    }

    /// Upper bound on concurrent comparisons (0 = available parallelism).
    #[must_use]
    pub const fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    /// Resolve library UUIDs to folder keys and owned id prefixes.
    ///
    /// Unresolvable libraries are logged and left out; if none resolve the
    /// request is rejected.
    pub fn resolve_scope(&self, libraries: &[Uuid]) -> Result<LibraryScope> {
        let mut scope = LibraryScope::default();
        let mut seen = HashSet::new();

        for &library in libraries {
            if !seen.insert(library) {
                continue;
            }
            let Some(folder) = self.metadata.folder_key(library) else {
                tracing::error!(%library, "library has no folder key; leaving it out of the run");
                continue;
            };
            scope.libraries.push(library);
            scope.folders.push(folder);
            scope
                .component_prefixes
                .extend(self.index.owned_component_ids(library).iter().map(ToString::to_string));
            scope
                .threat_prefixes
                .extend(self.index.owned_threat_ids(library).iter().map(ToString::to_string));
            scope
                .security_requirement_ids
                .extend(self.index.owned_security_requirement_ids(library));
        }

        if scope.libraries.is_empty() {
            return Err(DriftError::validation(
                "none of the requested libraries could be resolved",
            ));
        }
        scope.folders.push(GLOBAL_FOLDER.to_string());

        tracing::debug!(
            libraries = scope.libraries.len(),
            components = scope.component_prefixes.len(),
            threats = scope.threat_prefixes.len(),
            security_requirements = scope.security_requirement_ids.len(),
            "library scope resolved"
        );
        Ok(scope)
    }

    /// Run the scoped diff described by `request`.
    #[tracing::instrument(skip_all, fields(uncommitted = request.include_uncommitted))]
    pub fn run(&self, request: &ScopedDiffRequest, cancel: &CancellationToken) -> Result<ScopedDiff> {
        request.validate()?;
        cancel.check()?;

        let (units, libraries) = match &request.libraries {
            LibrarySelection::All => (vec![DiffUnit::Everything], self.metadata.libraries()),
            LibrarySelection::Only(libraries) => {
                let scope = self.resolve_scope(libraries)?;
                (scope.units(), scope.libraries)
            }
        };

        let baseline_source = request.baseline_source();
        let target_source = request.target_source();
        let pair = SnapshotPair::resolve(&baseline_source, &target_source)?;
        let report = self.run_units(&pair, &units, cancel)?;

        tracing::info!(
            units = units.len(),
            added = report.added.len(),
            deleted = report.deleted.len(),
            modified = report.modified.len(),
            kind_changed = report.kind_changed.len(),
            "tree comparison finished"
        );
        // documents must come from the trees that were compared
        Ok(ScopedDiff {
            report,
            libraries,
            baseline: DocumentSource::for_snapshot(&baseline_source, &pair.baseline),
            target: DocumentSource::for_snapshot(&target_source, &pair.target),
        })
    }

    /// Run independent comparison units on the worker pool and merge the
    /// partial reports in unit order.
    pub fn run_units(
        &self,
        pair: &SnapshotPair,
        units: &[DiffUnit],
        cancel: &CancellationToken,
    ) -> Result<TreeDiffReport> {
        let workers = worker_count(self.max_workers).min(units.len().max(1));
        let pool = worker_pool(workers, "drift-tree")?;

        let parts: Vec<TreeDiffReport> = pool.install(|| {
            units
                .par_iter()
                .map(|unit| {
                    cancel.check()?;
                    self.run_unit(&pair.baseline, &pair.target, unit)
                        .with_context(|| unit.label())
                })
                .collect::<Result<Vec<_>>>()
        })?;
        cancel.check()?;

        Ok(TreeDiffReport::merge_all(parts))
    }

    fn run_unit(
        &self,
        baseline: &SnapshotHandle,
        target: &SnapshotHandle,
        unit: &DiffUnit,
    ) -> Result<TreeDiffReport> {
        // each unit opens its own handles; repositories are not shared across threads
        let baseline = baseline.open()?;
        let target = target.open()?;
        let base_root = baseline.root()?;
        let target_root = target.root()?;

        match unit {
            DiffUnit::Folder(folder) if self.ignore.is_empty() => {
                self.differ.compare_full(&base_root, &target_root, folder)
            }
            DiffUnit::Folder(folder) => {
                self.differ
                    .compare_excluding(&base_root, &target_root, folder, &self.ignore)
            }
            DiffUnit::Prefixed { family, prefixes } => self.differ.compare_prefixed(
                &base_root,
                &target_root,
                &family.relative_folder(),
                prefixes,
            ),
            DiffUnit::Everything => {
                self.differ
                    .compare_excluding(&base_root, &target_root, "", &self.ignore)
            }
        }
    }
}
