//! Drift engine: tree diff, path context, per-kind processors, mapping
//! reconciliation.

use super::builder::DriftBuilder;
use super::fields::FieldPolicy;
use super::mappings::MappingReconciler;
use super::processors::{EntityDriftProcessor, LibraryDriftProcessor};
use super::result::Drift;
use super::traits::DriftProcessor;
use crate::error::{DriftError, Result, TreeErrorKind};
use crate::index::{IndexService, LibraryMetadataSource};
use crate::model::DomainEntityType;
use crate::paths::EntityPathContext;
use crate::reader::{DocumentSource, EntityReaders};
use crate::scope::{ScopedDiff, ScopedDiffOrchestrator, ScopedDiffRequest};
use crate::tree::{TreeDiffReport, TreeDiffer};
use crate::utils::{CancellationToken, worker_pool};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

/// Computes a [`Drift`] between a baseline and a target repository.
pub struct DriftEngine {
    index: Arc<dyn IndexService>,
    metadata: Arc<dyn LibraryMetadataSource>,
    readers: EntityReaders,
    fields: FieldPolicy,
    differ: TreeDiffer,
    ignore_names: HashSet<String>,
    max_workers: usize,
}

impl DriftEngine {
    /// Create an engine with YAML readers and default field allow-lists
    pub fn new(index: Arc<dyn IndexService>, metadata: Arc<dyn LibraryMetadataSource>) -> Self {
        Self {
            index,
            metadata,
            readers: EntityReaders::yaml(),
            fields: FieldPolicy::default(),
            differ: TreeDiffer::default(),
            ignore_names: HashSet::new(),
            max_workers: 0,
        }
    }

    /// Create an engine whose index also serves library metadata
    pub fn from_index<I>(index: Arc<I>) -> Self
    where
        I: IndexService + LibraryMetadataSource + 'static,
    {
        let metadata: Arc<dyn LibraryMetadataSource> = index.clone();
        Self::new(index, metadata)
    }

    /// Replace the entity readers
    #[must_use]
    pub fn with_readers(mut self, readers: EntityReaders) -> Self {
        self.readers = readers;
        self
    }

    /// Set the compared fields per entity kind
    #[must_use]
    pub fn with_field_policy(mut self, fields: FieldPolicy) -> Self {
        self.fields = fields;
        self
    }

    #[must_use]
    pub const fn with_differ(mut self, differ: TreeDiffer) -> Self {
        self.differ = differ;
        self
    }

    /// Names skipped at any depth by whole-folder comparisons
    #[must_use]
    pub fn with_ignore_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Upper bound on worker threads (0 = available parallelism)
    #[must_use]
    pub const fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    /// Run the whole pipeline for `request`.
    #[tracing::instrument(skip_all, fields(all = request.libraries.is_all()))]
    pub fn compute(&self, request: &ScopedDiffRequest, cancel: &CancellationToken) -> Result<Drift> {
        let orchestrator = ScopedDiffOrchestrator::new(self.index.as_ref(), self.metadata.as_ref())
            .with_differ(self.differ)
            .with_ignore_names(self.ignore_names.clone())
            .with_max_workers(self.max_workers);
        let ScopedDiff {
            report,
            libraries,
            baseline,
            target,
        } = orchestrator.run(request, cancel)?;

        self.compute_from_report(&report, baseline, target, &libraries, cancel)
    }

    /// Build the aggregate from an already merged tree report.
    ///
    /// Documents named by the report are read from `baseline` and `target`,
    /// which should be the sides the report was computed from.
    ///
    /// Collection runs concurrently per entity kind; the builder is then fed
    /// on this thread in a fixed order. A cancelled run returns
    /// [`DriftError::Cancelled`] and the partial aggregate is dropped.
    #[tracing::instrument(skip_all, fields(paths = report.total()))]
    pub fn compute_from_report(
        &self,
        report: &TreeDiffReport,
        baseline: impl Into<DocumentSource>,
        target: impl Into<DocumentSource>,
        batch_libraries: &[Uuid],
        cancel: &CancellationToken,
    ) -> Result<Drift> {
        cancel.check()?;
        let ctx = EntityPathContext::build(report, baseline, target);

        let metadata = self.metadata.as_ref();
        let libraries = LibraryDriftProcessor::new(self.readers.libraries.as_ref(), &self.fields.library);
        let components =
            EntityDriftProcessor::new(self.readers.components.as_ref(), &self.fields.component, metadata);
        let threats = EntityDriftProcessor::new(self.readers.threats.as_ref(), &self.fields.threat, metadata);
        let security_requirements = EntityDriftProcessor::new(
            self.readers.security_requirements.as_ref(),
            &self.fields.security_requirement,
            metadata,
        );
        let test_cases =
            EntityDriftProcessor::new(self.readers.test_cases.as_ref(), &self.fields.test_case, metadata);
        let properties =
            EntityDriftProcessor::new(self.readers.properties.as_ref(), &self.fields.property, metadata);
        let mappings = MappingReconciler::new(self.index.as_ref(), batch_libraries);

        let (mut c_lib, mut c_comp, mut c_threat, mut c_sr, mut c_tc, mut c_prop, mut c_map) =
            (None, None, None, None, None, None, None);
        let pool = worker_pool(self.max_workers, "drift-read")?;
        pool.scope(|s| {
            s.spawn(|_| c_lib = Some(libraries.collect(&ctx, cancel)));
            s.spawn(|_| c_comp = Some(components.collect(&ctx, cancel)));
            s.spawn(|_| c_threat = Some(threats.collect(&ctx, cancel)));
            s.spawn(|_| c_sr = Some(security_requirements.collect(&ctx, cancel)));
            s.spawn(|_| c_tc = Some(test_cases.collect(&ctx, cancel)));
            s.spawn(|_| c_prop = Some(properties.collect(&ctx, cancel)));
            s.spawn(|_| c_map = Some(mappings.collect(&ctx, cancel)));
        });

        let mut builder = DriftBuilder::new(Arc::clone(&self.metadata));
        apply(&libraries, c_lib, &mut builder)?;
        apply(&components, c_comp, &mut builder)?;
        apply(&threats, c_threat, &mut builder)?;
        apply(&security_requirements, c_sr, &mut builder)?;
        apply(&test_cases, c_tc, &mut builder)?;
        apply(&properties, c_prop, &mut builder)?;
        apply(&mappings, c_map, &mut builder)?;

        for entity_type in DomainEntityType::GLOBAL {
            builder.set_global(entity_type, ctx.relative_changes(entity_type));
        }
        builder.record_kind_changes(report.kind_changed.iter().cloned());
        cancel.check()?;

        let drift = builder.finish();
        tracing::info!(
            libraries_added = drift.summary.libraries_added,
            libraries_deleted = drift.summary.libraries_deleted,
            libraries_modified = drift.summary.libraries_modified,
            skipped = drift.summary.skipped,
            "drift computed"
        );
        Ok(drift)
    }
}

/// Feed one stage's collected output into the builder.
fn apply<P: DriftProcessor>(
    processor: &P,
    collected: Option<Result<P::Collected>>,
    builder: &mut DriftBuilder,
) -> Result<()> {
    let collected = collected.unwrap_or_else(|| {
        Err(DriftError::tree(
            processor.name(),
            TreeErrorKind::WorkerPool("collection stage did not run".to_string()),
        ))
    })?;
    tracing::trace!(stage = processor.name(), "applying stage");
    processor.apply(collected, builder);
    Ok(())
}

impl std::fmt::Debug for DriftEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriftEngine")
            .field("fields", &self.fields)
            .field("differ", &self.differ)
            .field("ignore_names", &self.ignore_names)
            .field("max_workers", &self.max_workers)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::ContentIndex;
    use std::path::Path;

    #[test]
    fn test_cancelled_run_publishes_nothing() {
        let engine = DriftEngine::from_index(Arc::new(ContentIndex::default()));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = engine
            .compute_from_report(&TreeDiffReport::new(), Path::new("/b"), Path::new("/t"), &[], &cancel)
            .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_empty_report_has_no_drift() {
        let engine = DriftEngine::from_index(Arc::new(ContentIndex::default())).with_max_workers(2);
        let drift = engine
            .compute_from_report(
                &TreeDiffReport::new(),
                Path::new("/b"),
                Path::new("/t"),
                &[],
                &CancellationToken::new(),
            )
            .unwrap();
        assert!(!drift.has_drift());
    }
}
