//! Per-kind drift processors.
//!
//! Each processor turns one entity kind's [`ChangeSet`](crate::paths::ChangeSet)
//! into added, removed and modified records. Reading and comparing happens
//! in `collect`; attaching to the aggregate happens in `apply`.

mod entity;
mod library;

pub use entity::{EntityChanges, EntityDriftProcessor, Located};
pub use library::{LibraryChanges, LibraryDriftProcessor};

use crate::diff::result::UNASSIGNED_LIBRARY;
use crate::error::{DriftError, ErrorContext, Result};
use crate::index::LibraryMetadataSource;
use crate::paths::{EntityPathContext, classify_path};
use crate::reader::{EntityReader, OpenDocuments, SkippedItem, opened};
use crate::utils::CancellationToken;
use rayon::prelude::*;
use uuid::Uuid;

/// Outcome of reading both sides of a modified path.
pub(crate) enum PairRead<T> {
    Both { baseline: T, target: T },
    /// One side is gone; treated as unchanged
    Missing,
    Unreadable(SkippedItem),
}

/// Read a modified pair. Both documents must exist before either is parsed.
pub(crate) fn read_pair<T>(
    reader: &dyn EntityReader<T>,
    baseline: &OpenDocuments,
    target: &OpenDocuments,
    relative: &str,
) -> PairRead<T> {
    let skipped = |err: DriftError| {
        tracing::warn!(path = %relative, reason = %err, "skipping unreadable modified pair");
        PairRead::Unreadable(SkippedItem::new(relative, err.to_string()))
    };

    let texts = baseline
        .read_text(relative)
        .and_then(|b| target.read_text(relative).map(|t| (b, t)));
    let (baseline_text, target_text) = match texts {
        Ok((Some(b), Some(t))) => (b, t),
        Ok(_) => {
            tracing::debug!(path = %relative, "modified pair is missing a side, treated as unchanged");
            return PairRead::Missing;
        }
        Err(err) => return skipped(err),
    };

    let parse = |text: &str| reader.parse_str(text).context(format!("reading {relative}"));
    match (parse(&baseline_text), parse(&target_text)) {
        (Ok(baseline), Ok(target)) => PairRead::Both { baseline, target },
        (Err(err), _) | (_, Err(err)) => skipped(err),
    }
}

/// Read every modified pair in parallel, preserving input order.
///
/// Each worker opens both sides once; only cancellation or a source that
/// cannot be opened fails the batch.
pub(crate) fn read_pairs<T: Send>(
    reader: &dyn EntityReader<T>,
    ctx: &EntityPathContext,
    relatives: &[String],
    cancel: &CancellationToken,
) -> Result<Vec<PairRead<T>>> {
    relatives
        .par_iter()
        .map_init(
            || {
                let baseline = ctx.baseline().open().map_err(|e| e.to_string());
                let target = ctx.target().open().map_err(|e| e.to_string());
                (baseline, target)
            },
            |(baseline, target), relative| {
                cancel.check()?;
                Ok(read_pair(reader, opened(baseline)?, opened(target)?, relative))
            },
        )
        .collect()
}

/// Library that owns a document.
///
/// The document's own `library_uuid` wins; otherwise the library folder in
/// its repository-relative path is looked up. Unresolvable owners land in
/// [`UNASSIGNED_LIBRARY`].
pub(crate) fn owning_library(
    declared: Option<Uuid>,
    relative: &str,
    metadata: &dyn LibraryMetadataSource,
) -> Uuid {
    if let Some(library) = declared {
        return library;
    }
    let from_path = classify_path(relative)
        .ok()
        .and_then(|info| info.library_key)
        .and_then(|key| metadata.library_for_folder(&key));

    from_path.unwrap_or_else(|| {
        tracing::error!(path = %relative, "cannot resolve owning library");
        UNASSIGNED_LIBRARY
    })
}
