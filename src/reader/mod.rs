//! Entity reader contract and the YAML implementation.
//!
//! A reader turns a document into an entity. Documents are addressed by
//! repository-relative path inside a [`DocumentSource`], which is either a
//! directory on disk or a snapshot tree. "Not found" is not an error
//! (`read_one` returns `None`); unreadable or undecodable documents are.

mod source;
mod yaml;

pub use source::{DocumentSource, OpenDocuments};
pub use yaml::YamlEntityReader;

pub(crate) use source::opened;

use crate::error::{ErrorContext, Result};
use crate::model::{Component, Library, Property, SecurityRequirement, TestCase, Threat};
use crate::utils::CancellationToken;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A document that was left out of the result, with the logged cause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedItem {
    pub path: String,
    pub reason: String,
}

impl SkippedItem {
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Entities read by one batch call, plus the documents that were skipped.
#[derive(Debug, Clone)]
pub struct BatchRead<T> {
    pub entities: Vec<(String, T)>,
    pub skipped: Vec<SkippedItem>,
}

impl<T> Default for BatchRead<T> {
    fn default() -> Self {
        Self {
            entities: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

/// Reads entity documents of one kind.
pub trait EntityReader<T>: Send + Sync {
    /// Decode one document.
    fn parse_str(&self, content: &str) -> Result<T>;

    /// Read one document. Returns `Ok(None)` when it does not exist.
    fn read_one(&self, docs: &OpenDocuments, relative: &str) -> Result<Option<T>> {
        let Some(content) = docs.read_text(relative)? else {
            return Ok(None);
        };
        self.parse_str(&content)
            .with_context(|| format!("reading {relative}"))
            .map(Some)
    }

    /// Read a batch of documents in parallel.
    ///
    /// Per-document failures are logged and reported in
    /// [`BatchRead::skipped`]; only cancellation or a source that cannot be
    /// opened fails the batch. Output order follows input order.
    fn read_many(
        &self,
        source: &DocumentSource,
        paths: &[String],
        cancel: &CancellationToken,
    ) -> Result<BatchRead<T>>
    where
        T: Send,
    {
        let outcomes: Vec<(String, std::result::Result<T, String>)> = paths
            .par_iter()
            .map_init(
                || source.open().map_err(|e| e.to_string()),
                |docs, path| {
                    cancel.check()?;
                    let outcome = match self.read_one(opened(docs)?, path) {
                        Ok(Some(entity)) => Ok(entity),
                        Ok(None) => Err("document not found".to_string()),
                        Err(err) => Err(err.to_string()),
                    };
                    Ok((path.clone(), outcome))
                },
            )
            .collect::<Result<_>>()?;

        let mut batch = BatchRead::default();
        for (path, outcome) in outcomes {
            match outcome {
                Ok(entity) => batch.entities.push((path, entity)),
                Err(reason) => {
                    tracing::warn!(path = %path, %source, %reason, "skipping unreadable document");
                    batch.skipped.push(SkippedItem::new(path, reason));
                }
            }
        }
        Ok(batch)
    }
}

/// One reader per entity kind.
#[derive(Clone)]
pub struct EntityReaders {
    pub libraries: Arc<dyn EntityReader<Library>>,
    pub components: Arc<dyn EntityReader<Component>>,
    pub threats: Arc<dyn EntityReader<Threat>>,
    pub security_requirements: Arc<dyn EntityReader<SecurityRequirement>>,
    pub test_cases: Arc<dyn EntityReader<TestCase>>,
    pub properties: Arc<dyn EntityReader<Property>>,
}

impl EntityReaders {
    /// YAML readers for every kind.
    #[must_use]
    pub fn yaml() -> Self {
        Self {
            libraries: Arc::new(YamlEntityReader::<Library>::new()),
            components: Arc::new(YamlEntityReader::<Component>::new()),
            threats: Arc::new(YamlEntityReader::<Threat>::new()),
            security_requirements: Arc::new(YamlEntityReader::<SecurityRequirement>::new()),
            test_cases: Arc::new(YamlEntityReader::<TestCase>::new()),
            properties: Arc::new(YamlEntityReader::<Property>::new()),
        }
    }
}

impl Default for EntityReaders {
    fn default() -> Self {
        Self::yaml()
    }
}

impl std::fmt::Debug for EntityReaders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityReaders").finish_non_exhaustive()
    }
}
