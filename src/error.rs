//! Unified error types for drift-tools.
//!
//! Validation errors are surfaced to the caller before any work is done.
//! Per-item read and parse failures never reach this type's callers at the
//! pipeline level: processors log and skip them.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for drift-tools operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DriftError {
    /// Errors reading or decoding entity documents
    #[error("Failed to read entity: {context}")]
    Read {
        context: String,
        #[source]
        source: ReadErrorKind,
    },

    /// Errors while walking or comparing repository trees
    #[error("Tree comparison failed: {context}")]
    Tree {
        context: String,
        #[source]
        source: TreeErrorKind,
    },

    /// Errors loading or querying the id index
    #[error("Index lookup failed: {context}")]
    Index {
        context: String,
        #[source]
        source: IndexErrorKind,
    },

    /// IO errors with context
    #[error("IO error at {path:?}: {message}")]
    Io {
        path: Option<PathBuf>,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration errors
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The run was cancelled before the aggregate was complete
    #[error("Drift computation cancelled")]
    Cancelled,
}

/// Specific entity read error kinds
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ReadErrorKind {
    #[error("Invalid YAML document: {0}")]
    InvalidYaml(String),

    #[error("Invalid JSON document: {0}")]
    InvalidJson(String),

    #[error("Missing required field: {field} in {context}")]
    MissingField { field: String, context: String },

    #[error("Malformed mapping filename '{name}': {reason}")]
    MalformedMappingName { name: String, reason: String },

    #[error("Document is not valid UTF-8: {0}")]
    InvalidEncoding(String),
}

/// Specific tree comparison error kinds
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TreeErrorKind {
    #[error("Git object store error: {0}")]
    Git(#[from] git2::Error),

    #[error("Revision not found: {0}")]
    RevisionNotFound(String),

    #[error("Snapshot could not be opened: {0}")]
    SnapshotUnavailable(String),

    #[error("Worker pool construction failed: {0}")]
    WorkerPool(String),
}

/// Specific index error kinds
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum IndexErrorKind {
    #[error("Index file not found: {0}")]
    NotFound(String),

    #[error("Invalid index document: {0}")]
    InvalidDocument(String),

    #[error("Unknown library: {0}")]
    UnknownLibrary(String),
}

// ============================================================================
// Result type alias
// ============================================================================

/// Convenient Result type for drift-tools operations
pub type Result<T> = std::result::Result<T, DriftError>;

// ============================================================================
// Error construction helpers
// ============================================================================

impl DriftError {
    /// Create a read error with context
    pub fn read(context: impl Into<String>, source: ReadErrorKind) -> Self {
        Self::Read {
            context: context.into(),
            source,
        }
    }

    /// Create a read error for a malformed mapping filename
    pub fn malformed_mapping(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::read(
            "parsing mapping filename",
            ReadErrorKind::MalformedMappingName {
                name: name.into(),
                reason: reason.into(),
            },
        )
    }

    /// Create a read error for a missing field
    pub fn missing_field(field: impl Into<String>, context: impl Into<String>) -> Self {
        Self::read(
            "missing required field",
            ReadErrorKind::MissingField {
                field: field.into(),
                context: context.into(),
            },
        )
    }

    /// Create a tree error with context
    pub fn tree(context: impl Into<String>, source: TreeErrorKind) -> Self {
        Self::Tree {
            context: context.into(),
            source,
        }
    }

    /// Create an index error with context
    pub fn index(context: impl Into<String>, source: IndexErrorKind) -> Self {
        Self::Index {
            context: context.into(),
            source,
        }
    }

    /// Create an IO error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        let message = format!("{source}");
        Self::Io {
            path: Some(path),
            message,
            source,
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether this error came from a cancellation request
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

// ============================================================================
// Conversions from existing error types
// ============================================================================

impl From<std::io::Error> for DriftError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            path: None,
            message: format!("{err}"),
            source: err,
        }
    }
}

impl From<git2::Error> for DriftError {
    fn from(err: git2::Error) -> Self {
        Self::tree("git operation", TreeErrorKind::Git(err))
    }
}

impl From<serde_yaml_ng::Error> for DriftError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        Self::read(
            "YAML deserialization",
            ReadErrorKind::InvalidYaml(err.to_string()),
        )
    }
}

impl From<serde_json::Error> for DriftError {
    fn from(err: serde_json::Error) -> Self {
        Self::read(
            "JSON deserialization",
            ReadErrorKind::InvalidJson(err.to_string()),
        )
    }
}

// ============================================================================
// Error context extension trait
// ============================================================================

/// Extension trait for adding context to errors.
///
/// Context strings are chained outermost-first, so an error raised while
/// reading a component inside a library scan renders as
/// `"scanning library 7: reading 7/components/12.yaml: ..."`.
pub trait ErrorContext<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context from a closure (lazy evaluation).
    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: Into<DriftError>> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        let ctx: String = context.into();
        self.map_err(|e| add_context_to_error(e.into(), &ctx))
    }

    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| {
            let ctx: String = f().into();
            add_context_to_error(e.into(), &ctx)
        })
    }
}

/// Add context to an error, chaining with any existing context.
fn add_context_to_error(err: DriftError, new_ctx: &str) -> DriftError {
    match err {
        DriftError::Read {
            context: existing,
            source,
        } => DriftError::Read {
            context: chain_context(new_ctx, &existing),
            source,
        },
        DriftError::Tree {
            context: existing,
            source,
        } => DriftError::Tree {
            context: chain_context(new_ctx, &existing),
            source,
        },
        DriftError::Index {
            context: existing,
            source,
        } => DriftError::Index {
            context: chain_context(new_ctx, &existing),
            source,
        },
        DriftError::Io {
            path,
            message,
            source,
        } => DriftError::Io {
            path,
            message: chain_context(new_ctx, &message),
            source,
        },
        DriftError::Config(msg) => DriftError::Config(chain_context(new_ctx, &msg)),
        DriftError::Validation(msg) => DriftError::Validation(chain_context(new_ctx, &msg)),
        DriftError::Cancelled => DriftError::Cancelled,
    }
}

/// Chain two context strings together.
fn chain_context(new: &str, existing: &str) -> String {
    if existing.is_empty() {
        new.to_string()
    } else {
        format!("{new}: {existing}")
    }
}

/// Extension trait for Option types to convert to errors with context.
pub trait OptionContext<T> {
    /// Convert None to an error with the given context.
    fn context_none(self, context: impl Into<String>) -> Result<T>;

    /// Convert None to an error with context from a closure.
    fn with_context_none<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T> OptionContext<T> for Option<T> {
    fn context_none(self, context: impl Into<String>) -> Result<T> {
        self.ok_or_else(|| DriftError::Validation(context.into()))
    }

    fn with_context_none<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.ok_or_else(|| DriftError::Validation(f().into()))
    }
}
