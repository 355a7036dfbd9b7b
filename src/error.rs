//! Unified error types for sbom-merge.
//!
//! Fatal conditions (unparseable documents, missing anchors, unsupported
//! dialects) surface as [`SbomMergeError`]. Conditions the merge engine can
//! recover from are logged and never reach this type.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for sbom-merge operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SbomMergeError {
    /// Errors while reading an SBOM document or one of its identifiers
    #[error("Failed to parse SBOM: {context}")]
    Parse {
        context: String,
        #[source]
        source: ParseErrorKind,
    },

    /// Errors while merging two documents
    #[error("Merge failed: {context}")]
    Merge {
        context: String,
        #[source]
        source: MergeErrorKind,
    },

    /// Errors while rewriting parent image provenance
    #[error("Provenance rewrite failed: {context}")]
    Provenance {
        context: String,
        #[source]
        source: ProvenanceErrorKind,
    },

    /// IO errors with context
    #[error("IO error at {path:?}: {message}")]
    Io {
        path: Option<PathBuf>,
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Specific parse error kinds
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ParseErrorKind {
    #[error("Unknown SBOM format - expected CycloneDX or SPDX markers")]
    UnknownFormat,

    #[error("Unsupported format version: {version} (supported: {supported})")]
    UnsupportedVersion { version: String, supported: String },

    #[error("Invalid JSON structure: {0}")]
    InvalidJson(String),

    #[error("Missing required field: {field} in {context}")]
    MissingField { field: String, context: String },

    #[error("Malformed PURL: {purl} - {reason}")]
    InvalidPurl { purl: String, reason: String },

    #[error("Malformed image reference: {reference} - {reason}")]
    InvalidImageReference { reference: String, reason: String },

    #[error("Unknown SBOM flavour '{0}' (expected cachi2 or syft)")]
    InvalidFlavour(String),
}

/// Specific merge error kinds
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum MergeErrorKind {
    #[error("Resolver component '{name}' has no purl")]
    MissingPurl { name: String },

    #[error("No DESCRIBES relationship found")]
    MissingDescribes,

    #[error("Cannot infer {role} element, candidates: {}", .candidates.join(", "))]
    AmbiguousAnchor {
        role: &'static str,
        candidates: Vec<String>,
    },

    #[error("Element '{element}' is described but also has incoming relationships")]
    CyclicGraph { element: String },

    #[error("Cannot merge a {left} document with a {right} document")]
    FormatMismatch { left: String, right: String },

    #[error("Unsupported combination of inputs: {0}")]
    UnsupportedCombination(String),

    #[error("At least two SBOMs are required, got {0}")]
    NotEnoughInputs(usize),
}

/// Specific provenance error kinds
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ProvenanceErrorKind {
    #[error("Document has no DESCRIBES relationship to identify itself")]
    MissingSelfReference,

    #[error("Component SBOM has no DESCENDANT_OF relationship naming its parent image")]
    MissingParentLink,

    #[error("Dockerfile has no stages with pullspecs")]
    NoBaseImages,
}

// ============================================================================
// Result type alias
// ============================================================================

/// Convenient Result type for sbom-merge operations
pub type Result<T> = std::result::Result<T, SbomMergeError>;

// ============================================================================
// Error construction helpers
// ============================================================================

impl SbomMergeError {
    /// Create a parse error with context
    pub fn parse(context: impl Into<String>, source: ParseErrorKind) -> Self {
        Self::Parse {
            context: context.into(),
            source,
        }
    }

    /// Create a parse error for missing field
    pub fn missing_field(field: impl Into<String>, context: impl Into<String>) -> Self {
        Self::parse(
            "missing required field",
            ParseErrorKind::MissingField {
                field: field.into(),
                context: context.into(),
            },
        )
    }

    /// Create a parse error for a purl that does not follow the purl grammar
    pub fn invalid_purl(purl: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::parse(
            "reading package URL",
            ParseErrorKind::InvalidPurl {
                purl: purl.into(),
                reason: reason.into(),
            },
        )
    }

    /// Create a merge error with context
    pub fn merge(context: impl Into<String>, source: MergeErrorKind) -> Self {
        Self::Merge {
            context: context.into(),
            source,
        }
    }

    /// Create a merge error for a relationship graph without DESCRIBES
    pub fn missing_describes(context: impl Into<String>) -> Self {
        Self::merge(context, MergeErrorKind::MissingDescribes)
    }

    /// Create a provenance error with context
    pub fn provenance(context: impl Into<String>, source: ProvenanceErrorKind) -> Self {
        Self::Provenance {
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
}

// ============================================================================
// Conversions from existing error types
// ============================================================================

impl From<std::io::Error> for SbomMergeError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            path: None,
            message: format!("{err}"),
            source: err,
        }
    }
}

impl From<serde_json::Error> for SbomMergeError {
    fn from(err: serde_json::Error) -> Self {
        Self::parse(
            "JSON deserialization",
            ParseErrorKind::InvalidJson(err.to_string()),
        )
    }
}

// ============================================================================
// Error context extension trait
// ============================================================================

/// Extension trait for adding context to errors.
///
/// Context strings are chained so the final message reads from the
/// outermost operation inwards.
///
/// # Example
///
/// ```ignore
/// use sbom_merge::error::ErrorContext;
///
/// let anchors = RelationshipGraph::new(&doc.relationships)
///     .anchors()
///     .context("incoming document")?;
/// ```
pub trait ErrorContext<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context from a closure, evaluated only on error.
    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: Into<SbomMergeError>> ErrorContext<T> for std::result::Result<T, E> {
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
fn add_context_to_error(err: SbomMergeError, new_ctx: &str) -> SbomMergeError {
    match err {
        SbomMergeError::Parse {
            context: existing,
            source,
        } => SbomMergeError::Parse {
            context: chain_context(new_ctx, &existing),
            source,
        },
        SbomMergeError::Merge {
            context: existing,
            source,
        } => SbomMergeError::Merge {
            context: chain_context(new_ctx, &existing),
            source,
        },
        SbomMergeError::Provenance {
            context: existing,
            source,
        } => SbomMergeError::Provenance {
            context: chain_context(new_ctx, &existing),
            source,
        },
        SbomMergeError::Io {
            path,
            message,
            source,
        } => SbomMergeError::Io {
            path,
            message: chain_context(new_ctx, &message),
            source,
        },
    }
}

/// Chain two context strings together as "`new`: `existing`".
fn chain_context(new: &str, existing: &str) -> String {
    if existing.is_empty() {
        new.to_string()
    } else {
        format!("{new}: {existing}")
    }
}
