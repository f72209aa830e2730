//! Error types
//!
//! Tokenizing and highlighting never fail: malformed prompts are rendered, not rejected.
//! Errors only come from the edges: building resources, loading configuration, scanning
//! name folders and producing output formats.

use std::path::PathBuf;
use thiserror::Error;

/// Invalid highlighting resources
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    #[error("color palette is empty")]
    EmptyColors,
    #[error("color '{0}' has no RGB channels")]
    InvalidColor(String),
    #[error("error color is empty")]
    EmptyErrorColor,
    #[error("unknown highlight type '{0}' (expected 'strength' or 'nesting')")]
    UnknownHighlightType(String),
}

/// Failure while collecting names from a model folder
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("'{0}' is not a directory")]
    NotADirectory(PathBuf),
    #[error("failed to scan '{path}': {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: ignore::Error,
    },
}

/// Failure while selecting or producing an output format
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("format '{0}' not found")]
    UnknownFormat(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Top-level error for callers that drive the whole pipeline
#[derive(Debug, Error)]
pub enum HighlightError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Resource(#[from] ResourceError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
