// This module defines the error type for the dispatch generator using the thiserror crate.
// GenError covers every way a generation run can fail: a structurally corrupt algorithm
// catalog, a malformed signature registry, an operation the registry does not know, a
// restriction token outside the closed vocabulary, an unknown blocking mode, unbalanced
// indentation markers in the token stream and I/O failures of the command line driver.
// All of them are fatal; a run either produces both artifacts or none.

//! Error types for the dispatch generator.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for a generation run.
#[derive(Error, Debug)]
pub enum GenError {
    #[error("catalog line {line}: {reason}")]
    Catalog { line: usize, reason: String },

    #[error("registry line {line}: {reason}")]
    Registry { line: usize, reason: String },

    #[error("operation `{name}` is not in the signature registry")]
    UnknownOperation { name: String },

    #[error("unsupported restriction `{token}` on algorithm `{algorithm}`")]
    UnsupportedRestriction { algorithm: String, token: String },

    #[error("algorithm `{algorithm}`: {reason}")]
    InvalidDescriptor { algorithm: String, reason: String },

    #[error("unknown blocking mode `{mode}`")]
    UnknownBlockingMode { mode: String },

    #[error("unbalanced indentation: {reason}")]
    Unbalanced { reason: String },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for generator operations.
pub type GenResult<T> = Result<T, GenError>;

impl GenError {
    pub(crate) fn catalog(line: usize, reason: impl Into<String>) -> Self {
        GenError::Catalog {
            line,
            reason: reason.into(),
        }
    }

    pub(crate) fn registry(line: usize, reason: impl Into<String>) -> Self {
        GenError::Registry {
            line,
            reason: reason.into(),
        }
    }
}
