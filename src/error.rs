//! Centralized error types for msgshell.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the msgshell library.
#[derive(Error, Debug)]
pub enum MsgError {
    /// I/O error with the associated file path.
    #[error("I/O error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The specified file does not exist.
    #[error("MSG file not found: {0}")]
    FileNotFound(PathBuf),

    /// The compound file container is invalid (bad signature, broken FAT chain, ...).
    #[error("Invalid compound file: {0}")]
    ContainerFormat(#[source] std::io::Error),

    /// A required directory or document entry is absent.
    #[error("Entry '{name}' not found in '{directory}'")]
    MissingEntry { directory: String, name: String },

    /// An entry exists but is a directory where a document was expected.
    #[error("Entry '{0}' is not a document")]
    NotADocument(String),

    /// An entry exists but is a document where a directory was expected.
    #[error("Entry '{0}' is not a directory")]
    NotADirectory(String),

    /// The fixed header of a property stream is shorter than its layout requires.
    #[error("Malformed header in '{stream}': need {needed} bytes, {available} available")]
    MalformedHeader {
        stream: String,
        needed: usize,
        available: usize,
    },

    /// A property record ran past the end of its stream.
    #[error("Truncated property record in '{stream}' at offset {offset}: {remaining} byte(s) left")]
    TruncatedRecord {
        stream: String,
        offset: u64,
        remaining: usize,
    },

    /// A variable-size property references a stream that does not exist.
    #[error("Auxiliary stream '{name}' missing from '{directory}'")]
    MissingAuxiliaryStream { directory: String, name: String },

    /// An auxiliary stream exists but its contents do not fit the property type.
    #[error("Invalid auxiliary stream '{name}': {reason}")]
    InvalidAuxiliaryStream { name: String, reason: String },

    /// Embedded messages are nested deeper than the configured limit.
    #[error("Embedded messages nested deeper than {limit} levels")]
    NestingTooDeep { limit: usize },
}

/// Convenience alias for `Result<T, MsgError>`.
pub type Result<T> = std::result::Result<T, MsgError>;

impl MsgError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Map an `io::Error` from opening a file, turning `NotFound` into [`MsgError::FileNotFound`].
    pub fn open(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::FileNotFound(path)
        } else {
            Self::io(path, source)
        }
    }
}

/// Allow `?` on `std::io::Error` when no path context is available
/// (rare, prefer `MsgError::io`).
impl From<std::io::Error> for MsgError {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            path: PathBuf::from("<unknown>"),
            source,
        }
    }
}
