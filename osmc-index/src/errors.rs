//! Error and result types shared by both index families.

use std::io;
use thiserror::Error;

/// Errors that can occur while building, writing or reading an index.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The file on disk does not follow the record layout it is read with.
    #[error("Corrupted index: {0}")]
    Corrupted(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Index reader is closed")]
    Closed,
}

impl IndexError {
    /// Returns true when the error points at a damaged index file rather
    /// than at the caller or the operating system.
    pub fn is_corruption(&self) -> bool {
        match self {
            IndexError::Corrupted(_) => true,
            IndexError::Io(err) => err.kind() == io::ErrorKind::UnexpectedEof,
            _ => false,
        }
    }
}

/// Result type for index operations
pub type IndexResult<T> = Result<T, IndexError>;
