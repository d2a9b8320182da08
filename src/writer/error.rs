use std::path::PathBuf;

use crate::index::IndexError;

/// Errors that can occur while configuring, assembling or driving a writer
#[derive(Debug, thiserror::Error)]
pub enum WriterError {
    /// Invalid or incompatible configuration, detected at a setter or at `build()`
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// I/O error while opening, writing or closing a named file
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File the operation was acting on
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// I/O error on a sink without a known path
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Record rejected by the backend (bad field, undeclared header key, ...)
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Error from the on-the-fly index creator
    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    /// Operation on a writer that has already been closed
    #[error("Writer already closed")]
    Closed,

    /// Error from background writer thread
    #[error("Background writer error: {0}")]
    BackgroundWriterError(String),

    /// Background writer thread panicked
    #[error("Background writer thread panicked")]
    ThreadPanicked,
}

impl WriterError {
    /// Attach a path to an I/O error
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` for configuration errors
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}
