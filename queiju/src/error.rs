//! Error type shared by every runner operation.
//!
//! All messages carry the `queiju:` prefix so they read the same whether they
//! surface from the library or from the CLI.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Boxed underlying cause kept as an error source.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while configuring or running QE binaries.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("queiju: QE not found in PATH")]
    QeNotInPath,

    #[error("queiju: Invalid path: {path}")]
    InvalidPath { path: String },

    #[error("queiju: QE binaries not found on {path}")]
    BinariesNotFound { path: String },

    #[error("queiju: Command not found on PATH:{command}")]
    CommandNotInPath { command: String },

    #[error("queiju: invalid command {command} on run")]
    InvalidCommand { command: String },

    #[error("queiju: Invalid command: {path}")]
    MissingExecutable { path: String },

    #[error("queiju: could not save output to file: {}", path.display())]
    SaveOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("queiju: could not look up {command}")]
    Lookup {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("queiju: failed to run {target}")]
    Execute {
        target: String,
        #[source]
        source: BoxError,
    },

    #[error("queiju: {context}")]
    Io {
        context: String,
        #[source]
        source: BoxError,
    },

    #[error("queiju: {command} timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    #[error("queiju: {command} exited with status {code:?}")]
    CommandFailed { command: String, code: Option<i32> },
}

/// Flat classification of [`Error`] for callers that only branch on the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    QeNotInPath,
    InvalidPath,
    BinariesNotFound,
    CommandNotInPath,
    InvalidCommand,
    MissingExecutable,
    SaveOutput,
    Lookup,
    Execute,
    Io,
    Timeout,
    CommandFailed,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::QeNotInPath => ErrorKind::QeNotInPath,
            Error::InvalidPath { .. } => ErrorKind::InvalidPath,
            Error::BinariesNotFound { .. } => ErrorKind::BinariesNotFound,
            Error::CommandNotInPath { .. } => ErrorKind::CommandNotInPath,
            Error::InvalidCommand { .. } => ErrorKind::InvalidCommand,
            Error::MissingExecutable { .. } => ErrorKind::MissingExecutable,
            Error::SaveOutput { .. } => ErrorKind::SaveOutput,
            Error::Lookup { .. } => ErrorKind::Lookup,
            Error::Execute { .. } => ErrorKind::Execute,
            Error::Io { .. } => ErrorKind::Io,
            Error::Timeout { .. } => ErrorKind::Timeout,
            Error::CommandFailed { .. } => ErrorKind::CommandFailed,
        }
    }

    pub(crate) fn io(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Error::Io {
            context: context.into(),
            source: source.into(),
        }
    }
}

/// Result alias for runner operations.
pub type Result<T> = std::result::Result<T, Error>;
