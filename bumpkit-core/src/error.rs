//! Error types and result aliases.

use std::path::PathBuf;

use thiserror::Error;

use crate::applier::ReleaseStep;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("IO error at {}: {source}", path.display())]
    IoAt {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Malformed change record in {}: {reason}", dir.display())]
    MalformedRecord { dir: PathBuf, reason: String },

    #[error(
        "Change record '{record}' references unknown package '{name}'. Available packages: {available}"
    )]
    UnknownPackage {
        name: String,
        record: String,
        available: String,
    },

    #[error("Invalid manifest {}: {message}", path.display())]
    Manifest { path: PathBuf, message: String },

    #[error("Version control error: {message}")]
    VersionControl {
        message: String,
        touched: Vec<PathBuf>,
    },

    #[error("Failed after writing {} file(s)", written.len())]
    PartialApply {
        written: Vec<PathBuf>,
        #[source]
        source: Box<Error>,
    },

    #[error("Release aborted during the {step} step")]
    Aborted {
        step: ReleaseStep,
        applied: Vec<PathBuf>,
        #[source]
        source: Box<Error>,
    },

    #[error("Release error: {0}")]
    Release(String),
}

impl Error {
    pub fn io_at(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::IoAt {
            path: path.into(),
            source,
        }
    }

    pub fn vcs(message: impl Into<String>) -> Self {
        Error::VersionControl {
            message: message.into(),
            touched: Vec::new(),
        }
    }

    /// Files already changed on disk when this error was raised.
    ///
    /// Empty for errors raised before any mutation.
    pub fn applied_paths(&self) -> &[PathBuf] {
        match self {
            Error::Aborted { applied, .. } => applied,
            Error::PartialApply { written, .. } => written,
            Error::VersionControl { touched, .. } => touched,
            _ => &[],
        }
    }

    /// The innermost error, looking through [`Error::Aborted`] and
    /// [`Error::PartialApply`] wrappers.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Aborted { source, .. } | Error::PartialApply { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
