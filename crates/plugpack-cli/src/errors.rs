//! Error taxonomy of a packaging run
//!
//! Every stage failure is fatal to the run; there is no retry anywhere in
//! the pipeline.

use plugpack_config::ConfigError;
use plugpack_manifest::{ManifestError, ValidationIssue};
use plugpack_signer::PackerError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PackError {
    #[error("{} should be a directory.", .0.display())]
    NotADirectory(PathBuf),

    #[error("Manifest file {} not found.", .0.display())]
    ManifestNotFound(PathBuf),

    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid manifest.json")]
    InvalidManifest(Vec<ValidationIssue>),

    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    #[error("Packaging failed: {0}")]
    Packaging(#[from] PackerError),

    #[error("Failed to build contents.zip: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error on {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
}

impl PackError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        PackError::Io {
            path: path.into(),
            source,
        }
    }

    /// Map a manifest loading error, attributing I/O and parse failures to `path`
    pub(crate) fn from_manifest_load(path: PathBuf, error: ManifestError) -> Self {
        match error {
            ManifestError::Io(source) => PackError::Io { path, source },
            ManifestError::Parse(source) => PackError::Parse { path, source },
            other => PackError::Manifest(other),
        }
    }
}
