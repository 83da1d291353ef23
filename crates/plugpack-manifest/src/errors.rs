use std::io;
use thiserror::Error;

/// Errors that can occur while loading or validating a plugin manifest
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse manifest: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid manifest schema: {0}")]
    Schema(String),

    #[error("Invalid source selector '{0}'")]
    InvalidSelector(String),
}
