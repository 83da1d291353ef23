use std::io;
use thiserror::Error;

/// Errors raised while signing or verifying a plugin
#[derive(Error, Debug)]
pub enum PackerError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Plugin archive is missing {0}")]
    MissingEntry(&'static str),

    #[error("Signature does not match contents.zip")]
    SignatureMismatch,
}
