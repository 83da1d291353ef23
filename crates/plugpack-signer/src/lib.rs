//! Packaging step for plugpack
//!
//! Takes the content archive produced from a plugin directory plus an
//! optional private key and returns the signed plugin artifact, its
//! identifier and the key that signed it.

pub mod error;
pub mod keys;
pub mod packer;

pub use error::PackerError;
pub use keys::{plugin_id, PluginKey};
pub use packer::{verify_plugin, Ed25519Packer, CONTENTS_ENTRY, PUBKEY_ENTRY, SIGNATURE_ENTRY};

/// Result of packaging one plugin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackOutput {
    /// Identifier derived from the public key
    pub id: String,
    /// Private key text, either the one supplied or a newly generated one
    pub private_key: String,
    /// Signed plugin artifact bytes
    pub plugin: Vec<u8>,
}

/// Turns a content archive into a signed plugin.
///
/// When `private_key` is `None` the implementation generates a new key and
/// returns it in [`PackOutput::private_key`].
pub trait Packer: Send + Sync {
    fn pack(&self, contents: &[u8], private_key: Option<&str>) -> Result<PackOutput, PackerError>;
}
