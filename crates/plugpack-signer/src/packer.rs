use std::io::{Cursor, Read, Write};

use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

use crate::error::PackerError;
use crate::keys::{plugin_id, PluginKey};
use crate::{PackOutput, Packer};

pub const CONTENTS_ENTRY: &str = "contents.zip";
pub const PUBKEY_ENTRY: &str = "PUBKEY";
pub const SIGNATURE_ENTRY: &str = "SIGNATURE";

/// Signs the content archive with Ed25519 and wraps it together with the
/// public key and signature in an outer zip.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Packer;

impl Packer for Ed25519Packer {
    fn pack(&self, contents: &[u8], private_key: Option<&str>) -> Result<PackOutput, PackerError> {
        let key = match private_key {
            Some(text) => PluginKey::from_text(text)?,
            None => {
                debug!("No private key supplied, generating a new one");
                PluginKey::generate()
            }
        };

        let signature = key.sign(contents);
        let public_key = key.public_key_bytes();
        let plugin = write_stored_zip(&[
            (CONTENTS_ENTRY, contents),
            (PUBKEY_ENTRY, public_key.as_slice()),
            (SIGNATURE_ENTRY, signature.as_slice()),
        ])?;

        let id = key.plugin_id();
        info!("Signed plugin {} ({} bytes)", id, plugin.len());

        Ok(PackOutput {
            id,
            private_key: key.to_text(),
            plugin,
        })
    }
}

fn write_stored_zip(entries: &[(&str, &[u8])]) -> Result<Vec<u8>, PackerError> {
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Stored)
        .last_modified_time(DateTime::default());

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        zip.start_file(*name, options)?;
        zip.write_all(data)?;
    }
    Ok(zip.finish()?.into_inner())
}

fn read_entry(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    name: &'static str,
) -> Result<Vec<u8>, PackerError> {
    let mut file = archive
        .by_name(name)
        .map_err(|_| PackerError::MissingEntry(name))?;
    let mut data = Vec::new();
    file.read_to_end(&mut data)?;
    Ok(data)
}

/// Check a signed plugin and return its identifier.
///
/// # Errors
///
/// Fails when an entry is missing, the public key is malformed or the
/// signature does not cover `contents.zip`.
pub fn verify_plugin(plugin: &[u8]) -> Result<String, PackerError> {
    let mut archive = ZipArchive::new(Cursor::new(plugin))?;
    let contents = read_entry(&mut archive, CONTENTS_ENTRY)?;
    let public_key = read_entry(&mut archive, PUBKEY_ENTRY)?;
    let signature = read_entry(&mut archive, SIGNATURE_ENTRY)?;

    let key_bytes: [u8; 32] = public_key
        .as_slice()
        .try_into()
        .map_err(|_| PackerError::InvalidPublicKey(format!("{} bytes", public_key.len())))?;
    let verifying_key = VerifyingKey::from_bytes(&key_bytes)
        .map_err(|e| PackerError::InvalidPublicKey(e.to_string()))?;

    let signature_bytes: [u8; 64] = signature
        .as_slice()
        .try_into()
        .map_err(|_| PackerError::SignatureMismatch)?;
    verifying_key
        .verify(&contents, &Signature::from_bytes(&signature_bytes))
        .map_err(|_| PackerError::SignatureMismatch)?;

    Ok(plugin_id(&key_bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTENTS: &[u8] = b"PK\x05\x06 pretend this is a zip";

    #[test]
    fn test_pack_without_key_generates_one() {
        let output = Ed25519Packer.pack(CONTENTS, None);
        assert!(output.is_ok());
        let Ok(output) = output else {
            return;
        };
        assert_eq!(output.id.len(), 32);
        assert!(PluginKey::from_text(&output.private_key).is_ok());
        assert!(verify_plugin(&output.plugin).is_ok_and(|id| id == output.id));
    }

    #[test]
    fn test_pack_with_key_reuses_it() {
        let key = PluginKey::generate();
        let text = key.to_text();

        let first = Ed25519Packer.pack(CONTENTS, Some(&text));
        let second = Ed25519Packer.pack(b"other contents", Some(&text));
        let (Ok(first), Ok(second)) = (first, second) else {
            panic!("packing with a valid key failed");
        };
        assert_eq!(first.id, key.plugin_id());
        assert_eq!(second.id, key.plugin_id());
        assert_eq!(first.private_key, text);
    }

    #[test]
    fn test_pack_rejects_bad_key() {
        assert!(matches!(
            Ed25519Packer.pack(CONTENTS, Some("zz")),
            Err(PackerError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_tampered_contents_fail_verification() {
        let Ok(output) = Ed25519Packer.pack(CONTENTS, None) else {
            panic!("packing failed");
        };
        let key = PluginKey::generate();
        let forged = write_stored_zip(&[
            (CONTENTS_ENTRY, b"forged".as_slice()),
            (PUBKEY_ENTRY, key.public_key_bytes().as_slice()),
            (SIGNATURE_ENTRY, key.sign(CONTENTS).as_slice()),
        ]);
        assert!(matches!(
            forged.map(|bytes| verify_plugin(&bytes)),
            Ok(Err(PackerError::SignatureMismatch))
        ));
        assert!(verify_plugin(&output.plugin).is_ok());
    }

    #[test]
    fn test_missing_entry() {
        let Ok(partial) = write_stored_zip(&[(CONTENTS_ENTRY, CONTENTS)]) else {
            panic!("writing zip failed");
        };
        assert!(matches!(
            verify_plugin(&partial),
            Err(PackerError::MissingEntry(PUBKEY_ENTRY))
        ));
    }
}
