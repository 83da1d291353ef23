//! Manifest loading
//!
//! The manifest is kept as the parsed JSON document: validation runs against
//! the raw document and the source list resolver walks it by field path, so
//! there is no typed model to keep in sync with the schema.

use crate::errors::ManifestError;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name of the manifest inside a plugin directory
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// A parsed plugin manifest. Never mutated after load.
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    document: Value,
}

impl Manifest {
    pub fn from_value(document: Value) -> Self {
        Self { document }
    }

    pub fn from_json_str(content: &str) -> Result<Self, ManifestError> {
        Ok(Self::from_value(serde_json::from_str(content)?))
    }

    /// Parse raw file bytes; invalid UTF-8 is a parse error like any other bad JSON
    pub fn from_json_slice(content: &[u8]) -> Result<Self, ManifestError> {
        Ok(Self::from_value(serde_json::from_slice(content)?))
    }

    /// Path of the manifest file inside `plugin_dir`
    pub fn path_in(plugin_dir: &Path) -> PathBuf {
        plugin_dir.join(MANIFEST_FILE_NAME)
    }

    /// Load `manifest.json` from a plugin directory without caching or validation
    pub fn load(plugin_dir: &Path) -> Result<Self, ManifestError> {
        Self::load_from_path(&Self::path_in(plugin_dir))
    }

    pub fn load_from_path(path: &Path) -> Result<Self, ManifestError> {
        debug!("Reading manifest from {:?}", path);
        let content = std::fs::read(path)?;
        Self::from_json_slice(&content)
    }

    pub fn as_value(&self) -> &Value {
        &self.document
    }

    /// English display name, falling back to any other localized name
    pub fn name(&self) -> Option<&str> {
        let names = self.document.get("name")?.as_object()?;
        names
            .get("en")
            .or_else(|| names.values().next())
            .and_then(Value::as_str)
    }

    pub fn version(&self) -> Option<u64> {
        self.document.get("version").and_then(Value::as_u64)
    }
}
