//! The packaging pipeline
//!
//! A run is a strict sequence of stages and the first failing stage aborts
//! it:
//!
//! 1. the plugin path must be a directory
//! 2. it must contain `manifest.json`
//! 3. the manifest is loaded (no caching)
//! 4. the manifest is validated against the plugin directory
//! 5. output paths are resolved
//! 6. the output directory is created while `contents.zip` is built
//! 7. the private key is loaded, if one was given
//! 8. the packaging step signs the archive
//! 9. the artifact is written, plus `<id>.ppk` for a generated key
//!
//! Partial outputs are not cleaned up on failure.

use crate::archive::build_content_archive;
use crate::errors::PackError;
use crate::keys::load_private_key;
use crate::logger;
use crate::output::{key_file_path, resolve_output_paths, write_file, OutputPaths};
use plugpack_config::{Compression, Config, DEFAULT_OUTPUT_NAME};
use plugpack_manifest::{
    format_issues, validate_manifest, Manifest, SourceListResolver, ValidationResult,
};
use plugpack_signer::Packer;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Caller supplied knobs for one packaging run
#[derive(Debug, Clone, PartialEq)]
pub struct PackOptions {
    /// Existing private key file; a new key is generated when absent
    pub ppk: Option<PathBuf>,
    /// Explicit artifact path, used verbatim
    pub out: Option<PathBuf>,
    /// Artifact file name when `out` is absent
    pub output_name: String,
    pub compression: Compression,
    /// Selectors appended to the default source list selectors
    pub source_fields: Vec<String>,
}

impl Default for PackOptions {
    fn default() -> Self {
        Self {
            ppk: None,
            out: None,
            output_name: DEFAULT_OUTPUT_NAME.to_string(),
            compression: Compression::default(),
            source_fields: Vec::new(),
        }
    }
}

impl PackOptions {
    /// Options seeded from the user configuration
    pub fn from_config(config: &Config) -> Result<Self, PackError> {
        Ok(Self {
            output_name: config.output_name().to_string(),
            compression: config.compression()?,
            source_fields: config.source_fields.clone(),
            ..Self::default()
        })
    }
}

/// What a successful run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackReport {
    /// Artifact path, exactly the override when one was given
    pub output_file: PathBuf,
    /// Key file written for a generated key
    pub key_file: Option<PathBuf>,
    pub id: String,
    /// Entry names of `contents.zip`, in archive order
    pub entries: Vec<String>,
}

/// A loaded manifest and its validation outcome
#[derive(Debug, Clone)]
pub struct PluginCheck {
    pub manifest: Manifest,
    pub result: ValidationResult,
}

/// Run stages 1 to 4 without failing on validation issues.
pub fn check_plugin(plugin_dir: &Path) -> Result<PluginCheck, PackError> {
    logger::step(&format!("Checking plugin directory {}", plugin_dir.display()));
    if !plugin_dir.is_dir() {
        return Err(PackError::NotADirectory(plugin_dir.to_path_buf()));
    }

    let manifest_path = Manifest::path_in(plugin_dir);
    if !manifest_path.is_file() {
        return Err(PackError::ManifestNotFound(manifest_path));
    }

    logger::step("Loading manifest.json");
    let manifest = Manifest::load_from_path(&manifest_path)
        .map_err(|e| PackError::from_manifest_load(manifest_path.clone(), e))?;
    logger::step("Validating manifest.json");
    let result = validate_manifest(&manifest, plugin_dir)?;
    debug!("Validation result: valid={}", result.valid);

    Ok(PluginCheck { manifest, result })
}

/// Stages 1 to 4; an invalid manifest is reported line by line and aborts.
pub fn load_valid_manifest(plugin_dir: &Path) -> Result<Manifest, PackError> {
    let PluginCheck { manifest, result } = check_plugin(plugin_dir)?;
    if result.valid {
        return Ok(manifest);
    }

    logger::error("Invalid manifest.json:");
    for line in format_issues(&result.errors) {
        logger::list_item(&line);
    }
    Err(PackError::InvalidManifest(result.errors))
}

/// Package `plugin_dir` into a signed plugin artifact.
///
/// # Errors
///
/// Returns the [`PackError`] of the first stage that fails.
pub fn pack_plugin(
    plugin_dir: &Path,
    options: &PackOptions,
    packer: &dyn Packer,
) -> Result<PackReport, PackError> {
    let manifest = load_valid_manifest(plugin_dir)?;

    let sources = SourceListResolver::default()
        .with_extra_selectors(&options.source_fields)?
        .resolve(&manifest);
    debug!("Source list: {:?}", sources);

    let absolute_dir =
        std::path::absolute(plugin_dir).map_err(|e| PackError::io(plugin_dir, e))?;
    let paths = resolve_output_paths(&absolute_dir, options.out.as_deref(), &options.output_name);
    debug!("outputDir : {}", paths.out_dir.display());
    debug!("outputFile : {}", paths.out_file.display());

    logger::spinner_start("Packaging plugin...");
    let (id, key_file) = match package(plugin_dir, &sources, &paths, options, packer) {
        Ok(packaged) => {
            logger::spinner_success(&format!("Packaged {} file(s)", sources.len()));
            packaged
        }
        Err(e) => {
            logger::spinner_error("Packaging failed");
            return Err(e);
        }
    };

    Ok(PackReport {
        output_file: paths.out_file,
        key_file,
        id,
        entries: sources,
    })
}

/// Stages 6 to 9
fn package(
    plugin_dir: &Path,
    sources: &[String],
    paths: &OutputPaths,
    options: &PackOptions,
    packer: &dyn Packer,
) -> Result<(String, Option<PathBuf>), PackError> {
    logger::step("Creating output directory and building contents.zip");
    let (created, contents) = rayon::join(
        || std::fs::create_dir_all(&paths.out_dir).map_err(|e| PackError::io(&paths.out_dir, e)),
        || build_content_archive(plugin_dir, sources, options.compression),
    );
    created?;
    let contents = contents?;

    let private_key = load_private_key(options.ppk.as_deref())?;
    logger::step("Signing contents.zip");
    let output = packer.pack(&contents, private_key.as_deref())?;

    let key_file = if private_key.is_none() {
        let key_file = key_file_path(&paths.out_dir, &output.id);
        write_file(&key_file, output.private_key.as_bytes())?;
        Some(key_file)
    } else {
        None
    };
    write_file(&paths.out_file, &output.plugin)?;
    info!("Wrote {} ({} bytes)", paths.out_file.display(), output.plugin.len());

    Ok((output.id, key_file))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_from_config() {
        let mut config = Config::default();
        assert!(config.set("output-name", "release.zip".to_string()).is_ok());
        assert!(config.set("compression", "store".to_string()).is_ok());
        assert!(config.set("source-fields", "locales[].icon".to_string()).is_ok());

        let options = PackOptions::from_config(&config);
        assert!(options.is_ok());
        let Ok(options) = options else {
            return;
        };
        assert_eq!(options.output_name, "release.zip");
        assert_eq!(options.compression, Compression::Store);
        assert_eq!(options.source_fields, vec!["locales[].icon"]);
        assert!(options.ppk.is_none() && options.out.is_none());
    }

    #[test]
    fn test_bad_compression_in_config() {
        let config = Config {
            compression: Some("brotli".to_string()),
            ..Config::default()
        };
        assert!(matches!(
            PackOptions::from_config(&config),
            Err(PackError::Config(_))
        ));
    }

    #[test]
    fn test_not_a_directory() {
        let Ok(temp_file) = tempfile::NamedTempFile::new() else {
            return;
        };
        assert!(matches!(
            check_plugin(temp_file.path()),
            Err(PackError::NotADirectory(_))
        ));
    }
}
