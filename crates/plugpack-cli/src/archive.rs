//! Content archive (`contents.zip`) construction
//!
//! Files are read in parallel and written in source list order with fixed
//! timestamps, so an unchanged plugin directory always yields the same entry
//! names in the same order.

use crate::errors::PackError;
use plugpack_config::Compression;
use rayon::prelude::*;
use std::io::{Cursor, Write};
use std::path::Path;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

fn compression_method(compression: Compression) -> CompressionMethod {
    match compression {
        Compression::Deflate => CompressionMethod::Deflated,
        Compression::Store => CompressionMethod::Stored,
    }
}

/// Build the content archive from `sources`, relative to `plugin_dir`.
///
/// # Errors
///
/// Fails with [`PackError::Io`] naming the file when a source cannot be read,
/// e.g. because it vanished after validation.
pub fn build_content_archive(
    plugin_dir: &Path,
    sources: &[String],
    compression: Compression,
) -> Result<Vec<u8>, PackError> {
    let files = sources
        .par_iter()
        .map(|source| {
            let path = plugin_dir.join(source);
            std::fs::read(&path)
                .map(|data| (source.as_str(), data))
                .map_err(|e| PackError::io(path, e))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let options = SimpleFileOptions::default()
        .compression_method(compression_method(compression))
        .last_modified_time(DateTime::default())
        .unix_permissions(0o644);

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in &files {
        zip.start_file(*name, options)?;
        zip.write_all(data)
            .map_err(|e| PackError::io(plugin_dir.join(name), e))?;
    }
    let bytes = zip.finish()?.into_inner();

    debug!(
        "contents.zip: {} entries, {} bytes",
        files.len(),
        bytes.len()
    );
    Ok(bytes)
}

/// Entry names of a zip archive, in archive order
pub fn list_archive_entries(bytes: &[u8]) -> Result<Vec<String>, PackError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut names = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        names.push(archive.by_index(index)?.name().to_string());
    }
    Ok(names)
}
