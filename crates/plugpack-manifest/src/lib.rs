//! Plugin manifest handling for plugpack
//!
//! Loads `manifest.json` from a plugin directory, validates it against the
//! bundled JSON schema (with filesystem-aware `relative-path` and
//! `maxFileSize` rules) and resolves the list of files the manifest bundles.

pub mod errors;
pub mod manifest;
pub mod messages;
pub mod predicates;
pub mod schema;
pub mod source_list;

pub use errors::ManifestError;
pub use manifest::{Manifest, MANIFEST_FILE_NAME};
pub use messages::{format_issue, format_issues};
pub use predicates::{
    file_size_at_most, relative_path_exists, PathExists, PluginDirProbe, SizeWithinLimit,
};
pub use schema::{
    manifest_schema, validate_manifest, ManifestValidator, ValidationIssue, ValidationResult,
};
pub use source_list::{
    normalize_source_path, source_list, SourceListResolver, SourceSelector,
    DEFAULT_SOURCE_SELECTORS,
};
