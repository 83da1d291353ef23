//! Manifest validation against the bundled JSON schema
//!
//! The schema itself is environment-agnostic. The two rules that need the
//! filesystem, the `relative-path` format and the `maxFileSize` keyword, are
//! backed by injected [`PathExists`] and [`SizeWithinLimit`] capabilities, so
//! the same schema can be checked against a real plugin directory or a fake.

use crate::errors::ManifestError;
use crate::manifest::Manifest;
use crate::predicates::{PathExists, PluginDirProbe, SizeWithinLimit};
use jsonschema::error::ValidationErrorKind;
use jsonschema::paths::{LazyLocation, Location};
use jsonschema::{Keyword, ValidationError};
use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

pub const RELATIVE_PATH_FORMAT: &str = "relative-path";
pub const HTTP_URL_FORMAT: &str = "http-url";
pub const HTTPS_URL_FORMAT: &str = "https-url";
pub const MAX_FILE_SIZE_KEYWORD: &str = "maxFileSize";

const MANIFEST_SCHEMA_SOURCE: &str = include_str!("../schema/manifest-schema.json");

static MANIFEST_SCHEMA: Lazy<Result<Value, String>> =
    Lazy::new(|| serde_json::from_str(MANIFEST_SCHEMA_SOURCE).map_err(|e| e.to_string()));

/// The bundled manifest schema document
pub fn manifest_schema() -> Result<&'static Value, ManifestError> {
    MANIFEST_SCHEMA
        .as_ref()
        .map_err(|e| ManifestError::Schema(e.clone()))
}

/// One schema, format or keyword violation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    /// JSON pointer to the offending value, empty for the document root
    pub instance_path: String,
    /// JSON pointer into the schema to the rule that failed
    pub schema_path: String,
    /// Name of the failing rule, e.g. `required`, `format`, `maxFileSize`
    pub keyword: String,
    /// Format name when `keyword` is `format`
    pub format: Option<String>,
    pub instance: Value,
    pub message: String,
}

/// Outcome of a validation run; `errors` is in schema evaluation order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
}

impl ValidationResult {
    fn from_issues(errors: Vec<ValidationIssue>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/// Validates manifests with filesystem-aware custom rules
#[derive(Clone)]
pub struct ManifestValidator {
    path_exists: Arc<dyn PathExists>,
    size_within_limit: Arc<dyn SizeWithinLimit>,
}

impl ManifestValidator {
    pub fn new(
        path_exists: impl PathExists + 'static,
        size_within_limit: impl SizeWithinLimit + 'static,
    ) -> Self {
        Self {
            path_exists: Arc::new(path_exists),
            size_within_limit: Arc::new(size_within_limit),
        }
    }

    /// Validator whose custom rules look at files under `plugin_dir`
    pub fn for_plugin_dir(plugin_dir: &Path) -> Self {
        let probe = Arc::new(PluginDirProbe::new(plugin_dir));
        Self {
            path_exists: probe.clone(),
            size_within_limit: probe,
        }
    }

    pub fn validate(&self, manifest: &Manifest) -> Result<ValidationResult, ManifestError> {
        self.validate_with_schema(manifest_schema()?, manifest)
    }

    /// Validate against an arbitrary schema that may use the custom rules
    pub fn validate_with_schema(
        &self,
        schema: &Value,
        manifest: &Manifest,
    ) -> Result<ValidationResult, ManifestError> {
        let validator = self.compile(schema)?;
        let issues: Vec<ValidationIssue> = validator
            .iter_errors(manifest.as_value())
            .map(|error| to_issue(&error))
            .collect();

        debug!("Manifest validation finished with {} issue(s)", issues.len());
        Ok(ValidationResult::from_issues(issues))
    }

    fn compile(&self, schema: &Value) -> Result<jsonschema::Validator, ManifestError> {
        let path_exists = Arc::clone(&self.path_exists);
        let size_within_limit = Arc::clone(&self.size_within_limit);

        jsonschema::options()
            .should_validate_formats(true)
            .with_format(RELATIVE_PATH_FORMAT, move |candidate: &str| {
                path_exists.path_exists(candidate)
            })
            .with_format(HTTP_URL_FORMAT, |candidate: &str| {
                is_url_with_scheme(candidate, &["http", "https"])
            })
            .with_format(HTTPS_URL_FORMAT, |candidate: &str| {
                is_url_with_scheme(candidate, &["https"])
            })
            .with_keyword(
                MAX_FILE_SIZE_KEYWORD,
                move |_parent, value, path| max_file_size_factory(&size_within_limit, value, path),
            )
            .build(schema)
            .map_err(|e| ManifestError::Schema(e.to_string()))
    }
}

/// Validate a manifest against files in `plugin_dir`
pub fn validate_manifest(
    manifest: &Manifest,
    plugin_dir: &Path,
) -> Result<ValidationResult, ManifestError> {
    ManifestValidator::for_plugin_dir(plugin_dir).validate(manifest)
}

fn is_url_with_scheme(candidate: &str, schemes: &[&str]) -> bool {
    url::Url::parse(candidate)
        .is_ok_and(|url| schemes.contains(&url.scheme()) && url.host_str().is_some())
}

struct MaxFileSize {
    limit: u64,
    schema_path: Location,
    size_within_limit: Arc<dyn SizeWithinLimit>,
}

impl Keyword for MaxFileSize {
    fn validate<'i>(
        &self,
        instance: &'i Value,
        location: &LazyLocation,
    ) -> Result<(), ValidationError<'i>> {
        if self.is_valid(instance) {
            return Ok(());
        }
        Err(ValidationError::custom(
            self.schema_path.clone(),
            location.into(),
            instance,
            format!("file must exist and be at most {} bytes", self.limit),
        ))
    }

    fn is_valid(&self, instance: &Value) -> bool {
        // Non-string values are left to the `type` keyword
        match instance.as_str() {
            Some(candidate) => self.size_within_limit.size_within_limit(self.limit, candidate),
            None => true,
        }
    }
}

fn max_file_size_factory<'a>(
    size_within_limit: &Arc<dyn SizeWithinLimit>,
    value: &'a Value,
    path: Location,
) -> Result<Box<dyn Keyword>, ValidationError<'a>> {
    match value.as_u64() {
        Some(limit) => Ok(Box::new(MaxFileSize {
            limit,
            schema_path: path,
            size_within_limit: Arc::clone(size_within_limit),
        })),
        None => Err(ValidationError::custom(
            Location::new(),
            path,
            value,
            "maxFileSize must be a non-negative integer number of bytes",
        )),
    }
}

fn to_issue(error: &ValidationError<'_>) -> ValidationIssue {
    let schema_path = error.schema_path.to_string();
    // maxFileSize is the only custom keyword registered
    let keyword = match &error.kind {
        ValidationErrorKind::Custom { .. } => MAX_FILE_SIZE_KEYWORD.to_string(),
        _ => schema_path
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string(),
    };
    let format = match &error.kind {
        ValidationErrorKind::Format { format } => Some(format.to_string()),
        _ => None,
    };

    ValidationIssue {
        instance_path: error.instance_path.to_string(),
        schema_path,
        keyword,
        format,
        instance: error.instance.clone().into_owned(),
        message: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn fake_validator(files: &[(&str, u64)]) -> ManifestValidator {
        let files: Arc<HashMap<String, u64>> = Arc::new(
            files
                .iter()
                .map(|(name, size)| ((*name).to_string(), *size))
                .collect(),
        );
        let sizes = Arc::clone(&files);
        ManifestValidator::new(
            move |candidate: &str| files.contains_key(candidate),
            move |max: u64, candidate: &str| sizes.get(candidate).is_some_and(|s| *s <= max),
        )
    }

    fn minimal_manifest() -> Value {
        json!({
            "manifest_version": 1,
            "version": 1,
            "type": "APP",
            "name": {"en": "sample plugin"},
            "icon": "image/icon.png"
        })
    }

    fn validate(validator: &ManifestValidator, document: Value) -> ValidationResult {
        let result = validator.validate(&Manifest::from_value(document));
        assert!(result.is_ok(), "schema failed to compile: {:?}", result);
        result.unwrap_or_else(|_| ValidationResult::from_issues(Vec::new()))
    }

    #[test]
    fn test_bundled_schema_parses() {
        assert!(manifest_schema().is_ok());
    }

    #[test]
    fn test_minimal_manifest_is_valid() {
        let validator = fake_validator(&[("image/icon.png", 100)]);
        let result = validate(&validator, minimal_manifest());
        assert!(result.valid, "unexpected issues: {:?}", result.errors);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_missing_relative_path_is_reported() {
        let validator = fake_validator(&[("image/icon.png", 100), ("js/desktop.js", 10)]);
        let mut manifest = minimal_manifest();
        manifest["desktop"] = json!({"js": ["js/desktop.js", "js/missing.js"]});

        let result = validate(&validator, manifest);
        assert!(!result.valid);
        let paths: Vec<&str> = result
            .errors
            .iter()
            .map(|e| e.instance_path.as_str())
            .collect();
        assert!(paths.contains(&"/desktop/js/1"), "issues: {:?}", paths);
        assert!(!paths.contains(&"/desktop/js/0"));
        assert!(!paths.contains(&"/icon"));
    }

    #[test]
    fn test_missing_icon_fails_format_and_size() {
        let validator = fake_validator(&[]);
        let result = validate(&validator, minimal_manifest());
        assert!(!result.valid);
        assert!(result.errors.iter().all(|e| e.instance_path == "/icon"));
        assert!(result.errors.iter().any(|e| e.keyword == MAX_FILE_SIZE_KEYWORD));
        assert!(result
            .errors
            .iter()
            .any(|e| e.format.as_deref() == Some(RELATIVE_PATH_FORMAT)));
    }

    #[test]
    fn test_max_file_size_boundary() {
        let at_limit = fake_validator(&[("image/icon.png", 20_971_520)]);
        assert!(validate(&at_limit, minimal_manifest()).valid);

        let over_limit = fake_validator(&[("image/icon.png", 20_971_521)]);
        let result = validate(&over_limit, minimal_manifest());
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].keyword, MAX_FILE_SIZE_KEYWORD);
        assert_eq!(result.errors[0].instance, json!("image/icon.png"));
    }

    #[test]
    fn test_custom_schema_limit() {
        let schema = json!({
            "type": "object",
            "properties": {
                "html": {"type": "string", "format": "relative-path", "maxFileSize": 5}
            }
        });
        let validator = fake_validator(&[("config.html", 5), ("big.html", 6)]);

        let ok = validator.validate_with_schema(&schema, &Manifest::from_value(json!({"html": "config.html"})));
        assert!(ok.is_ok_and(|r| r.valid));

        let too_big = validator.validate_with_schema(&schema, &Manifest::from_value(json!({"html": "big.html"})));
        assert!(too_big.is_ok_and(|r| !r.valid));
    }

    #[test]
    fn test_invalid_max_file_size_value_is_schema_error() {
        let schema = json!({"properties": {"icon": {"maxFileSize": "20MB"}}});
        let validator = fake_validator(&[]);
        let result = validator.validate_with_schema(&schema, &Manifest::from_value(json!({})));
        assert!(matches!(result, Err(ManifestError::Schema(_))));
    }

    #[test]
    fn test_url_formats() {
        let validator = fake_validator(&[("image/icon.png", 1)]);

        let mut manifest = minimal_manifest();
        manifest["homepage_url"] = json!({"en": "not a url"});
        let result = validate(&validator, manifest);
        assert!(!result.valid);
        assert_eq!(result.errors[0].instance_path, "/homepage_url/en");
        assert_eq!(result.errors[0].format.as_deref(), Some(HTTP_URL_FORMAT));

        let mut manifest = minimal_manifest();
        manifest["desktop"] = json!({"js": ["http://example.com/insecure.js"]});
        assert!(!validate(&validator, manifest).valid);

        let mut manifest = minimal_manifest();
        manifest["homepage_url"] = json!({"en": "http://example.com"});
        manifest["desktop"] = json!({"js": ["https://example.com/lib.js"]});
        assert!(validate(&validator, manifest).valid);
    }

    #[test]
    fn test_every_violation_is_reported() {
        let validator = fake_validator(&[]);
        let manifest = json!({
            "manifest_version": 2,
            "version": 0,
            "type": "APP",
            "name": {"en": "x"},
            "icon": "image/icon.png",
            "unknown": true
        });
        let result = validate(&validator, manifest);
        assert!(!result.valid);
        let paths: Vec<&str> = result
            .errors
            .iter()
            .map(|e| e.instance_path.as_str())
            .collect();
        assert!(paths.contains(&"/manifest_version"));
        assert!(paths.contains(&"/version"));
        assert!(paths.contains(&"/icon"));
        assert!(paths.contains(&""));
    }
}
