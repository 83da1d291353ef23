//! Source list resolution
//!
//! Which manifest fields reference bundled files is described by a list of
//! selectors rather than hard-coded, so new manifest sections only need a new
//! selector. A selector is a dotted field path where a `[]` suffix iterates an
//! array (`desktop.js[]`, `locales[].icon`); the special selector `$manifest`
//! stands for the manifest file itself.

use crate::errors::ManifestError;
use crate::manifest::{Manifest, MANIFEST_FILE_NAME};
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Component, Path};
use std::str::FromStr;

pub const MANIFEST_SELECTOR: &str = "$manifest";

/// Fields scanned by default, in archive order
pub const DEFAULT_SOURCE_SELECTORS: &[&str] = &[
    "desktop.js[]",
    "desktop.css[]",
    "mobile.js[]",
    "mobile.css[]",
    "config.js[]",
    "config.css[]",
    "config.html",
    MANIFEST_SELECTOR,
    "icon",
];

/// One segment of a field selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldStep {
    key: String,
    each: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSelector {
    ManifestFile,
    Field(Vec<FieldStep>),
}

impl FromStr for SourceSelector {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let selector = s.trim();
        if selector == MANIFEST_SELECTOR {
            return Ok(SourceSelector::ManifestFile);
        }

        let steps = selector
            .split('.')
            .map(|segment| {
                let (key, each) = match segment.strip_suffix("[]") {
                    Some(key) => (key, true),
                    None => (segment, false),
                };
                if key.is_empty() || key.contains(['[', ']', '$']) {
                    return Err(ManifestError::InvalidSelector(s.to_string()));
                }
                Ok(FieldStep {
                    key: key.to_string(),
                    each,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SourceSelector::Field(steps))
    }
}

impl SourceSelector {
    fn collect<'m>(&self, manifest: &'m Manifest, out: &mut Vec<&'m str>) {
        match self {
            SourceSelector::ManifestFile => out.push(MANIFEST_FILE_NAME),
            SourceSelector::Field(steps) => collect_field(manifest.as_value(), steps, out),
        }
    }
}

fn collect_field<'m>(value: &'m Value, steps: &[FieldStep], out: &mut Vec<&'m str>) {
    let Some((step, rest)) = steps.split_first() else {
        if let Some(path) = value.as_str() {
            out.push(path);
        }
        return;
    };

    let Some(child) = value.get(&step.key) else {
        return;
    };

    if step.each {
        if let Some(items) = child.as_array() {
            for item in items {
                collect_field(item, rest, out);
            }
        }
    } else {
        collect_field(child, rest, out);
    }
}

/// Archive entry name for a manifest path: `.` segments dropped, `/` separators.
///
/// Paths with other non-plain components are returned unchanged; validation
/// already rejects them.
pub fn normalize_source_path(path: &str) -> String {
    let mut segments = Vec::new();
    for component in Path::new(path).components() {
        match component {
            Component::CurDir => {}
            Component::Normal(segment) => segments.push(segment.to_string_lossy()),
            _ => return path.to_string(),
        }
    }
    segments.join("/")
}

fn is_remote(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Derives the ordered, deduplicated list of files a manifest bundles
#[derive(Debug, Clone)]
pub struct SourceListResolver {
    selectors: Vec<SourceSelector>,
}

impl Default for SourceListResolver {
    fn default() -> Self {
        Self {
            selectors: DEFAULT_SOURCE_SELECTORS
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect(),
        }
    }
}

impl SourceListResolver {
    pub fn new(selectors: Vec<SourceSelector>) -> Self {
        Self { selectors }
    }

    /// Append selectors after the current ones
    pub fn with_extra_selectors<I, S>(mut self, extra: I) -> Result<Self, ManifestError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for selector in extra {
            self.selectors.push(selector.as_ref().parse()?);
        }
        Ok(self)
    }

    pub fn selectors(&self) -> &[SourceSelector] {
        &self.selectors
    }

    /// Resolve the source list. Remote URLs are skipped; paths are normalized
    /// and duplicates keep their first position.
    pub fn resolve(&self, manifest: &Manifest) -> Vec<String> {
        let mut candidates = Vec::new();
        for selector in &self.selectors {
            selector.collect(manifest, &mut candidates);
        }

        let mut seen = HashSet::new();
        candidates
            .into_iter()
            .filter(|path| !is_remote(path))
            .map(normalize_source_path)
            .filter(|path| !path.is_empty() && seen.insert(path.clone()))
            .collect()
    }
}

/// Source list using the default selectors
pub fn source_list(manifest: &Manifest) -> Vec<String> {
    SourceListResolver::default().resolve(manifest)
}
