//! Filesystem predicates used by the manifest validator
//!
//! Both checks answer `false` on any filesystem error: a missing or
//! unreadable file referenced by the manifest is a manifest-authoring error,
//! reported through validation rather than propagated.

use std::fs;
use std::path::{Component, Path, PathBuf};

/// Capability behind the `relative-path` format
pub trait PathExists: Send + Sync {
    fn path_exists(&self, candidate: &str) -> bool;
}

/// Capability behind the `maxFileSize` keyword
pub trait SizeWithinLimit: Send + Sync {
    fn size_within_limit(&self, max_bytes: u64, candidate: &str) -> bool;
}

impl<F> PathExists for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn path_exists(&self, candidate: &str) -> bool {
        self(candidate)
    }
}

impl<F> SizeWithinLimit for F
where
    F: Fn(u64, &str) -> bool + Send + Sync,
{
    fn size_within_limit(&self, max_bytes: u64, candidate: &str) -> bool {
        self(max_bytes, candidate)
    }
}

/// Answers both predicates against files under a plugin directory
#[derive(Debug, Clone)]
pub struct PluginDirProbe {
    base_dir: PathBuf,
}

impl PluginDirProbe {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn metadata(&self, candidate: &str) -> Option<fs::Metadata> {
        let relative = contained_relative_path(candidate)?;
        fs::metadata(self.base_dir.join(relative)).ok()
    }
}

impl PathExists for PluginDirProbe {
    fn path_exists(&self, candidate: &str) -> bool {
        self.metadata(candidate).is_some_and(|m| m.is_file())
    }
}

impl SizeWithinLimit for PluginDirProbe {
    fn size_within_limit(&self, max_bytes: u64, candidate: &str) -> bool {
        self.metadata(candidate)
            .is_some_and(|m| m.is_file() && m.len() <= max_bytes)
    }
}

/// Predicate for the `relative-path` format, closed over `base_dir`
pub fn relative_path_exists(base_dir: impl Into<PathBuf>) -> impl Fn(&str) -> bool + Send + Sync {
    let probe = PluginDirProbe::new(base_dir);
    move |candidate| probe.path_exists(candidate)
}

/// Predicate for the `maxFileSize` keyword, closed over `base_dir`
pub fn file_size_at_most(base_dir: impl Into<PathBuf>) -> impl Fn(u64, &str) -> bool + Send + Sync {
    let probe = PluginDirProbe::new(base_dir);
    move |max_bytes, candidate| probe.size_within_limit(max_bytes, candidate)
}

/// Accept only paths that stay inside the base directory
fn contained_relative_path(candidate: &str) -> Option<&Path> {
    let path = Path::new(candidate);
    if candidate.is_empty() {
        return None;
    }
    let contained = path
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    contained.then_some(path)
}
