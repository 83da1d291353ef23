//! Output location resolution and persistence

use crate::errors::PackError;
use std::path::{Component, Path, PathBuf};

/// Where the artifact and a generated key end up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub out_dir: PathBuf,
    pub out_file: PathBuf,
}

/// Drop `.` and fold `..` into the preceding segment without touching the filesystem
fn lexically_normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Resolve the output directory and file.
///
/// Without an override the artifact is `output_name` placed next to the
/// plugin directory, i.e. in the parent of `plugin_dir` once its `.` and `..`
/// segments are resolved. `plugin_dir` should already be absolute. An
/// override is used verbatim as the file and its parent (or `.` for a bare
/// file name) becomes the output directory.
pub fn resolve_output_paths(
    plugin_dir: &Path,
    out: Option<&Path>,
    output_name: &str,
) -> OutputPaths {
    match out {
        Some(out_file) => {
            let out_dir = match out_file.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            };
            OutputPaths {
                out_dir,
                out_file: out_file.to_path_buf(),
            }
        }
        None => {
            let plugin_dir = lexically_normalize(plugin_dir);
            let out_dir = plugin_dir
                .parent()
                .map_or_else(|| plugin_dir.to_path_buf(), Path::to_path_buf);
            OutputPaths {
                out_file: out_dir.join(output_name),
                out_dir,
            }
        }
    }
}

/// Path of the key file written for a freshly generated key
pub fn key_file_path(out_dir: &Path, id: &str) -> PathBuf {
    out_dir.join(format!("{}.ppk", id))
}

pub(crate) fn write_file(path: &Path, contents: &[u8]) -> Result<(), PackError> {
    std::fs::write(path, contents).map_err(|e| PackError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_next_to_plugin_dir() {
        let paths = resolve_output_paths(Path::new("/work/sample/plugin-dir"), None, "plugin.zip");
        assert_eq!(paths.out_dir, PathBuf::from("/work/sample"));
        assert_eq!(paths.out_file, PathBuf::from("/work/sample/plugin.zip"));
    }

    #[test]
    fn test_parent_segments_are_resolved_first() {
        let paths = resolve_output_paths(
            Path::new("/work/sample/plugin-dir/image/.."),
            None,
            "plugin.zip",
        );
        assert_eq!(paths.out_file, PathBuf::from("/work/sample/plugin.zip"));

        let paths = resolve_output_paths(Path::new("/work/sample/plugin-dir/."), None, "plugin.zip");
        assert_eq!(paths.out_dir, PathBuf::from("/work/sample"));
    }

    #[test]
    fn test_configured_output_name() {
        let paths = resolve_output_paths(Path::new("/work/plugin-dir"), None, "release.zip");
        assert_eq!(paths.out_file, PathBuf::from("/work/release.zip"));
    }

    #[test]
    fn test_override_is_used_verbatim() {
        let paths = resolve_output_paths(
            Path::new("/work/plugin-dir"),
            Some(Path::new("dist/out/custom.zip")),
            "plugin.zip",
        );
        assert_eq!(paths.out_file, PathBuf::from("dist/out/custom.zip"));
        assert_eq!(paths.out_dir, PathBuf::from("dist/out"));
    }

    #[test]
    fn test_bare_override_uses_current_dir() {
        let paths = resolve_output_paths(
            Path::new("/work/plugin-dir"),
            Some(Path::new("custom.zip")),
            "plugin.zip",
        );
        assert_eq!(paths.out_dir, PathBuf::from("."));
        assert_eq!(paths.out_file, PathBuf::from("custom.zip"));
    }

    #[test]
    fn test_key_file_path() {
        assert_eq!(
            key_file_path(Path::new("/work"), "abcdefghijklmnop"),
            PathBuf::from("/work/abcdefghijklmnop.ppk")
        );
    }
}
