use crate::config_manager::Config;
use crate::errors::PackError;
use crate::logger;
use crate::pipeline::check_plugin;
use crate::GlobalOpts;
use clap::Args;
use colored::*;
use plugpack_manifest::{format_issues, ManifestError, SourceListResolver};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Args, Debug, Clone)]
pub struct ValidateCommand {
    /// Plugin directory containing manifest.json
    pub plugin_dir: PathBuf,

    /// Print the validation result as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn handle_validate(command: ValidateCommand, opts: &GlobalOpts) -> Result<(), PackError> {
    let check = check_plugin(&command.plugin_dir)?;

    if command.json {
        let rendered = serde_json::to_string_pretty(&check.result).map_err(ManifestError::from)?;
        println!("{}", rendered);
    } else if !check.result.valid {
        logger::error("Invalid manifest.json:");
        for line in format_issues(&check.result.errors) {
            logger::list_item(&line);
        }
    }

    if !check.result.valid {
        return Err(PackError::InvalidManifest(check.result.errors));
    }
    if command.json {
        return Ok(());
    }

    let config = Config::load()?;
    let sources = SourceListResolver::default()
        .with_extra_selectors(&config.source_fields)?
        .resolve(&check.manifest);

    println!("{}", "Bundled files:".bold().green());
    for source in &sources {
        println!("  {}", source);
    }

    let unreferenced = unreferenced_files(&command.plugin_dir, &sources);
    if !unreferenced.is_empty() {
        println!("{}", "Not referenced by manifest.json:".bold().yellow());
        for file in &unreferenced {
            println!("  {}", file.dimmed());
        }
    } else if opts.verbosity_level() > 0 {
        logger::info("Every file in the plugin directory is referenced");
    }

    logger::success("manifest.json is valid");
    Ok(())
}

/// Files under `plugin_dir` that the source list leaves out, sorted, with `/` separators
pub fn unreferenced_files(plugin_dir: &Path, sources: &[String]) -> Vec<String> {
    let bundled: HashSet<&str> = sources.iter().map(String::as_str).collect();

    WalkDir::new(plugin_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let relative = entry.path().strip_prefix(plugin_dir).ok()?;
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            (!bundled.contains(name.as_str())).then_some(name)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use plugpack_manifest::Manifest;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_unreferenced_files() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let root = temp_dir.path();
        assert!(fs::create_dir_all(root.join("image")).is_ok());
        assert!(fs::create_dir_all(root.join("src")).is_ok());
        for file in ["manifest.json", "image/icon.png", "image/unused.png", "src/app.ts"] {
            assert!(fs::write(root.join(file), "x").is_ok());
        }

        let sources = vec!["manifest.json".to_string(), "image/icon.png".to_string()];
        assert_eq!(
            unreferenced_files(root, &sources),
            vec!["image/unused.png", "src/app.ts"]
        );
    }

    #[test]
    fn test_dot_prefixed_references_count_as_referenced() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let root = temp_dir.path();
        assert!(fs::create_dir_all(root.join("image")).is_ok());
        for file in ["manifest.json", "image/icon.png"] {
            assert!(fs::write(root.join(file), "x").is_ok());
        }

        let manifest = Manifest::from_value(json!({"icon": "./image/icon.png"}));
        let sources = SourceListResolver::default().resolve(&manifest);
        assert!(unreferenced_files(root, &sources).is_empty());
    }
}
