use crate::config_manager::Config;
use crate::errors::PackError;
use crate::logger;
use crate::pipeline::{pack_plugin, PackOptions};
use crate::GlobalOpts;
use clap::Args;
use colored::*;
use plugpack_signer::Ed25519Packer;
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct PackCommand {
    /// Plugin directory containing manifest.json
    pub plugin_dir: PathBuf,

    /// Private key file; a new key is generated and saved as <id>.ppk when omitted
    #[arg(long, value_name = "FILE")]
    pub ppk: Option<PathBuf>,

    /// Output plugin file (default: plugin.zip next to the plugin directory)
    #[arg(short, long, value_name = "FILE")]
    pub out: Option<PathBuf>,
}

pub fn handle_pack(command: PackCommand, opts: &GlobalOpts) -> Result<(), PackError> {
    let config = Config::load()?;
    let options = PackOptions {
        ppk: command.ppk,
        out: command.out,
        ..PackOptions::from_config(&config)?
    };
    logger::debug(&format!(
        "Packing {} (compression: {})",
        command.plugin_dir.display(),
        options.compression
    ));

    let report = pack_plugin(&command.plugin_dir, &options, &Ed25519Packer)?;

    if opts.verbosity_level() > 0 {
        for entry in &report.entries {
            logger::list_item(entry);
        }
    }
    if let Some(key_file) = &report.key_file {
        logger::success(&format!("Generated private key {}", key_file.display()));
    }
    logger::success(&format!("Packed plugin {}", report.id.cyan()));
    println!("{}", report.output_file.display());
    Ok(())
}
