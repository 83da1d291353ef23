use clap::{Parser, Subcommand};
use plugpack::{
    commands::{
        config::{self, ConfigAction},
        pack::{self, PackCommand},
        validate::{self, ValidateCommand},
    },
    logger, GlobalOpts,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "plugpack")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Plugin packager",
    long_about = "plugpack validates a plugin directory against its manifest.json and packages it into a signed plugin archive."
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate and package a plugin directory
    Pack(PackCommand),
    /// Validate manifest.json without packaging
    Validate(ValidateCommand),
    /// Configure plugpack
    #[command(subcommand_required = false, arg_required_else_help = false)]
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| logger::verbosity_to_tracing_filter().into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr),
        )
        .init();
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logger::init_with_verbosity(cli.global.verbosity_level()) {
        logger::warn(&format!("Failed to initialize logger: {}", e));
    }
    init_tracing();

    let result = match cli.command {
        Commands::Pack(command) => pack::handle_pack(command, &cli.global).map_err(|e| e.to_string()),
        Commands::Validate(command) => {
            validate::handle_validate(command, &cli.global).map_err(|e| e.to_string())
        }
        Commands::Config { action } => {
            config::handle_config(action, &cli.global).map_err(|e| e.to_string())
        }
    };

    if let Err(e) = result {
        logger::error(&e);
        if cli.global.verbosity_level() > 0 {
            logger::show_log_path();
        }
        std::process::exit(1);
    }
}
