//! `devhost` command line.
//!
//! ```text
//! devhost check [--config devhost.toml]
//! devhost serve [--config devhost.toml] [--root public] [--host H] [--port P]
//! ```
//!
//! Any configuration or startup error prints `error: ...` to stderr and exits
//! with status 1.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use devhost::config::{self, ServerOverrides};
use devhost::integration::IntegrationRegistry;
use devhost::lifecycle::{self, signals, ServeOptions, Shutdown};
use devhost::observability::logging;

const DEFAULT_CONFIG: &str = "devhost.toml";

#[derive(Parser)]
#[command(name = "devhost", version)]
#[command(about = "Dev server for static sites", long_about = None)]
struct Cli {
    /// Log level for devhost (RUST_LOG takes precedence)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the config file and print the resolved configuration
    Check {
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
    },
    /// Run the dev server
    Serve {
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,

        /// Directory to serve
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Override server.host
        #[arg(long)]
        host: Option<String>,

        /// Override server.port
        #[arg(long, allow_negative_numbers = true)]
        port: Option<i64>,

        /// Do not watch files for changes
        #[arg(long)]
        no_watch: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.log_level.as_deref());

    match execute(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn execute(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Check { config: config_path } => {
            let config = config::load_file(&config_path)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Serve {
            config: config_path,
            root,
            host,
            port,
            no_watch,
        } => {
            let overrides = ServerOverrides { host, port };
            let source = config::read_file(&config_path)?.apply_overrides(&overrides);
            let config = config::load(&source)?;

            tracing::info!(
                site = %config.site_origin(),
                host = %config.server().host(),
                port = config.server().port(),
                "Configuration loaded"
            );

            let shutdown = Shutdown::new();
            signals::spawn_signal_handler(shutdown.clone());

            let options = ServeOptions {
                root,
                config_path: Some(config_path),
                watch: !no_watch,
            };
            let registry = IntegrationRegistry::with_builtins();
            lifecycle::run(config, options, &registry, shutdown).await?;

            tracing::info!("Shutdown complete");
        }
    }
    Ok(())
}
