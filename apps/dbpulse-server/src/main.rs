use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use runtime::{AppConfig, CliArgs};

mod db;
mod server;
mod shutdown;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// dbpulse server - paginated, filterable reports over database telemetry
#[derive(Parser)]
#[command(name = "dbpulse-server")]
#[command(about = "dbpulse server - paginated, filterable reports over database telemetry")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use an in-memory database seeded with demo data
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
        mock: cli.mock,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config.logging.clone().unwrap_or_default();
    runtime::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "dbpulse server starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => server::run(config, args).await,
        Commands::Check => check_config(&config, &args),
    }
}

fn check_config(config: &AppConfig, args: &CliArgs) -> Result<()> {
    tracing::info!("Checking configuration...");

    if config.server.host.trim().is_empty() {
        bail!("server.host must not be empty");
    }
    if args.mock {
        tracing::info!("--mock set, skipping database check");
    } else {
        match &config.database {
            Some(db) => {
                let backend = db::detect_from_dsn(db)?;
                tracing::info!(backend, "database url accepted");
            }
            None => bail!("no database configured (use --mock to run without one)"),
        }
    }
    for name in config.reports.resources.keys() {
        if !reports::RESOURCE_NAMES.contains(&name.as_str()) {
            bail!("reports.resources: unknown resource '{name}'");
        }
    }

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("{}", config.to_yaml()?);
    Ok(())
}
