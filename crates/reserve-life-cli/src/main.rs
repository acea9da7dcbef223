//! Reserve Life CLI - Command-line interface for the reserve life tracker.

use clap::Parser;
use reserve_life_cli::commands;
use reserve_life_cli::{Cli, Command, Config, Formatter};
use reserve_life_store::JsonStore;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr; `-v` overrides `RUST_LOG`, which overrides the `info` default.
fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

async fn run(cli: Cli) -> reserve_life_cli::Result<()> {
    // Load or create config
    let config_path = match cli.config {
        Some(path) => path,
        None => Config::default_path()?,
    };
    let config = Config::load(&config_path)?;

    // Determine output format
    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);

    // Determine color setting
    let color_enabled = !cli.no_color && config.settings.color;

    // Create formatter
    let formatter = Formatter::new(format, color_enabled);

    let mut store = JsonStore::open(config.data_path(&config_path))?;

    // Handle commands
    match cli.command {
        Command::Company(args) => {
            commands::execute_company(args, &mut store, &config, &formatter).await?;
        }
        Command::Filings(args) => {
            commands::execute_filings(args, &mut store, &config, &formatter).await?;
        }
        Command::Extract(args) => {
            commands::execute_extract(args, &mut store, &config, &formatter).await?;
        }
        Command::Series(args) => {
            commands::execute_series(args, &store, &formatter)?;
        }
        Command::Log(args) => {
            commands::execute_log(args, &store, &formatter)?;
        }
    }

    Ok(())
}
