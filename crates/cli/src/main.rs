//! Brainstem CLI — the main entry point.
//!
//! Commands:
//! - `onboard`   — Write a default config file
//! - `status`    — Show the effective configuration
//! - `config`    — Validate, print or locate the config file
//! - `simulate`  — Run the brain against the built-in simulated world

use brainstem_config::{AppConfig, LoggingConfig};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(
    name = "brainstem",
    about = "Brainstem — autonomous decision engine for block-world game agents",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Onboard,

    /// Show the effective configuration
    Status,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Run the brain against the simulated world
    Simulate {
        /// Wall-clock seconds to run for
        #[arg(short, long, default_value_t = 120)]
        seconds: u64,

        /// Seed for the world and the brain
        #[arg(long, default_value_t = 42, env = "BRAINSTEM_SEED")]
        seed: u64,

        /// World seconds simulated per wall-clock second
        #[arg(long, default_value_t = 1.0)]
        speed: f64,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Parse and validate the config file
    Validate,
    /// Print the effective configuration as TOML
    Show,
    /// Print the config file location
    Path,
}

fn init_tracing(verbose: bool, logging: &LoggingConfig) {
    let default = if verbose { "debug" } else { logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let logging = AppConfig::load().map(|c| c.logging).unwrap_or_default();
    init_tracing(cli.verbose, &logging);

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Status => commands::status::run().await?,
        Commands::Config { action } => match action {
            ConfigAction::Validate => commands::config_cmd::validate().await?,
            ConfigAction::Show => commands::config_cmd::show().await?,
            ConfigAction::Path => commands::config_cmd::path().await?,
        },
        Commands::Simulate {
            seconds,
            seed,
            speed,
        } => commands::simulate::run(seconds, seed, speed).await?,
    }

    Ok(())
}
