//! parentcfg CLI
//!
//! Compiles a catalog snapshot into the parent.config of one cache server.
//!
//! # Usage
//!
//! ```bash
//! parentcfg compile snapshot.json --to-url https://to.example.net
//! parentcfg compile snapshot.yaml --ats-major-version 5 -o parent.config
//! parentcfg --format json compile snapshot.json
//! parentcfg config set tool_name my-config-tool
//! ```
//!
//! Logs go to stderr (`RUST_LOG`, default `info`), stdout carries only output.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod output;
mod snapshot;

#[derive(Parser)]
#[command(name = "parentcfg")]
#[command(version)]
#[command(about = "parent.config compiler for cache fleets", long_about = None)]
struct Cli {
    /// Output format
    #[arg(long, short, env = "PARENTCFG_FORMAT")]
    format: Option<output::OutputFormat>,

    /// Profile name from config file
    #[arg(long, short, env = "PARENTCFG_PROFILE")]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile parent.config from a JSON or YAML snapshot
    Compile {
        /// Snapshot file (.json, .yaml or .yml)
        snapshot: PathBuf,

        /// Tool name written into the header comment
        #[arg(long, env = "PARENTCFG_TOOL_NAME")]
        tool_name: Option<String>,

        /// Control-plane URL written into the header comment
        #[arg(long, env = "PARENTCFG_TO_URL")]
        to_url: Option<String>,

        /// Major version of the cache software
        #[arg(long, env = "PARENTCFG_ATS_MAJOR_VERSION")]
        ats_major_version: Option<u32>,

        /// Write to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Configure CLI
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Set configuration value
    Set { key: String, value: String },
    /// Get configuration value
    Get { key: String },
    /// List all configuration
    List,
    /// Initialize configuration
    Init,
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let profile = cli.profile.as_deref();

    match cli.command {
        Commands::Compile {
            snapshot,
            tool_name,
            to_url,
            ats_major_version,
            output,
        } => {
            let config = config::Config::load(profile).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Config not readable, using defaults");
                config::Config::default()
            });
            let format = match cli.format {
                Some(format) => format,
                None => default_format(&config),
            };

            let args = commands::compile::CompileArgs {
                snapshot,
                tool_name,
                to_url,
                ats_major_version,
                output,
            };
            commands::compile::handle(args, &config, format)
        }
        Commands::Config { action } => commands::config::handle(action, profile),
    }
}

fn default_format(config: &config::Config) -> output::OutputFormat {
    use clap::ValueEnum;

    config
        .default_format
        .as_deref()
        .and_then(|name| output::OutputFormat::from_str(name, true).ok())
        .unwrap_or(output::OutputFormat::Text)
}
