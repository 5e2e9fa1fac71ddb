// Copyright 2026 SynQc Contributors
// SPDX-License-Identifier: Apache-2.0

//! SynQc provider CLI
//!
//! Inspect the configured provider clients and run experiment presets on them.
//!
//! # Usage
//!
//! ```bash
//! # List configured providers
//! SYNQC_QISKIT_BACKEND_IBM_QUANTUM=aer_simulator synqc providers
//!
//! # Run a preset
//! synqc run --provider ibm_quantum --preset health --shots 1024
//!
//! # Check a configuration file
//! synqc validate --config /path/to/synqc.yaml
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use synqc_providers::config::{Config, LoggingConfig};
use synqc_providers::provider::{Capabilities, ExperimentPreset, ProviderRegistry};
use synqc_providers::{Result, VERSION};

/// SynQc provider clients
#[derive(Parser)]
#[command(name = "synqc")]
#[command(author = "SynQc Contributors")]
#[command(version = VERSION)]
#[command(about = "Run SynQc experiment presets on configured quantum providers")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured providers
    Providers,

    /// List experiment presets
    Presets,

    /// Run an experiment preset on a provider
    Run {
        /// Provider id (e.g. ibm_quantum)
        #[arg(short, long)]
        provider: String,

        /// Preset name (health, latency, dpd_demo)
        #[arg(long, default_value = "health")]
        preset: String,

        /// Number of shots
        #[arg(short, long, default_value_t = 1024)]
        shots: u32,
    },

    /// Show effective configuration
    Config,

    /// Validate configuration file
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    init_logging(&config.logging);

    match cli.command {
        Commands::Providers => {
            let registry = ProviderRegistry::from_config(&config)?;
            let caps = Capabilities::detect();

            println!(
                "Capabilities: simulator={} runtime={}",
                caps.simulator, caps.runtime
            );
            println!("Configured providers:");
            for (id, backend) in registry.list_with_backends() {
                println!("  {} -> {}", id, backend);
            }

            if registry.is_empty() {
                println!("  (no providers configured)");
            }
        }

        Commands::Presets => {
            for preset in ExperimentPreset::ALL {
                println!("  {:<10} {}", preset, preset.description());
            }
        }

        Commands::Run {
            provider,
            preset,
            shots,
        } => {
            let preset: ExperimentPreset = preset.parse()?;
            let registry = ProviderRegistry::from_config(&config)?;
            let client = registry.get(&provider)?;

            info!(
                version = VERSION,
                provider = %provider,
                backend = %client.backend_name(),
                "Starting run"
            );

            match client.run(preset, shots).await {
                Ok(result) => {
                    info!(
                        provider = %provider,
                        most_frequent = ?result.most_frequent(),
                        fidelity = ?result.fidelity,
                        "Run complete"
                    );
                    println!("{}", serde_json::to_string_pretty(&result)?);
                }
                Err(e) => {
                    error!(provider = %provider, code = e.code(), error = %e, "Run failed");
                    eprintln!("{}: {}", e.code(), e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Config => {
            println!("{}", serde_yml::to_string(&config)?);
        }

        Commands::Validate => match config.validate() {
            Ok(()) => {
                println!("Configuration is valid");
            }
            Err(e) => {
                eprintln!("Configuration error: {}", e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}

/// Initialize logging with tracing. Logs go to stderr so command output stays parseable.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let registry = tracing_subscriber::registry().with(filter);

    if logging.format == "json" {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
