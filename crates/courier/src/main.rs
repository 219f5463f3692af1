// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Courier - forwards messaging-session events to a PocketBase record-store.
//!
//! This is the binary entry point for the bridge.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod console;
mod qr;
mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use courier_config::{ConfigError, CourierConfig};

/// Courier - forwards messaging-session events to a record-store.
#[derive(Parser, Debug)]
#[command(name = "courier", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable debug logs.
    #[arg(long, global = true)]
    debug: bool,

    /// Request full (1 year) history sync when logging in.
    #[arg(long, global = true)]
    request_full_sync: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the bridge (default).
    Serve,
    /// Print the effective configuration as TOML.
    Config,
}

impl Cli {
    fn load_config(&self) -> Result<CourierConfig, Vec<ConfigError>> {
        let mut config = match &self.config {
            Some(path) => courier_config::load_and_validate_path(path)?,
            None => courier_config::load_and_validate()?,
        };
        if self.debug {
            config.log.level = "debug".to_string();
        }
        if self.request_full_sync {
            config.session.request_full_sync = true;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match cli.load_config() {
        Ok(config) => config,
        Err(errors) => {
            courier_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Commands::Config => match toml::to_string_pretty(&config) {
            Ok(rendered) => print!("{rendered}"),
            Err(e) => {
                eprintln!("error: failed to render configuration: {e}");
                std::process::exit(1);
            }
        },
    }
}
