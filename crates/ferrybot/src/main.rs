// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ferrybot - an IM-automation gateway with a staged handler pipeline.
//!
//! This is the binary entry point for the gateway process.

use clap::{Parser, Subcommand};

mod serve;
mod shutdown;

/// Ferrybot - an IM-automation gateway with a staged handler pipeline.
#[derive(Parser, Debug)]
#[command(name = "ferrybot", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the gateway server.
    Serve,
    /// Print the resolved configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup.
    let config = match ferrybot_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            ferrybot_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("ferrybot: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Config) => match toml::to_string_pretty(&config) {
            Ok(rendered) => print!("{rendered}"),
            Err(e) => {
                eprintln!("ferrybot: failed to render config: {e}");
                std::process::exit(1);
            }
        },
        None => {
            println!("ferrybot: use --help for available commands");
        }
    }
}
