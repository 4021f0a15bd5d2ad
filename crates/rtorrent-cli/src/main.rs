//! # rTorrent XML-RPC CLI
//!
//! ## Usage
//!
//! ```sh,ignore
//! cargo run --release --bin rtorrent -- --endpoint https://seedbox/RPC2 get-torrents --view stopped
//! ```
//!
//! Global flags can also be set through `RTORRENT_*` environment variables or a `.env` file.

use std::{io, process::ExitCode};

use clap::Parser;
use rtorrent_client::RTorrentClient;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::commands::CliError;

mod cli;
mod commands;
mod output;

/// Initializes the tracing subscriber.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    let config = cli.config();
    debug!("Using {config:?}");

    let client = match RTorrentClient::try_from_config(&config) {
        Ok(client) => client,
        Err(e) => {
            error!("error connecting to rTorrent: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut stdout = io::stdout().lock();
    match commands::run(&client, cli.command, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        // already reported per operation
        Err(CliError::Failed(_)) => ExitCode::FAILURE,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
