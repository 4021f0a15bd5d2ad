use std::{path::PathBuf, time::Duration};

use clap::{Parser, Subcommand};
use rtorrent_client::{ClientConfig, DEFAULT_ENDPOINT, InfoHash, View};

/// Top-level CLI struct for the binary.
#[derive(Debug, Parser)]
#[command(version, about = "rTorrent XML-RPC CLI", long_about = None)]
pub(crate) struct Cli {
    /// rTorrent endpoint
    #[arg(long, global = true, env = "RTORRENT_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Disable certificate checking on this endpoint, useful for testing
    #[arg(long, global = true, env = "RTORRENT_DISABLE_CERT_CHECK")]
    pub disable_cert_check: bool,

    /// rTorrent basic auth username
    #[arg(long, global = true, env = "RTORRENT_USERNAME", default_value = "")]
    pub username: String,

    /// rTorrent basic auth password
    #[arg(
        long,
        global = true,
        env = "RTORRENT_PASSWORD",
        default_value = "",
        hide_env_values = true
    )]
    pub password: String,

    /// Abort requests that take longer than this many seconds
    #[arg(long, global = true, env = "RTORRENT_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// The client configuration selected by the global flags.
    pub(crate) fn config(&self) -> ClientConfig {
        let config = ClientConfig::new(&self.endpoint)
            .with_auth(&self.username, &self.password)
            .with_insecure_skip_verify(self.disable_cert_check);
        match self.timeout_secs {
            Some(secs) => config.with_timeout(Duration::from_secs(secs)),
            None => config,
        }
    }
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Retrieves the IP for this rTorrent instance
    GetIp,
    /// Retrieves the name for this rTorrent instance
    GetName,
    /// Retrieves the up/down totals for this rTorrent instance
    GetTotals,
    /// Retrieves the torrents from this rTorrent instance
    GetTorrents {
        /// View to use, known values: main, started, stopped, hashing, seeding
        #[arg(long, default_value = "main")]
        view: View,
    },
    /// Retrieves a single torrent
    GetTorrent {
        /// Hash of the torrent
        #[arg(long)]
        hash: InfoHash,
    },
    /// Retrieves the files for a specific torrent
    GetFiles {
        /// Hash of the torrent
        #[arg(long)]
        hash: InfoHash,
    },
    /// Retrieves the trackers for a specific torrent
    GetTrackers {
        /// Hash of the torrent
        #[arg(long)]
        hash: InfoHash,
    },
    /// Retrieves the transfer status of a specific torrent
    GetStatus {
        /// Hash of the torrent
        #[arg(long)]
        hash: InfoHash,
    },
    /// Adds a torrent by URL or from a local .torrent file
    Add {
        /// URL of the .torrent file or magnet link
        #[arg(long, required_unless_present = "file", conflicts_with = "file")]
        url: Option<String>,
        /// Local .torrent file to upload
        #[arg(long)]
        file: Option<PathBuf>,
        /// Add without starting
        #[arg(long)]
        stopped: bool,
        /// Label to set on the stopped torrent
        #[arg(long, requires = "stopped")]
        label: Option<String>,
    },
    /// Sets the label of a torrent
    SetLabel {
        /// Hash of the torrent
        #[arg(long)]
        hash: InfoHash,
        /// New label, may be empty
        #[arg(long)]
        label: String,
    },
    /// Starts a torrent
    Start {
        /// Hash of the torrent
        #[arg(long)]
        hash: InfoHash,
    },
    /// Stops a torrent
    Stop {
        /// Hash of the torrent
        #[arg(long)]
        hash: InfoHash,
    },
    /// Removes a torrent, leaving its data in place
    Delete {
        /// Hash of the torrent
        #[arg(long)]
        hash: InfoHash,
    },
}
