//! # rTorrent client over XML-RPC.
//!
//! usage:
//!
//! ```rust,ignore
//! use rtorrent_client::{ClientConfig, RTorrentClient};
//! use rtorrent_types::{Label, RTorrent, View};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::new("https://seedbox.example/RPC2").with_auth("user", "secret");
//!     let client = RTorrentClient::try_from_config(&config)?;
//!
//!     client.add_stopped("https://example.com/x.torrent", Some(&Label::new("linux")))?;
//!     for torrent in client.torrents(&View::Stopped)? {
//!         println!("{} {} [{}]", torrent.hash, torrent.name, torrent.label);
//!         for file in client.files(&torrent.hash)? {
//!             println!("\t{} ({} bytes)", file.path, file.size);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Every call blocks until the daemon answers. Entities are fetched in one batched round
//! trip; use [`RTorrentClient::execute`] to batch arbitrary procedures.

pub mod codec;
mod config;
mod conversions;
pub mod multicall;
mod procedures;
mod transport;

mod client;

#[cfg(test)]
mod testutil;

pub use client::RTorrentClient;
pub use codec::{Call, RawString, Response, Value};
pub use config::{ClientConfig, DEFAULT_ENDPOINT};
pub use multicall::CallResult;
pub use transport::{HttpTransport, Transport};

pub use rtorrent_types::{
    Fault, File, InfoHash, Label, RTorrent, RTorrentError, Status, Torrent, Tracker, TrackerType,
    View,
};

#[cfg(test)]
use test_log as _;
#[cfg(test)]
use tracing_subscriber as _;
