//! # rTorrent Types
//!
//! This crate defines the domain types, the error type and the [`RTorrent`] trait
//! shared by the rTorrent XML-RPC client and its front ends.

use std::{convert::Infallible, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use thiserror::Error;

/// A procedure-level error reported by the daemon inside a well-formed response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("fault {code}: {message}")]
pub struct Fault {
    /// The daemon's fault code.
    pub code: i64,
    /// The daemon's fault message.
    pub message: String,
}

impl Fault {
    /// Create a new fault.
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Whether the daemon rejected the call because it does not know the given info-hash.
    pub fn is_unknown_hash(&self) -> bool {
        self.message
            .to_ascii_lowercase()
            .contains("could not find info-hash")
    }
}

/// Error type for rTorrent operations.
#[derive(Error, Debug)]
pub enum RTorrentError {
    /// The endpoint could not be parsed, or the HTTP client could not be built for it.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Connection, TLS or HTTP status failures. `status` is set when the daemon answered
    /// with a non-success HTTP status.
    #[error("transport error: {message}")]
    Transport {
        /// HTTP status code, if a response was received.
        status: Option<u16>,
        /// Description of the failure, including its underlying causes.
        message: String,
    },

    /// A request parameter cannot be represented in an XML-RPC document, such as a NaN
    /// double or a string holding a control character XML 1.0 forbids.
    #[error("encode error: {0}")]
    Encode(String),

    /// The response body is not a well-formed XML-RPC response.
    #[error("decode error: {0}")]
    Decode(String),

    /// The daemon reported an error for the procedure call.
    #[error("daemon {0}")]
    Fault(Fault),

    /// A multicall returned a different number of results than calls were submitted.
    #[error("batch size mismatch: submitted {expected} calls, received {actual} results")]
    BatchSizeMismatch {
        /// Number of submitted calls.
        expected: usize,
        /// Number of decoded results.
        actual: usize,
    },

    /// Decoded values do not match the fields expected for an entity.
    #[error("mapping error: {0}")]
    Mapping(String),
}

impl From<Fault> for RTorrentError {
    fn from(fault: Fault) -> Self {
        Self::Fault(fault)
    }
}

/// Canonical torrent identifier, always upper-case hex.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InfoHash(String);

impl InfoHash {
    /// Create an info-hash, normalizing it to upper case.
    pub fn new(hash: impl AsRef<str>) -> Self {
        Self(hash.as_ref().trim().to_ascii_uppercase())
    }

    /// The normalized hash.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InfoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InfoHash {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for InfoHash {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl FromStr for InfoHash {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl PartialEq<str> for InfoHash {
    fn eq(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other.trim())
    }
}

impl PartialEq<&str> for InfoHash {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

/// A named, daemon-defined filter over the torrent set.
///
/// The daemon validates view names, the client passes them through verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum View {
    /// Every torrent.
    #[default]
    Main,
    /// Started torrents.
    Started,
    /// Stopped torrents.
    Stopped,
    /// Torrents being hash-checked.
    Hashing,
    /// Completed torrents being seeded.
    Seeding,
    /// Any other view configured on the daemon.
    Custom(String),
}

impl View {
    /// The view name as sent to the daemon.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Main => "main",
            Self::Started => "started",
            Self::Stopped => "stopped",
            Self::Hashing => "hashing",
            Self::Seeding => "seeding",
            Self::Custom(name) => name,
        }
    }
}

impl From<&str> for View {
    fn from(value: &str) -> Self {
        match value {
            "main" => Self::Main,
            "started" => Self::Started,
            "stopped" => Self::Stopped,
            "hashing" => Self::Hashing,
            "seeding" => Self::Seeding,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl FromStr for View {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A label to attach to a torrent when it is added.
///
/// Pass `None` where a label is optional to leave the label untouched;
/// `Some(Label::new(""))` explicitly sets an empty label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Label(String);

impl Label {
    /// The field that stores labels on the daemon.
    pub const FIELD: &'static str = "d.custom1";

    /// Create a label.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The label value.
    pub fn value(&self) -> &str {
        &self.0
    }

    /// The label as an inline command argument, e.g. `d.custom1.set="movies"`.
    pub fn to_command(&self) -> String {
        let escaped = self.0.replace('\\', "\\\\").replace('"', "\\\"");
        format!("{}.set=\"{}\"", Self::FIELD, escaped)
    }
}

impl From<&str> for Label {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// How a tracker is contacted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackerType {
    /// HTTP(S) tracker.
    Http,
    /// UDP tracker.
    Udp,
    /// Distributed hash table.
    Dht,
}

impl TryFrom<i64> for TrackerType {
    type Error = RTorrentError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::Http),
            2 => Ok(Self::Udp),
            3 => Ok(Self::Dht),
            other => Err(RTorrentError::Mapping(format!(
                "unknown tracker type code {other}"
            ))),
        }
    }
}

/// Torrent information.
#[derive(Debug, Clone, PartialEq)]
pub struct Torrent {
    /// Unique identifier of the torrent.
    pub hash: InfoHash,
    /// Display name.
    pub name: String,
    /// Free-form label, empty when unset.
    pub label: String,
    /// Total size in bytes.
    pub size: u64,
    /// Download path, empty until the daemon knows where the data lives.
    pub path: String,
    /// Whether all data has been downloaded.
    pub completed: bool,
    /// Upload/download ratio.
    pub ratio: f64,
    /// Creation date from the metainfo.
    pub created: Option<DateTime<Utc>>,
    /// When the torrent was last started.
    pub started: Option<DateTime<Utc>>,
    /// When the download finished.
    pub finished: Option<DateTime<Utc>>,
}

/// A file belonging to a torrent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    /// Path relative to the torrent's base path.
    pub path: String,
    /// Size in bytes.
    pub size: u64,
}

/// A tracker belonging to a torrent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tracker {
    /// Announce URL.
    pub url: String,
    /// How the tracker is contacted.
    pub kind: TrackerType,
    /// Whether the tracker is used.
    pub enabled: bool,
    /// Consecutive failed announces.
    pub failed_counter: u64,
    /// Peers returned by the last announce.
    pub peers: u64,
    /// Last announce attempt, if any.
    pub last_announce_attempt: Option<DateTime<Utc>>,
}

/// A point-in-time transfer snapshot of a torrent.
#[derive(Debug, Clone, PartialEq)]
pub struct Status {
    /// Whether all data has been downloaded.
    pub completed: bool,
    /// Bytes downloaded so far.
    pub completed_bytes: u64,
    /// Current download rate in bytes per second.
    pub down_rate: u64,
    /// Current upload rate in bytes per second.
    pub up_rate: u64,
    /// Total size in bytes.
    pub size: u64,
    /// Upload/download ratio.
    pub ratio: f64,
}

/// RTorrent defines the entity-oriented interface to an rTorrent daemon.
///
/// Every call is a blocking, point-in-time request. State-changing operations return once
/// the daemon has acknowledged them, which is not necessarily when the change is visible;
/// poll the read operations to observe it.
pub trait RTorrent {
    /// The address the daemon is bound to.
    fn ip(&self) -> Result<String, RTorrentError>;
    /// The daemon's host name.
    fn name(&self) -> Result<String, RTorrentError>;
    /// Total bytes downloaded.
    fn down_total(&self) -> Result<u64, RTorrentError>;
    /// Total bytes uploaded.
    fn up_total(&self) -> Result<u64, RTorrentError>;
    /// Current global download rate in bytes per second.
    fn down_rate(&self) -> Result<u64, RTorrentError>;
    /// Current global upload rate in bytes per second.
    fn up_rate(&self) -> Result<u64, RTorrentError>;

    /// List the torrents in a view, in the daemon's order.
    fn torrents(&self, view: &View) -> Result<Vec<Torrent>, RTorrentError>;
    /// Get a single torrent.
    fn torrent(&self, hash: &InfoHash) -> Result<Torrent, RTorrentError>;
    /// List the files of a torrent.
    fn files(&self, hash: &InfoHash) -> Result<Vec<File>, RTorrentError>;
    /// List the trackers of a torrent, primary tracker first.
    fn trackers(&self, hash: &InfoHash) -> Result<Vec<Tracker>, RTorrentError>;
    /// Get the transfer status of a torrent.
    fn status(&self, hash: &InfoHash) -> Result<Status, RTorrentError>;

    /// Add a torrent by URL and start it.
    fn add(&self, url: &str) -> Result<(), RTorrentError>;
    /// Add a torrent by URL without starting it, optionally labelled.
    fn add_stopped(&self, url: &str, label: Option<&Label>) -> Result<(), RTorrentError>;
    /// Upload torrent file contents and start the torrent.
    fn add_torrent(&self, data: &[u8]) -> Result<(), RTorrentError>;
    /// Upload torrent file contents without starting the torrent, optionally labelled.
    fn add_torrent_stopped(&self, data: &[u8], label: Option<&Label>)
    -> Result<(), RTorrentError>;

    /// Set the label of a torrent.
    fn set_label(&self, hash: &InfoHash, label: &str) -> Result<(), RTorrentError>;
    /// Announce to the torrent's trackers now.
    fn reannounce(&self, hash: &InfoHash) -> Result<(), RTorrentError>;
    /// Remove a torrent from the daemon. Downloaded data is left in place.
    fn delete(&self, hash: &InfoHash) -> Result<(), RTorrentError>;
    /// Start a torrent.
    fn start(&self, hash: &InfoHash) -> Result<(), RTorrentError>;
    /// Stop a torrent.
    fn stop(&self, hash: &InfoHash) -> Result<(), RTorrentError>;
    /// Pause a torrent.
    fn pause(&self, hash: &InfoHash) -> Result<(), RTorrentError>;
    /// Resume a paused torrent.
    fn resume(&self, hash: &InfoHash) -> Result<(), RTorrentError>;
    /// Open a torrent.
    fn open(&self, hash: &InfoHash) -> Result<(), RTorrentError>;
    /// Close a torrent.
    fn close(&self, hash: &InfoHash) -> Result<(), RTorrentError>;

    /// Whether the torrent is open.
    fn is_open(&self, hash: &InfoHash) -> Result<bool, RTorrentError>;
    /// Whether the torrent is active.
    fn is_active(&self, hash: &InfoHash) -> Result<bool, RTorrentError>;
    /// The daemon's state flag: 0 for stopped, 1 for started.
    fn state(&self, hash: &InfoHash) -> Result<i64, RTorrentError>;
}
