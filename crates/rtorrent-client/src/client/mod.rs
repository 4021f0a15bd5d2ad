//! rTorrent XML-RPC client implementation.

use tracing::debug;

use rtorrent_types::{
    File, InfoHash, Label, RTorrent, RTorrentError, Status, Torrent, Tracker, View,
};

use crate::codec::{Call, Value};
use crate::config::ClientConfig;
use crate::conversions::{self, FromFields};
use crate::multicall::{self, CallResult};
use crate::procedures::{self, Field};
use crate::transport::{HttpTransport, Transport};

#[cfg(test)]
mod tests;

/// RTorrentClient talks to one rTorrent daemon over XML-RPC.
///
/// The client only holds immutable configuration, so it can be shared between threads
/// whenever its transport can.
#[derive(Debug, Clone)]
pub struct RTorrentClient<T: Transport = HttpTransport> {
    transport: T,
}

impl RTorrentClient {
    /// Create a client for `endpoint` without authentication.
    ///
    /// `insecure` skips TLS certificate validation and should only be used for testing.
    pub fn new(endpoint: &str, insecure: bool) -> Result<Self, RTorrentError> {
        Self::try_from_config(&ClientConfig::new(endpoint).with_insecure_skip_verify(insecure))
    }

    /// Create a client from a full configuration.
    pub fn try_from_config(config: &ClientConfig) -> Result<Self, RTorrentError> {
        let transport = HttpTransport::new(config)?;
        debug!("Using rTorrent XML-RPC endpoint {}", transport.endpoint());
        Ok(Self { transport })
    }
}

impl<T: Transport> RTorrentClient<T> {
    /// Create a client over a custom transport.
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Execute arbitrary procedure calls in one round trip, one result per call.
    pub fn execute(&self, calls: &[Call]) -> Result<Vec<CallResult>, RTorrentError> {
        multicall::execute(&self.transport, calls)
    }

    /// Execute one arbitrary procedure call.
    pub fn call(&self, call: Call) -> Result<Value, RTorrentError> {
        multicall::call(&self.transport, call)
    }

    fn get_text(&self, procedure: &str) -> Result<String, RTorrentError> {
        let value = self.call(Call::new(procedure, Vec::new()))?;
        conversions::string_value(procedure, value)
    }

    fn get_unsigned(&self, procedure: &str) -> Result<u64, RTorrentError> {
        let value = self.call(Call::new(procedure, Vec::new()))?;
        conversions::unsigned_value(procedure, value)
    }

    fn get_field(&self, field: Field, hash: &InfoHash) -> Result<Value, RTorrentError> {
        self.call(Call::new(field.name(), vec![hash.as_str().into()]))
    }

    /// Fetch one entity by requesting each of its fields in a single batch.
    fn fetch<E: FromFields>(&self, hash: &InfoHash) -> Result<E, RTorrentError> {
        let calls: Vec<Call> = E::FIELDS
            .iter()
            .map(|field| Call::new(field.name(), vec![hash.as_str().into()]))
            .collect();
        let values = multicall::execute_all(&self.transport, &calls)?;
        conversions::map_flat::<E>(values)?
            .into_iter()
            .next()
            .ok_or_else(|| RTorrentError::Mapping(format!("no fields returned for {hash}")))
    }

    /// Fetch the files or trackers of a torrent through a daemon-side multicall.
    fn fetch_rows<E: FromFields>(
        &self,
        procedure: &str,
        hash: &InfoHash,
    ) -> Result<Vec<E>, RTorrentError> {
        let mut params: Vec<Value> = vec![hash.as_str().into(), "".into()];
        params.extend(E::FIELDS.iter().map(|field| Value::from(field.query())));
        let rows = self.call(Call::new(procedure, params))?;
        conversions::map_rows(rows)
    }

    fn command(&self, procedure: &str, hash: &InfoHash) -> Result<(), RTorrentError> {
        self.call(Call::new(procedure, vec![hash.as_str().into()]))?;
        Ok(())
    }

    fn load(
        &self,
        procedure: &str,
        source: Value,
        label: Option<&Label>,
    ) -> Result<(), RTorrentError> {
        let mut params = vec![Value::from(""), source];
        if let Some(label) = label {
            params.push(label.to_command().into());
        }
        self.call(Call::new(procedure, params))?;
        Ok(())
    }
}

impl<T: Transport> RTorrent for RTorrentClient<T> {
    fn ip(&self) -> Result<String, RTorrentError> {
        debug!("Getting bind address");
        let ip = self.get_text(procedures::BIND_ADDRESS)?;
        debug!("Bind address: {ip}");
        Ok(ip)
    }

    fn name(&self) -> Result<String, RTorrentError> {
        debug!("Getting host name");
        let name = self.get_text(procedures::HOSTNAME)?;
        debug!("Host name: {name}");
        Ok(name)
    }

    fn down_total(&self) -> Result<u64, RTorrentError> {
        debug!("Getting download total");
        let down_total = self.get_unsigned(procedures::DOWN_TOTAL)?;
        debug!("Download total: {down_total} bytes");
        Ok(down_total)
    }

    fn up_total(&self) -> Result<u64, RTorrentError> {
        debug!("Getting upload total");
        let up_total = self.get_unsigned(procedures::UP_TOTAL)?;
        debug!("Upload total: {up_total} bytes");
        Ok(up_total)
    }

    fn down_rate(&self) -> Result<u64, RTorrentError> {
        debug!("Getting download rate");
        let down_rate = self.get_unsigned(procedures::DOWN_RATE)?;
        debug!("Download rate: {down_rate} B/s");
        Ok(down_rate)
    }

    fn up_rate(&self) -> Result<u64, RTorrentError> {
        debug!("Getting upload rate");
        let up_rate = self.get_unsigned(procedures::UP_RATE)?;
        debug!("Upload rate: {up_rate} B/s");
        Ok(up_rate)
    }

    fn torrents(&self, view: &View) -> Result<Vec<Torrent>, RTorrentError> {
        debug!("Listing torrents in view {view}");
        let mut params: Vec<Value> = vec!["".into(), view.as_str().into()];
        params.extend(Torrent::FIELDS.iter().map(|field| Value::from(field.query())));
        let rows = self.call(Call::new(procedures::TORRENT_MULTICALL, params))?;
        let torrents: Vec<Torrent> = conversions::map_rows(rows)?;
        debug!("{} torrents in view {view}", torrents.len());
        Ok(torrents)
    }

    fn torrent(&self, hash: &InfoHash) -> Result<Torrent, RTorrentError> {
        debug!("Getting torrent {hash}");
        let torrent: Torrent = self.fetch(hash)?;
        debug!("Torrent {hash}: {torrent:?}");
        Ok(torrent)
    }

    fn files(&self, hash: &InfoHash) -> Result<Vec<File>, RTorrentError> {
        debug!("Listing files of {hash}");
        let files: Vec<File> = self.fetch_rows(procedures::FILE_MULTICALL, hash)?;
        debug!("{} files in {hash}", files.len());
        Ok(files)
    }

    fn trackers(&self, hash: &InfoHash) -> Result<Vec<Tracker>, RTorrentError> {
        debug!("Listing trackers of {hash}");
        let trackers: Vec<Tracker> = self.fetch_rows(procedures::TRACKER_MULTICALL, hash)?;
        debug!("Trackers of {hash}: {trackers:?}");
        Ok(trackers)
    }

    fn status(&self, hash: &InfoHash) -> Result<Status, RTorrentError> {
        debug!("Getting status of {hash}");
        let status: Status = self.fetch(hash)?;
        debug!("Status of {hash}: {status:?}");
        Ok(status)
    }

    fn add(&self, url: &str) -> Result<(), RTorrentError> {
        debug!("Adding torrent from URL: {url}");
        self.load(procedures::LOAD_START, url.into(), None)?;
        debug!("Add command sent");
        Ok(())
    }

    fn add_stopped(&self, url: &str, label: Option<&Label>) -> Result<(), RTorrentError> {
        debug!("Adding stopped torrent from URL: {url}, label={label:?}");
        self.load(procedures::LOAD_NORMAL, url.into(), label)?;
        debug!("Add command sent");
        Ok(())
    }

    fn add_torrent(&self, data: &[u8]) -> Result<(), RTorrentError> {
        debug!("Uploading torrent ({} bytes)", data.len());
        self.load(procedures::LOAD_RAW_START, Value::Base64(data.to_vec()), None)?;
        debug!("Upload command sent");
        Ok(())
    }

    fn add_torrent_stopped(
        &self,
        data: &[u8],
        label: Option<&Label>,
    ) -> Result<(), RTorrentError> {
        debug!("Uploading stopped torrent ({} bytes), label={label:?}", data.len());
        self.load(procedures::LOAD_RAW, Value::Base64(data.to_vec()), label)?;
        debug!("Upload command sent");
        Ok(())
    }

    fn set_label(&self, hash: &InfoHash, label: &str) -> Result<(), RTorrentError> {
        debug!("Setting label of {hash} to {label:?}");
        self.call(Call::new(
            procedures::SET_LABEL,
            vec![hash.as_str().into(), label.into()],
        ))?;
        Ok(())
    }

    fn reannounce(&self, hash: &InfoHash) -> Result<(), RTorrentError> {
        debug!("Announcing {hash}");
        self.command(procedures::TRACKER_ANNOUNCE, hash)
    }

    fn delete(&self, hash: &InfoHash) -> Result<(), RTorrentError> {
        debug!("Deleting {hash}");
        self.command(procedures::ERASE, hash)?;
        debug!("Delete command sent");
        Ok(())
    }

    fn start(&self, hash: &InfoHash) -> Result<(), RTorrentError> {
        debug!("Starting {hash}");
        self.command(procedures::START, hash)
    }

    fn stop(&self, hash: &InfoHash) -> Result<(), RTorrentError> {
        debug!("Stopping {hash}");
        self.command(procedures::STOP, hash)
    }

    fn pause(&self, hash: &InfoHash) -> Result<(), RTorrentError> {
        debug!("Pausing {hash}");
        self.command(procedures::PAUSE, hash)
    }

    fn resume(&self, hash: &InfoHash) -> Result<(), RTorrentError> {
        debug!("Resuming {hash}");
        self.command(procedures::RESUME, hash)
    }

    fn open(&self, hash: &InfoHash) -> Result<(), RTorrentError> {
        debug!("Opening {hash}");
        self.command(procedures::OPEN, hash)
    }

    fn close(&self, hash: &InfoHash) -> Result<(), RTorrentError> {
        debug!("Closing {hash}");
        self.command(procedures::CLOSE, hash)
    }

    fn is_open(&self, hash: &InfoHash) -> Result<bool, RTorrentError> {
        debug!("Getting open flag of {hash}");
        let is_open = conversions::flag(Field::IsOpen, self.get_field(Field::IsOpen, hash)?)?;
        debug!("Open flag of {hash}: {is_open}");
        Ok(is_open)
    }

    fn is_active(&self, hash: &InfoHash) -> Result<bool, RTorrentError> {
        debug!("Getting active flag of {hash}");
        let is_active = conversions::flag(Field::IsActive, self.get_field(Field::IsActive, hash)?)?;
        debug!("Active flag of {hash}: {is_active}");
        Ok(is_active)
    }

    fn state(&self, hash: &InfoHash) -> Result<i64, RTorrentError> {
        debug!("Getting state of {hash}");
        let state = conversions::integer(Field::State, self.get_field(Field::State, hash)?)?;
        debug!("State of {hash}: {state}");
        Ok(state)
    }
}
