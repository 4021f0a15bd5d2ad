//! Command execution against any [`RTorrent`] implementation.

use std::{fs, io, path::PathBuf};

use rtorrent_client::{InfoHash, Label, RTorrent, RTorrentError};
use thiserror::Error;
use tracing::{error, info};

use crate::cli::Command;
use crate::output;

/// Error variants for the CLI.
#[derive(Error, Debug)]
pub(crate) enum CliError {
    #[error("failed to read {}: {source}", path.display())]
    ReadTorrent { path: PathBuf, source: io::Error },
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
    #[error("{0} operation(s) failed")]
    Failed(usize),
}

/// Tracks failed daemon operations. A failure is logged and produces no output.
#[derive(Debug, Default)]
struct Outcome {
    failures: usize,
}

impl Outcome {
    fn check<T>(&mut self, what: &str, result: Result<T, RTorrentError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                error!("error {what}: {err}");
                self.failures += 1;
                None
            }
        }
    }

    fn finish(self) -> Result<(), CliError> {
        match self.failures {
            0 => Ok(()),
            n => Err(CliError::Failed(n)),
        }
    }
}

/// Runs `command`, writing results to `out`.
pub(crate) fn run<R: RTorrent>(
    client: &R,
    command: Command,
    out: &mut impl io::Write,
) -> Result<(), CliError> {
    let mut outcome = Outcome::default();

    match command {
        Command::GetIp => {
            if let Some(ip) = outcome.check("getting rTorrent IP", client.ip()) {
                writeln!(out, "{ip}")?;
            }
        }
        Command::GetName => {
            if let Some(name) = outcome.check("getting rTorrent name", client.name()) {
                writeln!(out, "{name}")?;
            }
        }
        Command::GetTotals => {
            if let Some(down) = outcome.check("getting rTorrent down total", client.down_total()) {
                writeln!(out, "{down}")?;
            }
            if let Some(up) = outcome.check("getting rTorrent up total", client.up_total()) {
                writeln!(out, "{up}")?;
            }
        }
        Command::GetTorrents { view } => {
            if let Some(torrents) = outcome.check("getting torrents", client.torrents(&view)) {
                info!("found {} torrents in view {view}", torrents.len());
                for torrent in &torrents {
                    output::torrent(out, torrent)?;
                }
            }
        }
        Command::GetTorrent { hash } => {
            if let Some(torrent) = outcome.check("getting torrent", client.torrent(&hash)) {
                output::torrent(out, &torrent)?;
            }
        }
        Command::GetFiles { hash } => {
            if let Some(files) = outcome.check("getting files", client.files(&hash)) {
                info!("found {} files for torrent {hash}", files.len());
                for file in &files {
                    output::file(out, file)?;
                }
            }
        }
        Command::GetTrackers { hash } => {
            if let Some(trackers) = outcome.check("getting trackers", client.trackers(&hash)) {
                for tracker in &trackers {
                    output::tracker(out, tracker)?;
                }
            }
        }
        Command::GetStatus { hash } => {
            if let Some(status) = outcome.check("getting status", client.status(&hash)) {
                output::status(out, &status)?;
            }
        }
        Command::Add {
            url,
            file,
            stopped,
            label,
        } => {
            let label = label.map(Label::new);
            let result = match (url, file) {
                (Some(url), _) if stopped => client.add_stopped(&url, label.as_ref()),
                (Some(url), _) => client.add(&url),
                (None, Some(path)) => {
                    let data = fs::read(&path)
                        .map_err(|source| CliError::ReadTorrent { path, source })?;
                    if stopped {
                        client.add_torrent_stopped(&data, label.as_ref())
                    } else {
                        client.add_torrent(&data)
                    }
                }
                (None, None) => Ok(()),
            };
            if outcome.check("adding torrent", result).is_some() {
                info!("torrent submitted");
            }
        }
        Command::SetLabel { hash, label } => {
            if outcome
                .check("setting label", client.set_label(&hash, &label))
                .is_some()
            {
                info!("label of {hash} set to {label:?}");
            }
        }
        Command::Start { hash } => command_sent(&mut outcome, "starting", &hash, client.start(&hash)),
        Command::Stop { hash } => command_sent(&mut outcome, "stopping", &hash, client.stop(&hash)),
        Command::Delete { hash } => {
            command_sent(&mut outcome, "deleting", &hash, client.delete(&hash))
        }
    }

    outcome.finish()
}

fn command_sent(
    outcome: &mut Outcome,
    what: &str,
    hash: &InfoHash,
    result: Result<(), RTorrentError>,
) {
    if outcome.check(&format!("{what} torrent {hash}"), result).is_some() {
        info!("{what} {hash}: command sent");
    }
}
