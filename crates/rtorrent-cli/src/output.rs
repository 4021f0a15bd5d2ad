//! Human readable rendering of daemon entities.

use std::{fmt::Display, io};

use rtorrent_client::{File, Status, Torrent, Tracker, TrackerType};

fn or_dash<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn tracker_type(kind: TrackerType) -> &'static str {
    match kind {
        TrackerType::Http => "HTTP",
        TrackerType::Udp => "UDP",
        TrackerType::Dht => "DHT",
    }
}

pub(crate) fn torrent(out: &mut impl io::Write, torrent: &Torrent) -> io::Result<()> {
    writeln!(out, "Torrent:")?;
    writeln!(out, "\tHash: {}", torrent.hash)?;
    writeln!(out, "\tName: {}", torrent.name)?;
    writeln!(out, "\tPath: {}", torrent.path)?;
    writeln!(out, "\tSize: {}", torrent.size)?;
    writeln!(out, "\tLabel: {}", torrent.label)?;
    writeln!(out, "\tCompleted: {}", torrent.completed)?;
    writeln!(out, "\tRatio: {:.3}", torrent.ratio)?;
    writeln!(out, "\tCreated: {}", or_dash(torrent.created))?;
    writeln!(out, "\tStarted: {}", or_dash(torrent.started))?;
    writeln!(out, "\tFinished: {}", or_dash(torrent.finished))
}

pub(crate) fn file(out: &mut impl io::Write, file: &File) -> io::Result<()> {
    writeln!(out, "File:")?;
    writeln!(out, "\tPath: {}", file.path)?;
    writeln!(out, "\tSize: {} bytes", file.size)
}

pub(crate) fn tracker(out: &mut impl io::Write, tracker: &Tracker) -> io::Result<()> {
    writeln!(out, "Tracker:")?;
    writeln!(out, "\tURL: {}", tracker.url)?;
    writeln!(out, "\tType: {}", tracker_type(tracker.kind))?;
    writeln!(out, "\tEnabled: {}", tracker.enabled)?;
    writeln!(out, "\tFailed: {}", tracker.failed_counter)?;
    writeln!(out, "\tPeers: {}", tracker.peers)?;
    writeln!(
        out,
        "\tLast announce: {}",
        or_dash(tracker.last_announce_attempt)
    )
}

pub(crate) fn status(out: &mut impl io::Write, status: &Status) -> io::Result<()> {
    writeln!(out, "Status:")?;
    writeln!(out, "\tCompleted: {}", status.completed)?;
    writeln!(
        out,
        "\tProgress: {}/{} bytes",
        status.completed_bytes, status.size
    )?;
    writeln!(out, "\tDown rate: {} B/s", status.down_rate)?;
    writeln!(out, "\tUp rate: {} B/s", status.up_rate)?;
    writeln!(out, "\tRatio: {:.3}", status.ratio)
}

#[cfg(test)]
mod tests {
    use rtorrent_client::InfoHash;

    use super::*;

    fn render(write: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut out = Vec::new();
        write(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn renders_a_torrent() {
        let torrent = Torrent {
            hash: InfoHash::new("b185765be59bc56ab29a4860a5820863bf0512ad"),
            name: "ubuntu.iso".into(),
            label: String::new(),
            size: 1024,
            path: "/downloads/ubuntu.iso".into(),
            completed: true,
            ratio: 1.5,
            created: None,
            started: None,
            finished: None,
        };

        let text = render(|out| super::torrent(out, &torrent));

        assert_eq!(
            text,
            "Torrent:\n\
             \tHash: B185765BE59BC56AB29A4860A5820863BF0512AD\n\
             \tName: ubuntu.iso\n\
             \tPath: /downloads/ubuntu.iso\n\
             \tSize: 1024\n\
             \tLabel: \n\
             \tCompleted: true\n\
             \tRatio: 1.500\n\
             \tCreated: -\n\
             \tStarted: -\n\
             \tFinished: -\n"
        );
    }

    #[test]
    fn renders_a_tracker() {
        let tracker = Tracker {
            url: "udp://tracker.example:6969".into(),
            kind: TrackerType::Udp,
            enabled: true,
            failed_counter: 2,
            peers: 40,
            last_announce_attempt: None,
        };

        let text = render(|out| super::tracker(out, &tracker));

        assert!(text.starts_with("Tracker:\n\tURL: udp://tracker.example:6969\n\tType: UDP\n"));
        assert!(text.ends_with("\tLast announce: -\n"));
    }

    #[test]
    fn renders_status_progress() {
        let status = Status {
            completed: false,
            completed_bytes: 512,
            down_rate: 64,
            up_rate: 0,
            size: 2048,
            ratio: 0.0,
        };

        let text = render(|out| super::status(out, &status));

        assert!(text.contains("\tProgress: 512/2048 bytes\n"));
        assert!(text.contains("\tDown rate: 64 B/s\n"));
    }
}
