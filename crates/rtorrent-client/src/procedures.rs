//! Procedure names understood by the daemon.
//!
//! Entity fields are a closed [`Field`] enum so that the field list used to request an
//! entity and the wire type used to decode each value cannot drift apart.

pub(crate) const BIND_ADDRESS: &str = "network.bind_address";
pub(crate) const HOSTNAME: &str = "system.hostname";
pub(crate) const DOWN_TOTAL: &str = "throttle.global_down.total";
pub(crate) const UP_TOTAL: &str = "throttle.global_up.total";
pub(crate) const DOWN_RATE: &str = "throttle.global_down.rate";
pub(crate) const UP_RATE: &str = "throttle.global_up.rate";

pub(crate) const TORRENT_MULTICALL: &str = "d.multicall2";
pub(crate) const FILE_MULTICALL: &str = "f.multicall";
pub(crate) const TRACKER_MULTICALL: &str = "t.multicall";

pub(crate) const LOAD_START: &str = "load.start";
pub(crate) const LOAD_NORMAL: &str = "load.normal";
pub(crate) const LOAD_RAW_START: &str = "load.raw_start";
pub(crate) const LOAD_RAW: &str = "load.raw";

pub(crate) const SET_LABEL: &str = "d.custom1.set";
pub(crate) const TRACKER_ANNOUNCE: &str = "d.tracker_announce";
pub(crate) const ERASE: &str = "d.erase";
pub(crate) const START: &str = "d.start";
pub(crate) const STOP: &str = "d.stop";
pub(crate) const PAUSE: &str = "d.pause";
pub(crate) const RESUME: &str = "d.resume";
pub(crate) const OPEN: &str = "d.open";
pub(crate) const CLOSE: &str = "d.close";

/// How a field's value is represented on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldKind {
    Text,
    Integer,
    /// 0/1 integer or boolean
    Flag,
}

/// A getter procedure for one field of a torrent, file or tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Field {
    Hash,
    Name,
    SizeBytes,
    Label,
    BasePath,
    Complete,
    Ratio,
    CreationDate,
    StartedAt,
    FinishedAt,
    CompletedBytes,
    DownRate,
    UpRate,
    IsOpen,
    IsActive,
    State,
    FilePath,
    FileSizeBytes,
    TrackerUrl,
    TrackerType,
    TrackerEnabled,
    TrackerFailedCounter,
    TrackerPeers,
    TrackerLastActivity,
}

impl Field {
    /// The getter procedure name.
    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Hash => "d.hash",
            Self::Name => "d.name",
            Self::SizeBytes => "d.size_bytes",
            Self::Label => "d.custom1",
            Self::BasePath => "d.base_path",
            Self::Complete => "d.complete",
            Self::Ratio => "d.ratio",
            Self::CreationDate => "d.creation_date",
            Self::StartedAt => "d.timestamp.started",
            Self::FinishedAt => "d.timestamp.finished",
            Self::CompletedBytes => "d.completed_bytes",
            Self::DownRate => "d.down.rate",
            Self::UpRate => "d.up.rate",
            Self::IsOpen => "d.is_open",
            Self::IsActive => "d.is_active",
            Self::State => "d.state",
            Self::FilePath => "f.path",
            Self::FileSizeBytes => "f.size_bytes",
            Self::TrackerUrl => "t.url",
            Self::TrackerType => "t.type",
            Self::TrackerEnabled => "t.is_enabled",
            Self::TrackerFailedCounter => "t.failed_counter",
            Self::TrackerPeers => "t.latest_sum_peers",
            Self::TrackerLastActivity => "t.activity_time_last",
        }
    }

    /// The field as a command for the daemon-side multicalls, e.g. `d.name=`.
    pub(crate) fn query(self) -> String {
        format!("{}=", self.name())
    }

    pub(crate) fn kind(self) -> FieldKind {
        match self {
            Self::Hash
            | Self::Name
            | Self::Label
            | Self::BasePath
            | Self::FilePath
            | Self::TrackerUrl => FieldKind::Text,
            Self::Complete
            | Self::IsOpen
            | Self::IsActive
            | Self::TrackerEnabled => FieldKind::Flag,
            Self::SizeBytes
            | Self::Ratio
            | Self::CreationDate
            | Self::StartedAt
            | Self::FinishedAt
            | Self::CompletedBytes
            | Self::DownRate
            | Self::UpRate
            | Self::State
            | Self::FileSizeBytes
            | Self::TrackerType
            | Self::TrackerFailedCounter
            | Self::TrackerPeers
            | Self::TrackerLastActivity => FieldKind::Integer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queries_append_an_equals_sign() {
        assert_eq!(Field::Name.query(), "d.name=");
        assert_eq!(Field::FileSizeBytes.query(), "f.size_bytes=");
        assert_eq!(Field::TrackerLastActivity.query(), "t.activity_time_last=");
    }

    #[test]
    fn field_kinds() {
        assert_eq!(Field::Label.kind(), FieldKind::Text);
        assert_eq!(Field::Complete.kind(), FieldKind::Flag);
        assert_eq!(Field::SizeBytes.kind(), FieldKind::Integer);
        assert_eq!(Field::State.kind(), FieldKind::Integer);
    }
}
