//! Positional mapping of decoded field values onto domain entities.
//!
//! Each entity declares the ordered fields it is fetched with. Values are consumed
//! strictly in that order and each one must have the wire type its field prescribes;
//! any count or type mismatch fails the whole mapping.

use chrono::{DateTime, Utc};
use rtorrent_types::{File, InfoHash, RTorrentError, Status, Torrent, Tracker, TrackerType};

use crate::codec::Value;
use crate::procedures::{Field, FieldKind};

/// An entity assembled from a fixed, ordered list of fields.
pub(crate) trait FromFields: Sized {
    /// The fields, in request order.
    const FIELDS: &'static [Field];

    fn from_fields(reader: &mut FieldReader) -> Result<Self, RTorrentError>;
}

/// Consumes one entity's values in field order.
#[derive(Debug)]
pub(crate) struct FieldReader {
    fields: &'static [Field],
    values: std::vec::IntoIter<Value>,
    position: usize,
}

impl FieldReader {
    fn new(fields: &'static [Field], values: Vec<Value>) -> Result<Self, RTorrentError> {
        if values.len() != fields.len() {
            return Err(RTorrentError::Mapping(format!(
                "expected {} field values, got {}",
                fields.len(),
                values.len()
            )));
        }
        Ok(Self {
            fields,
            values: values.into_iter(),
            position: 0,
        })
    }

    fn next(&mut self, field: Field) -> Result<Value, RTorrentError> {
        let expected = self.fields.get(self.position).copied();
        if expected != Some(field) {
            return Err(RTorrentError::Mapping(format!(
                "read {} at position {}, where {} was requested",
                field.name(),
                self.position,
                expected.map_or("nothing", Field::name)
            )));
        }
        self.position += 1;
        self.values.next().ok_or_else(|| {
            RTorrentError::Mapping(format!("no value left for {}", field.name()))
        })
    }

    fn finish(self) -> Result<(), RTorrentError> {
        if self.position == self.fields.len() {
            Ok(())
        } else {
            Err(RTorrentError::Mapping(format!(
                "{} of {} field values were not consumed",
                self.fields.len() - self.position,
                self.fields.len()
            )))
        }
    }

    pub(crate) fn text(&mut self, field: Field) -> Result<String, RTorrentError> {
        let value = self.next(field)?;
        text(field, value)
    }

    pub(crate) fn integer(&mut self, field: Field) -> Result<i64, RTorrentError> {
        let value = self.next(field)?;
        integer(field, value)
    }

    pub(crate) fn unsigned(&mut self, field: Field) -> Result<u64, RTorrentError> {
        let value = self.next(field)?;
        unsigned(field, value)
    }

    pub(crate) fn flag(&mut self, field: Field) -> Result<bool, RTorrentError> {
        let value = self.next(field)?;
        flag(field, value)
    }

    /// Seconds since the epoch, 0 meaning "never".
    pub(crate) fn timestamp(&mut self, field: Field) -> Result<Option<DateTime<Utc>>, RTorrentError> {
        match self.integer(field)? {
            0 => Ok(None),
            seconds => DateTime::from_timestamp(seconds, 0).map(Some).ok_or_else(|| {
                RTorrentError::Mapping(format!(
                    "{} timestamp {seconds} is out of range",
                    field.name()
                ))
            }),
        }
    }
}

fn expect_kind(field: Field, kind: FieldKind) -> Result<(), RTorrentError> {
    if field.kind() == kind {
        Ok(())
    } else {
        Err(RTorrentError::Mapping(format!(
            "{} is a {:?} field, not {:?}",
            field.name(),
            field.kind(),
            kind
        )))
    }
}

fn mismatch(procedure: &str, expected: &str, found: &Value) -> RTorrentError {
    RTorrentError::Mapping(format!(
        "{procedure}: expected {expected}, found {} {found:?}",
        found.kind()
    ))
}

pub(crate) fn text(field: Field, value: Value) -> Result<String, RTorrentError> {
    expect_kind(field, FieldKind::Text)?;
    string_value(field.name(), value)
}

pub(crate) fn integer(field: Field, value: Value) -> Result<i64, RTorrentError> {
    expect_kind(field, FieldKind::Integer)?;
    integer_value(field.name(), value)
}

pub(crate) fn unsigned(field: Field, value: Value) -> Result<u64, RTorrentError> {
    expect_kind(field, FieldKind::Integer)?;
    unsigned_value(field.name(), value)
}

pub(crate) fn flag(field: Field, value: Value) -> Result<bool, RTorrentError> {
    expect_kind(field, FieldKind::Flag)?;
    value
        .as_bool()
        .ok_or_else(|| mismatch(field.name(), "a 0/1 flag", &value))
}

/// The string result of `procedure`. Bytes that are not UTF-8 become U+FFFD; callers
/// that need them exactly go through [`crate::RTorrentClient::execute`].
pub(crate) fn string_value(procedure: &str, value: Value) -> Result<String, RTorrentError> {
    match value {
        Value::String(text) => Ok(text.into_string_lossy()),
        other => Err(mismatch(procedure, "string", &other)),
    }
}

/// The integer result of `procedure`.
pub(crate) fn integer_value(procedure: &str, value: Value) -> Result<i64, RTorrentError> {
    value
        .as_i64()
        .ok_or_else(|| mismatch(procedure, "integer", &value))
}

/// The non-negative integer result of `procedure`, such as a byte count.
pub(crate) fn unsigned_value(procedure: &str, value: Value) -> Result<u64, RTorrentError> {
    let int = integer_value(procedure, value)?;
    u64::try_from(int).map_err(|_| {
        RTorrentError::Mapping(format!("{procedure}: expected a non-negative integer, found {int}"))
    })
}

/// Map exactly one entity's values.
pub(crate) fn map_one<T: FromFields>(values: Vec<Value>) -> Result<T, RTorrentError> {
    let mut reader = FieldReader::new(T::FIELDS, values)?;
    let entity = T::from_fields(&mut reader)?;
    reader.finish()?;
    Ok(entity)
}

/// Map a daemon-side multicall result: an array holding one array per entity.
pub(crate) fn map_rows<T: FromFields>(value: Value) -> Result<Vec<T>, RTorrentError> {
    let rows = match value {
        Value::Array(rows) => rows,
        other => return Err(mismatch("multicall", "an array of rows", &other)),
    };

    rows.into_iter()
        .enumerate()
        .map(|(index, row)| match row {
            Value::Array(values) => map_one(values).map_err(|err| match err {
                RTorrentError::Mapping(message) => {
                    RTorrentError::Mapping(format!("row {index}: {message}"))
                }
                other => other,
            }),
            other => Err(mismatch("multicall", "a row array", &other)),
        })
        .collect()
}

/// Map a flat sequence holding the values of consecutive entities.
///
/// The length must be an exact multiple of the entity width.
pub(crate) fn map_flat<T: FromFields>(values: Vec<Value>) -> Result<Vec<T>, RTorrentError> {
    let width = T::FIELDS.len();
    if values.len() % width != 0 {
        return Err(RTorrentError::Mapping(format!(
            "{} values cannot be split into entities of {width} fields",
            values.len()
        )));
    }

    let count = values.len() / width;
    let mut values = values.into_iter();
    let mut entities = Vec::with_capacity(count);
    for _ in 0..count {
        entities.push(map_one(values.by_ref().take(width).collect())?);
    }
    Ok(entities)
}

/// The daemon reports ratios in thousandths.
fn ratio(thousandths: i64) -> f64 {
    thousandths as f64 / 1000.0
}

impl FromFields for Torrent {
    const FIELDS: &'static [Field] = &[
        Field::Hash,
        Field::Name,
        Field::SizeBytes,
        Field::Label,
        Field::BasePath,
        Field::Complete,
        Field::Ratio,
        Field::CreationDate,
        Field::StartedAt,
        Field::FinishedAt,
    ];

    fn from_fields(reader: &mut FieldReader) -> Result<Self, RTorrentError> {
        Ok(Self {
            hash: InfoHash::new(reader.text(Field::Hash)?),
            name: reader.text(Field::Name)?,
            size: reader.unsigned(Field::SizeBytes)?,
            label: reader.text(Field::Label)?,
            path: reader.text(Field::BasePath)?,
            completed: reader.flag(Field::Complete)?,
            ratio: ratio(reader.integer(Field::Ratio)?),
            created: reader.timestamp(Field::CreationDate)?,
            started: reader.timestamp(Field::StartedAt)?,
            finished: reader.timestamp(Field::FinishedAt)?,
        })
    }
}

impl FromFields for File {
    const FIELDS: &'static [Field] = &[Field::FilePath, Field::FileSizeBytes];

    fn from_fields(reader: &mut FieldReader) -> Result<Self, RTorrentError> {
        Ok(Self {
            path: reader.text(Field::FilePath)?,
            size: reader.unsigned(Field::FileSizeBytes)?,
        })
    }
}

impl FromFields for Tracker {
    const FIELDS: &'static [Field] = &[
        Field::TrackerUrl,
        Field::TrackerType,
        Field::TrackerEnabled,
        Field::TrackerFailedCounter,
        Field::TrackerPeers,
        Field::TrackerLastActivity,
    ];

    fn from_fields(reader: &mut FieldReader) -> Result<Self, RTorrentError> {
        Ok(Self {
            url: reader.text(Field::TrackerUrl)?,
            kind: TrackerType::try_from(reader.integer(Field::TrackerType)?)?,
            enabled: reader.flag(Field::TrackerEnabled)?,
            failed_counter: reader.unsigned(Field::TrackerFailedCounter)?,
            peers: reader.unsigned(Field::TrackerPeers)?,
            last_announce_attempt: reader.timestamp(Field::TrackerLastActivity)?,
        })
    }
}

impl FromFields for Status {
    const FIELDS: &'static [Field] = &[
        Field::Complete,
        Field::CompletedBytes,
        Field::DownRate,
        Field::UpRate,
        Field::SizeBytes,
        Field::Ratio,
    ];

    fn from_fields(reader: &mut FieldReader) -> Result<Self, RTorrentError> {
        Ok(Self {
            completed: reader.flag(Field::Complete)?,
            completed_bytes: reader.unsigned(Field::CompletedBytes)?,
            down_rate: reader.unsigned(Field::DownRate)?,
            up_rate: reader.unsigned(Field::UpRate)?,
            size: reader.unsigned(Field::SizeBytes)?,
            ratio: ratio(reader.integer(Field::Ratio)?),
        })
    }
}
