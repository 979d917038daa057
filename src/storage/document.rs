//! Persisted recording document
//!
//! ```json
//! {
//!   "RecordMs": 1523.4,
//!   "KeyTableVersion": 1,
//!   "Keys":  [ { "Key": "A", "StartTime": 100.0, "EndTime": 250.0 } ],
//!   "Mouse": [ { "EventType": "Move", "Position": { "X": 10, "Y": 10 },
//!                "StartTime": 300.0, "EndTime": 300.0 } ]
//! }
//! ```
//!
//! Times are milliseconds since the session start. An `EndTime` of `0` marks
//! an interval that was still open when recording stopped.

use crate::actions::keycode::{KeyCode, KEY_TABLE_VERSION};
use crate::actions::model::{sort_by_start, KeyAction, MouseAction, MouseEventType, Position};
use crate::recorder::channel::{RecordingError, RecordingResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

const FIELD_RECORD_MS: &str = "RecordMs";
const FIELD_KEY_TABLE_VERSION: &str = "KeyTableVersion";
const FIELD_KEYS: &str = "Keys";
const FIELD_MOUSE: &str = "Mouse";

/// Persisted form of a [`KeyAction`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeyRecord {
    pub key: KeyCode,
    #[serde(default)]
    pub start_time: f64,
    #[serde(default)]
    pub end_time: f64,
}

/// Persisted form of a [`MouseAction`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MouseRecord {
    pub event_type: MouseEventType,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub start_time: f64,
    #[serde(default)]
    pub end_time: f64,
}

/// A recording file, or the fragment of one written by a single channel
///
/// Absent fields are left untouched by a merge-save.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordDocument {
    pub record_ms: Option<f64>,
    pub key_table_version: Option<u32>,
    pub keys: Option<Vec<KeyRecord>>,
    pub mouse: Option<Vec<MouseRecord>>,
}

impl RecordDocument {
    /// Fragment written by the keyboard channel
    pub fn from_key_actions(record_len: Duration, actions: &[KeyAction]) -> Self {
        Self {
            record_ms: Some(duration_to_ms(record_len)),
            key_table_version: Some(KEY_TABLE_VERSION),
            keys: Some(actions.iter().map(KeyRecord::from).collect()),
            mouse: None,
        }
    }

    /// Fragment written by the mouse channel
    pub fn from_mouse_actions(record_len: Duration, actions: &[MouseAction]) -> Self {
        Self {
            record_ms: Some(duration_to_ms(record_len)),
            key_table_version: None,
            keys: None,
            mouse: Some(actions.iter().map(MouseRecord::from).collect()),
        }
    }

    /// Parse file content; blank content is an empty document
    pub fn from_json_str(content: &str) -> RecordingResult<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        match serde_json::from_str::<Value>(content) {
            Ok(Value::Object(map)) => Self::from_map(&map),
            Ok(other) => Err(RecordingError::ParseError(format!(
                "expected a JSON object at the top level, found {}",
                json_kind(&other)
            ))),
            Err(e) => Err(RecordingError::ParseError(format!("invalid JSON: {}", e))),
        }
    }

    /// Read the known fields of a top-level object, ignoring the rest
    pub fn from_map(map: &Map<String, Value>) -> RecordingResult<Self> {
        let record_ms = match map.get(FIELD_RECORD_MS) {
            None | Some(Value::Null) => None,
            Some(Value::Number(n)) => n.as_f64(),
            Some(other) => {
                return Err(RecordingError::ParseError(format!(
                    "{} must be a number, found {}",
                    FIELD_RECORD_MS,
                    json_kind(other)
                )))
            }
        };

        let key_table_version = match map.get(FIELD_KEY_TABLE_VERSION) {
            None | Some(Value::Null) => None,
            Some(value) => Some(
                value
                    .as_u64()
                    .and_then(|v| u32::try_from(v).ok())
                    .ok_or_else(|| {
                        RecordingError::ParseError(format!(
                            "{} must be a non-negative integer",
                            FIELD_KEY_TABLE_VERSION
                        ))
                    })?,
            ),
        };

        Ok(Self {
            record_ms,
            key_table_version,
            keys: parse_array(map, FIELD_KEYS)?,
            mouse: parse_array(map, FIELD_MOUSE)?,
        })
    }

    /// Serialize the present fields as a top-level object
    pub fn to_map(&self) -> RecordingResult<Map<String, Value>> {
        let mut map = Map::new();
        if let Some(ms) = self.record_ms {
            map.insert(FIELD_RECORD_MS.to_string(), Value::from(ms));
        }
        if let Some(version) = self.key_table_version {
            map.insert(FIELD_KEY_TABLE_VERSION.to_string(), Value::from(version));
        }
        if let Some(keys) = &self.keys {
            map.insert(FIELD_KEYS.to_string(), to_value(keys)?);
        }
        if let Some(mouse) = &self.mouse {
            map.insert(FIELD_MOUSE.to_string(), to_value(mouse)?);
        }
        Ok(map)
    }

    /// Key actions sorted by start time
    ///
    /// A document without a session length or without keys yields an empty list.
    pub fn key_actions(&self) -> RecordingResult<Vec<KeyAction>> {
        if let Some(version) = self.key_table_version {
            if version > KEY_TABLE_VERSION {
                return Err(RecordingError::ParseError(format!(
                    "key table version {} is newer than supported version {}",
                    version, KEY_TABLE_VERSION
                )));
            }
        }

        let records = match (&self.keys, self.has_record_len()) {
            (Some(records), true) => records,
            _ => return Ok(Vec::new()),
        };

        let mut actions = records
            .iter()
            .map(KeyAction::try_from)
            .collect::<RecordingResult<Vec<_>>>()?;
        sort_by_start(&mut actions, |a| a.start_time);
        Ok(actions)
    }

    /// Mouse actions sorted by start time
    pub fn mouse_actions(&self) -> RecordingResult<Vec<MouseAction>> {
        let records = match (&self.mouse, self.has_record_len()) {
            (Some(records), true) => records,
            _ => return Ok(Vec::new()),
        };

        let mut actions = records
            .iter()
            .map(MouseAction::try_from)
            .collect::<RecordingResult<Vec<_>>>()?;
        sort_by_start(&mut actions, |a| a.start_time);
        Ok(actions)
    }

    fn has_record_len(&self) -> bool {
        matches!(self.record_ms, Some(ms) if ms != 0.0)
    }
}

impl From<&KeyAction> for KeyRecord {
    fn from(action: &KeyAction) -> Self {
        Self {
            key: action.key,
            start_time: duration_to_ms(action.start_time),
            end_time: action.end_time.map(duration_to_ms).unwrap_or(0.0),
        }
    }
}

impl TryFrom<&KeyRecord> for KeyAction {
    type Error = RecordingError;

    fn try_from(record: &KeyRecord) -> RecordingResult<Self> {
        Ok(Self {
            key: record.key,
            start_time: ms_to_duration(record.start_time)?,
            end_time: open_marker(ms_to_duration(record.end_time)?),
        })
    }
}

impl From<&MouseAction> for MouseRecord {
    fn from(action: &MouseAction) -> Self {
        Self {
            event_type: action.event_type,
            position: action.position,
            start_time: duration_to_ms(action.start_time),
            end_time: action.end_time.map(duration_to_ms).unwrap_or(0.0),
        }
    }
}

impl TryFrom<&MouseRecord> for MouseAction {
    type Error = RecordingError;

    fn try_from(record: &MouseRecord) -> RecordingResult<Self> {
        let start_time = ms_to_duration(record.start_time)?;
        let end = ms_to_duration(record.end_time)?;
        let end_time = match record.event_type {
            // Samples are instantaneous whatever was stored
            MouseEventType::Move => Some(start_time),
            _ => open_marker(end),
        };

        Ok(Self {
            event_type: record.event_type,
            position: record.position,
            start_time,
            end_time,
        })
    }
}

/// Milliseconds as written to disk
pub fn duration_to_ms(d: Duration) -> f64 {
    d.as_nanos() as f64 / 1_000_000.0
}

/// Inverse of [`duration_to_ms`], exact to the nanosecond for realistic lengths
pub fn ms_to_duration(ms: f64) -> RecordingResult<Duration> {
    if !ms.is_finite() || ms < 0.0 {
        return Err(RecordingError::ParseError(format!(
            "invalid time value {}",
            ms
        )));
    }
    let nanos = (ms * 1_000_000.0).round();
    // 2^64 as f64; anything at or above it does not fit a u64
    if nanos >= u64::MAX as f64 {
        return Err(RecordingError::ParseError(format!(
            "time value {} is out of range",
            ms
        )));
    }
    Ok(Duration::from_nanos(nanos as u64))
}

fn open_marker(end: Duration) -> Option<Duration> {
    if end.is_zero() {
        None
    } else {
        Some(end)
    }
}

fn parse_array<T: serde::de::DeserializeOwned>(
    map: &Map<String, Value>,
    field: &str,
) -> RecordingResult<Option<Vec<T>>> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value @ Value::Array(_)) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|e| RecordingError::ParseError(format!("{}: {}", field, e))),
        Some(other) => Err(RecordingError::ParseError(format!(
            "{} must be an array, found {}",
            field,
            json_kind(other)
        ))),
    }
}

fn to_value<T: Serialize>(value: &T) -> RecordingResult<Value> {
    serde_json::to_value(value).map_err(|e| {
        RecordingError::IoError(std::io::Error::new(std::io::ErrorKind::Other, e))
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
