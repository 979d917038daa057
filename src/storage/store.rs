//! Persistence adapters
//!
//! A save merges into whatever the target already holds: top-level fields of
//! the new document replace the stored ones wholesale, every other stored
//! field is kept. This lets the keyboard and mouse channels write the same
//! file independently.

use crate::recorder::channel::{RecordingError, RecordingResult};
use crate::storage::document::RecordDocument;
use crate::storage::path::{validate_path, validate_writable_path};
use parking_lot::Mutex as ParkingMutex;
use serde_json::{Map, Value};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Durable storage for recordings
pub trait PersistenceAdapter: Send + Sync {
    /// Load the playback document; missing or blank storage is an empty document
    fn load(&self) -> RecordingResult<RecordDocument>;

    /// Merge `document` into the recording target
    fn merge_save(&self, document: &RecordDocument) -> RecordingResult<()>;
}

/// JSON file storage with separate recording-target and playback-source paths
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    recording_path: PathBuf,
    playback_path: PathBuf,
}

impl JsonFileStore {
    pub fn new(recording_path: impl Into<PathBuf>, playback_path: impl Into<PathBuf>) -> Self {
        Self {
            recording_path: recording_path.into(),
            playback_path: playback_path.into(),
        }
    }

    /// Record into and play back from the same file
    pub fn single(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self::new(path.clone(), path)
    }

    pub fn recording_path(&self) -> &Path {
        &self.recording_path
    }

    pub fn playback_path(&self) -> &Path {
        &self.playback_path
    }

    fn read_object(path: &Path) -> RecordingResult<Map<String, Value>> {
        if !path.exists() {
            return Ok(Map::new());
        }

        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(RecordingError::ParseError(format!(
                "'{}' does not hold a JSON object",
                path.display()
            ))),
            Err(e) => Err(RecordingError::ParseError(format!(
                "'{}' is not valid JSON: {}",
                path.display(),
                e
            ))),
        }
    }

    fn write_object(path: &Path, map: Map<String, Value>) -> RecordingResult<()> {
        let data = serde_json::to_vec_pretty(&Value::Object(map)).map_err(|e| {
            RecordingError::IoError(std::io::Error::new(std::io::ErrorKind::Other, e))
        })?;

        // Write next to the target, then rename over it
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&data)?;
        tmp.flush()?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl PersistenceAdapter for JsonFileStore {
    fn load(&self) -> RecordingResult<RecordDocument> {
        validate_path(&self.playback_path)?;

        if !self.playback_path.exists() {
            tracing::debug!("No recording at {:?}, nothing to load", self.playback_path);
            return Ok(RecordDocument::default());
        }

        let content = std::fs::read_to_string(&self.playback_path)?;
        let document = RecordDocument::from_json_str(&content)?;

        tracing::debug!("Loaded recording from {:?}", self.playback_path);
        Ok(document)
    }

    fn merge_save(&self, document: &RecordDocument) -> RecordingResult<()> {
        validate_writable_path(&self.recording_path)?;

        let mut stored = Self::read_object(&self.recording_path)?;
        merge_fields(&mut stored, document.to_map()?);
        Self::write_object(&self.recording_path, stored)?;

        tracing::info!("Saved recording to {:?}", self.recording_path);
        Ok(())
    }
}

/// In-memory storage holding one JSON object
#[derive(Debug, Default)]
pub struct MemoryStore {
    contents: ParkingMutex<Map<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the stored object
    pub fn contents(&self) -> Value {
        Value::Object(self.contents.lock().clone())
    }
}

impl PersistenceAdapter for MemoryStore {
    fn load(&self) -> RecordingResult<RecordDocument> {
        RecordDocument::from_map(&self.contents.lock())
    }

    fn merge_save(&self, document: &RecordDocument) -> RecordingResult<()> {
        let update = document.to_map()?;
        merge_fields(&mut self.contents.lock(), update);
        Ok(())
    }
}

fn merge_fields(stored: &mut Map<String, Value>, update: Map<String, Value>) {
    for (name, value) in update {
        stored.insert(name, value);
    }
}
