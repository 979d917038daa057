//! Recorder mode and configuration
//!
//! [`RecorderConfig`] is built once through [`RecorderConfigBuilder`], which
//! rejects conflicting hotkey setups as soon as they are made.
//! [`RecorderSettings`] is the serde mirror used to load the same
//! configuration from a JSON file.

use crate::actions::keycode::KeyCode;
use crate::processing::coordinate_correction::CoordinateCorrection;
use crate::recorder::channel::{RecordingError, RecordingResult};
use crate::recorder::mouse::DEFAULT_MOVE_THRESHOLD;
use crate::storage::path::validate_path;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// File used for both recording and playback unless configured otherwise
pub const DEFAULT_ACTION_PATH: &str = "RecorderActions.json";

/// Current recorder mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecorderMode {
    #[default]
    Idle,
    Recording,
    Playing,
}

impl std::fmt::Display for RecorderMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecorderMode::Idle => write!(f, "idle"),
            RecorderMode::Recording => write!(f, "recording"),
            RecorderMode::Playing => write!(f, "playing"),
        }
    }
}

/// Hotkeys driving the mode transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindKeys {
    pub start: KeyCode,
    pub stop: KeyCode,
    pub play: KeyCode,
}

impl BindKeys {
    pub fn contains(&self, key: KeyCode) -> bool {
        key == self.start || key == self.stop || key == self.play
    }

    fn validate(&self) -> RecordingResult<()> {
        if self.start == self.stop || self.start == self.play || self.stop == self.play {
            return Err(RecordingError::ConfigurationError(format!(
                "bind keys must be distinct (start={}, stop={}, play={})",
                self.start, self.stop, self.play
            )));
        }
        Ok(())
    }
}

/// Complete recorder configuration, immutable while a session is active
#[derive(Debug, Clone, PartialEq)]
pub struct RecorderConfig {
    recording_path: PathBuf,
    playback_path: PathBuf,
    bind_keys: Option<BindKeys>,
    tracked_keys: BTreeSet<KeyCode>,
    keyboard_tracking: bool,
    mouse_tracking: bool,
    mouse_move: bool,
    move_threshold: f64,
    correction: CoordinateCorrection,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            recording_path: PathBuf::from(DEFAULT_ACTION_PATH),
            playback_path: PathBuf::from(DEFAULT_ACTION_PATH),
            bind_keys: None,
            tracked_keys: BTreeSet::new(),
            keyboard_tracking: true,
            mouse_tracking: true,
            mouse_move: true,
            move_threshold: DEFAULT_MOVE_THRESHOLD,
            correction: CoordinateCorrection::default(),
        }
    }
}

impl RecorderConfig {
    pub fn builder() -> RecorderConfigBuilder {
        RecorderConfigBuilder::default()
    }

    pub fn recording_path(&self) -> &Path {
        &self.recording_path
    }

    pub fn playback_path(&self) -> &Path {
        &self.playback_path
    }

    pub fn bind_keys(&self) -> Option<BindKeys> {
        self.bind_keys
    }

    pub fn tracked_keys(&self) -> &BTreeSet<KeyCode> {
        &self.tracked_keys
    }

    pub fn is_tracked(&self, key: KeyCode) -> bool {
        self.tracked_keys.contains(&key)
    }

    pub fn keyboard_tracking(&self) -> bool {
        self.keyboard_tracking
    }

    pub fn mouse_tracking(&self) -> bool {
        self.mouse_tracking
    }

    pub fn mouse_move(&self) -> bool {
        self.mouse_move
    }

    pub fn move_threshold(&self) -> f64 {
        self.move_threshold
    }

    pub fn correction(&self) -> CoordinateCorrection {
        self.correction
    }

    /// Check that hooks can be armed with this configuration
    pub fn validate(&self) -> RecordingResult<()> {
        if self.bind_keys.is_none() {
            return Err(RecordingError::InvalidConfiguration(
                "no bind keys configured".to_string(),
            ));
        }
        if self.keyboard_tracking && self.tracked_keys.is_empty() {
            return Err(RecordingError::InvalidConfiguration(
                "keyboard tracking is enabled but no keys are tracked".to_string(),
            ));
        }
        Ok(())
    }
}

/// Fail-fast builder for [`RecorderConfig`]
#[derive(Debug, Clone, Default)]
pub struct RecorderConfigBuilder {
    config: RecorderConfig,
}

impl RecorderConfigBuilder {
    /// Record into and play back from the same file
    pub fn action_path(self, path: impl Into<PathBuf>) -> RecordingResult<Self> {
        let path = path.into();
        self.action_paths(path.clone(), path)
    }

    pub fn action_paths(
        mut self,
        recording: impl Into<PathBuf>,
        playback: impl Into<PathBuf>,
    ) -> RecordingResult<Self> {
        let recording = recording.into();
        let playback = playback.into();
        validate_path(&recording)?;
        validate_path(&playback)?;

        self.config.recording_path = recording;
        self.config.playback_path = playback;
        Ok(self)
    }

    pub fn bind_keys(mut self, start: KeyCode, stop: KeyCode, play: KeyCode) -> RecordingResult<Self> {
        let binds = BindKeys { start, stop, play };
        binds.validate()?;

        if let Some(key) = self.config.tracked_keys.iter().find(|k| binds.contains(**k)) {
            return Err(RecordingError::ConfigurationError(format!(
                "bind key {} is also a tracked key",
                key
            )));
        }

        self.config.bind_keys = Some(binds);
        Ok(self)
    }

    /// Replace the tracked key set
    pub fn track_keys(mut self, keys: impl IntoIterator<Item = KeyCode>) -> RecordingResult<Self> {
        let mut tracked = BTreeSet::new();
        for key in keys {
            if self.is_bind_key(key) {
                return Err(RecordingError::ConfigurationError(format!(
                    "tracked key {} is already a bind key",
                    key
                )));
            }
            if !tracked.insert(key) {
                return Err(RecordingError::ConfigurationError(format!(
                    "key {} is tracked twice",
                    key
                )));
            }
        }

        self.config.tracked_keys = tracked;
        Ok(self)
    }

    /// Track every key in the table except the bind keys
    pub fn track_all_keys(mut self) -> Self {
        let tracked = KeyCode::ALL
            .iter()
            .copied()
            .filter(|k| !self.is_bind_key(*k))
            .collect();
        self.config.tracked_keys = tracked;
        self
    }

    pub fn keyboard_tracking(mut self, enabled: bool) -> Self {
        self.config.keyboard_tracking = enabled;
        self
    }

    pub fn mouse_tracking(mut self, enabled: bool) -> Self {
        self.config.mouse_tracking = enabled;
        self
    }

    /// Record cursor movement samples, not only clicks
    pub fn mouse_move(mut self, enabled: bool) -> Self {
        self.config.mouse_move = enabled;
        self
    }

    pub fn move_threshold(mut self, threshold: f64) -> RecordingResult<Self> {
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(RecordingError::ConfigurationError(format!(
                "move threshold must be a non-negative number, got {}",
                threshold
            )));
        }
        self.config.move_threshold = threshold;
        Ok(self)
    }

    pub fn coordinate_correction(mut self, correction: CoordinateCorrection) -> Self {
        self.config.correction = correction;
        self
    }

    pub fn build(self) -> RecorderConfig {
        self.config
    }

    fn is_bind_key(&self, key: KeyCode) -> bool {
        self.config.bind_keys.is_some_and(|b| b.contains(key))
    }
}

/// Recorder configuration as stored in a settings file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecorderSettings {
    pub recording_path: PathBuf,
    /// Defaults to `recording_path`
    pub playback_path: Option<PathBuf>,
    pub bind_keys: Option<BindKeys>,
    pub tracked_keys: Vec<KeyCode>,
    /// Overrides `tracked_keys`
    pub track_all_keys: bool,
    pub keyboard_tracking: bool,
    pub mouse_tracking: bool,
    pub mouse_move: bool,
    pub move_threshold: f64,
    pub coordinate_correction: CoordinateCorrection,
}

impl Default for RecorderSettings {
    fn default() -> Self {
        let config = RecorderConfig::default();
        Self {
            recording_path: config.recording_path,
            playback_path: None,
            bind_keys: None,
            tracked_keys: Vec::new(),
            track_all_keys: false,
            keyboard_tracking: config.keyboard_tracking,
            mouse_tracking: config.mouse_tracking,
            mouse_move: config.mouse_move,
            move_threshold: config.move_threshold,
            coordinate_correction: config.correction,
        }
    }
}

impl RecorderSettings {
    pub fn from_json_file(path: &Path) -> RecordingResult<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            RecordingError::ParseError(format!("invalid settings in '{}': {}", path.display(), e))
        })
    }

    /// Build a configuration, applying the same checks as the builder
    pub fn into_config(self) -> RecordingResult<RecorderConfig> {
        let playback_path = self
            .playback_path
            .unwrap_or_else(|| self.recording_path.clone());

        let mut builder = RecorderConfig::builder()
            .action_paths(self.recording_path, playback_path)?
            .keyboard_tracking(self.keyboard_tracking)
            .mouse_tracking(self.mouse_tracking)
            .mouse_move(self.mouse_move)
            .move_threshold(self.move_threshold)?
            .coordinate_correction(self.coordinate_correction);

        if let Some(binds) = self.bind_keys {
            builder = builder.bind_keys(binds.start, binds.stop, binds.play)?;
        }

        builder = if self.track_all_keys {
            builder.track_all_keys()
        } else {
            builder.track_keys(self.tracked_keys)?
        };

        Ok(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn binds() -> RecordingResult<RecorderConfigBuilder> {
        RecorderConfig::builder().bind_keys(KeyCode::F9, KeyCode::F10, KeyCode::F11)
    }

    #[test]
    fn test_defaults() {
        let config = RecorderConfig::default();
        assert_eq!(config.recording_path(), Path::new(DEFAULT_ACTION_PATH));
        assert_eq!(config.playback_path(), Path::new(DEFAULT_ACTION_PATH));
        assert!(config.keyboard_tracking());
        assert!(config.mouse_tracking());
        assert!(config.mouse_move());
        assert_eq!(config.move_threshold(), 5.0);
        assert_eq!(config.correction(), CoordinateCorrection::default());
    }

    #[test]
    fn test_bind_keys_must_be_distinct() {
        let err = RecorderConfig::builder()
            .bind_keys(KeyCode::F9, KeyCode::F9, KeyCode::F11)
            .unwrap_err();
        assert!(matches!(err, RecordingError::ConfigurationError(_)));
    }

    #[test]
    fn test_bind_key_cannot_be_tracked() {
        let err = binds()
            .unwrap()
            .track_keys([KeyCode::A, KeyCode::F10])
            .unwrap_err();
        assert!(matches!(err, RecordingError::ConfigurationError(_)));

        let err = RecorderConfig::builder()
            .track_keys([KeyCode::A, KeyCode::F10])
            .unwrap()
            .bind_keys(KeyCode::F9, KeyCode::F10, KeyCode::F11)
            .unwrap_err();
        assert!(matches!(err, RecordingError::ConfigurationError(_)));
    }

    #[test]
    fn test_duplicate_tracked_key_is_rejected() {
        let err = binds()
            .unwrap()
            .track_keys([KeyCode::A, KeyCode::B, KeyCode::A])
            .unwrap_err();
        assert!(matches!(err, RecordingError::ConfigurationError(_)));
    }

    #[test]
    fn test_track_all_keys_skips_bind_keys() {
        let config = binds().unwrap().track_all_keys().build();
        assert!(config.is_tracked(KeyCode::A));
        assert!(!config.is_tracked(KeyCode::F9));
        assert!(!config.is_tracked(KeyCode::F11));
        assert_eq!(config.tracked_keys().len(), KeyCode::ALL.len() - 3);
    }

    #[test]
    fn test_validate_requires_bind_keys() {
        let config = RecorderConfig::builder()
            .track_keys([KeyCode::A])
            .unwrap()
            .build();
        assert!(matches!(
            config.validate(),
            Err(RecordingError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_validate_requires_tracked_keys_with_keyboard_tracking() {
        let config = binds().unwrap().build();
        assert!(matches!(
            config.validate(),
            Err(RecordingError::InvalidConfiguration(_))
        ));

        let mouse_only = binds().unwrap().keyboard_tracking(false).build();
        assert!(mouse_only.validate().is_ok());
    }

    #[test]
    fn test_invalid_path_fails_immediately() {
        let err = RecorderConfig::builder().action_path("").unwrap_err();
        assert!(matches!(err, RecordingError::PathError(_)));

        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing").join("actions.json");
        let err = RecorderConfig::builder().action_path(missing).unwrap_err();
        assert!(matches!(err, RecordingError::PathError(_)));
    }

    #[test]
    fn test_negative_move_threshold_is_rejected() {
        assert!(RecorderConfig::builder().move_threshold(-1.0).is_err());
        assert!(RecorderConfig::builder().move_threshold(f64::NAN).is_err());
    }

    #[test]
    fn test_settings_from_json_file() {
        let dir = tempdir().unwrap();
        let actions = dir.path().join("actions.json");
        let settings_path = dir.path().join("settings.json");
        let content = serde_json::json!({
            "recordingPath": actions,
            "bindKeys": { "start": "F9", "stop": "F10", "play": "F11" },
            "trackedKeys": ["A", "S", "D", "W"],
            "mouseMove": false,
            "coordinateCorrection": { "scaleX": 1.0, "scaleY": 1.0 },
        });
        std::fs::write(&settings_path, content.to_string()).unwrap();

        let config = RecorderSettings::from_json_file(&settings_path)
            .unwrap()
            .into_config()
            .unwrap();

        assert_eq!(config.recording_path(), actions.as_path());
        assert_eq!(config.playback_path(), actions.as_path());
        assert_eq!(config.tracked_keys().len(), 4);
        assert!(!config.mouse_move());
        assert!(config.mouse_tracking());
        assert_eq!(config.correction(), CoordinateCorrection::identity());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_settings_conflicts_are_rejected() {
        let settings = RecorderSettings {
            bind_keys: Some(BindKeys {
                start: KeyCode::A,
                stop: KeyCode::B,
                play: KeyCode::C,
            }),
            tracked_keys: vec![KeyCode::C],
            ..Default::default()
        };
        assert!(matches!(
            settings.into_config(),
            Err(RecordingError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_malformed_settings_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "trackedKeys": ["NotAKey"] }"#).unwrap();

        assert!(matches!(
            RecorderSettings::from_json_file(&path),
            Err(RecordingError::ParseError(_))
        ));
    }
}
