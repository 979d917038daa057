//! Recording channel trait
//!
//! Defines the interface for the recording channels (keyboard, mouse) and the
//! error type shared across the crate.

use crate::storage::store::PersistenceAdapter;
use async_trait::async_trait;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Errors that can occur while configuring, recording, persisting or replaying
#[derive(Error, Debug)]
pub enum RecordingError {
    /// Conflicting bind-key / tracked-key setup
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Configuration is incomplete at the moment hooks would be armed
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Path error: {0}")]
    PathError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    /// Operation invoked in the wrong recorder mode
    #[error("State error: {0}")]
    StateError(String),

    #[error("Actuator error: {0}")]
    ActuatorError(String),

    #[error("Playback error: {0}")]
    PlaybackError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for recording operations
pub type RecordingResult<T> = Result<T, RecordingError>;

/// Zero point of a recording session
///
/// Every action time is measured from `origin`; event timestamps that predate
/// it (delivered late by the source) clamp to zero.
#[derive(Debug, Clone, Copy)]
pub struct SessionClock {
    origin: Instant,
}

impl SessionClock {
    pub fn starting_at(origin: Instant) -> Self {
        Self { origin }
    }

    pub fn origin(&self) -> Instant {
        self.origin
    }

    pub fn elapsed_at(&self, timestamp: Instant) -> Duration {
        timestamp.saturating_duration_since(self.origin)
    }
}

/// Trait for recording channels
///
/// Each channel owns a private action list fed by one input stream. Channels
/// are driven by the [`Recorder`](crate::recorder::Recorder), which is the
/// single writer for every list.
#[async_trait]
pub trait RecordingChannel: Send + Sync {
    /// Get the channel identifier (e.g., "keyboard", "mouse")
    fn id(&self) -> &str;

    fn channel_type(&self) -> ChannelType;

    /// Clear the action list and start timing from `clock`
    async fn start(&mut self, clock: SessionClock) -> RecordingResult<()>;

    /// Freeze the action list and merge-save it through `store`
    ///
    /// `ended_at` is the session length written as `RecordMs`.
    async fn stop(
        &mut self,
        ended_at: Duration,
        store: &dyn PersistenceAdapter,
    ) -> RecordingResult<()>;

    fn is_recording(&self) -> bool;

    /// Number of actions recorded in the current or last session
    fn action_count(&self) -> usize;
}

/// Types of recording channels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelType {
    /// Keyboard press intervals
    Keyboard,
    /// Mouse clicks and movement samples
    Mouse,
}

impl std::fmt::Display for ChannelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelType::Keyboard => write!(f, "keyboard"),
            ChannelType::Mouse => write!(f, "mouse"),
        }
    }
}
