//! Recorder coordinator
//!
//! [`Recorder`] owns the Idle / Recording / Playing lifecycle. Every event from
//! the event source passes through [`Recorder::dispatch`], which is the single
//! writer for both channels' action lists: bind keys drive mode transitions
//! and tracked input is forwarded to the keyboard and mouse channels while
//! recording.

use crate::actions::model::{Action, MouseEventType};
use crate::capture::input::source::EventSource;
use crate::capture::input::types::{InputEvent, KeyEvent, MouseEvent};
use crate::playback::actuator::Actuator;
use crate::playback::scheduler::{PlaybackCancel, PlaybackScheduler, PlaybackSummary};
use crate::recorder::channel::{RecordingChannel, RecordingError, RecordingResult, SessionClock};
use crate::recorder::keyboard::KeyboardChannel;
use crate::recorder::mouse::MouseChannel;
use crate::recorder::state::{RecorderConfig, RecorderMode};
use crate::storage::document::duration_to_ms;
use crate::storage::store::{JsonFileStore, PersistenceAdapter};
use chrono::{DateTime, Utc};
use parking_lot::Mutex as ParkingMutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Result of a finished recording session
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingSummary {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub duration_ms: f64,
    pub key_actions: usize,
    pub mouse_actions: usize,
}

/// A playback running in the background
pub struct PlaybackHandle {
    cancel: PlaybackCancel,
    task: JoinHandle<RecordingResult<PlaybackSummary>>,
}

impl PlaybackHandle {
    /// Stop the playback at its next suspend point
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Cancellation handle usable after the playback handle has moved
    pub fn canceller(&self) -> PlaybackCancel {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub async fn wait(self) -> RecordingResult<PlaybackSummary> {
        self.task
            .await
            .map_err(|e| RecordingError::PlaybackError(e.to_string()))?
    }
}

struct Session {
    id: Uuid,
    started_at: DateTime<Utc>,
    clock: SessionClock,
}

pub struct Recorder {
    config: RecorderConfig,
    mode: Arc<ParkingMutex<RecorderMode>>,
    keyboard: KeyboardChannel,
    mouse: MouseChannel,
    store: Arc<dyn PersistenceAdapter>,
    /// Store derived from the configured paths, rebuilt on reconfigure
    file_backed: bool,
    actuator: Arc<dyn Actuator>,
    session: Option<Session>,
    playback: Option<PlaybackHandle>,
}

impl Recorder {
    /// Recorder persisting to the configured JSON files
    pub fn new(config: RecorderConfig, actuator: Arc<dyn Actuator>) -> Self {
        let store = file_store(&config);
        let mut recorder = Self::with_store(config, store, actuator);
        recorder.file_backed = true;
        recorder
    }

    /// Recorder persisting through a custom adapter
    pub fn with_store(
        config: RecorderConfig,
        store: Arc<dyn PersistenceAdapter>,
        actuator: Arc<dyn Actuator>,
    ) -> Self {
        Self {
            mouse: MouseChannel::new(config.move_threshold()),
            keyboard: KeyboardChannel::new(),
            config,
            mode: Arc::new(ParkingMutex::new(RecorderMode::Idle)),
            store,
            file_backed: false,
            actuator,
            session: None,
            playback: None,
        }
    }

    pub fn mode(&self) -> RecorderMode {
        *self.mode.lock()
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Replace the configuration; only allowed while idle
    pub fn reconfigure(&mut self, config: RecorderConfig) -> RecordingResult<()> {
        self.require_mode(RecorderMode::Idle, "reconfigure")?;

        if self.file_backed {
            self.store = file_store(&config);
        }
        self.mouse = MouseChannel::new(config.move_threshold());
        self.config = config;

        tracing::debug!("Recorder reconfigured");
        Ok(())
    }

    /// Arm `source` and process its events until the stream ends
    ///
    /// A failed transition is logged and the hooks stay armed. A session still
    /// recording when the stream ends is stopped and saved; a running playback
    /// is awaited.
    pub async fn run(&mut self, source: &mut dyn EventSource) -> RecordingResult<()> {
        self.config.validate()?;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let guard = source.arm(tx)?;

        tracing::info!("Recorder armed, waiting for bind keys");

        while let Some(event) = rx.recv().await {
            if let Err(e) = self.dispatch(event).await {
                tracing::warn!("Event dispatch failed: {}", e);
            }
        }

        guard.release();

        if self.mode() == RecorderMode::Recording {
            self.stop_recording().await?;
        }
        self.wait_playback().await?;

        tracing::info!("Event stream closed, recorder disarmed");
        Ok(())
    }

    /// Route one event according to the current mode
    pub async fn dispatch(&mut self, event: InputEvent) -> RecordingResult<()> {
        match event {
            InputEvent::Key(e) => self.dispatch_key(e).await,
            InputEvent::Mouse(e) => {
                self.dispatch_mouse(&e);
                Ok(())
            }
        }
    }

    async fn dispatch_key(&mut self, event: KeyEvent) -> RecordingResult<()> {
        let mode = self.mode();

        if let Some(binds) = self.config.bind_keys().filter(|b| b.contains(event.key)) {
            if !event.is_down {
                return Ok(());
            }

            return match mode {
                RecorderMode::Idle if event.key == binds.start => {
                    self.start_recording_at(event.timestamp).await
                }
                RecorderMode::Recording if event.key == binds.stop => {
                    self.stop_recording_at(event.timestamp).await.map(|_| ())
                }
                RecorderMode::Idle if event.key == binds.play => self.start_playback().await,
                _ => {
                    tracing::debug!("Ignoring bind key {} while {}", event.key, mode);
                    Ok(())
                }
            };
        }

        if mode == RecorderMode::Recording
            && self.config.keyboard_tracking()
            && self.config.is_tracked(event.key)
        {
            self.keyboard.record(&event);
        }
        Ok(())
    }

    fn dispatch_mouse(&self, event: &MouseEvent) {
        if self.mode() != RecorderMode::Recording || !self.config.mouse_tracking() {
            return;
        }
        if event.event_type == MouseEventType::Move && !self.config.mouse_move() {
            return;
        }
        self.mouse.record(event);
    }

    pub async fn start_recording(&mut self) -> RecordingResult<()> {
        self.start_recording_at(Instant::now()).await
    }

    /// Begin a session whose time zero is `origin`
    pub async fn start_recording_at(&mut self, origin: Instant) -> RecordingResult<()> {
        self.require_mode(RecorderMode::Idle, "start recording")?;

        let clock = SessionClock::starting_at(origin);
        if self.config.keyboard_tracking() {
            self.keyboard.start(clock).await?;
        }
        if self.config.mouse_tracking() {
            self.mouse.start(clock).await?;
        }

        let session = Session {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            clock,
        };
        tracing::info!("Recording started... (session={})", session.id);

        self.session = Some(session);
        *self.mode.lock() = RecorderMode::Recording;
        Ok(())
    }

    pub async fn stop_recording(&mut self) -> RecordingResult<RecordingSummary> {
        self.stop_recording_at(Instant::now()).await
    }

    /// End the session at `ended` and merge-save both channels
    pub async fn stop_recording_at(&mut self, ended: Instant) -> RecordingResult<RecordingSummary> {
        self.require_mode(RecorderMode::Recording, "stop recording")?;
        let session = self.session.take().ok_or_else(|| {
            RecordingError::StateError("recording without an active session".to_string())
        })?;

        let length = session.clock.elapsed_at(ended);
        let keyboard = self.keyboard.stop(length, self.store.as_ref()).await;
        let mouse = self.mouse.stop(length, self.store.as_ref()).await;
        *self.mode.lock() = RecorderMode::Idle;
        keyboard?;
        mouse?;

        let summary = RecordingSummary {
            session_id: session.id,
            started_at: session.started_at,
            duration_ms: duration_to_ms(length),
            key_actions: self.keyboard.action_count(),
            mouse_actions: self.mouse.action_count(),
        };
        tracing::info!(
            "Recording stopped and saved. (session={}, keys={}, mouse={}, {:.1}ms)",
            summary.session_id,
            summary.key_actions,
            summary.mouse_actions,
            summary.duration_ms
        );
        Ok(summary)
    }

    /// Load the playback file and replay it in the background
    ///
    /// The recorder returns to idle once every action has been replayed. An
    /// error from the previous, finished playback is returned here and the new
    /// playback does not start.
    pub async fn start_playback(&mut self) -> RecordingResult<()> {
        self.require_mode(RecorderMode::Idle, "start playback")?;

        if let Some(previous) = self.playback.take() {
            let summary = previous.wait().await?;
            tracing::debug!(
                "Previous playback finished (completed={}, cancelled={})",
                summary.completed,
                summary.cancelled
            );
        }

        let actions = self.load_actions()?;
        let scheduler = PlaybackScheduler::new(self.actuator.clone(), self.config.correction());
        let (cancel, token) = PlaybackCancel::pair();
        let mode = self.mode.clone();

        *mode.lock() = RecorderMode::Playing;
        tracing::info!("Playing actions...");

        let task = tokio::spawn(async move {
            let result = scheduler.play_until(actions, token).await;
            *mode.lock() = RecorderMode::Idle;
            result
        });

        self.playback = Some(PlaybackHandle { cancel, task });
        Ok(())
    }

    /// Wait for the current or last playback, if any
    pub async fn wait_playback(&mut self) -> RecordingResult<Option<PlaybackSummary>> {
        match self.playback.take() {
            Some(handle) => handle.wait().await.map(Some),
            None => Ok(None),
        }
    }

    /// Request cancellation of a running playback; `false` when none is running
    pub fn cancel_playback(&self) -> bool {
        match &self.playback {
            Some(handle) if !handle.is_finished() => {
                handle.cancel();
                true
            }
            _ => false,
        }
    }

    /// Cancellation handle of the running playback, if any
    pub fn playback_canceller(&self) -> Option<PlaybackCancel> {
        self.playback.as_ref().map(PlaybackHandle::canceller)
    }

    fn load_actions(&self) -> RecordingResult<Vec<Action>> {
        let document = self.store.load()?;
        let mut actions = Vec::new();

        if self.config.keyboard_tracking() {
            actions.extend(document.key_actions()?.into_iter().map(Action::from));
        }
        if self.config.mouse_tracking() {
            actions.extend(document.mouse_actions()?.into_iter().map(Action::from));
        }

        tracing::debug!("Loaded {} actions for playback", actions.len());
        Ok(actions)
    }

    fn require_mode(&self, expected: RecorderMode, operation: &str) -> RecordingResult<()> {
        let mode = self.mode();
        if mode != expected {
            return Err(RecordingError::StateError(format!(
                "cannot {} while {}",
                operation, mode
            )));
        }
        Ok(())
    }
}

fn file_store(config: &RecorderConfig) -> Arc<dyn PersistenceAdapter> {
    Arc::new(JsonFileStore::new(
        config.recording_path(),
        config.playback_path(),
    ))
}
