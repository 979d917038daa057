//! Keyboard recording
//!
//! [`KeyboardMerger`] folds key down/up notifications into press intervals;
//! [`KeyboardChannel`] wraps it as a [`RecordingChannel`] that persists the
//! `Keys` fragment of the record document on stop.

use crate::actions::keycode::KeyCode;
use crate::actions::model::KeyAction;
use crate::capture::input::types::KeyEvent;
use crate::recorder::channel::{
    ChannelType, RecordingChannel, RecordingError, RecordingResult, SessionClock,
};
use crate::storage::document::RecordDocument;
use crate::storage::store::PersistenceAdapter;
use async_trait::async_trait;
use parking_lot::Mutex as ParkingMutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Builds key press intervals from an ordered key event stream
///
/// At most one interval per key is open at any time. Repeated downs of a held
/// key (OS key repeat) are coalesced into the open interval.
#[derive(Debug, Default)]
pub struct KeyboardMerger {
    actions: Vec<KeyAction>,
    /// Index of the most recent action per key
    latest: HashMap<KeyCode, usize>,
}

impl KeyboardMerger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, key: KeyCode, is_down: bool, elapsed: Duration) {
        let latest = self.latest.get(&key).copied();

        if is_down {
            match latest {
                Some(i) if self.actions[i].is_open() => {}
                _ => {
                    self.latest.insert(key, self.actions.len());
                    self.actions.push(KeyAction::open(key, elapsed));
                }
            }
            return;
        }

        match latest {
            Some(i) if self.actions[i].is_open() => {
                self.actions[i].end_time = Some(elapsed);
            }
            _ => tracing::trace!("Dropping release of {} without a press", key),
        }
    }

    pub fn actions(&self) -> &[KeyAction] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn clear(&mut self) {
        self.actions.clear();
        self.latest.clear();
    }
}

pub struct KeyboardChannel {
    id: String,
    is_recording: Arc<AtomicBool>,
    clock: Option<SessionClock>,
    merger: Arc<ParkingMutex<KeyboardMerger>>,
}

impl KeyboardChannel {
    pub fn new() -> Self {
        Self {
            id: "keyboard".to_string(),
            is_recording: Arc::new(AtomicBool::new(false)),
            clock: None,
            merger: Arc::new(ParkingMutex::new(KeyboardMerger::new())),
        }
    }

    /// Feed one key event into the current session
    pub fn record(&self, event: &KeyEvent) {
        if !self.is_recording.load(Ordering::SeqCst) {
            return;
        }
        let Some(clock) = self.clock else {
            return;
        };

        let elapsed = clock.elapsed_at(event.timestamp);
        self.merger.lock().record(event.key, event.is_down, elapsed);
    }

    /// Snapshot of the current or last session's actions
    pub fn actions(&self) -> Vec<KeyAction> {
        self.merger.lock().actions().to_vec()
    }
}

impl Default for KeyboardChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordingChannel for KeyboardChannel {
    fn id(&self) -> &str {
        &self.id
    }

    fn channel_type(&self) -> ChannelType {
        ChannelType::Keyboard
    }

    async fn start(&mut self, clock: SessionClock) -> RecordingResult<()> {
        if self.is_recording.load(Ordering::SeqCst) {
            return Err(RecordingError::StateError(
                "keyboard channel is already recording".to_string(),
            ));
        }

        self.merger.lock().clear();
        self.clock = Some(clock);
        self.is_recording.store(true, Ordering::SeqCst);

        tracing::debug!("Keyboard recording started");
        Ok(())
    }

    async fn stop(
        &mut self,
        ended_at: Duration,
        store: &dyn PersistenceAdapter,
    ) -> RecordingResult<()> {
        if !self.is_recording.swap(false, Ordering::SeqCst) {
            return Ok(());
        }

        let document = {
            let merger = self.merger.lock();
            RecordDocument::from_key_actions(ended_at, merger.actions())
        };
        store.merge_save(&document)?;

        tracing::info!(
            "Keyboard recording stopped (keys={}, length={:?})",
            self.action_count(),
            ended_at
        );
        Ok(())
    }

    fn is_recording(&self) -> bool {
        self.is_recording.load(Ordering::SeqCst)
    }

    fn action_count(&self) -> usize {
        self.merger.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::store::MemoryStore;
    use serde_json::json;
    use std::time::Instant;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_down_then_up_closes_interval() {
        let mut merger = KeyboardMerger::new();
        merger.record(KeyCode::A, true, ms(100));
        merger.record(KeyCode::A, false, ms(250));

        assert_eq!(
            merger.actions(),
            &[KeyAction {
                key: KeyCode::A,
                start_time: ms(100),
                end_time: Some(ms(250)),
            }]
        );
        assert!(merger.actions()[0].start_time < merger.actions()[0].end_time.unwrap());
    }

    #[test]
    fn test_key_repeat_is_coalesced() {
        let mut merger = KeyboardMerger::new();
        merger.record(KeyCode::S, true, ms(10));
        merger.record(KeyCode::S, true, ms(40));
        merger.record(KeyCode::S, true, ms(70));
        merger.record(KeyCode::S, false, ms(90));

        assert_eq!(merger.len(), 1);
        assert_eq!(merger.actions()[0].start_time, ms(10));
        assert_eq!(merger.actions()[0].end_time, Some(ms(90)));
    }

    #[test]
    fn test_release_without_press_is_dropped() {
        let mut merger = KeyboardMerger::new();
        merger.record(KeyCode::A, false, ms(5));
        assert!(merger.is_empty());

        merger.record(KeyCode::A, true, ms(10));
        merger.record(KeyCode::A, false, ms(20));
        let before = merger.actions().to_vec();

        merger.record(KeyCode::A, false, ms(30));
        assert_eq!(merger.actions(), before.as_slice());
    }

    #[test]
    fn test_second_press_after_release_appends() {
        let mut merger = KeyboardMerger::new();
        merger.record(KeyCode::A, true, ms(0));
        merger.record(KeyCode::B, true, ms(5));
        merger.record(KeyCode::A, false, ms(10));
        merger.record(KeyCode::A, true, ms(20));
        merger.record(KeyCode::B, false, ms(25));
        merger.record(KeyCode::A, false, ms(30));

        let summary: Vec<_> = merger
            .actions()
            .iter()
            .map(|a| (a.key, a.start_time, a.end_time))
            .collect();
        assert_eq!(
            summary,
            vec![
                (KeyCode::A, ms(0), Some(ms(10))),
                (KeyCode::B, ms(5), Some(ms(25))),
                (KeyCode::A, ms(20), Some(ms(30))),
            ]
        );
    }

    #[test]
    fn test_press_at_session_start_is_ordinary() {
        let mut merger = KeyboardMerger::new();
        merger.record(KeyCode::Space, true, Duration::ZERO);
        merger.record(KeyCode::Space, true, ms(30));
        merger.record(KeyCode::Space, false, ms(60));

        assert_eq!(merger.len(), 1);
        assert_eq!(merger.actions()[0].start_time, Duration::ZERO);
    }

    #[test]
    fn test_held_key_stays_open() {
        let mut merger = KeyboardMerger::new();
        merger.record(KeyCode::LShiftKey, true, ms(15));
        assert!(merger.actions()[0].is_open());
    }

    #[tokio::test]
    async fn test_channel_saves_keys_fragment() {
        let origin = Instant::now();
        let store = MemoryStore::new();
        let mut channel = KeyboardChannel::new();

        channel.start(SessionClock::starting_at(origin)).await.unwrap();
        assert!(channel.is_recording());
        assert_eq!(channel.id(), "keyboard");
        assert_eq!(channel.channel_type(), ChannelType::Keyboard);
        channel.record(&KeyEvent {
            key: KeyCode::A,
            is_down: true,
            timestamp: origin + ms(100),
        });
        channel.record(&KeyEvent {
            key: KeyCode::A,
            is_down: false,
            timestamp: origin + ms(250),
        });
        channel.stop(ms(400), &store).await.unwrap();

        assert!(!channel.is_recording());
        assert_eq!(channel.action_count(), 1);
        assert_eq!(
            store.contents(),
            json!({
                "RecordMs": 400.0,
                "KeyTableVersion": 1,
                "Keys": [{ "Key": "A", "StartTime": 100.0, "EndTime": 250.0 }],
            })
        );
    }

    #[tokio::test]
    async fn test_events_outside_session_are_ignored() {
        let origin = Instant::now();
        let mut channel = KeyboardChannel::new();
        channel.record(&KeyEvent {
            key: KeyCode::A,
            is_down: true,
            timestamp: origin,
        });
        assert_eq!(channel.action_count(), 0);

        channel.start(SessionClock::starting_at(origin)).await.unwrap();
        assert!(matches!(
            channel.start(SessionClock::starting_at(origin)).await,
            Err(RecordingError::StateError(_))
        ));
    }

    #[tokio::test]
    async fn test_restart_clears_previous_session() {
        let origin = Instant::now();
        let store = MemoryStore::new();
        let mut channel = KeyboardChannel::new();

        channel.start(SessionClock::starting_at(origin)).await.unwrap();
        channel.record(&KeyEvent {
            key: KeyCode::B,
            is_down: true,
            timestamp: origin,
        });
        channel.stop(ms(10), &store).await.unwrap();
        assert_eq!(channel.actions().len(), 1);

        channel.start(SessionClock::starting_at(origin)).await.unwrap();
        assert_eq!(channel.action_count(), 0);
    }
}
