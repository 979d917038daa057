//! Mouse recording
//!
//! Clicks are recorded as press intervals per event type. Movement is sampled:
//! a new sample is kept only once the cursor has travelled at least the move
//! threshold from the last kept sample, which bounds the otherwise unbounded
//! stream of move notifications.

use crate::actions::model::{MouseAction, MouseEventType, Position};
use crate::capture::input::types::MouseEvent;
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

/// Default minimum cursor travel between two kept move samples
pub const DEFAULT_MOVE_THRESHOLD: f64 = 5.0;

/// Builds click intervals and thresholded move samples from mouse events
#[derive(Debug)]
pub struct MouseMerger {
    threshold: f64,
    actions: Vec<MouseAction>,
    /// Index of the most recent click action per click type
    latest_click: HashMap<MouseEventType, usize>,
    last_move: Option<Position>,
}

impl MouseMerger {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            actions: Vec::new(),
            latest_click: HashMap::new(),
            last_move: None,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn record(
        &mut self,
        event_type: MouseEventType,
        position: Position,
        is_down: bool,
        elapsed: Duration,
    ) {
        if event_type == MouseEventType::Move {
            self.record_move(position, elapsed);
            return;
        }

        let latest = self.latest_click.get(&event_type).copied();
        if is_down {
            match latest {
                // A second press while the first is unreleased restarts it
                Some(i) if self.actions[i].is_open() => {
                    self.actions[i].start_time = elapsed;
                }
                _ => {
                    self.latest_click.insert(event_type, self.actions.len());
                    self.actions
                        .push(MouseAction::press(event_type, position, elapsed));
                }
            }
            return;
        }

        match latest {
            Some(i) if self.actions[i].is_open() => {
                self.actions[i].end_time = Some(elapsed);
            }
            _ => tracing::trace!("Dropping {:?} release without a press", event_type),
        }
    }

    fn record_move(&mut self, position: Position, elapsed: Duration) {
        if let Some(last) = self.last_move {
            if position.distance(&last) < self.threshold {
                return;
            }
        }
        self.last_move = Some(position);
        self.actions.push(MouseAction::sample(position, elapsed));
    }

    pub fn actions(&self) -> &[MouseAction] {
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
        self.latest_click.clear();
        self.last_move = None;
    }
}

impl Default for MouseMerger {
    fn default() -> Self {
        Self::new(DEFAULT_MOVE_THRESHOLD)
    }
}

pub struct MouseChannel {
    id: String,
    is_recording: Arc<AtomicBool>,
    clock: Option<SessionClock>,
    merger: Arc<ParkingMutex<MouseMerger>>,
}

impl MouseChannel {
    pub fn new(move_threshold: f64) -> Self {
        Self {
            id: "mouse".to_string(),
            is_recording: Arc::new(AtomicBool::new(false)),
            clock: None,
            merger: Arc::new(ParkingMutex::new(MouseMerger::new(move_threshold))),
        }
    }

    /// Feed one mouse event into the current session
    pub fn record(&self, event: &MouseEvent) {
        if !self.is_recording.load(Ordering::SeqCst) {
            return;
        }
        let Some(clock) = self.clock else {
            return;
        };

        let elapsed = clock.elapsed_at(event.timestamp);
        self.merger
            .lock()
            .record(event.event_type, event.position, event.is_down, elapsed);
    }

    /// Snapshot of the current or last session's actions
    pub fn actions(&self) -> Vec<MouseAction> {
        self.merger.lock().actions().to_vec()
    }
}

impl Default for MouseChannel {
    fn default() -> Self {
        Self::new(DEFAULT_MOVE_THRESHOLD)
    }
}

#[async_trait]
impl RecordingChannel for MouseChannel {
    fn id(&self) -> &str {
        &self.id
    }

    fn channel_type(&self) -> ChannelType {
        ChannelType::Mouse
    }

    async fn start(&mut self, clock: SessionClock) -> RecordingResult<()> {
        if self.is_recording.load(Ordering::SeqCst) {
            return Err(RecordingError::StateError(
                "mouse channel is already recording".to_string(),
            ));
        }

        self.merger.lock().clear();
        self.clock = Some(clock);
        self.is_recording.store(true, Ordering::SeqCst);

        tracing::debug!(
            "Mouse recording started (move_threshold={})",
            self.merger.lock().threshold()
        );
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

        let (document, moves) = {
            let merger = self.merger.lock();
            let moves = merger
                .actions()
                .iter()
                .filter(|a| a.event_type == MouseEventType::Move)
                .count();
            (
                RecordDocument::from_mouse_actions(ended_at, merger.actions()),
                moves,
            )
        };
        store.merge_save(&document)?;

        tracing::info!(
            "Mouse recording stopped (moves={}, clicks={}, length={:?})",
            moves,
            self.action_count() - moves,
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

    fn positions(merger: &MouseMerger) -> Vec<(i32, i32)> {
        merger
            .actions()
            .iter()
            .map(|a| (a.position.x, a.position.y))
            .collect()
    }

    #[test]
    fn test_small_moves_are_dropped() {
        let mut merger = MouseMerger::default();
        merger.record(MouseEventType::Move, Position::new(0, 0), false, ms(0));
        merger.record(MouseEventType::Move, Position::new(2, 2), false, ms(10));
        merger.record(MouseEventType::Move, Position::new(10, 10), false, ms(20));

        assert_eq!(positions(&merger), vec![(0, 0), (10, 10)]);
        assert_eq!(merger.actions()[1].start_time, ms(20));
        assert_eq!(merger.actions()[1].end_time, Some(ms(20)));
    }

    #[test]
    fn test_moves_below_threshold_keep_only_first() {
        let mut merger = MouseMerger::default();
        for i in 0..20 {
            merger.record(MouseEventType::Move, Position::new(i % 3, 0), false, ms(i as u64));
        }
        assert_eq!(positions(&merger), vec![(0, 0)]);
    }

    #[test]
    fn test_moves_at_threshold_are_all_kept() {
        let mut merger = MouseMerger::default();
        let path = [(0, 0), (3, 4), (6, 8), (6, 13), (20, 13)];
        for (i, (x, y)) in path.iter().enumerate() {
            merger.record(MouseEventType::Move, Position::new(*x, *y), false, ms(i as u64));
        }
        assert_eq!(positions(&merger), path.to_vec());
    }

    #[test]
    fn test_threshold_measures_from_last_kept_sample() {
        let mut merger = MouseMerger::new(5.0);
        merger.record(MouseEventType::Move, Position::new(0, 0), false, ms(0));
        merger.record(MouseEventType::Move, Position::new(3, 0), false, ms(1));
        merger.record(MouseEventType::Move, Position::new(6, 0), false, ms(2));

        // (6,0) is 3 from the dropped (3,0) but 6 from the kept (0,0)
        assert_eq!(positions(&merger), vec![(0, 0), (6, 0)]);
    }

    #[test]
    fn test_click_interval() {
        let mut merger = MouseMerger::default();
        merger.record(MouseEventType::ClickLeft, Position::new(5, 6), true, ms(30));
        merger.record(MouseEventType::ClickLeft, Position::new(5, 6), false, ms(90));

        assert_eq!(
            merger.actions(),
            &[MouseAction {
                event_type: MouseEventType::ClickLeft,
                position: Position::new(5, 6),
                start_time: ms(30),
                end_time: Some(ms(90)),
            }]
        );
    }

    #[test]
    fn test_repeated_press_restarts_open_click() {
        let mut merger = MouseMerger::default();
        merger.record(MouseEventType::ClickRight, Position::new(1, 1), true, ms(10));
        merger.record(MouseEventType::ClickRight, Position::new(2, 2), true, ms(50));
        merger.record(MouseEventType::ClickRight, Position::new(2, 2), false, ms(70));

        assert_eq!(merger.len(), 1);
        assert_eq!(merger.actions()[0].start_time, ms(50));
        assert_eq!(merger.actions()[0].end_time, Some(ms(70)));
    }

    #[test]
    fn test_click_types_are_independent() {
        let mut merger = MouseMerger::default();
        merger.record(MouseEventType::ClickLeft, Position::new(0, 0), true, ms(0));
        merger.record(MouseEventType::ClickRight, Position::new(0, 0), true, ms(5));
        merger.record(MouseEventType::ClickLeft, Position::new(0, 0), false, ms(10));

        assert!(!merger.actions()[0].is_open());
        assert!(merger.actions()[1].is_open());
    }

    #[test]
    fn test_orphan_release_is_dropped() {
        let mut merger = MouseMerger::default();
        merger.record(MouseEventType::ClickLeft, Position::new(0, 0), false, ms(5));
        assert!(merger.is_empty());
    }

    #[tokio::test]
    async fn test_channel_saves_mouse_fragment() {
        let origin = Instant::now();
        let store = MemoryStore::new();
        let mut channel = MouseChannel::default();

        channel.start(SessionClock::starting_at(origin)).await.unwrap();
        assert_eq!(channel.id(), "mouse");
        assert_eq!(channel.channel_type(), ChannelType::Mouse);
        channel.record(&MouseEvent {
            event_type: MouseEventType::Move,
            position: Position::new(10, 10),
            is_down: false,
            timestamp: origin + ms(300),
        });
        channel.record(&MouseEvent {
            event_type: MouseEventType::ClickLeft,
            position: Position::new(10, 10),
            is_down: true,
            timestamp: origin + ms(320),
        });
        channel.stop(ms(500), &store).await.unwrap();

        assert_eq!(
            store.contents(),
            json!({
                "RecordMs": 500.0,
                "Mouse": [
                    {
                        "EventType": "Move",
                        "Position": { "X": 10, "Y": 10 },
                        "StartTime": 300.0,
                        "EndTime": 300.0,
                    },
                    {
                        "EventType": "ClickLeft",
                        "Position": { "X": 10, "Y": 10 },
                        "StartTime": 320.0,
                        "EndTime": 0.0,
                    },
                ],
            })
        );
    }
}
