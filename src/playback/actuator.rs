//! Actuator boundary
//!
//! The actuator physically replays effects (cursor moves, key and button
//! presses). Platform simulation lives outside the crate; [`EffectLog`] is the
//! built-in implementation that records effects and reports them through
//! `tracing`.

use crate::actions::keycode::KeyCode;
use crate::actions::model::MouseButton;
use crate::recorder::channel::RecordingResult;
use parking_lot::Mutex as ParkingMutex;
use std::time::Duration;
use tokio::time::Instant;

/// Sink for replayed input effects
///
/// Calls come concurrently from many playback tasks; implementations must not
/// block for long.
pub trait Actuator: Send + Sync {
    fn key_down(&self, key: KeyCode) -> RecordingResult<()>;

    fn key_up(&self, key: KeyCode) -> RecordingResult<()>;

    fn move_to(&self, x: f64, y: f64) -> RecordingResult<()>;

    fn button_down(&self, button: MouseButton) -> RecordingResult<()>;

    fn button_up(&self, button: MouseButton) -> RecordingResult<()>;
}

/// One replayed effect
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    KeyDown(KeyCode),
    KeyUp(KeyCode),
    MoveTo { x: f64, y: f64 },
    ButtonDown(MouseButton),
    ButtonUp(MouseButton),
}

/// Effect stamped with its offset from the log's creation
#[derive(Debug, Clone, PartialEq)]
pub struct TimedEffect {
    pub at: Duration,
    pub effect: Effect,
}

/// Actuator that records every effect instead of simulating it
#[derive(Debug)]
pub struct EffectLog {
    started: Instant,
    effects: ParkingMutex<Vec<TimedEffect>>,
}

impl EffectLog {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            effects: ParkingMutex::new(Vec::new()),
        }
    }

    /// Effects in the order they were emitted
    pub fn effects(&self) -> Vec<TimedEffect> {
        self.effects.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.effects.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.lock().is_empty()
    }

    fn push(&self, effect: Effect) -> RecordingResult<()> {
        let at = self.started.elapsed();
        tracing::debug!("[{:>8.1}ms] {:?}", at.as_secs_f64() * 1000.0, effect);
        self.effects.lock().push(TimedEffect { at, effect });
        Ok(())
    }
}

impl Default for EffectLog {
    fn default() -> Self {
        Self::new()
    }
}

impl Actuator for EffectLog {
    fn key_down(&self, key: KeyCode) -> RecordingResult<()> {
        self.push(Effect::KeyDown(key))
    }

    fn key_up(&self, key: KeyCode) -> RecordingResult<()> {
        self.push(Effect::KeyUp(key))
    }

    fn move_to(&self, x: f64, y: f64) -> RecordingResult<()> {
        self.push(Effect::MoveTo { x, y })
    }

    fn button_down(&self, button: MouseButton) -> RecordingResult<()> {
        self.push(Effect::ButtonDown(button))
    }

    fn button_up(&self, button: MouseButton) -> RecordingResult<()> {
        self.push(Effect::ButtonUp(button))
    }
}
