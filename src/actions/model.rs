//! Recorded actions
//!
//! An action is one input occurrence measured relative to the start of its
//! recording session. Key and click actions are intervals which stay open
//! (`end_time == None`) until the matching release arrives; mouse moves are
//! instantaneous samples.

use crate::actions::keycode::KeyCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One continuous press of a single key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyAction {
    pub key: KeyCode,
    pub start_time: Duration,
    /// `None` while the key is still held
    pub end_time: Option<Duration>,
}

impl KeyAction {
    pub fn open(key: KeyCode, start_time: Duration) -> Self {
        Self {
            key,
            start_time,
            end_time: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }

    /// Time between press and release, zero for an interval that never closed
    pub fn hold(&self) -> Duration {
        hold_between(self.start_time, self.end_time)
    }
}

/// Kind of mouse input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseEventType {
    ClickLeft,
    ClickRight,
    Move,
}

impl MouseEventType {
    /// Button pressed by a click type, `None` for movement
    pub fn button(self) -> Option<MouseButton> {
        match self {
            MouseEventType::ClickLeft => Some(MouseButton::Left),
            MouseEventType::ClickRight => Some(MouseButton::Right),
            MouseEventType::Move => None,
        }
    }
}

/// Mouse button driven by the actuator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
}

/// Cursor position in capture space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    #[serde(rename = "X")]
    pub x: i32,
    #[serde(rename = "Y")]
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another position
    pub fn distance(&self, other: &Position) -> f64 {
        let dx = f64::from(self.x) - f64::from(other.x);
        let dy = f64::from(self.y) - f64::from(other.y);
        (dx * dx + dy * dy).sqrt()
    }
}

/// One click interval or one movement sample
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MouseAction {
    pub event_type: MouseEventType,
    pub position: Position,
    pub start_time: Duration,
    /// `None` while the button is still held. Moves always carry `Some(start_time)`.
    pub end_time: Option<Duration>,
}

impl MouseAction {
    pub fn press(event_type: MouseEventType, position: Position, start_time: Duration) -> Self {
        Self {
            event_type,
            position,
            start_time,
            end_time: None,
        }
    }

    pub fn sample(position: Position, at: Duration) -> Self {
        Self {
            event_type: MouseEventType::Move,
            position,
            start_time: at,
            end_time: Some(at),
        }
    }

    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }

    pub fn hold(&self) -> Duration {
        hold_between(self.start_time, self.end_time)
    }
}

/// Either kind of action, as handed to the playback scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Key(KeyAction),
    Mouse(MouseAction),
}

impl Action {
    pub fn start_time(&self) -> Duration {
        match self {
            Action::Key(a) => a.start_time,
            Action::Mouse(a) => a.start_time,
        }
    }

    /// Hold before the release effect, `None` when the action has no release
    pub fn hold(&self) -> Option<Duration> {
        match self {
            Action::Key(a) => Some(a.hold()),
            Action::Mouse(a) if a.event_type == MouseEventType::Move => None,
            Action::Mouse(a) => Some(a.hold()),
        }
    }
}

impl From<KeyAction> for Action {
    fn from(action: KeyAction) -> Self {
        Action::Key(action)
    }
}

impl From<MouseAction> for Action {
    fn from(action: MouseAction) -> Self {
        Action::Mouse(action)
    }
}

fn hold_between(start: Duration, end: Option<Duration>) -> Duration {
    end.map(|end| end.saturating_sub(start)).unwrap_or(Duration::ZERO)
}

/// Stable sort by start time; ties keep insertion order
pub fn sort_by_start<T>(actions: &mut [T], start: impl Fn(&T) -> Duration) {
    actions.sort_by_key(|a| start(a));
}
