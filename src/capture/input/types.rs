use crate::actions::keycode::KeyCode;
use crate::actions::model::{MouseEventType, Position};
use std::time::Instant;

/// A key going down or up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: KeyCode,
    pub is_down: bool,
    pub timestamp: Instant,
}

/// A button going down or up, or the cursor moving
///
/// `is_down` is meaningless for [`MouseEventType::Move`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    pub event_type: MouseEventType,
    pub position: Position,
    pub is_down: bool,
    pub timestamp: Instant,
}

/// Raw notification delivered by an event source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
}

impl InputEvent {
    pub fn key_down(key: KeyCode, timestamp: Instant) -> Self {
        InputEvent::Key(KeyEvent {
            key,
            is_down: true,
            timestamp,
        })
    }

    pub fn key_up(key: KeyCode, timestamp: Instant) -> Self {
        InputEvent::Key(KeyEvent {
            key,
            is_down: false,
            timestamp,
        })
    }

    pub fn mouse_down(event_type: MouseEventType, position: Position, timestamp: Instant) -> Self {
        InputEvent::Mouse(MouseEvent {
            event_type,
            position,
            is_down: true,
            timestamp,
        })
    }

    pub fn mouse_up(event_type: MouseEventType, position: Position, timestamp: Instant) -> Self {
        InputEvent::Mouse(MouseEvent {
            event_type,
            position,
            is_down: false,
            timestamp,
        })
    }

    pub fn mouse_move(position: Position, timestamp: Instant) -> Self {
        InputEvent::Mouse(MouseEvent {
            event_type: MouseEventType::Move,
            position,
            is_down: false,
            timestamp,
        })
    }

    pub fn timestamp(&self) -> Instant {
        match self {
            InputEvent::Key(e) => e.timestamp,
            InputEvent::Mouse(e) => e.timestamp,
        }
    }
}
