//! Action model shared by recording, persistence and playback

pub mod keycode;
pub mod model;

pub use keycode::{KeyCode, KEY_TABLE_VERSION};
pub use model::{Action, KeyAction, MouseAction, MouseButton, MouseEventType, Position};
