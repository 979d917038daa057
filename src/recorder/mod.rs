//! Recorder module
//!
//! The mode state machine and the recording channels it drives.

pub mod channel;
pub mod coordinator;
pub mod keyboard;
pub mod mouse;
pub mod state;

pub use channel::{ChannelType, RecordingChannel, RecordingError, RecordingResult, SessionClock};
pub use coordinator::{PlaybackHandle, Recorder, RecordingSummary};
pub use keyboard::{KeyboardChannel, KeyboardMerger};
pub use mouse::{MouseChannel, MouseMerger, DEFAULT_MOVE_THRESHOLD};
pub use state::{BindKeys, RecorderConfig, RecorderConfigBuilder, RecorderMode, RecorderSettings};
