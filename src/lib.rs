//! Input Replay - record system-wide keyboard and mouse input and replay it
//! with its original timing.
//!
//! Event sources deliver raw input to a [`Recorder`], which merges it into
//! press intervals and movement samples, persists them as JSON and later
//! replays them concurrently through an [`Actuator`].

pub mod actions;
pub mod capture;
pub mod playback;
pub mod processing;
pub mod recorder;
pub mod storage;

pub use actions::{Action, KeyAction, KeyCode, MouseAction, MouseEventType, Position};
pub use capture::{ChannelEventSource, EventSource, InputEvent, InputInjector};
pub use playback::{Actuator, EffectLog, PlaybackScheduler, PlaybackSummary};
pub use recorder::{
    Recorder, RecorderConfig, RecorderMode, RecorderSettings, RecordingError, RecordingResult,
};
pub use storage::{JsonFileStore, PersistenceAdapter};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber
///
/// `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "input_replay=debug,input_replay_lib=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
