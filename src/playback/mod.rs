//! Playback module for replaying recorded actions
//!
//! The scheduler turns loaded actions into timed effects and hands them to an
//! [`Actuator`].

pub mod actuator;
pub mod scheduler;

pub use actuator::{Actuator, Effect, EffectLog, TimedEffect};
pub use scheduler::{CancelToken, PlaybackCancel, PlaybackScheduler, PlaybackSummary};
