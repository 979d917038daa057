//! Input capture
//!
//! Everything on the acquisition side of the recorder.

pub mod input;

pub use input::{ChannelEventSource, EventSource, HookGuard, InputEvent, InputInjector};
