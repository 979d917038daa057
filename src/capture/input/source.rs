//! Event source boundary
//!
//! Arming a source installs its hooks and returns a [`HookGuard`]; the hooks
//! stay installed exactly as long as the guard lives, including on early
//! returns and error paths.

use crate::capture::input::types::InputEvent;
use crate::recorder::channel::{RecordingError, RecordingResult};
use parking_lot::Mutex as ParkingMutex;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// Producer of raw input notifications
pub trait EventSource: Send {
    /// Install hooks delivering every event into `sink` until the guard drops
    fn arm(&mut self, sink: UnboundedSender<InputEvent>) -> RecordingResult<HookGuard>;
}

/// Scoped hook registration; releases the hooks when dropped
pub struct HookGuard {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl HookGuard {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Release the hooks now instead of at drop
    pub fn release(mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for HookGuard {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for HookGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookGuard")
            .field("armed", &self.release.is_some())
            .finish()
    }
}

type SharedSink = Arc<ParkingMutex<Option<UnboundedSender<InputEvent>>>>;

/// Event source fed programmatically through an [`InputInjector`]
///
/// Platform hook callbacks (or tests) hold the injector and push translated
/// events; they reach the recorder only while the source is armed.
pub struct ChannelEventSource {
    sink: SharedSink,
}

/// Handle pushing events into a [`ChannelEventSource`]
#[derive(Clone)]
pub struct InputInjector {
    sink: SharedSink,
}

impl ChannelEventSource {
    pub fn new() -> (Self, InputInjector) {
        let sink: SharedSink = Arc::new(ParkingMutex::new(None));
        (
            Self { sink: sink.clone() },
            InputInjector { sink },
        )
    }
}

impl EventSource for ChannelEventSource {
    fn arm(&mut self, sink: UnboundedSender<InputEvent>) -> RecordingResult<HookGuard> {
        let mut slot = self.sink.lock();
        if slot.is_some() {
            return Err(RecordingError::StateError(
                "event source is already armed".to_string(),
            ));
        }
        *slot = Some(sink);
        drop(slot);

        tracing::debug!("Input hooks armed");

        let shared = self.sink.clone();
        Ok(HookGuard::new(move || {
            shared.lock().take();
            tracing::debug!("Input hooks released");
        }))
    }
}

impl InputInjector {
    /// Deliver an event; returns `false` when no consumer is listening
    pub fn inject(&self, event: InputEvent) -> bool {
        match self.sink.lock().as_ref() {
            Some(tx) => tx.send(event).is_ok(),
            None => {
                tracing::trace!("Dropping {:?}: event source not armed", event);
                false
            }
        }
    }

    pub fn is_armed(&self) -> bool {
        self.sink.lock().is_some()
    }

    /// End the event stream; the consumer sees it close once queued events drain
    pub fn close(&self) {
        self.sink.lock().take();
    }
}
