//! Input event acquisition
//!
//! Raw keyboard and mouse notifications, and the [`EventSource`] boundary
//! through which platform hooks deliver them. Hook registration itself lives
//! outside this crate; an event source only has to translate native codes into
//! [`KeyCode`](crate::actions::KeyCode) and push [`InputEvent`]s.

pub mod source;
pub mod types;

pub use source::{ChannelEventSource, EventSource, HookGuard, InputInjector};
pub use types::{InputEvent, KeyEvent, MouseEvent};
