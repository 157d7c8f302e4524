//! Per-connection session core
//!
//! Each browser connection owns one session: at most one live SSH channel,
//! one bounded conversation, and at most one in-flight assistant request.
//! Inbound events are dispatched to the session one at a time; outbound
//! events go only to the owning connection's sink.

mod events;
mod manager;
mod session;

pub use events::{ClientEvent, ResultKind, ServerEvent};
pub use manager::SessionManager;
pub use session::{EventSink, Session, ShellState};
