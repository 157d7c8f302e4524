//! Transport gateway
//!
//! The real-time channel between browsers and the session core: one
//! websocket per tab, named JSON events in both directions, plus the server
//! lifecycle wrapper that wires the collaborators together.

mod server;
mod ws;

pub use server::{Gateway, GatewayBuilder, GatewayState};
pub use ws::{ws_router, WsState};
