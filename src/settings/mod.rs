//! Settings and saved-host persistence
//!
//! Simple JSON-file collaborators consumed by the session core: the last
//! working SSH profile is recorded after every successful connect, and saved
//! hosts are a name-keyed CRUD store. The REST surface is browser-initiated.

mod handler;
mod store;

pub use handler::{settings_router, SettingsState};
pub use store::{AssistantSettings, ConnectionSettings, SavedHost, SettingsStore, StoredSettings};
