//! Assistant backend client
//!
//! Wraps the Ollama-compatible language-model server behind a trait seam so
//! the session layer can be exercised against a mock. All calls are
//! stateless with respect to the backend: conversation continuity comes
//! purely from re-sending the trimmed history window on every request.

mod client;
mod prompt;

pub use client::OllamaClient;
pub use prompt::{chat_prompt, command_prompt, normalize_command};

use crate::config::Persona;
use crate::error::Result;
use crate::history::Message;
use async_trait::async_trait;

/// Operations the session layer needs from the language-model backend
#[async_trait]
pub trait AssistantBackend: Send + Sync {
    /// Free-form chat completion primed with persona and history window
    async fn complete(
        &self,
        prompt: &str,
        history: &[Message],
        model: &str,
        persona: &Persona,
    ) -> Result<String>;

    /// Turn a natural-language description into exactly one shell command
    async fn generate_command(
        &self,
        description: &str,
        model: &str,
        persona: &Persona,
    ) -> Result<String>;

    /// Model identifiers the backend reports, in listed order
    async fn list_models(&self) -> Result<Vec<String>>;

    /// Check reachability of `url` and return its model list
    async fn probe(&self, url: &str) -> Result<Vec<String>>;
}
