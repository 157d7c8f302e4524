//! Bounded per-session conversation store
//!
//! Holds the ordered transcript of one session's assistant conversation and
//! the trailing window used as model context. Memory-resident only: the
//! store dies with the session and is not recoverable across reconnects.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Who authored a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn in the assistant conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Message author
    pub role: Role,

    /// Message text (may contain fenced code / lightweight markdown)
    pub content: String,

    /// Creation time; stamped on receipt for client-supplied messages
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,

    /// Marks a failure report rather than real content
    #[serde(default, skip_serializing_if = "is_false")]
    pub error: bool,
}

fn is_false(v: &bool) -> bool {
    !*v
}

impl Message {
    /// Create a regular message
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
            error: false,
        }
    }

    /// Create an error-flagged assistant message
    pub fn error(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
            error: true,
        }
    }
}

/// Ordered, bounded conversation log.
///
/// Append-only with a sliding window: when the log exceeds `max_messages`,
/// the oldest entries are dropped. Trimming happens inside `append`, never
/// deferred, so `window(n)` can never observe more than the cap.
#[derive(Debug)]
pub struct Conversation {
    messages: VecDeque<Message>,
    max_messages: usize,
}

impl Conversation {
    /// Create an empty conversation bounded to `max_messages` entries
    pub fn new(max_messages: usize) -> Self {
        Self {
            messages: VecDeque::with_capacity(max_messages.min(128)),
            max_messages: max_messages.max(1),
        }
    }

    /// Append a message, dropping the oldest entries past the cap
    pub fn append(&mut self, message: Message) {
        self.messages.push_back(message);
        while self.messages.len() > self.max_messages {
            self.messages.pop_front();
        }
    }

    /// The most recent `n` messages, oldest first
    pub fn window(&self, n: usize) -> Vec<Message> {
        let skip = self.messages.len().saturating_sub(n);
        self.messages.iter().skip(skip).cloned().collect()
    }

    /// Full ordered copy for re-rendering
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.iter().cloned().collect()
    }

    /// Number of stored messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the conversation holds no messages
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Drop all messages
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
