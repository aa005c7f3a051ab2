//! Transcript messages.
//!
//! A transcript is an append-only list of [`Message`]s; insertion order is
//! display order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Greeting seeded into the transcript whenever the panel opens.
pub const DEFAULT_GREETING: &str = "Hello! How can I help you today? Type a message below.";

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The person typing into the widget.
    User,
    /// The remote chat service (or the widget speaking on its behalf).
    Assistant,
}

/// A single entry in the transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Author of the message.
    pub sender: Sender,
    /// Message text, shown verbatim.
    pub text: String,
    /// When the message was appended. Display only.
    pub sent_at: DateTime<Utc>,
}

impl Message {
    /// Create a new user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
            sent_at: Utc::now(),
        }
    }

    /// Create a new assistant message.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Assistant,
            text: text.into(),
            sent_at: Utc::now(),
        }
    }

    /// Whether this message was written by the user.
    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }
}
