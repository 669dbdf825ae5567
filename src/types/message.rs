use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{Content, Part};

/// Who authored a message.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person at the keyboard.
    User,

    /// The generative model.
    #[default]
    Model,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => f.write_str("user"),
            Role::Model => f.write_str("model"),
        }
    }
}

/// One entry of a chat transcript.
///
/// Messages are immutable once appended to a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// The author of the message.
    pub role: Role,

    /// The text of the message.
    pub text: String,
}

impl Message {
    /// Create a new `Message` with the given role and text.
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }

    /// Create a new user `Message`.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    /// Create a new model `Message`.
    pub fn model(text: impl Into<String>) -> Self {
        Self::new(Role::Model, text)
    }
}

impl From<&Message> for Content {
    fn from(message: &Message) -> Self {
        Content {
            role: message.role,
            parts: vec![Part::text(message.text.clone())],
        }
    }
}
