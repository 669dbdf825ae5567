use serde::{Deserialize, Serialize};

use crate::types::Role;

/// A single part of a content entry.
///
/// Only text parts are produced; parts of other kinds that come back from
/// the API deserialize with empty text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Part {
    /// The text of this part.
    #[serde(default)]
    pub text: String,
}

impl Part {
    /// Create a text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// A role-tagged entry in the wire transcript: `{role, parts: [{text}]}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Content {
    /// The author of this entry.
    #[serde(default)]
    pub role: Role,

    /// The parts that make up this entry.
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// Concatenated text of all parts, or `None` if there is none.
    pub fn text(&self) -> Option<String> {
        let text: String = self.parts.iter().map(|part| part.text.as_str()).collect();
        if text.is_empty() { None } else { Some(text) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_text_joins_parts() {
        let content = Content {
            role: Role::Model,
            parts: vec![Part::text("hello "), Part::text("there")],
        };
        assert_eq!(content.text().as_deref(), Some("hello there"));
    }

    #[test]
    fn content_without_text() {
        let content: Content =
            serde_json::from_str(r#"{"parts": [{"functionCall": {"name": "x"}}]}"#).unwrap();
        assert_eq!(content.role, Role::Model);
        assert_eq!(content.text(), None);
    }
}
