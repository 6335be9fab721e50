use serde::{Deserialize, Serialize};

/// The author of a turn in a conversation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Text written by the person at the terminal.
    User,

    /// Text generated by the remote model.
    Model,
}

/// A single piece of a turn.
///
/// Only text parts are produced or consumed by this client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Part {
    /// The text of this part.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Part {
    /// Create a text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }
}

/// One turn of a conversation, attributed to the user or the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    /// The author of the turn.
    ///
    /// Streamed response chunks occasionally omit the role.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,

    /// The parts that make up the turn.
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// Create a turn with a single text part.
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role: Some(role),
            parts: vec![Part::text(text)],
        }
    }

    /// Create a user turn.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    /// Create a model turn.
    pub fn model(text: impl Into<String>) -> Self {
        Self::new(Role::Model, text)
    }

    /// Concatenate the text of every part.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn user_content_serialization() {
        let content = Content::user("Hello, Gemini!");
        let json = to_value(&content).unwrap();

        assert_eq!(
            json,
            json!({
                "role": "user",
                "parts": [{"text": "Hello, Gemini!"}]
            })
        );
    }

    #[test]
    fn content_without_role_deserializes() {
        let content: Content = serde_json::from_value(json!({
            "parts": [{"text": "Hi"}, {"text": " there"}]
        }))
        .unwrap();

        assert_eq!(content.role, None);
        assert_eq!(content.text(), "Hi there");
    }

    #[test]
    fn non_text_parts_are_skipped() {
        let content: Content = serde_json::from_value(json!({
            "role": "model",
            "parts": [{"inlineData": {"mimeType": "image/png", "data": ""}}, {"text": "ok"}]
        }))
        .unwrap();

        assert_eq!(content.role, Some(Role::Model));
        assert_eq!(content.text(), "ok");
    }
}
