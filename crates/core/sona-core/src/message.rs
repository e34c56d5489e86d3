//! Chat message types shared by the core and the provider transports

use serde::{Deserialize, Serialize};

/// Message author role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Compiled instruction text; never persisted in history
    System,
    /// The end user
    User,
    /// The persona's replies
    Assistant,
    /// Legacy alias for assistant used by turn-based transports
    Model,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Model => write!(f, "model"),
        }
    }
}

/// One typed piece of multimodal content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Plain text fragment
    Text {
        /// The text
        text: String,
    },
    /// Reference to an image
    ImageUrl {
        /// Image URL or base64 data URI
        url: String,
    },
}

/// Message payload: plain text or an ordered list of typed parts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Plain text content
    Text(String),
    /// Multimodal content parts
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// Flatten to plain text: text parts joined with newlines, image parts
    /// skipped.
    pub fn as_text(&self) -> String {
        match self {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    ContentPart::Text { text } => Some(text.as_str()),
                    ContentPart::ImageUrl { .. } => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// A single role/content message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author role
    pub role: Role,
    /// Payload
    pub content: MessageContent,
}

impl ChatMessage {
    /// Build a plain-text user message
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(text.into()),
        }
    }

    /// Build a plain-text assistant message
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: MessageContent::Text(text.into()),
        }
    }

    /// Build a plain-text system message
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: MessageContent::Text(text.into()),
        }
    }

    /// Build a multimodal user message from text plus image references
    pub fn user_with_images(text: impl Into<String>, image_urls: &[String]) -> Self {
        let mut parts = vec![ContentPart::Text { text: text.into() }];
        for url in image_urls {
            parts.push(ContentPart::ImageUrl { url: url.clone() });
        }
        Self {
            role: Role::User,
            content: MessageContent::Parts(parts),
        }
    }

    /// Text view of the payload
    pub fn text(&self) -> String {
        self.content.as_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serde_names() {
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
        assert_eq!(serde_json::to_string(&Role::Model).unwrap(), "\"model\"");
        assert_eq!(Role::User.to_string(), "user");
    }

    #[test]
    fn test_plain_text_message() {
        let message = ChatMessage::user("hello");
        assert_eq!(message.role, Role::User);
        assert_eq!(message.text(), "hello");
    }

    #[test]
    fn test_multimodal_message() {
        let message = ChatMessage::user_with_images(
            "describe this",
            &["https://example.com/cat.png".to_string()],
        );

        match &message.content {
            MessageContent::Parts(parts) => {
                assert_eq!(parts.len(), 2);
                assert!(matches!(parts[0], ContentPart::Text { .. }));
                assert!(matches!(parts[1], ContentPart::ImageUrl { .. }));
            }
            MessageContent::Text(_) => panic!("expected parts"),
        }
        assert_eq!(message.text(), "describe this");
    }

    #[test]
    fn test_content_part_serde_shape() {
        let part = ContentPart::ImageUrl {
            url: "data:image/png;base64,xyz".to_string(),
        };
        let json = serde_json::to_value(&part).unwrap();
        assert_eq!(json["type"], "image_url");
        assert_eq!(json["url"], "data:image/png;base64,xyz");
    }
}
