//! The `Message` entity: immutable once constructed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Agent,
    System,
}

/// A2A v0.3.0 part discriminator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Part {
    Text { text: String },
    Data { data: serde_json::Value },
    File {
        bytes: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
}

/// Free-form metadata attached to a message.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// An immutable chat message: role, ordered parts, free-form metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub role: Role,
    pub parts: Vec<Part>,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl<'de> Deserialize<'de> for Message {
    /// Parts with an unrecognized `kind` are dropped rather than failing
    /// the whole message, since a peer on a newer protocol revision may
    /// send part kinds this build doesn't know about yet.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            role: Role,
            parts: Vec<serde_json::Value>,
            #[serde(default)]
            metadata: Metadata,
        }

        let raw = Raw::deserialize(deserializer)?;
        let parts = raw
            .parts
            .into_iter()
            .filter_map(|v| serde_json::from_value::<Part>(v).ok())
            .collect();

        Ok(Message {
            role: raw.role,
            parts,
            metadata: raw.metadata,
        })
    }
}

impl Message {
    /// Construct a message carrying a single text part.
    pub fn text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![Part::Text { text: text.into() }],
            metadata: Metadata::new(),
        }
    }

    /// Construct a message carrying a single text part and metadata.
    pub fn text_with_metadata(role: Role, text: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            role,
            parts: vec![Part::Text { text: text.into() }],
            metadata,
        }
    }

    /// Append a vision part (base64 bytes + mime type) to the message.
    pub fn with_file_part(mut self, bytes: impl Into<String>, mime_type: impl Into<String>) -> Self {
        self.parts.push(Part::File {
            bytes: bytes.into(),
            mime_type: mime_type.into(),
        });
        self
    }

    /// Concatenate all `Text` parts with newline separators. Side-effect
    /// free.
    pub fn extract_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_text_message_extracts_its_own_text() {
        let msg = Message::text(Role::User, "hello world");
        assert_eq!(msg.extract_text(), "hello world");
    }

    #[test]
    fn extract_text_joins_multiple_text_parts_with_newline() {
        let msg = Message {
            role: Role::Agent,
            parts: vec![
                Part::Text { text: "line one".into() },
                Part::Data { data: serde_json::json!({"x": 1}) },
                Part::Text { text: "line two".into() },
            ],
            metadata: Metadata::new(),
        };
        assert_eq!(msg.extract_text(), "line one\nline two");
    }

    #[test]
    fn unknown_kind_is_dropped_on_decode() {
        let json = serde_json::json!({
            "role": "agent",
            "parts": [
                {"kind": "text", "text": "kept"},
                {"kind": "audio", "blob": "xyz"}
            ]
        });
        let msg: Message = serde_json::from_value(json).unwrap();
        assert_eq!(msg.parts.len(), 1);
        assert_eq!(msg.extract_text(), "kept");
    }

    #[test]
    fn metadata_roundtrips_through_json() {
        let mut metadata = Metadata::new();
        metadata.insert("userId".to_string(), serde_json::json!("u1"));
        metadata.insert("personaId".to_string(), serde_json::json!("hannah"));
        let msg = Message::text_with_metadata(Role::User, "hi", metadata.clone());
        let json = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back.metadata, metadata);
    }
}
