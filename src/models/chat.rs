//! Chat messages and the events a chat turn emits.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    Human,
    Assistant,
}

/// A role-tagged message sent to a generation model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn human(content: impl Into<String>) -> Self {
        Self {
            role: Role::Human,
            content: content.into(),
        }
    }
}

/// One record of a streamed answer.
///
/// Serializes as `{"type": "answer" | "sources" | "error", "content": ...}`,
/// one JSON object per line on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum ChatEvent {
    Answer(String),
    Sources(Vec<String>),
    Error(String),
}

impl ChatEvent {
    pub fn to_ndjson(&self) -> Result<String, serde_json::Error> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub question: String,
}

/// Complete answer of a synchronous turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatAnswer {
    pub answer: String,
    pub sources: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_format() {
        let answer = ChatEvent::Answer("Hel".to_string());
        assert_eq!(
            serde_json::to_string(&answer).unwrap(),
            r#"{"type":"answer","content":"Hel"}"#
        );

        let sources = ChatEvent::Sources(vec!["a.pdf".to_string()]);
        assert_eq!(
            sources.to_ndjson().unwrap(),
            "{\"type\":\"sources\",\"content\":[\"a.pdf\"]}\n"
        );
    }

    #[test]
    fn test_event_decodes_error_record() {
        let event: ChatEvent =
            serde_json::from_str(r#"{"type":"error","content":"index offline"}"#).unwrap();
        assert_eq!(event, ChatEvent::Error("index offline".to_string()));
    }
}
