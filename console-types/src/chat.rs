//! Chat turns and the streaming chat endpoint's wire format.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use crate::PayloadError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "../../console-ui/src/types/generated.ts")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One rendered turn of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../console-ui/src/types/generated.ts")]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Body of `POST /tasks/{id}/chat/stream`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../console-ui/src/types/generated.ts")]
pub struct ChatStreamRequest {
    pub messages: Vec<ChatTurn>,
    pub thread_id: String,
    pub thread_number: u32,
    /// Set only when continuing a persisted log, so the backend updates it
    /// instead of creating a new one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub execution_number: Option<i64>,
}

/// One decoded `data:` line of a streamed chat reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatFragment {
    Text(String),
    Done,
    Error(String),
}

impl ChatFragment {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Text(_))
    }
}

/// Decode the JSON after a `data:` prefix.
pub fn parse_chat_fragment(data: &str) -> Result<ChatFragment, PayloadError> {
    let json = serde_json::from_str::<Value>(data)?;
    if !json.is_object() {
        return Err(PayloadError::NotAnObject);
    }

    if let Some(error) = json.get("error").filter(|v| !v.is_null()) {
        let message = error
            .as_str()
            .map(ToString::to_string)
            .unwrap_or_else(|| error.to_string());
        return Ok(ChatFragment::Error(message));
    }
    if json.get("done").and_then(Value::as_bool) == Some(true) {
        return Ok(ChatFragment::Done);
    }
    if let Some(text) = json.get("text").and_then(Value::as_str) {
        return Ok(ChatFragment::Text(text.to_string()));
    }

    Err(PayloadError::UnknownFragment(data.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_omits_unset_execution_number() {
        let request = ChatStreamRequest {
            messages: vec![ChatTurn::user("hi")],
            thread_id: "thread_1_abc".to_string(),
            thread_number: 1,
            execution_number: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("execution_number").is_none());
        assert_eq!(json["messages"][0]["role"], "user");

        let resumed = ChatStreamRequest {
            execution_number: Some(7),
            ..request
        };
        let json = serde_json::to_value(&resumed).unwrap();
        assert_eq!(json["execution_number"], 7);
    }

    #[test]
    fn fragments_decode() {
        assert_eq!(
            parse_chat_fragment(r#"{"text":"Hel"}"#).unwrap(),
            ChatFragment::Text("Hel".to_string())
        );
        assert_eq!(
            parse_chat_fragment(r#"{"done":true}"#).unwrap(),
            ChatFragment::Done
        );
        assert_eq!(
            parse_chat_fragment(r#"{"error":"model overloaded"}"#).unwrap(),
            ChatFragment::Error("model overloaded".to_string())
        );
    }

    #[test]
    fn unusable_fragments_are_errors() {
        assert!(parse_chat_fragment(r#"{"te"#).is_err());
        assert!(matches!(
            parse_chat_fragment(r#"{"done":false}"#),
            Err(PayloadError::UnknownFragment(_))
        ));
        assert!(matches!(
            parse_chat_fragment(r#""text""#),
            Err(PayloadError::NotAnObject)
        ));
    }
}
