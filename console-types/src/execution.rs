//! Execution messages emitted while a task runs, and the persisted logs
//! that record them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use ts_rs::TS;

use crate::PayloadError;

pub const MESSAGE_TYPE_INIT: &str = "init";
pub const MESSAGE_TYPE_SYSTEM: &str = "SystemMessage";
pub const MESSAGE_TYPE_USER: &str = "UserMessage";
pub const MESSAGE_TYPE_ASSISTANT: &str = "AssistantMessage";
pub const MESSAGE_TYPE_RESULT: &str = "ResultMessage";
/// Control-only sentinel closing a live stream. Never stored in a message list.
pub const MESSAGE_TYPE_END: &str = "end";

// ============================================================================
// Messages
// ============================================================================

/// One event emitted during a task run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionMessage {
    pub kind: MessageKind,
    /// 0-100, carried by any message type.
    pub progress: Option<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MessageKind {
    /// Session start notice.
    Init { message: Option<String> },
    System {
        message: Option<String>,
        content: Option<String>,
    },
    User {
        text: Option<String>,
        content: Option<String>,
    },
    Assistant {
        text: Option<String>,
        content: Option<String>,
    },
    Result {
        text: Option<String>,
        is_error: bool,
        duration_ms: Option<u64>,
        cost_usd: Option<f64>,
    },
    /// A `type` this client does not know yet.
    Unrecognized {
        type_name: String,
        text: Option<String>,
    },
    /// Persisted content that could not be decoded, shown verbatim.
    Raw { content: String },
}

impl ExecutionMessage {
    pub fn raw(content: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Raw {
                content: content.into(),
            },
            progress: None,
        }
    }

    fn from_object(type_name: &str, json: &Value) -> Self {
        let kind = match type_name {
            MESSAGE_TYPE_INIT => MessageKind::Init {
                message: string_field(json, "message")
                    .or_else(|| string_field(json, "text"))
                    .or_else(|| content_field(json)),
            },
            MESSAGE_TYPE_SYSTEM => MessageKind::System {
                message: string_field(json, "message").or_else(|| string_field(json, "text")),
                content: content_field(json),
            },
            MESSAGE_TYPE_USER => MessageKind::User {
                text: string_field(json, "text"),
                content: content_field(json),
            },
            MESSAGE_TYPE_ASSISTANT => MessageKind::Assistant {
                text: string_field(json, "text"),
                content: content_field(json),
            },
            MESSAGE_TYPE_RESULT => MessageKind::Result {
                text: string_field(json, "text")
                    .or_else(|| string_field(json, "result"))
                    .or_else(|| string_field(json, "message")),
                is_error: json
                    .get("is_error")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
                duration_ms: json.get("duration_ms").and_then(|v| {
                    v.as_u64()
                        .or_else(|| v.as_f64().filter(|ms| *ms >= 0.0).map(|ms| ms as u64))
                }),
                cost_usd: json.get("cost_usd").and_then(Value::as_f64),
            },
            other => MessageKind::Unrecognized {
                type_name: other.to_string(),
                text: string_field(json, "text")
                    .or_else(|| string_field(json, "message"))
                    .or_else(|| content_field(json)),
            },
        };

        Self {
            kind,
            progress: progress_field(json),
        }
    }

    /// The wire discriminator this message was decoded from.
    pub fn type_name(&self) -> &str {
        match &self.kind {
            MessageKind::Init { .. } => MESSAGE_TYPE_INIT,
            MessageKind::System { .. } => MESSAGE_TYPE_SYSTEM,
            MessageKind::User { .. } => MESSAGE_TYPE_USER,
            MessageKind::Assistant { .. } => MESSAGE_TYPE_ASSISTANT,
            MessageKind::Result { .. } => MESSAGE_TYPE_RESULT,
            MessageKind::Unrecognized { type_name, .. } => type_name,
            MessageKind::Raw { .. } => "raw",
        }
    }

    /// Best human-readable body, if any.
    pub fn display_text(&self) -> Option<&str> {
        let text = match &self.kind {
            MessageKind::Init { message } => message.as_deref(),
            MessageKind::System { message, content } => message.as_deref().or(content.as_deref()),
            MessageKind::User { text, content } | MessageKind::Assistant { text, content } => {
                text.as_deref().or(content.as_deref())
            }
            MessageKind::Result { text, .. } => text.as_deref(),
            MessageKind::Unrecognized { text, .. } => text.as_deref(),
            MessageKind::Raw { content } => Some(content.as_str()),
        };
        text.filter(|t| !t.trim().is_empty())
    }

    pub fn is_result(&self) -> bool {
        matches!(self.kind, MessageKind::Result { .. })
    }
}

/// A decoded live-stream event.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Message(ExecutionMessage),
    /// Terminal sentinel, optionally carrying the final task status.
    End { status: Option<String> },
}

impl StreamEvent {
    pub fn from_value(json: &Value) -> Result<Self, PayloadError> {
        if !json.is_object() {
            return Err(PayloadError::NotAnObject);
        }
        let type_name = json
            .get("type")
            .and_then(Value::as_str)
            .ok_or(PayloadError::MissingType)?;

        if type_name == MESSAGE_TYPE_END {
            return Ok(Self::End {
                status: string_field(json, "status"),
            });
        }
        Ok(Self::Message(ExecutionMessage::from_object(type_name, json)))
    }
}

/// Decode the `data` field of one server-sent event.
pub fn parse_stream_event(data: &str) -> Result<StreamEvent, PayloadError> {
    let json = serde_json::from_str::<Value>(data)?;
    StreamEvent::from_value(&json)
}

/// Decode a persisted `response_content` into its ordered message list.
///
/// Content serialized twice (a JSON string holding the array) is unwrapped
/// once. Individual entries that are not messages, and any `end` sentinel,
/// are skipped; order of the remaining entries is kept.
pub fn parse_response_content(raw: &str) -> Result<Vec<ExecutionMessage>, PayloadError> {
    let json = match serde_json::from_str::<Value>(raw)? {
        Value::String(inner) => serde_json::from_str::<Value>(&inner)?,
        other => other,
    };
    let Value::Array(entries) = json else {
        return Err(PayloadError::NotASequence);
    };

    Ok(entries
        .iter()
        .filter_map(|entry| match StreamEvent::from_value(entry) {
            Ok(StreamEvent::Message(message)) => Some(message),
            Ok(StreamEvent::End { .. }) | Err(_) => None,
        })
        .collect())
}

fn string_field(json: &Value, key: &str) -> Option<String> {
    json.get(key).and_then(Value::as_str).map(ToString::to_string)
}

/// `content` is either plain text or structured blocks; structured content
/// is kept as compact JSON.
fn content_field(json: &Value) -> Option<String> {
    match json.get("content")? {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

fn progress_field(json: &Value) -> Option<u8> {
    let value = json.get("progress")?.as_f64()?;
    if value.is_nan() {
        return None;
    }
    Some(value.clamp(0.0, 100.0).round() as u8)
}

// ============================================================================
// Persisted logs
// ============================================================================

/// Persisted record of one task run or chat turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../console-ui/src/types/generated.ts")]
pub struct ExecutionLog {
    pub id: i64,
    pub task_id: i64,
    /// Monotonic per task, 1-based.
    pub execution_number: i64,
    #[serde(default)]
    pub response_type: String,
    #[serde(default, deserialize_with = "content_as_text")]
    #[ts(type = "string")]
    pub response_content: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub thread_number: Option<u32>,
}

impl ExecutionLog {
    pub fn messages(&self) -> Result<Vec<ExecutionMessage>, PayloadError> {
        parse_response_content(&self.response_content)
    }

    pub fn is_failed(&self) -> bool {
        self.response_type == "failed"
    }

    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.created_at)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Accepts `response_content` as a string, `null`, or an inline JSON value.
fn content_as_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(text) => text,
        other => other.to_string(),
    })
}
