//! Shared types between the task console and its backend
//!
//! These types are used by:
//! - the Dioxus console (WASM)
//! - any other client of the task execution API (TypeScript bindings via ts-rs)
//!
//! Decoding is lenient: the execution backend emits a loosely
//! typed schema, and a bad unit must never take down the view rendering it.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

mod chat;
mod error;
mod execution;

pub use chat::{parse_chat_fragment, ChatFragment, ChatRole, ChatStreamRequest, ChatTurn};
pub use error::PayloadError;
pub use execution::{
    parse_response_content, parse_stream_event, ExecutionLog, ExecutionMessage, MessageKind,
    StreamEvent, MESSAGE_TYPE_ASSISTANT, MESSAGE_TYPE_END, MESSAGE_TYPE_INIT,
    MESSAGE_TYPE_RESULT, MESSAGE_TYPE_SYSTEM, MESSAGE_TYPE_USER,
};

// ============================================================================
// API Types
// ============================================================================

/// Success code used by the backend's `{code, data}` envelope.
pub const API_CODE_OK: i64 = 200;

/// Generic API response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub code: i64,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    pub fn into_data(self) -> Result<T, PayloadError> {
        match (self.code, self.data) {
            (API_CODE_OK, Some(data)) => Ok(data),
            (code, _) => Err(PayloadError::EnvelopeRejected {
                code,
                message: self
                    .message
                    .unwrap_or_else(|| "response carried no data".to_string()),
            }),
        }
    }
}

// ============================================================================
// Tasks
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Cancelled,
    Other(String),
}

impl TaskStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "pending" => Self::Pending,
            "in_progress" => Self::InProgress,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            "cancelled" => Self::Cancelled,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Other(raw) => raw,
        }
    }

    /// Only running tasks have a live stream.
    pub fn is_running(&self) -> bool {
        matches!(self, Self::InProgress)
    }
}

/// Task row as returned by the task CRUD endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../console-ui/src/types/generated.ts")]
pub struct TaskSummary {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub workspace_id: Option<i64>,
}

impl TaskSummary {
    pub fn status(&self) -> TaskStatus {
        TaskStatus::parse(&self.status)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use ts_rs::Config;

    #[test]
    fn test_envelope_success() {
        let envelope: ApiEnvelope<Vec<TaskSummary>> = serde_json::from_value(serde_json::json!({
            "code": 200,
            "data": [{"id": 4, "title": "Refactor", "status": "in_progress"}]
        }))
        .unwrap();
        let tasks = envelope.into_data().unwrap();
        assert_eq!(tasks.len(), 1);
        assert!(tasks[0].status().is_running());
    }

    #[test]
    fn test_envelope_rejection() {
        let envelope: ApiEnvelope<Vec<TaskSummary>> = serde_json::from_value(serde_json::json!({
            "code": 500,
            "message": "database unavailable"
        }))
        .unwrap();
        let err = envelope.into_data().unwrap_err();
        assert!(err.to_string().contains("database unavailable"));
    }

    #[test]
    fn test_task_status_round_trip() {
        for raw in ["pending", "in_progress", "completed", "failed", "cancelled", "queued"] {
            assert_eq!(TaskStatus::parse(raw).as_str(), raw);
        }
        assert_eq!(
            TaskStatus::parse("queued"),
            TaskStatus::Other("queued".to_string())
        );
    }

    #[test]
    fn export_types() {
        // The export_to attribute in each type's #[ts] macro specifies the output file
        let config = Config::default();
        ExecutionLog::export(&config).unwrap();
        ChatRole::export(&config).unwrap();
        ChatTurn::export(&config).unwrap();
        ChatStreamRequest::export(&config).unwrap();
        TaskSummary::export(&config).unwrap();
    }
}
