//! Persisted execution history for tasks that are not running.

use console_types::{ExecutionLog, ExecutionMessage};

use crate::api::fetch_execution_logs;

/// Logs as the backend returned them plus the messages of the current one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistorySnapshot {
    pub logs: Vec<ExecutionLog>,
    pub messages: Vec<ExecutionMessage>,
}

impl HistorySnapshot {
    pub fn from_logs(logs: Vec<ExecutionLog>) -> Self {
        let messages = select_latest(&logs)
            .map(history_messages)
            .unwrap_or_default();
        Self { logs, messages }
    }

    pub fn latest(&self) -> Option<&ExecutionLog> {
        select_latest(&self.logs)
    }
}

/// The backend lists logs most recent first; that order is trusted as is.
pub fn select_latest(logs: &[ExecutionLog]) -> Option<&ExecutionLog> {
    logs.first()
}

/// Messages of one log, or its raw content as a single message when the
/// content does not decode.
pub fn history_messages(log: &ExecutionLog) -> Vec<ExecutionMessage> {
    match log.messages() {
        Ok(messages) => messages,
        Err(err) => {
            dioxus_logger::tracing::warn!(
                "Execution log {} (task {}) is not a message sequence: {}",
                log.execution_number,
                log.task_id,
                err
            );
            if log.response_content.trim().is_empty() {
                Vec::new()
            } else {
                vec![ExecutionMessage::raw(log.response_content.clone())]
            }
        }
    }
}

/// Fetch and decode a task's history. Never fails: read-path errors are
/// logged and produce an empty snapshot.
pub async fn load_history(task_id: i64) -> HistorySnapshot {
    match fetch_execution_logs(task_id).await {
        Ok(logs) => {
            let snapshot = HistorySnapshot::from_logs(logs);
            match snapshot.latest() {
                Some(log) => dioxus_logger::tracing::debug!(
                    "Task {} has {} execution logs, showing #{}",
                    task_id,
                    snapshot.logs.len(),
                    log.execution_number
                ),
                None => dioxus_logger::tracing::debug!("Task {} has no execution logs", task_id),
            }
            snapshot
        }
        Err(e) => {
            dioxus_logger::tracing::error!(
                "Failed to load execution logs for task {}: {}",
                task_id,
                e
            );
            HistorySnapshot::default()
        }
    }
}
