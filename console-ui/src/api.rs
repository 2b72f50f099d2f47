use console_types::{ApiEnvelope, ChatStreamRequest, ExecutionLog, TaskSummary};
use gloo_net::http::{Request, Response};
use serde::de::DeserializeOwned;

use crate::config::console_config;
use crate::error::ConsoleError;

/// Unwrap a `{code, data, message}` response, turning non-OK statuses into
/// `ConsoleError::Http` with the body's own reason when it has one.
async fn read_envelope<T: DeserializeOwned>(response: Response) -> Result<T, ConsoleError> {
    if !response.ok() {
        return Err(http_error(response).await);
    }

    let envelope: ApiEnvelope<T> = response.json().await?;
    Ok(envelope.into_data()?)
}

async fn http_error(response: Response) -> ConsoleError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    ConsoleError::http(status, &body)
}

// ============================================================================
// Tasks
// ============================================================================

pub async fn fetch_tasks() -> Result<Vec<TaskSummary>, ConsoleError> {
    let url = console_config().tasks_url();
    let response = Request::get(&url).send().await?;
    read_envelope(response).await
}

pub async fn fetch_task(task_id: i64) -> Result<TaskSummary, ConsoleError> {
    let url = console_config().task_url(task_id);
    let response = Request::get(&url).send().await?;
    read_envelope(response).await
}

// ============================================================================
// Execution logs
// ============================================================================

/// Logs for a task, most recent first.
pub async fn fetch_execution_logs(task_id: i64) -> Result<Vec<ExecutionLog>, ConsoleError> {
    let url = console_config().execution_logs_url(task_id);
    let response = Request::get(&url).send().await?;
    read_envelope(response).await
}

// ============================================================================
// Chat
// ============================================================================

/// Start a streamed chat turn and hand back the raw response body.
pub async fn open_chat_stream(
    task_id: i64,
    request: &ChatStreamRequest,
) -> Result<web_sys::ReadableStream, ConsoleError> {
    let url = console_config().chat_stream_url(task_id);
    dioxus_logger::tracing::info!(
        "Sending chat turn for task {} (thread {} #{})",
        task_id,
        request.thread_id,
        request.thread_number
    );

    let response = Request::post(&url)
        .header("Accept", "text/event-stream")
        .json(request)?
        .send()
        .await?;

    if !response.ok() {
        return Err(http_error(response).await);
    }

    response
        .body()
        .ok_or_else(|| ConsoleError::Stream("response has no body".to_string()))
}
