//! Chat threads: which conversation the next turn belongs to, and how a
//! persisted log turns back into a transcript.

use console_types::{ChatTurn, ExecutionLog, MessageKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadState {
    pub thread_id: Option<String>,
    pub thread_number: u32,
    /// Log the next turn continues, if one was resumed.
    pub current_execution_number: Option<i64>,
}

impl Default for ThreadState {
    fn default() -> Self {
        Self {
            thread_id: None,
            thread_number: 1,
            current_execution_number: None,
        }
    }
}

impl ThreadState {
    /// Thread id for the next send, minting one if the thread is new.
    pub fn ensure_thread_id(&mut self, mint: impl FnOnce() -> String) -> String {
        self.thread_id.get_or_insert_with(mint).clone()
    }

    /// Explicit "new conversation".
    pub fn start_new(&mut self) {
        self.thread_id = None;
        self.current_execution_number = None;
        self.thread_number += 1;
    }

    pub fn complete_turn(&mut self) {
        self.thread_number += 1;
    }

    /// Continue the conversation recorded in `log`. Thread fields are only
    /// taken when the log carries them.
    pub fn adopt_log(&mut self, log: &ExecutionLog) {
        if let Some(thread_id) = log.thread_id.as_ref().filter(|id| !id.is_empty()) {
            self.thread_id = Some(thread_id.clone());
        }
        if let Some(thread_number) = log.thread_number {
            self.thread_number = thread_number;
        }
        self.current_execution_number = Some(log.execution_number);
    }
}

/// Rebuild the visible conversation of a persisted log.
///
/// Only user and assistant messages with text count as turns. Content that
/// does not decode, or decodes without any turns, is shown as one assistant
/// turn holding the raw text.
pub fn reconstruct_transcript(log: &ExecutionLog) -> Vec<ChatTurn> {
    let raw = log.response_content.trim();
    if raw.is_empty() {
        return Vec::new();
    }

    let messages = match log.messages() {
        Ok(messages) => messages,
        Err(err) => {
            dioxus_logger::tracing::warn!(
                "Execution log {} has no message sequence, showing raw content: {}",
                log.execution_number,
                err
            );
            return vec![ChatTurn::assistant(log.response_content.clone())];
        }
    };

    let turns: Vec<ChatTurn> = messages
        .into_iter()
        .filter_map(|message| match message.kind {
            MessageKind::User { text: Some(text), .. } if !text.is_empty() => {
                Some(ChatTurn::user(text))
            }
            MessageKind::Assistant { text: Some(text), .. } if !text.is_empty() => {
                Some(ChatTurn::assistant(text))
            }
            _ => None,
        })
        .collect();

    if turns.is_empty() {
        return vec![ChatTurn::assistant(log.response_content.clone())];
    }
    turns
}

pub fn thread_id_from(now_ms: i64, suffix: &str) -> String {
    format!("thread_{now_ms}_{suffix}")
}

/// `thread_<epoch-ms>_<9 random chars>`.
pub fn mint_thread_id() -> String {
    let suffix: String = uuid::Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(9)
        .collect();
    thread_id_from(chrono::Utc::now().timestamp_millis(), &suffix)
}
