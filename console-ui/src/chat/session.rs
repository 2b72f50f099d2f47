use console_types::{ChatFragment, ChatStreamRequest, ChatTurn, ExecutionLog};

use crate::thread::{reconstruct_transcript, ThreadState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SendRejected {
    #[error("Nothing to send")]
    EmptyInput,
    #[error("A reply is still streaming")]
    InFlight,
}

/// What one fragment did to the reply being streamed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyProgress {
    Streaming,
    Completed,
    Failed(String),
    /// No reply in flight.
    Ignored,
}

/// Transcript and thread bookkeeping behind the chat panel.
///
/// At most one reply streams at a time. Its placeholder is the last
/// assistant turn and is filled in place as fragments arrive.
#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    transcript: Vec<ChatTurn>,
    thread: ThreadState,
    pending: Option<usize>,
    last_error: Option<String>,
}

impl ChatSession {
    pub fn transcript(&self) -> &[ChatTurn] {
        &self.transcript
    }

    pub fn thread(&self) -> &ThreadState {
        &self.thread
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_sending(&self) -> bool {
        self.pending.is_some()
    }

    /// Record the user's turn plus an empty assistant placeholder and build
    /// the request for them. `mint` is only called when the thread is new.
    pub fn begin_send(
        &mut self,
        input: &str,
        mint: impl FnOnce() -> String,
    ) -> Result<ChatStreamRequest, SendRejected> {
        let text = input.trim();
        if text.is_empty() {
            return Err(SendRejected::EmptyInput);
        }
        if self.is_sending() {
            return Err(SendRejected::InFlight);
        }

        let thread_id = self.thread.ensure_thread_id(mint);
        self.last_error = None;
        self.transcript.push(ChatTurn::user(text));
        let messages = self.transcript.clone();

        self.transcript.push(ChatTurn::assistant(String::new()));
        self.pending = Some(self.transcript.len() - 1);

        Ok(ChatStreamRequest {
            messages,
            thread_id,
            thread_number: self.thread.thread_number,
            execution_number: self.thread.current_execution_number,
        })
    }

    pub fn apply_fragment(&mut self, fragment: ChatFragment) -> ReplyProgress {
        let Some(index) = self.pending else {
            return ReplyProgress::Ignored;
        };

        match fragment {
            ChatFragment::Text(text) => {
                if let Some(turn) = self.transcript.get_mut(index) {
                    turn.content.push_str(&text);
                }
                ReplyProgress::Streaming
            }
            ChatFragment::Done => {
                self.pending = None;
                self.thread.complete_turn();
                ReplyProgress::Completed
            }
            ChatFragment::Error(message) => {
                self.fail(message.clone());
                ReplyProgress::Failed(message)
            }
        }
    }

    /// Body ended without `done` or `error`. Partial text stays as is.
    pub fn stream_ended(&mut self) -> bool {
        if self.pending.is_none() {
            return false;
        }
        self.release_placeholder();
        true
    }

    pub fn transport_failed(&mut self, message: impl Into<String>) -> bool {
        if self.pending.is_none() {
            return false;
        }
        self.fail(message.into());
        true
    }

    /// Explicit "new conversation": empty transcript, fresh thread.
    pub fn start_new_thread(&mut self) -> Result<(), SendRejected> {
        if self.is_sending() {
            return Err(SendRejected::InFlight);
        }
        self.transcript.clear();
        self.thread.start_new();
        self.last_error = None;
        Ok(())
    }

    /// Load a persisted log so the next send continues it.
    pub fn resume(&mut self, log: &ExecutionLog) -> Result<(), SendRejected> {
        if self.is_sending() {
            return Err(SendRejected::InFlight);
        }
        self.transcript = reconstruct_transcript(log);
        self.thread.adopt_log(log);
        self.last_error = None;
        Ok(())
    }

    fn fail(&mut self, message: String) {
        self.release_placeholder();
        self.last_error = Some(message);
    }

    /// Drops the placeholder if nothing arrived for it.
    fn release_placeholder(&mut self) {
        if let Some(index) = self.pending.take() {
            if self
                .transcript
                .get(index)
                .is_some_and(|turn| turn.content.is_empty())
            {
                self.transcript.remove(index);
            }
        }
    }
}
