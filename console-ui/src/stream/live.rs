use console_types::{parse_stream_event, ExecutionMessage, StreamEvent};

/// Connection badge for the task detail view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Idle,
    Connecting,
    Open,
    /// Transport failed; no retry until the view re-activates.
    Disconnected,
    /// Closed by us (task stopped running, view torn down).
    Closed,
    /// Backend sent the `end` sentinel.
    Finished,
}

impl ConnectionState {
    pub fn is_live(self) -> bool {
        matches!(self, Self::Connecting | Self::Open)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Open => "live",
            Self::Disconnected => "disconnected",
            Self::Closed => "closed",
            Self::Finished => "finished",
        }
    }
}

/// Identity of one activation, captured when a subscription or history load
/// starts. Anything carrying an outdated ticket is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeedTicket {
    pub task_id: i64,
    generation: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Appended,
    /// `end` received; the caller must close the subscription.
    Terminal,
    /// Payload could not be decoded and was discarded.
    Dropped,
    /// Ticket no longer current; nothing changed.
    Stale,
}

/// Ordered message list behind the task detail view.
///
/// Fed either by the live stream while the task runs or by the latest
/// persisted log once it stops. Messages are only ever appended in arrival
/// order.
#[derive(Debug, Default)]
pub struct LiveFeed {
    task_id: Option<i64>,
    generation: u64,
    messages: Vec<ExecutionMessage>,
    connection: ConnectionState,
    final_status: Option<String>,
}

impl LiveFeed {
    pub fn task_id(&self) -> Option<i64> {
        self.task_id
    }

    pub fn messages(&self) -> &[ExecutionMessage] {
        &self.messages
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn final_status(&self) -> Option<&str> {
        self.final_status.as_deref()
    }

    /// Latest progress any message reported.
    pub fn progress(&self) -> Option<u8> {
        self.messages.iter().rev().find_map(|message| message.progress)
    }

    /// Start a live subscription for `task_id`. Always begins with an empty
    /// list and invalidates every earlier ticket.
    pub fn activate(&mut self, task_id: i64) -> FeedTicket {
        self.generation += 1;
        self.task_id = Some(task_id);
        self.messages.clear();
        self.connection = ConnectionState::Connecting;
        self.final_status = None;
        FeedTicket {
            task_id,
            generation: self.generation,
        }
    }

    fn is_live(&self, ticket: &FeedTicket) -> bool {
        ticket.generation == self.generation
            && self.task_id == Some(ticket.task_id)
            && self.connection.is_live()
    }

    pub fn opened(&mut self, ticket: &FeedTicket) -> bool {
        if !self.is_live(ticket) {
            return false;
        }
        self.connection = ConnectionState::Open;
        true
    }

    pub fn deliver(&mut self, ticket: &FeedTicket, data: &str) -> Delivery {
        if !self.is_live(ticket) {
            return Delivery::Stale;
        }

        match parse_stream_event(data) {
            Ok(StreamEvent::Message(message)) => {
                self.messages.push(message);
                self.connection = ConnectionState::Open;
                Delivery::Appended
            }
            Ok(StreamEvent::End { status }) => {
                self.connection = ConnectionState::Finished;
                self.final_status = status;
                Delivery::Terminal
            }
            Err(err) => {
                dioxus_logger::tracing::error!(
                    "Dropping undecodable stream event for task {}: {}",
                    ticket.task_id,
                    err
                );
                Delivery::Dropped
            }
        }
    }

    /// Returns false when the failure belongs to an outdated subscription.
    pub fn transport_failed(&mut self, ticket: &FeedTicket) -> bool {
        if !self.is_live(ticket) {
            return false;
        }
        self.connection = ConnectionState::Disconnected;
        true
    }

    /// Stop accepting live events. Safe to call repeatedly.
    pub fn deactivate(&mut self) -> bool {
        self.generation += 1;
        if self.connection.is_live() {
            self.connection = ConnectionState::Closed;
            return true;
        }
        false
    }

    /// Switch to history mode for `task_id`. Messages from a different task
    /// are discarded immediately; the current list stays visible for the
    /// same task until the history arrives.
    pub fn begin_history(&mut self, task_id: i64) -> FeedTicket {
        self.deactivate();
        if self.task_id != Some(task_id) {
            self.messages.clear();
            self.connection = ConnectionState::Idle;
            self.final_status = None;
        }
        self.task_id = Some(task_id);
        FeedTicket {
            task_id,
            generation: self.generation,
        }
    }

    pub fn apply_history(&mut self, ticket: &FeedTicket, messages: Vec<ExecutionMessage>) -> bool {
        if ticket.generation != self.generation || self.task_id != Some(ticket.task_id) {
            return false;
        }
        self.messages = messages;
        true
    }
}
