//! Per-task progress for list views.
//!
//! Each in-progress row owns its own subscription, independent of any detail
//! view watching the same task. Only the `progress` field is read; a
//! `ResultMessage` or `end` closes the subscription and the list refreshes
//! from the backend instead of inferring completion locally.

use std::collections::HashMap;

use console_types::{parse_stream_event, StreamEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgressTicket {
    pub task_id: i64,
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressUpdate {
    Updated(u8),
    Unchanged,
    /// Task produced its result; close the subscription and refresh the list.
    Finished,
    /// Stream ended without a result; close the subscription and refresh the list.
    Ended,
    Dropped,
    Stale,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconcile {
    pub open: Vec<i64>,
    pub close: Vec<i64>,
}

#[derive(Debug, Clone)]
struct Tracked {
    generation: u64,
    value: u8,
    active: bool,
}

#[derive(Debug, Default)]
pub struct ProgressBoard {
    tracked: HashMap<i64, Tracked>,
    generation: u64,
}

impl ProgressBoard {
    pub fn track(&mut self, task_id: i64) -> ProgressTicket {
        self.generation += 1;
        let generation = self.generation;
        let entry = self.tracked.entry(task_id).or_insert(Tracked {
            generation,
            value: 0,
            active: true,
        });
        entry.generation = generation;
        entry.active = true;
        ProgressTicket {
            task_id,
            generation,
        }
    }

    pub fn untrack(&mut self, task_id: i64) -> bool {
        self.tracked.remove(&task_id).is_some()
    }

    /// Current value, 0 when nothing was reported.
    pub fn progress(&self, task_id: i64) -> u8 {
        self.tracked.get(&task_id).map_or(0, |entry| entry.value)
    }

    pub fn is_active(&self, task_id: i64) -> bool {
        self.tracked.get(&task_id).is_some_and(|entry| entry.active)
    }

    fn current(&mut self, ticket: &ProgressTicket) -> Option<&mut Tracked> {
        self.tracked
            .get_mut(&ticket.task_id)
            .filter(|entry| entry.active && entry.generation == ticket.generation)
    }

    pub fn apply(&mut self, ticket: &ProgressTicket, data: &str) -> ProgressUpdate {
        let Some(entry) = self.current(ticket) else {
            return ProgressUpdate::Stale;
        };

        let message = match parse_stream_event(data) {
            Ok(StreamEvent::Message(message)) => message,
            Ok(StreamEvent::End { .. }) => {
                entry.active = false;
                return ProgressUpdate::Ended;
            }
            Err(err) => {
                dioxus_logger::tracing::error!(
                    "Dropping undecodable progress event for task {}: {}",
                    ticket.task_id,
                    err
                );
                return ProgressUpdate::Dropped;
            }
        };

        let mut update = ProgressUpdate::Unchanged;
        if let Some(progress) = message.progress {
            entry.value = progress;
            update = ProgressUpdate::Updated(progress);
        }
        if message.is_result() {
            entry.active = false;
            return ProgressUpdate::Finished;
        }
        update
    }

    pub fn transport_failed(&mut self, ticket: &ProgressTicket) -> bool {
        match self.current(ticket) {
            Some(entry) => {
                entry.active = false;
                true
            }
            None => false,
        }
    }

    /// Diff the tracked set against the tasks currently in progress.
    /// A task the backend still reports as running gets a fresh subscription
    /// when its previous one has closed.
    pub fn reconcile(&self, in_progress: &[i64]) -> Reconcile {
        let open = in_progress
            .iter()
            .copied()
            .filter(|task_id| !self.is_active(*task_id))
            .collect();
        let mut close: Vec<i64> = self
            .tracked
            .keys()
            .copied()
            .filter(|task_id| !in_progress.contains(task_id))
            .collect();
        close.sort_unstable();
        Reconcile { open, close }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_zero() {
        let mut board = ProgressBoard::default();
        assert_eq!(board.progress(9), 0);
        board.track(9);
        assert_eq!(board.progress(9), 0);
    }

    #[test]
    fn reads_progress_from_any_message_type() {
        let mut board = ProgressBoard::default();
        let ticket = board.track(1);
        assert_eq!(
            board.apply(&ticket, r#"{"type":"AssistantMessage","text":"x","progress":30}"#),
            ProgressUpdate::Updated(30)
        );
        assert_eq!(
            board.apply(&ticket, r#"{"type":"AssistantMessage","text":"y"}"#),
            ProgressUpdate::Unchanged
        );
        assert_eq!(board.progress(1), 30);
    }

    #[test]
    fn result_message_finishes_subscription() {
        let mut board = ProgressBoard::default();
        let ticket = board.track(1);
        assert_eq!(
            board.apply(&ticket, r#"{"type":"ResultMessage","progress":100}"#),
            ProgressUpdate::Finished
        );
        assert_eq!(board.progress(1), 100);
        assert!(!board.is_active(1));
        assert_eq!(
            board.apply(&ticket, r#"{"type":"SystemMessage","progress":5}"#),
            ProgressUpdate::Stale
        );
    }

    #[test]
    fn end_without_result_reopens_while_still_running() {
        let mut board = ProgressBoard::default();
        let ticket = board.track(1);
        board.apply(&ticket, r#"{"type":"SystemMessage","progress":30}"#);
        assert_eq!(
            board.apply(&ticket, r#"{"type":"end","status":"cancelled"}"#),
            ProgressUpdate::Ended
        );
        assert!(!board.is_active(1));

        let plan = board.reconcile(&[1]);
        assert_eq!(plan.open, vec![1]);
        assert!(plan.close.is_empty());

        let again = board.track(1);
        assert!(board.is_active(1));
        assert_eq!(board.progress(1), 30);
        assert_eq!(
            board.apply(&ticket, r#"{"type":"SystemMessage","progress":50}"#),
            ProgressUpdate::Stale
        );
        assert_eq!(
            board.apply(&again, r#"{"type":"SystemMessage","progress":50}"#),
            ProgressUpdate::Updated(50)
        );
    }

    #[test]
    fn failure_of_one_task_leaves_others_alone() {
        let mut board = ProgressBoard::default();
        let x = board.track(1);
        let y = board.track(2);
        assert!(board.transport_failed(&x));
        assert_eq!(
            board.apply(&y, r#"{"type":"SystemMessage","progress":55}"#),
            ProgressUpdate::Updated(55)
        );
        assert!(board.is_active(2));
        assert!(!board.is_active(1));
    }

    #[test]
    fn retracking_invalidates_old_ticket() {
        let mut board = ProgressBoard::default();
        let old = board.track(1);
        board.untrack(1);
        let new = board.track(1);
        assert_eq!(
            board.apply(&old, r#"{"type":"SystemMessage","progress":10}"#),
            ProgressUpdate::Stale
        );
        assert_eq!(
            board.apply(&new, r#"{"type":"SystemMessage","progress":10}"#),
            ProgressUpdate::Updated(10)
        );
    }

    #[test]
    fn reconcile_opens_new_and_closes_departed() {
        let mut board = ProgressBoard::default();
        board.track(1);
        let running = board.track(2);
        board.apply(&running, r#"{"type":"SystemMessage","progress":5}"#);
        let finished = board.track(4);
        board.apply(&finished, r#"{"type":"ResultMessage"}"#);

        let plan = board.reconcile(&[2, 3]);
        assert_eq!(plan.open, vec![3]);
        assert_eq!(plan.close, vec![1, 4]);
    }

    #[test]
    fn finished_task_still_listed_as_running_is_resubscribed() {
        let mut board = ProgressBoard::default();
        let ticket = board.track(7);
        assert_eq!(
            board.apply(&ticket, r#"{"type":"ResultMessage","progress":100}"#),
            ProgressUpdate::Finished
        );
        assert_eq!(board.reconcile(&[7]).open, vec![7]);
        assert_eq!(board.reconcile(&[]).close, vec![7]);
    }
}
