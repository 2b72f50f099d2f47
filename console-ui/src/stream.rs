//! Live task streams: the pure feed state and the browser subscription that
//! feeds it.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

mod event_source;
mod live;

pub use event_source::{open_task_stream, StreamSignal, TaskStreamRuntime};
pub use live::{ConnectionState, Delivery, FeedTicket, LiveFeed};

/// Callbacks push here; a component pump drains it on its own schedule.
/// Each entry carries the key (ticket or task id) captured at subscribe time.
pub type SignalQueue<K> = Rc<RefCell<VecDeque<(K, StreamSignal)>>>;

pub fn new_signal_queue<K>() -> SignalQueue<K> {
    Rc::new(RefCell::new(VecDeque::new()))
}

pub fn drain_signals<K>(queue: &SignalQueue<K>) -> Vec<(K, StreamSignal)> {
    queue.borrow_mut().drain(..).collect()
}
