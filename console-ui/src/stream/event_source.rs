use std::cell::Cell;
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{Event, EventSource, MessageEvent};

use crate::error::{js_error, ConsoleError};

// ── Stream signal type ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum StreamSignal {
    Opened,
    /// Raw `data` of one server-sent event.
    Message(String),
    Failed(String),
}

// ── EventSource runtime ──────────────────────────────────────────────────────

/// One live subscription to a task's event stream.
///
/// Closing is idempotent and detaches every callback, so nothing fires after
/// `close` returns. Dropping the runtime closes it.
pub struct TaskStreamRuntime {
    source: EventSource,
    url: String,
    closed: Rc<Cell<bool>>,
    _on_open: Closure<dyn FnMut(Event)>,
    _on_message: Closure<dyn FnMut(MessageEvent)>,
    _on_error: Closure<dyn FnMut(Event)>,
}

impl TaskStreamRuntime {
    pub fn close(&self) {
        if self.closed.replace(true) {
            return;
        }
        self.source.set_onopen(None);
        self.source.set_onmessage(None);
        self.source.set_onerror(None);
        self.source.close();
        dioxus_logger::tracing::info!("Closed task stream {}", self.url);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }
}

impl Drop for TaskStreamRuntime {
    fn drop(&mut self) {
        self.close();
    }
}

/// Subscribe to `url`. The browser's built-in reconnect is suppressed: the
/// first error closes the source and reports `Failed`.
pub fn open_task_stream<F>(url: &str, on_signal: F) -> Result<TaskStreamRuntime, ConsoleError>
where
    F: FnMut(StreamSignal) + 'static,
{
    dioxus_logger::tracing::info!("Opening task stream {}", url);

    let source = EventSource::new(url).map_err(|e| {
        dioxus_logger::tracing::error!("Failed to create EventSource: {:?}", e);
        ConsoleError::Request(js_error(&e))
    })?;

    let closed = Rc::new(Cell::new(false));
    let on_signal = Rc::new(std::cell::RefCell::new(on_signal));

    let closed_for_open = closed.clone();
    let on_signal_open = on_signal.clone();
    let on_open = Closure::wrap(Box::new(move |_e: Event| {
        if closed_for_open.get() {
            return;
        }
        on_signal_open.borrow_mut()(StreamSignal::Opened);
    }) as Box<dyn FnMut(Event)>);
    source.set_onopen(Some(on_open.as_ref().unchecked_ref()));

    let closed_for_message = closed.clone();
    let on_signal_message = on_signal.clone();
    let on_message = Closure::wrap(Box::new(move |e: MessageEvent| {
        if closed_for_message.get() {
            return;
        }
        let Some(data) = e.data().as_string() else {
            return;
        };
        dioxus_logger::tracing::debug!("Task stream event: {}", data);
        on_signal_message.borrow_mut()(StreamSignal::Message(data));
    }) as Box<dyn FnMut(MessageEvent)>);
    source.set_onmessage(Some(on_message.as_ref().unchecked_ref()));

    let closed_for_error = closed.clone();
    let source_for_error = source.clone();
    let url_for_error = url.to_string();
    let on_error = Closure::wrap(Box::new(move |_e: Event| {
        if closed_for_error.replace(true) {
            return;
        }
        source_for_error.close();
        dioxus_logger::tracing::error!("Task stream {} failed", url_for_error);
        on_signal.borrow_mut()(StreamSignal::Failed(format!(
            "stream {url_for_error} disconnected"
        )));
    }) as Box<dyn FnMut(Event)>);
    source.set_onerror(Some(on_error.as_ref().unchecked_ref()));

    Ok(TaskStreamRuntime {
        source,
        url: url.to_string(),
        closed,
        _on_open: on_open,
        _on_message: on_message,
        _on_error: on_error,
    })
}
