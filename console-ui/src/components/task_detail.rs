use std::cell::Cell;
use std::rc::Rc;

use console_types::{ExecutionLog, TaskSummary};
use dioxus::prelude::*;
use gloo_timers::future::TimeoutFuture;

use crate::api::fetch_task;
use crate::app::Route;
use crate::components::task_list::status_color;
use crate::components::{ChatPanel, ExecutionFeed, ProgressBar};
use crate::config::console_config;
use crate::history::load_history;
use crate::stream::{
    drain_signals, new_signal_queue, open_task_stream, ConnectionState, Delivery, FeedTicket,
    LiveFeed, StreamSignal, TaskStreamRuntime,
};

/// Route target. Keyed on the task id so switching tasks tears the whole
/// detail view down, closing its subscription, before the next one mounts.
#[component]
pub fn TaskDetailPage(task_id: i64) -> Element {
    rsx! {
        TaskDetail { key: "{task_id}", task_id }
    }
}

#[component]
fn TaskDetail(task_id: i64) -> Element {
    let mut task = use_signal(|| None::<TaskSummary>);
    let mut feed = use_signal(LiveFeed::default);
    let mut logs = use_signal(Vec::<ExecutionLog>::new);
    let mut runtime = use_signal(|| None::<TaskStreamRuntime>);
    let signal_queue = use_hook(new_signal_queue::<FeedTicket>);
    let mut pump_started = use_signal(|| false);
    let pump_alive = use_hook(|| Rc::new(Cell::new(true)));

    let loaded = use_memo(move || task.read().is_some());
    let running = use_memo(move || {
        task.read()
            .as_ref()
            .is_some_and(|task| task.status().is_running())
    });

    {
        let pump_alive = pump_alive.clone();
        use_drop(move || {
            pump_alive.set(false);
            if let Some(runtime) = runtime.write().take() {
                runtime.close();
            }
            feed.write().deactivate();
        });
    }

    let refresh_task = use_callback(move |_: ()| {
        spawn(async move {
            match fetch_task(task_id).await {
                Ok(summary) => task.set(Some(summary)),
                Err(e) => {
                    dioxus_logger::tracing::error!("Failed to fetch task {}: {}", task_id, e);
                }
            }
        });
    });

    // Reload persisted logs. The feed only takes them while the task is idle.
    let refresh_history = use_callback(move |_: ()| {
        let ticket = if *running.peek() {
            None
        } else {
            Some(feed.write().begin_history(task_id))
        };
        spawn(async move {
            let snapshot = load_history(task_id).await;
            if let Some(ticket) = ticket {
                if !feed.write().apply_history(&ticket, snapshot.messages) {
                    dioxus_logger::tracing::debug!("Discarded stale history for task {}", task_id);
                }
            }
            logs.set(snapshot.logs);
        });
    });

    use_effect(move || {
        refresh_task.call(());
    });

    // Live stream while running, persisted history otherwise. Status
    // refreshes that keep the same running flag do not re-run this.
    {
        let signal_queue = signal_queue.clone();
        use_effect(move || {
            if !loaded() {
                return;
            }
            let live = running();

            if let Some(previous) = runtime.write().take() {
                previous.close();
            }

            if !live {
                refresh_history.call(());
                return;
            }

            let ticket = feed.write().activate(task_id);
            let queue = signal_queue.clone();
            let url = console_config().task_stream_url(task_id);
            match open_task_stream(&url, move |signal| {
                queue.borrow_mut().push_back((ticket, signal));
            }) {
                Ok(stream) => runtime.set(Some(stream)),
                Err(e) => {
                    dioxus_logger::tracing::error!("Task stream {} failed to open: {}", task_id, e);
                    feed.write().transport_failed(&ticket);
                }
            }
            // Logs list for the chat picker, independent of the live feed
            spawn(async move {
                logs.set(load_history(task_id).await.logs);
            });
        });
    }

    // Drain stream signals into the feed
    {
        let signal_queue = signal_queue.clone();
        let pump_alive = pump_alive.clone();
        use_effect(move || {
            if pump_started() {
                return;
            }
            pump_started.set(true);

            let signal_queue = signal_queue.clone();
            let pump_alive = pump_alive.clone();
            spawn(async move {
                while pump_alive.get() {
                    for (ticket, signal) in drain_signals(&signal_queue) {
                        match signal {
                            StreamSignal::Opened => {
                                feed.write().opened(&ticket);
                            }
                            StreamSignal::Message(data) => {
                                let delivery = feed.write().deliver(&ticket, &data);
                                if delivery == Delivery::Terminal {
                                    if let Some(stream) = runtime.write().take() {
                                        stream.close();
                                    }
                                    refresh_task.call(());
                                }
                            }
                            StreamSignal::Failed(reason) => {
                                if feed.write().transport_failed(&ticket) {
                                    dioxus_logger::tracing::error!(
                                        "Task {} stream lost: {}",
                                        ticket.task_id,
                                        reason
                                    );
                                    if let Some(stream) = runtime.write().take() {
                                        stream.close();
                                    }
                                }
                            }
                        }
                    }
                    TimeoutFuture::new(16).await;
                }
            });
        });
    }

    let connection = feed.read().connection();
    let progress = feed.read().progress();
    let messages = feed.read().messages().to_vec();
    let final_status = feed.read().final_status().map(ToString::to_string);
    let empty_label = if running() {
        "Waiting for the first event..."
    } else {
        "No execution data for this task."
    };

    rsx! {
        div {
            style: "max-width: 64rem; margin: 0 auto; padding: 1.5rem; display: flex; flex-direction: column; gap: 1rem;",
            Link { to: Route::TaskListPage {}, "← All tasks" }

            {match task() {
                Some(summary) => {
                    let status = summary.status();
                    let color = status_color(&status);
                    rsx! {
                        div {
                            style: "display: flex; align-items: center; gap: 1rem;",
                            h1 { style: "flex: 1; font-size: 1.25rem; font-weight: 600;", "#{summary.id} {summary.title}" }
                            span {
                                style: "font-size: 0.75rem; padding: 0.125rem 0.5rem; border-radius: 9999px; background: {color}; color: white;",
                                "{status.as_str()}"
                            }
                            ConnectionBadge { state: connection }
                        }
                    }
                }
                None => rsx! {
                    div { style: "color: #9ca3af;", "Loading task {task_id}..." }
                },
            }}

            if running() {
                ProgressBar { value: progress.unwrap_or(0) }
            }
            if let Some(status) = final_status {
                div { style: "font-size: 0.75rem; color: #9ca3af;", "Stream finished: {status}" }
            }

            div {
                style: "padding: 1rem; background: #0f172a; border-radius: 0.5rem; max-height: 60vh; overflow-y: auto;",
                ExecutionFeed { messages, empty_label: empty_label.to_string() }
            }

            ChatPanel {
                task_id,
                logs: logs(),
                on_turn_complete: move |_| refresh_history.call(()),
            }
        }
    }
}

#[component]
fn ConnectionBadge(state: ConnectionState) -> Element {
    let color = match state {
        ConnectionState::Open => "#10b981",
        ConnectionState::Connecting => "#f59e0b",
        ConnectionState::Disconnected => "#ef4444",
        ConnectionState::Idle | ConnectionState::Closed | ConnectionState::Finished => "#6b7280",
    };

    rsx! {
        span {
            style: "display: inline-flex; align-items: center; gap: 0.375rem; font-size: 0.75rem; color: #9ca3af;",
            span { style: "width: 0.5rem; height: 0.5rem; border-radius: 9999px; background: {color};" }
            "{state.label()}"
        }
    }
}
