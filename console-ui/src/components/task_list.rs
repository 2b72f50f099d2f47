use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use console_types::{TaskStatus, TaskSummary};
use dioxus::prelude::*;
use gloo_timers::future::TimeoutFuture;

use crate::api::fetch_tasks;
use crate::app::Route;
use crate::components::ProgressBar;
use crate::config::console_config;
use crate::progress::{ProgressBoard, ProgressTicket, ProgressUpdate};
use crate::stream::{drain_signals, new_signal_queue, open_task_stream, StreamSignal, TaskStreamRuntime};

#[component]
pub fn TaskListPage() -> Element {
    let mut tasks = use_signal(Vec::<TaskSummary>::new);
    let mut loading = use_signal(|| true);
    let mut error = use_signal(|| None::<String>);
    let mut refresh_nonce = use_signal(|| 0u64);
    let mut board = use_signal(ProgressBoard::default);
    let mut runtimes = use_signal(HashMap::<i64, TaskStreamRuntime>::new);
    let signal_queue = use_hook(new_signal_queue::<ProgressTicket>);
    let mut pump_started = use_signal(|| false);
    let pump_alive = use_hook(|| Rc::new(Cell::new(true)));

    {
        let pump_alive = pump_alive.clone();
        use_drop(move || {
            pump_alive.set(false);
            let closed: Vec<TaskStreamRuntime> = runtimes.write().drain().map(|(_, rt)| rt).collect();
            for runtime in closed {
                runtime.close();
            }
        });
    }

    // Load (and reload) the task list
    use_effect(move || {
        let nonce = refresh_nonce();
        spawn(async move {
            match fetch_tasks().await {
                Ok(list) => {
                    dioxus_logger::tracing::debug!("Loaded {} tasks (refresh {})", list.len(), nonce);
                    tasks.set(list);
                    error.set(None);
                }
                Err(e) => {
                    dioxus_logger::tracing::error!("Failed to fetch tasks: {}", e);
                    error.set(Some(e.to_string()));
                }
            }
            loading.set(false);
        });
    });

    // Keep one progress subscription per in-progress task
    {
        let signal_queue = signal_queue.clone();
        use_effect(move || {
            let in_progress: Vec<i64> = tasks
                .read()
                .iter()
                .filter(|task| task.status().is_running())
                .map(|task| task.id)
                .collect();
            let plan = board.peek().reconcile(&in_progress);

            for task_id in plan.close {
                board.write().untrack(task_id);
                if let Some(runtime) = runtimes.write().remove(&task_id) {
                    runtime.close();
                }
            }

            for task_id in plan.open {
                let ticket = board.write().track(task_id);
                let queue = signal_queue.clone();
                let url = console_config().task_stream_url(task_id);
                match open_task_stream(&url, move |signal| {
                    queue.borrow_mut().push_back((ticket, signal));
                }) {
                    Ok(runtime) => {
                        runtimes.write().insert(task_id, runtime);
                    }
                    Err(e) => {
                        dioxus_logger::tracing::error!(
                            "Progress stream for task {} failed to open: {}",
                            task_id,
                            e
                        );
                        board.write().transport_failed(&ticket);
                    }
                }
            }
        });
    }

    // Drain stream signals into the board
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
                        let close = match signal {
                            StreamSignal::Opened => false,
                            StreamSignal::Message(data) => {
                                let update = board.write().apply(&ticket, &data);
                                match update {
                                    ProgressUpdate::Finished | ProgressUpdate::Ended => {
                                        dioxus_logger::tracing::info!(
                                            "Task {} stream closed ({:?}), refreshing list",
                                            ticket.task_id,
                                            update
                                        );
                                        let next = *refresh_nonce.peek() + 1;
                                        refresh_nonce.set(next);
                                        true
                                    }
                                    ProgressUpdate::Updated(_)
                                    | ProgressUpdate::Unchanged
                                    | ProgressUpdate::Dropped
                                    | ProgressUpdate::Stale => false,
                                }
                            }
                            StreamSignal::Failed(_) => board.write().transport_failed(&ticket),
                        };
                        if close {
                            if let Some(runtime) = runtimes.write().remove(&ticket.task_id) {
                                runtime.close();
                            }
                        }
                    }
                    TimeoutFuture::new(16).await;
                }
            });
        });
    }

    rsx! {
        div {
            style: "max-width: 64rem; margin: 0 auto; padding: 1.5rem;",
            div {
                style: "display: flex; align-items: center; justify-content: space-between; margin-bottom: 1rem;",
                h1 { style: "font-size: 1.25rem; font-weight: 600;", "Tasks" }
                button {
                    style: "padding: 0.375rem 0.75rem; background: #374151; color: white; border: none; border-radius: 0.375rem; cursor: pointer;",
                    onclick: move |_| {
                        let next = *refresh_nonce.peek() + 1;
                        refresh_nonce.set(next);
                    },
                    "Refresh"
                }
            }

            if let Some(message) = error() {
                div {
                    style: "padding: 0.75rem; margin-bottom: 1rem; background: #7f1d1d; color: #fecaca; border-radius: 0.375rem; font-size: 0.875rem;",
                    "{message}"
                }
            }

            if loading() && tasks.read().is_empty() {
                div { style: "color: #9ca3af;", "Loading tasks..." }
            } else if tasks.read().is_empty() {
                div { style: "color: #6b7280;", "No tasks yet." }
            } else {
                div {
                    style: "display: flex; flex-direction: column; gap: 0.5rem;",
                    for task in tasks.read().iter().cloned() {
                        TaskRow {
                            key: "{task.id}",
                            progress: board.read().progress(task.id),
                            task,
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn TaskRow(task: TaskSummary, progress: u8) -> Element {
    let status = task.status();
    let color = status_color(&status);

    rsx! {
        Link {
            to: Route::TaskDetailPage { task_id: task.id },
            div {
                style: "display: flex; align-items: center; gap: 1rem; padding: 0.75rem 1rem; background: #1f2937; border-radius: 0.5rem; color: #f3f4f6;",
                span { style: "color: #6b7280; font-family: monospace;", "#{task.id}" }
                span { style: "flex: 1;", "{task.title}" }
                if status.is_running() {
                    ProgressBar { value: progress }
                }
                span {
                    style: "font-size: 0.75rem; padding: 0.125rem 0.5rem; border-radius: 9999px; background: {color}; color: white;",
                    "{status.as_str()}"
                }
            }
        }
    }
}

pub(crate) fn status_color(status: &TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "#6b7280",
        TaskStatus::InProgress => "#2563eb",
        TaskStatus::Completed => "#059669",
        TaskStatus::Failed => "#dc2626",
        TaskStatus::Cancelled => "#92400e",
        TaskStatus::Other(_) => "#4b5563",
    }
}
