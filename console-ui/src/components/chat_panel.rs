use std::ops::ControlFlow;

use console_types::{ChatRole, ExecutionLog};
use dioxus::prelude::*;

use crate::chat::{stream_chat, ChatSession, ReplyProgress, StreamOutcome};
use crate::thread::mint_thread_id;

/// Threaded chat about one task, with a picker to continue a past log.
#[component]
pub fn ChatPanel(
    task_id: i64,
    logs: Vec<ExecutionLog>,
    on_turn_complete: EventHandler<()>,
) -> Element {
    let mut session = use_signal(ChatSession::default);
    let mut input_text = use_signal(String::new);
    let mut selected_log = use_signal(|| None::<i64>);

    let send_message = use_callback(move |_: ()| {
        let text = input_text();
        let request = match session.write().begin_send(&text, mint_thread_id) {
            Ok(request) => request,
            Err(rejected) => {
                dioxus_logger::tracing::debug!("Chat send rejected: {}", rejected);
                return;
            }
        };
        input_text.set(String::new());

        spawn(async move {
            let result = stream_chat(task_id, &request, |fragment| {
                match session.write().apply_fragment(fragment) {
                    ReplyProgress::Streaming => ControlFlow::Continue(()),
                    ReplyProgress::Completed => {
                        on_turn_complete.call(());
                        ControlFlow::Break(())
                    }
                    ReplyProgress::Failed(message) => {
                        dioxus_logger::tracing::error!("Chat reply for task {} failed: {}", task_id, message);
                        ControlFlow::Break(())
                    }
                    ReplyProgress::Ignored => ControlFlow::Break(()),
                }
            })
            .await;

            match result {
                Ok(StreamOutcome::Terminated) => {}
                Ok(StreamOutcome::Ended) => {
                    session.write().stream_ended();
                }
                Err(e) => {
                    dioxus_logger::tracing::error!("Chat stream for task {} failed: {}", task_id, e);
                    session.write().transport_failed(e.user_message());
                }
            }
        });
    });

    let onkeydown = use_callback(move |e: KeyboardEvent| {
        if e.key() == Key::Enter && !e.modifiers().shift() {
            e.prevent_default();
            send_message.call(());
        }
    });

    let logs_for_picker = logs.clone();
    let on_pick_log = move |e: FormEvent| {
        let Ok(execution_number) = e.value().parse::<i64>() else {
            return;
        };
        let Some(log) = logs_for_picker
            .iter()
            .find(|log| log.execution_number == execution_number)
        else {
            return;
        };
        match session.write().resume(log) {
            Ok(()) => selected_log.set(Some(execution_number)),
            Err(rejected) => {
                dioxus_logger::tracing::debug!("Cannot resume log {}: {}", execution_number, rejected);
            }
        }
    };

    let on_new_thread = move |_: MouseEvent| {
        if session.write().start_new_thread().is_ok() {
            selected_log.set(None);
        }
    };

    let sending = session.read().is_sending();
    let transcript = session.read().transcript().to_vec();
    let last_error = session.read().last_error().map(ToString::to_string);
    let thread_label = {
        let guard = session.read();
        let thread = guard.thread();
        match (&thread.thread_id, thread.current_execution_number) {
            (Some(id), Some(execution)) => format!("{id} · turn {} · log #{execution}", thread.thread_number),
            (Some(id), None) => format!("{id} · turn {}", thread.thread_number),
            (None, _) => "New conversation".to_string(),
        }
    };
    let picked = selected_log().map(|n| n.to_string()).unwrap_or_default();

    rsx! {
        div {
            style: "display: flex; flex-direction: column; gap: 0.75rem; padding: 1rem; background: #111827; border-radius: 0.5rem;",

            div {
                style: "display: flex; align-items: center; gap: 0.5rem;",
                span { style: "flex: 1; font-size: 0.75rem; color: #9ca3af; font-family: monospace;", "{thread_label}" }
                select {
                    style: "padding: 0.25rem; background: #1f2937; color: #e5e7eb; border: 1px solid #374151; border-radius: 0.25rem;",
                    disabled: sending,
                    value: "{picked}",
                    onchange: on_pick_log,
                    option { value: "", "Continue a previous run..." }
                    for log in logs.iter() {
                        option {
                            key: "{log.id}",
                            value: "{log.execution_number}",
                            style: log_option_style(log),
                            {log_label(log)}
                        }
                    }
                }
                button {
                    style: "padding: 0.25rem 0.75rem; background: #374151; color: white; border: none; border-radius: 0.25rem; cursor: pointer;",
                    disabled: sending,
                    onclick: on_new_thread,
                    "New conversation"
                }
            }

            div {
                style: "display: flex; flex-direction: column; gap: 0.5rem; max-height: 40vh; overflow-y: auto;",
                if transcript.is_empty() {
                    div { style: "color: #6b7280; font-size: 0.875rem;", "Ask a question about this task." }
                }
                for (index, turn) in transcript.into_iter().enumerate() {
                    div {
                        key: "{index}",
                        style: turn_style(turn.role),
                        if turn.content.is_empty() && sending {
                            span { style: "color: #9ca3af;", "..." }
                        } else {
                            "{turn.content}"
                        }
                    }
                }
            }

            if let Some(message) = last_error {
                div { style: "font-size: 0.8125rem; color: #fca5a5;", "{message}" }
            }

            div {
                style: "display: flex; gap: 0.5rem;",
                textarea {
                    style: "flex: 1; min-height: 2.5rem; padding: 0.5rem; background: #0f172a; color: #f3f4f6; border: 1px solid #374151; border-radius: 0.375rem; resize: vertical;",
                    placeholder: "Message",
                    disabled: sending,
                    value: "{input_text}",
                    oninput: move |e: FormEvent| input_text.set(e.value()),
                    onkeydown,
                }
                button {
                    style: "padding: 0.5rem 1rem; background: #2563eb; color: white; border: none; border-radius: 0.375rem; cursor: pointer;",
                    disabled: sending || input_text.read().trim().is_empty(),
                    onclick: move |_| send_message.call(()),
                    if sending { "Sending..." } else { "Send" }
                }
            }
        }
    }
}

fn turn_style(role: ChatRole) -> &'static str {
    match role {
        ChatRole::User => "align-self: flex-end; max-width: 80%; padding: 0.5rem 0.75rem; background: #1d4ed8; color: white; border-radius: 0.5rem; white-space: pre-wrap;",
        ChatRole::Assistant => "max-width: 80%; padding: 0.5rem 0.75rem; background: #1f2937; color: #f3f4f6; border-radius: 0.5rem; white-space: pre-wrap;",
    }
}

fn log_option_style(log: &ExecutionLog) -> &'static str {
    if log.is_failed() {
        "color: #fca5a5;"
    } else {
        "color: #e5e7eb;"
    }
}

fn log_label(log: &ExecutionLog) -> String {
    let when = log
        .created_at_utc()
        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| log.created_at.clone());
    format!("#{} · {} · {}", log.execution_number, log.response_type, when)
}
