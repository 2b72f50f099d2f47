use console_types::{ExecutionMessage, MessageKind};
use dioxus::prelude::*;

#[component]
pub fn ExecutionFeed(messages: Vec<ExecutionMessage>, empty_label: String) -> Element {
    if messages.is_empty() {
        return rsx! {
            div {
                style: "padding: 1.5rem; text-align: center; color: #6b7280; font-size: 0.875rem;",
                "{empty_label}"
            }
        };
    }

    rsx! {
        div {
            style: "display: flex; flex-direction: column; gap: 0.5rem;",
            for (index, message) in messages.into_iter().enumerate() {
                ExecutionMessageRow { key: "{index}", message }
            }
        }
    }
}

#[component]
fn ExecutionMessageRow(message: ExecutionMessage) -> Element {
    let progress = message.progress;

    let body = match message.kind {
        MessageKind::Init { message } => rsx! {
            div {
                style: "color: #9ca3af; font-size: 0.75rem; font-style: italic;",
                "Session started"
                if let Some(message) = message {
                    ": {message}"
                }
            }
        },
        MessageKind::System { message, content } => rsx! {
            div {
                style: "color: #9ca3af; font-size: 0.8125rem;",
                if let Some(message) = message {
                    div { "{message}" }
                }
                if let Some(content) = content {
                    pre {
                        style: "margin: 0.25rem 0 0; white-space: pre-wrap; font-size: 0.75rem; color: #6b7280;",
                        "{content}"
                    }
                }
            }
        },
        MessageKind::User { text, content } => rsx! {
            div {
                style: "align-self: flex-end; max-width: 80%; padding: 0.5rem 0.75rem; background: #1d4ed8; color: white; border-radius: 0.5rem; white-space: pre-wrap;",
                {text.or(content).unwrap_or_default()}
            }
        },
        MessageKind::Assistant { text, content } => rsx! {
            div {
                style: "max-width: 80%; padding: 0.5rem 0.75rem; background: #1f2937; color: #f3f4f6; border-radius: 0.5rem; white-space: pre-wrap;",
                if let Some(text) = text {
                    "{text}"
                } else if let Some(content) = content {
                    pre {
                        style: "margin: 0; white-space: pre-wrap; font-size: 0.75rem;",
                        "{content}"
                    }
                }
            }
        },
        MessageKind::Result {
            text,
            is_error,
            duration_ms,
            cost_usd,
        } => {
            let (border, label) = if is_error {
                ("#ef4444", "Failed")
            } else {
                ("#10b981", "Result")
            };
            let meta = result_meta(duration_ms, cost_usd);
            rsx! {
                div {
                    style: "padding: 0.5rem 0.75rem; border-left: 3px solid {border}; background: #111827; color: #e5e7eb;",
                    div {
                        style: "font-size: 0.75rem; font-weight: 600; color: {border};",
                        "{label}"
                        if !meta.is_empty() {
                            span { style: "margin-left: 0.5rem; color: #6b7280; font-weight: 400;", "{meta}" }
                        }
                    }
                    if let Some(text) = text {
                        div { style: "margin-top: 0.25rem; white-space: pre-wrap;", "{text}" }
                    }
                }
            }
        }
        MessageKind::Unrecognized { type_name, text } => rsx! {
            div {
                style: "color: #9ca3af; font-size: 0.8125rem;",
                span { style: "font-family: monospace; color: #f59e0b;", "[{type_name}] " }
                {text.unwrap_or_default()}
            }
        },
        MessageKind::Raw { content } => rsx! {
            pre {
                style: "margin: 0; padding: 0.5rem 0.75rem; background: #0b1220; color: #d1d5db; border-radius: 0.375rem; white-space: pre-wrap; font-size: 0.75rem;",
                "{content}"
            }
        },
    };

    rsx! {
        div {
            style: "display: flex; flex-direction: column;",
            {body}
            if let Some(progress) = progress {
                div { style: "font-size: 0.6875rem; color: #6b7280;", "{progress}%" }
            }
        }
    }
}

fn result_meta(duration_ms: Option<u64>, cost_usd: Option<f64>) -> String {
    let mut parts = Vec::new();
    if let Some(ms) = duration_ms {
        parts.push(format!("{:.1}s", ms as f64 / 1000.0));
    }
    if let Some(cost) = cost_usd {
        parts.push(format!("${cost:.4}"));
    }
    parts.join(" · ")
}

#[component]
pub fn ProgressBar(value: u8) -> Element {
    rsx! {
        div {
            style: "display: flex; align-items: center; gap: 0.5rem; min-width: 8rem;",
            div {
                style: "flex: 1; height: 0.375rem; background: #374151; border-radius: 9999px; overflow: hidden;",
                div { style: "width: {value}%; height: 100%; background: #3b82f6; transition: width 0.3s;" }
            }
            span { style: "font-size: 0.75rem; color: #9ca3af; min-width: 2.5rem; text-align: right;", "{value}%" }
        }
    }
}
