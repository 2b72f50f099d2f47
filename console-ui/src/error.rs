use console_types::PayloadError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConsoleError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("HTTP error: {status}{detail}")]
    Http { status: u16, detail: String },

    #[error("Failed to parse JSON: {0}")]
    Decode(String),

    #[error("API error (code {code}): {message}")]
    Api { code: i64, message: String },

    #[error("Stream error: {0}")]
    Stream(String),
}

impl ConsoleError {
    /// Build an HTTP error from a non-OK status and its body, preferring the
    /// body's `error` or `message` field when it is JSON.
    pub fn http(status: u16, body: &str) -> Self {
        let body = body.trim();
        let detail = if body.is_empty() {
            String::new()
        } else if let Some(reason) = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|json| {
                json.get("error")
                    .and_then(|v| v.as_str())
                    .or_else(|| json.get("message").and_then(|v| v.as_str()))
                    .map(ToString::to_string)
            })
        {
            format!(" ({reason})")
        } else {
            format!(" ({body})")
        };
        Self::Http { status, detail }
    }

    /// Stable failure wording shown next to the chat input.
    pub fn user_message(&self) -> String {
        match self {
            Self::Request(_) | Self::Stream(_) => {
                "Connection to the task service was lost.".to_string()
            }
            Self::Http { status, .. } => format!("The task service answered with HTTP {status}."),
            Self::Decode(_) => "The task service sent an unreadable reply.".to_string(),
            Self::Api { message, .. } => message.clone(),
        }
    }
}

impl From<PayloadError> for ConsoleError {
    fn from(err: PayloadError) -> Self {
        match err {
            PayloadError::EnvelopeRejected { code, message } => Self::Api { code, message },
            other => Self::Decode(other.to_string()),
        }
    }
}

impl From<gloo_net::Error> for ConsoleError {
    fn from(err: gloo_net::Error) -> Self {
        match err {
            gloo_net::Error::SerdeError(e) => Self::Decode(e.to_string()),
            other => Self::Request(other.to_string()),
        }
    }
}

pub(crate) fn js_error(value: &wasm_bindgen::JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            js_sys::Reflect::get(value, &"message".into())
                .ok()
                .and_then(|message| message.as_string())
        })
        .unwrap_or_else(|| format!("{value:?}"))
}
