use std::sync::OnceLock;

pub const DEFAULT_API_PREFIX: &str = "/api";
const DEV_API_BASE: &str = "http://localhost:8080";
const API_BASE_KEY: &str = "console.api_base";
const API_PREFIX_KEY: &str = "console.api_prefix";

/// Where the task backend lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Origin of the backend; empty means same origin.
    pub api_base: String,
    /// Path prefix of every endpoint, e.g. `/api`.
    pub api_prefix: String,
}

impl ConsoleConfig {
    /// - On localhost: the API server on port 8080
    /// - Elsewhere: same origin (the API serves the static bundle)
    ///
    /// Explicit overrides win over both.
    pub fn resolve(
        hostname: &str,
        base_override: Option<String>,
        prefix_override: Option<String>,
    ) -> Self {
        let api_base = base_override
            .map(|base| base.trim().to_string())
            .filter(|base| !base.is_empty())
            .unwrap_or_else(|| {
                if hostname == "localhost" || hostname == "127.0.0.1" {
                    DEV_API_BASE.to_string()
                } else {
                    String::new()
                }
            });
        let api_prefix = prefix_override
            .map(|prefix| normalize_prefix(&prefix))
            .unwrap_or_else(|| DEFAULT_API_PREFIX.to_string());

        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            api_prefix,
        }
    }

    fn root(&self) -> String {
        format!("{}{}", self.api_base, self.api_prefix)
    }

    pub fn tasks_url(&self) -> String {
        format!("{}/tasks", self.root())
    }

    pub fn task_url(&self, task_id: i64) -> String {
        format!("{}/tasks/{task_id}", self.root())
    }

    pub fn execution_logs_url(&self, task_id: i64) -> String {
        format!("{}/tasks/{task_id}/execution-logs", self.root())
    }

    pub fn task_stream_url(&self, task_id: i64) -> String {
        format!("{}/tasks/{task_id}/stream", self.root())
    }

    pub fn chat_stream_url(&self, task_id: i64) -> String {
        format!("{}/tasks/{task_id}/chat/stream", self.root())
    }
}

fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

fn load_from_browser() -> ConsoleConfig {
    let window = web_sys::window();
    let hostname = window
        .as_ref()
        .and_then(|w| w.location().hostname().ok())
        .unwrap_or_default();
    let storage = window.and_then(|w| w.local_storage().ok().flatten());
    let read = |key: &str| {
        storage
            .as_ref()
            .and_then(|storage| storage.get_item(key).ok().flatten())
    };

    let config = ConsoleConfig::resolve(&hostname, read(API_BASE_KEY), read(API_PREFIX_KEY));
    dioxus_logger::tracing::info!(
        "Console API at '{}{}'",
        config.api_base,
        config.api_prefix
    );
    config
}

/// Computed at first use, like the rest of the browser-derived state.
static CONSOLE_CONFIG: OnceLock<ConsoleConfig> = OnceLock::new();

pub fn console_config() -> &'static ConsoleConfig {
    CONSOLE_CONFIG.get_or_init(load_from_browser)
}
