pub mod api;
pub mod app;
pub mod chat;
pub mod components;
pub mod config;
pub mod error;
pub mod history;
pub mod progress;
pub mod stream;
pub mod thread;

pub use app::{App, Route};
pub use error::ConsoleError;
