/// Failure to decode a payload received from the backend.
///
/// Every decoder in this crate returns this instead of panicking; callers
/// decide whether the unit is dropped or degraded to raw text.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Payload is not a JSON object")]
    NotAnObject,

    #[error("Payload has no message type")]
    MissingType,

    #[error("Response content is not a message sequence")]
    NotASequence,

    #[error("Unrecognised chat fragment: {0}")]
    UnknownFragment(String),

    #[error("API rejected request (code {code}): {message}")]
    EnvelopeRejected { code: i64, message: String },
}
