//! Streamed chat turns: line decoding, session state and the HTTP body
//! reader that connects them.

mod decoder;
mod session;
mod transport;

pub use decoder::ChatStreamDecoder;
pub use session::{ChatSession, ReplyProgress, SendRejected};
pub use transport::{feed_chunk, stream_chat, StreamOutcome};
