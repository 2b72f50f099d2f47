use std::ops::ControlFlow;

use console_types::{ChatFragment, ChatStreamRequest, PayloadError};
use js_sys::{Reflect, Uint8Array};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::ReadableStreamDefaultReader;

use super::decoder::ChatStreamDecoder;
use crate::api::open_chat_stream;
use crate::error::{js_error, ConsoleError};

/// How a chat body stopped being read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    /// A terminal fragment arrived or the caller stopped reading.
    Terminated,
    /// The body ended before any terminal fragment.
    Ended,
}

/// Hand every fragment completed by `chunk` to `on_fragment`, stopping at
/// the first terminal fragment or when the callback breaks. Undecodable
/// lines are logged and skipped.
pub fn feed_chunk<F>(decoder: &mut ChatStreamDecoder, chunk: &[u8], on_fragment: &mut F) -> ControlFlow<()>
where
    F: FnMut(ChatFragment) -> ControlFlow<()>,
{
    for result in decoder.push(chunk) {
        dispatch(result, on_fragment)?;
    }
    ControlFlow::Continue(())
}

fn dispatch<F>(result: Result<ChatFragment, PayloadError>, on_fragment: &mut F) -> ControlFlow<()>
where
    F: FnMut(ChatFragment) -> ControlFlow<()>,
{
    match result {
        Ok(fragment) => {
            let terminal = fragment.is_terminal();
            on_fragment(fragment)?;
            if terminal {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        }
        Err(err) => {
            dioxus_logger::tracing::warn!("Skipping undecodable chat line: {}", err);
            ControlFlow::Continue(())
        }
    }
}

/// POST one chat turn and read its reply until a terminal fragment or the
/// end of the body. There is no read timeout.
pub async fn stream_chat<F>(
    task_id: i64,
    request: &ChatStreamRequest,
    mut on_fragment: F,
) -> Result<StreamOutcome, ConsoleError>
where
    F: FnMut(ChatFragment) -> ControlFlow<()>,
{
    let body = open_chat_stream(task_id, request).await?;
    let reader = body.get_reader().unchecked_into::<ReadableStreamDefaultReader>();
    let mut decoder = ChatStreamDecoder::new();

    loop {
        let chunk = JsFuture::from(reader.read()).await.map_err(|e| {
            dioxus_logger::tracing::error!("Chat stream read failed for task {}: {:?}", task_id, e);
            ConsoleError::Stream(js_error(&e))
        })?;

        let done = Reflect::get(&chunk, &"done".into())
            .ok()
            .and_then(|v| v.as_bool())
            .unwrap_or(true);
        if done {
            break;
        }

        let value = Reflect::get(&chunk, &"value".into())
            .map_err(|e| ConsoleError::Stream(js_error(&e)))?;
        let bytes = Uint8Array::new(&value).to_vec();
        dioxus_logger::tracing::debug!("Chat chunk for task {}: {} bytes", task_id, bytes.len());

        if feed_chunk(&mut decoder, &bytes, &mut on_fragment).is_break() {
            if let Err(e) = JsFuture::from(reader.cancel()).await {
                dioxus_logger::tracing::debug!(
                    "Cancelling chat body for task {} failed: {}",
                    task_id,
                    js_error(&e)
                );
            }
            return Ok(StreamOutcome::Terminated);
        }
    }

    if decoder.has_partial() {
        dioxus_logger::tracing::debug!("Chat body for task {} ended mid-line, flushing", task_id);
    }
    if let Some(result) = decoder.finish() {
        if dispatch(result, &mut on_fragment).is_break() {
            return Ok(StreamOutcome::Terminated);
        }
    }
    dioxus_logger::tracing::warn!("Chat stream for task {} ended without completion", task_id);
    Ok(StreamOutcome::Ended)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stops_at_first_terminal_fragment() {
        let mut decoder = ChatStreamDecoder::new();
        let mut seen = Vec::new();
        let flow = feed_chunk(
            &mut decoder,
            b"data: {\"text\":\"a\"}\ndata: {\"done\":true}\ndata: {\"text\":\"after\"}\n",
            &mut |fragment| {
                seen.push(fragment);
                ControlFlow::Continue(())
            },
        );
        assert!(flow.is_break());
        assert_eq!(seen, vec![ChatFragment::Text("a".into()), ChatFragment::Done]);
    }

    #[test]
    fn skips_bad_lines_and_honours_caller_break() {
        let mut decoder = ChatStreamDecoder::new();
        let mut seen = Vec::new();
        let flow = feed_chunk(
            &mut decoder,
            b"data: nope\ndata: {\"text\":\"x\"}\ndata: {\"text\":\"y\"}\n",
            &mut |fragment| {
                seen.push(fragment);
                ControlFlow::Break(())
            },
        );
        assert!(flow.is_break());
        assert_eq!(seen, vec![ChatFragment::Text("x".into())]);
    }
}
