//! Stream Scenario Tests
//!
//! Drives the live feed, history loader, thread reconstruction, chat session
//! and progress board through the same sequences the browser produces,
//! without any network.
//!
//! Run with: cargo test -p console-ui --test stream_scenarios

use std::ops::ControlFlow;

use console_types::{ChatFragment, ChatRole, ChatTurn, ExecutionLog, MessageKind};
use serde_json::{json, Value};

use console_ui::chat::{feed_chunk, ChatSession, ChatStreamDecoder, ReplyProgress};
use console_ui::history::HistorySnapshot;
use console_ui::progress::{ProgressBoard, ProgressUpdate};
use console_ui::stream::{ConnectionState, Delivery, LiveFeed};
use console_ui::thread::reconstruct_transcript;

fn event(value: Value) -> String {
    value.to_string()
}

fn execution_log(value: Value) -> ExecutionLog {
    serde_json::from_value(value).expect("valid execution log fixture")
}

/// Feed `chunks` through a decoder into `session` the way the transport does.
fn stream_reply(session: &mut ChatSession, chunks: &[&[u8]]) -> Vec<ReplyProgress> {
    let mut decoder = ChatStreamDecoder::new();
    let mut seen = Vec::new();
    for chunk in chunks {
        let flow = feed_chunk(&mut decoder, chunk, &mut |fragment: ChatFragment| {
            let progress = session.apply_fragment(fragment);
            let stop = !matches!(progress, ReplyProgress::Streaming);
            seen.push(progress);
            if stop {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        if flow.is_break() {
            break;
        }
    }
    seen
}

#[test]
fn test_live_events_append_in_arrival_order() {
    let mut feed = LiveFeed::default();
    let ticket = feed.activate(42);
    feed.opened(&ticket);

    let events = [
        event(json!({"type": "init", "message": "session 1"})),
        event(json!({"type": "SystemMessage", "message": "cloning", "progress": 10})),
        event(json!({"type": "AssistantMessage", "text": "Reading files"})),
        event(json!({"type": "UserMessage", "text": "continue"})),
        event(json!({"type": "ToolCall", "text": "ls -la"})),
        event(json!({"type": "ResultMessage", "text": "ok", "duration_ms": 1200, "cost_usd": 0.02})),
    ];
    for data in &events {
        assert_eq!(feed.deliver(&ticket, data), Delivery::Appended);
    }

    let types: Vec<&str> = feed.messages().iter().map(|m| m.type_name()).collect();
    assert_eq!(
        types,
        vec!["init", "SystemMessage", "AssistantMessage", "UserMessage", "ToolCall", "ResultMessage"]
    );
    assert_eq!(feed.connection(), ConnectionState::Open);
}

#[test]
fn test_nothing_appended_after_end() {
    let mut feed = LiveFeed::default();
    let ticket = feed.activate(42);
    feed.deliver(&ticket, &event(json!({"type": "AssistantMessage", "text": "one"})));
    assert_eq!(
        feed.deliver(&ticket, &event(json!({"type": "end", "status": "completed"}))),
        Delivery::Terminal
    );

    for _ in 0..3 {
        assert_eq!(
            feed.deliver(&ticket, &event(json!({"type": "AssistantMessage", "text": "late"}))),
            Delivery::Stale
        );
    }
    assert_eq!(feed.messages().len(), 1);
    assert_eq!(feed.connection(), ConnectionState::Finished);
    assert!(!feed.deactivate());
}

#[test]
fn test_malformed_payloads_never_panic() {
    let mut feed = LiveFeed::default();
    let ticket = feed.activate(1);
    for garbage in ["", "not json", "[1,2,3]", "{\"no_type\":true}", "null", "{\"type\":5}"] {
        assert_eq!(feed.deliver(&ticket, garbage), Delivery::Dropped, "payload {garbage:?}");
    }
    assert!(feed.messages().is_empty());

    let snapshot = HistorySnapshot::from_logs(vec![execution_log(json!({
        "id": 1,
        "task_id": 1,
        "execution_number": 1,
        "response_type": "failed",
        "response_content": "{\"truncated\": [",
    }))]);
    assert_eq!(snapshot.messages.len(), 1);
    assert!(matches!(snapshot.messages[0].kind, MessageKind::Raw { .. }));
}

#[test]
fn test_thread_resumption_keeps_only_chat_turns() {
    let content = json!([
        {"type": "UserMessage", "text": "A"},
        {"type": "AssistantMessage", "text": "B"},
        {"type": "SystemMessage", "text": "ignored"},
    ]);
    let log = execution_log(json!({
        "id": 3,
        "task_id": 9,
        "execution_number": 2,
        "response_type": "completed",
        "response_content": content.to_string(),
    }));

    let turns = reconstruct_transcript(&log);
    assert_eq!(turns, vec![ChatTurn::user("A"), ChatTurn::assistant("B")]);
    assert_eq!(log.response_content, content.to_string());
}

#[test]
fn test_fragment_split_mid_json_is_reassembled() {
    let mut decoder = ChatStreamDecoder::new();
    let mut fragments = decoder.push(b"data: {\"te");
    fragments.extend(decoder.push(b"xt\":\"hello\"}\n"));

    assert_eq!(fragments.len(), 1);
    assert_eq!(
        fragments[0].as_ref().expect("fragment decodes"),
        &ChatFragment::Text("hello".to_string())
    );
}

#[test]
fn test_progress_streams_are_independent() {
    let mut board = ProgressBoard::default();
    let x = board.track(1);
    let y = board.track(2);

    assert_eq!(
        board.apply(&x, &event(json!({"type": "SystemMessage", "progress": 40}))),
        ProgressUpdate::Updated(40)
    );
    assert_eq!(board.progress(2), 0);

    assert!(board.transport_failed(&y));
    assert_eq!(
        board.apply(&x, &event(json!({"type": "AssistantMessage", "progress": 70}))),
        ProgressUpdate::Updated(70)
    );
    assert_eq!(
        board.apply(&y, &event(json!({"type": "SystemMessage", "progress": 90}))),
        ProgressUpdate::Stale
    );
    assert_eq!(board.progress(1), 70);
    assert_eq!(board.progress(2), 0);

    assert_eq!(
        board.apply(&x, &event(json!({"type": "ResultMessage", "progress": 100}))),
        ProgressUpdate::Finished
    );
    assert!(!board.is_active(1));
}

#[test]
fn test_interleaved_progress_stays_per_task() {
    let mut board = ProgressBoard::default();
    let x = board.track(1);
    let y = board.track(2);

    for (ticket, value) in [(&x, 40), (&y, 10), (&x, 70), (&y, 20)] {
        assert_eq!(
            board.apply(ticket, &event(json!({"type": "SystemMessage", "progress": value}))),
            ProgressUpdate::Updated(value)
        );
    }
    assert_eq!(board.progress(1), 70);
    assert_eq!(board.progress(2), 20);
    assert!(board.is_active(1));
    assert!(board.is_active(2));
}

#[test]
fn test_end_without_result_is_resubscribed_while_listed_running() {
    let mut board = ProgressBoard::default();
    let ticket = board.track(1);
    board.apply(&ticket, &event(json!({"type": "SystemMessage", "progress": 30})));
    assert_eq!(
        board.apply(&ticket, &event(json!({"type": "end", "status": "cancelled"}))),
        ProgressUpdate::Ended
    );

    let plan = board.reconcile(&[1]);
    assert_eq!(plan.open, vec![1]);
    assert!(plan.close.is_empty());
    assert_eq!(board.progress(1), 30);

    assert_eq!(board.reconcile(&[]).close, vec![1]);
}

#[test]
fn test_new_thread_streams_reply_and_advances_thread() {
    let mut session = ChatSession::default();
    let mut minted = 0;
    let request = session
        .begin_send("hi", || {
            minted += 1;
            "thread_1700000000000_k3j9x2m1q".to_string()
        })
        .expect("send accepted");
    assert_eq!(minted, 1);
    assert_eq!(request.thread_id, "thread_1700000000000_k3j9x2m1q");
    assert_eq!(request.thread_number, 1);
    assert_eq!(request.messages, vec![ChatTurn::user("hi")]);

    let wire = serde_json::to_value(&request).expect("request serializes");
    assert!(wire.get("execution_number").is_none());

    assert_eq!(session.transcript().len(), 2);
    assert_eq!(session.transcript()[1].role, ChatRole::Assistant);

    let progress = stream_reply(
        &mut session,
        &[
            b"data: {\"text\":\"Hel\"}\n",
            b"data: {\"text\":\"lo!\"}\n",
            b"data: {\"done\":true}\n",
        ],
    );
    assert_eq!(
        progress,
        vec![ReplyProgress::Streaming, ReplyProgress::Streaming, ReplyProgress::Completed]
    );
    assert_eq!(session.transcript()[1].content, "Hello!");
    assert_eq!(session.thread().thread_number, 2);
    assert!(!session.is_sending());
}

#[test]
fn test_resumed_log_carries_execution_number() {
    let log = execution_log(json!({
        "id": 11,
        "task_id": 5,
        "execution_number": 7,
        "response_type": "completed",
        "response_content": json!([
            {"type": "UserMessage", "text": "what failed?"},
            {"type": "AssistantMessage", "text": "the migration"},
        ])
        .to_string(),
        "thread_id": "t1",
        "thread_number": 3,
    }));

    let mut session = ChatSession::default();
    session.resume(&log).expect("no reply in flight");
    assert_eq!(session.transcript().len(), 2);

    let request = session
        .begin_send("why?", || panic!("resumed thread must not mint an id"))
        .expect("send accepted");
    assert_eq!(request.thread_id, "t1");
    assert_eq!(request.thread_number, 3);
    assert_eq!(request.execution_number, Some(7));
    assert_eq!(request.messages.len(), 3);

    let wire = serde_json::to_value(&request).expect("request serializes");
    assert_eq!(wire["execution_number"], 7);
}

#[test]
fn test_error_fragment_stops_reply() {
    let mut session = ChatSession::default();
    session.begin_send("hi", || "thread_1_aaaaaaaaa".to_string()).expect("send accepted");

    let progress = stream_reply(
        &mut session,
        &[b"data: {\"error\":\"model overloaded\"}\ndata: {\"text\":\"ignored\"}\n"],
    );
    assert_eq!(progress, vec![ReplyProgress::Failed("model overloaded".to_string())]);
    assert_eq!(session.last_error(), Some("model overloaded"));
    assert_eq!(session.transcript(), &[ChatTurn::user("hi")]);
}

#[test]
fn test_history_after_live_run_uses_first_log() {
    let mut feed = LiveFeed::default();
    let live = feed.activate(8);
    feed.deliver(&live, &event(json!({"type": "AssistantMessage", "text": "streamed"})));
    feed.deliver(&live, &event(json!({"type": "end"})));

    let ticket = feed.begin_history(8);
    assert_eq!(feed.messages().len(), 1);

    let snapshot = HistorySnapshot::from_logs(vec![
        execution_log(json!({
            "id": 2,
            "task_id": 8,
            "execution_number": 2,
            "response_type": "completed",
            "response_content": json!([{"type": "AssistantMessage", "text": "persisted"}]).to_string(),
        })),
        execution_log(json!({
            "id": 1,
            "task_id": 8,
            "execution_number": 1,
            "response_type": "failed",
            "response_content": "boom",
        })),
    ]);
    assert!(feed.apply_history(&ticket, snapshot.messages.clone()));
    assert_eq!(feed.messages()[0].display_text(), Some("persisted"));
    assert_eq!(snapshot.latest().map(|log| log.execution_number), Some(2));
}
