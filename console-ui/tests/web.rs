//! Browser tests for the EventSource runtime.
//!
//! Run with: wasm-pack test --headless --firefox console-ui

#![cfg(target_arch = "wasm32")]

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen_test::*;

use console_ui::config::ConsoleConfig;
use console_ui::stream::{open_task_stream, StreamSignal};

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn close_is_idempotent_and_silences_callbacks() {
    let config = ConsoleConfig::resolve("console.test", None, None);
    let seen = Rc::new(RefCell::new(Vec::<StreamSignal>::new()));
    let sink = seen.clone();

    let runtime = open_task_stream(&config.task_stream_url(1), move |signal| {
        sink.borrow_mut().push(signal);
    })
    .expect("EventSource opens for a same-origin URL");

    assert!(!runtime.is_closed());
    runtime.close();
    runtime.close();
    assert!(runtime.is_closed());
    assert!(seen.borrow().is_empty());
}

#[wasm_bindgen_test]
fn drop_closes_the_source() {
    let config = ConsoleConfig::resolve("console.test", None, None);
    let runtime = open_task_stream(&config.task_stream_url(2), |_| {})
        .expect("EventSource opens for a same-origin URL");
    drop(runtime);
}
