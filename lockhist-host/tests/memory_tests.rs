use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use lockhist_host::{
    memory::MemoryHost,
    protocol::{HISTORY_REQUEST_TYPE, HISTORY_UPDATED_EVENT, MAX_HISTORY},
    CallDispatch, EventBus, HostError,
};
use serde_json::{json, Value};

fn entry(name: &str) -> Value {
    json!({ "name": name, "date": "01/01/2024 10:00:00", "state": "Away" })
}

fn counting_listener(counter: &Arc<AtomicUsize>) -> lockhist_host::Listener {
    let counter = counter.clone();
    Box::new(move |_: Value| {
        counter.fetch_add(1, Ordering::SeqCst);
    })
}

#[tokio::test]
async fn call_returns_history_in_stored_order() {
    let host = MemoryHost::new(vec![entry("Front Door"), entry("Back Door")]);

    let response = host
        .call(json!({ "type": HISTORY_REQUEST_TYPE }))
        .await
        .expect("history response");

    assert_eq!(
        json!({ "history": [entry("Front Door"), entry("Back Door")] }),
        response
    );
    assert_eq!(1, host.calls());
}

#[tokio::test]
async fn call_rejects_unknown_request_type() {
    let host = MemoryHost::default();

    let result = host.call(json!({ "type": "lock_history/unknown" })).await;

    assert!(matches!(result, Err(HostError::UnknownCommand(kind)) if kind == "lock_history/unknown"));
}

#[tokio::test]
async fn fail_next_call_fails_once() {
    let host = MemoryHost::default();
    host.fail_next_call("home_assistant_error", "backend unavailable");

    let first = host.call(json!({ "type": HISTORY_REQUEST_TYPE })).await;
    let second = host.call(json!({ "type": HISTORY_REQUEST_TYPE })).await;

    assert!(matches!(first, Err(HostError::Remote { .. })));
    assert!(second.is_ok());
}

#[test]
fn record_prepends_and_caps_history() {
    let host = MemoryHost::default();
    for index in 0..(MAX_HISTORY + 5) {
        host.record(entry(&format!("Tag {}", index)));
    }

    let history = host.history();

    assert_eq!(MAX_HISTORY, history.len());
    assert_eq!(entry(&format!("Tag {}", MAX_HISTORY + 4)), history[0]);
}

#[tokio::test]
async fn record_notifies_subscribed_listeners() {
    let host = MemoryHost::default();
    let received = Arc::new(AtomicUsize::new(0));

    let _subscription = host
        .subscribe(HISTORY_UPDATED_EVENT, counting_listener(&received))
        .await
        .expect("subscription");

    host.record(entry("Front Door"));
    host.emit("some_other_event", json!({}));

    assert_eq!(1, received.load(Ordering::SeqCst));
}

#[tokio::test]
async fn unsubscribed_listener_is_not_called() {
    let host = MemoryHost::default();
    let received = Arc::new(AtomicUsize::new(0));

    let mut subscription = host
        .subscribe(HISTORY_UPDATED_EVENT, counting_listener(&received))
        .await
        .expect("subscription");

    subscription.unsubscribe();
    subscription.unsubscribe();
    host.emit(HISTORY_UPDATED_EVENT, json!({}));

    assert_eq!(0, received.load(Ordering::SeqCst));
    assert_eq!(0, host.listener_count());
}

#[tokio::test]
async fn held_calls_resolve_in_release_order() {
    let host = MemoryHost::new(vec![entry("Front Door")]);
    host.hold();

    let first = tokio::spawn({
        let host = host.clone();
        async move { host.call(json!({ "type": HISTORY_REQUEST_TYPE })).await }
    });

    while host.held_calls() < 1 {
        tokio::task::yield_now().await;
    }

    assert!(!first.is_finished());
    assert!(host.release(0));

    let response = first.await.expect("join").expect("history response");
    assert_eq!(json!({ "history": [entry("Front Door")] }), response);
}

#[tokio::test]
async fn disconnect_ends_subscriptions_and_drops_listeners() {
    let host = MemoryHost::default();
    let received = Arc::new(AtomicUsize::new(0));

    let subscription = host
        .subscribe(HISTORY_UPDATED_EVENT, counting_listener(&received))
        .await
        .expect("subscription");
    let ended = subscription.ended();

    host.disconnect();
    host.record(entry("Front Door"));

    assert!(ended.is_cancelled());
    assert_eq!(0, host.listener_count());
    assert_eq!(0, received.load(Ordering::SeqCst));
}
