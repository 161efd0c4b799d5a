/*
    Messaging Integration Tests

    Both contexts run over a live host:
    - sendMessage / sendResponse correlation, including late responses
    - concurrent calls keep distinct ids
    - fire-and-forget platform commands
*/

mod common;

use std::time::Duration;

use common::{memory_builder, next, start, PlatformCall, RecordingPlatform};
use extbridge_core::bridge::ContextId;
use extbridge_core::ListenerOutcome;
use serde_json::{json, Value};

#[tokio::test]
async fn test_send_message_gets_immediate_response() {
    let bridge = start(memory_builder());
    bridge.background.on_message().add(|msg, sender, _| {
        ListenerOutcome::Respond(json!({"pong": msg["ping"], "via": sender.id}))
    });

    let reply = bridge.ui.send_message(&json!({"ping": 1})).await.unwrap();

    assert_eq!(reply, json!({"pong": 1, "via": "extbridge"}));
    assert_eq!(bridge.ui.pending_calls(), 0);
    bridge.stop().await;
}

#[tokio::test]
async fn test_late_response_resolves_exact_payload() {
    let bridge = start(memory_builder());
    bridge.background.on_message().add(|msg, _, _| {
        let echoed = msg.clone();
        ListenerOutcome::Deferred(Box::pin(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Some(json!({"late": true, "request": echoed}))
        }))
    });

    let reply = bridge
        .ui
        .send_message(&json!({"method": "getPublicKey"}))
        .await
        .unwrap();

    assert_eq!(reply, json!({"late": true, "request": {"method": "getPublicKey"}}));
    bridge.stop().await;
}

#[tokio::test]
async fn test_responder_kept_for_later() {
    let bridge = start(memory_builder());
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    bridge.background.on_message().add(move |_, _, responder| {
        let _ = tx.send(responder.clone());
        ListenerOutcome::Pending
    });

    let ui = bridge.ui.clone();
    let call = tokio::spawn(async move { ui.send_message("approve?").await });

    let responder = next(&mut rx).await;
    assert!(responder.send(json!("approved")));
    assert!(!responder.send(json!("twice")));

    assert_eq!(call.await.unwrap().unwrap(), json!("approved"));
    bridge.stop().await;
}

#[tokio::test]
async fn test_concurrent_calls_resolve_independently() {
    let bridge = start(memory_builder());
    bridge.background.on_message().add(|msg, _, _| {
        let n = msg["n"].as_u64().unwrap_or_default();
        ListenerOutcome::Deferred(Box::pin(async move {
            // Answer in reverse order of arrival.
            tokio::time::sleep(Duration::from_millis(60 - n * 20)).await;
            Some(json!(n * 10))
        }))
    });

    let (first, second, third) = (json!({"n": 0}), json!({"n": 1}), json!({"n": 2}));
    let (a, b, c) = tokio::join!(
        bridge.ui.send_message(&first),
        bridge.ui.send_message(&second),
        bridge.ui.send_message(&third),
    );

    assert_eq!(a.unwrap(), json!(0));
    assert_eq!(b.unwrap(), json!(10));
    assert_eq!(c.unwrap(), json!(20));
    bridge.stop().await;
}

#[tokio::test]
async fn test_background_can_message_ui() {
    let bridge = start(memory_builder());
    bridge
        .ui
        .on_message()
        .add(|_, _, _| ListenerOutcome::Respond(Value::String("ui here".into())));

    let reply = bridge.background.send_message(&json!({})).await.unwrap();
    assert_eq!(reply, json!("ui here"));
    bridge.stop().await;
}

#[tokio::test]
async fn test_platform_commands_reach_handler() {
    let (platform, mut calls) = RecordingPlatform::new();
    let bridge = start(memory_builder().platform(platform));

    bridge.ui.navigate_to("vault.html").unwrap();
    bridge.ui.open_options_page().unwrap();
    bridge.background.copy_to_clipboard("npub1example").unwrap();

    let mut seen = vec![next(&mut calls).await, next(&mut calls).await, next(&mut calls).await];
    seen.sort_by_key(|call| format!("{call:?}"));

    assert_eq!(
        seen,
        vec![
            PlatformCall::Copy("npub1example".into()),
            PlatformCall::Navigate(ContextId::Ui, "full_settings.html".into()),
            PlatformCall::Navigate(ContextId::Ui, "vault.html".into()),
        ]
    );
    bridge.stop().await;
}

#[tokio::test]
async fn test_calls_fail_once_host_stopped() {
    let bridge = start(memory_builder());
    let ui = bridge.ui.clone();
    bridge.stop().await;

    let result = ui.storage().clear().await;
    assert!(matches!(result, Err(extbridge_core::BridgeError::Transport(_))));
    assert_eq!(ui.pending_calls(), 0);
}
