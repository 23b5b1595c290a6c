
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use multiplayer_coordinator::protocol::{InputPayload, ServerMessage, SignalPayload};
use serde_json::json;
use test_helpers::start_test_server;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};

async fn connect_ws(
    addr: std::net::SocketAddr,
    code: &str,
    client_id: &str,
) -> tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>> {
    let url = format!("ws://{addr}/ws/multiplayer?code={code}&clientId={client_id}");
    let (stream, _) = tokio::time::timeout(Duration::from_secs(5), connect_async(&url))
        .await
        .expect("connect timed out")
        .expect("failed to connect");
    stream
}

async fn next_server_message(
    stream: &mut tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>,
) -> ServerMessage {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), stream.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended")
            .expect("frame error");
        if let WsMessage::Text(text) = frame {
            return serde_json::from_str(&text).expect("valid ServerMessage");
        }
    }
}

/// `ClientMessage` only derives `Deserialize` (the server never needs to
/// serialize frames it receives), so tests build the tagged JSON shape by
/// hand rather than through the type.
async fn send_client_message(
    stream: &mut tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>,
    message: serde_json::Value,
) {
    let json = message.to_string();
    stream.send(WsMessage::Text(json.into())).await.unwrap();
}

#[tokio::test]
async fn create_join_and_input_relay_reaches_only_the_host() {
    let addr = start_test_server().await;
    let client = reqwest::Client::new();

    let created: serde_json::Value = client
        .post(format!("http://{addr}/api/multiplayer/sessions"))
        .json(&json!({ "hostName": "Host" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let code = created["code"].as_str().unwrap().to_string();
    let host_id = created["clientId"].as_str().unwrap().to_string();

    let joined: serde_json::Value = client
        .post(format!("http://{addr}/api/multiplayer/sessions/{code}/join"))
        .json(&json!({ "name": "Guest" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let guest_id = joined["clientId"].as_str().unwrap().to_string();

    let mut host_ws = connect_ws(addr, &code, &host_id).await;
    let mut guest_ws = connect_ws(addr, &code, &guest_id).await;

    // Both connections get an initial room_state snapshot.
    assert!(matches!(next_server_message(&mut host_ws).await, ServerMessage::RoomState { .. }));
    assert!(matches!(next_server_message(&mut guest_ws).await, ServerMessage::RoomState { .. }));
    // Host also observes the guest's attach broadcast.
    assert!(matches!(next_server_message(&mut host_ws).await, ServerMessage::RoomState { .. }));

    send_client_message(
        &mut guest_ws,
        json!({
            "type": "input",
            "payload": { "kind": "digital", "control": "a", "pressed": true }
        }),
    )
    .await;

    match next_server_message(&mut host_ws).await {
        ServerMessage::RemoteInput { from_client_id, payload, .. } => {
            assert_eq!(from_client_id, guest_id);
            assert!(matches!(payload, InputPayload::Digital { pressed: true, .. }));
        }
        other => panic!("expected RemoteInput, got {other:?}"),
    }
}

#[tokio::test]
async fn chat_broadcasts_to_every_member_including_the_sender() {
    let addr = start_test_server().await;
    let client = reqwest::Client::new();

    let created: serde_json::Value = client
        .post(format!("http://{addr}/api/multiplayer/sessions"))
        .json(&json!({ "hostName": "Host" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let code = created["code"].as_str().unwrap().to_string();
    let host_id = created["clientId"].as_str().unwrap().to_string();

    let mut host_ws = connect_ws(addr, &code, &host_id).await;
    let _ = next_server_message(&mut host_ws).await; // initial snapshot

    send_client_message(&mut host_ws, json!({ "type": "chat", "text": "hello room" })).await;

    match next_server_message(&mut host_ws).await {
        ServerMessage::Chat { entry } => assert_eq!(entry.message, "hello room"),
        other => panic!("expected Chat, got {other:?}"),
    }
}

#[tokio::test]
async fn guest_host_rom_advisory_is_ignored_but_host_applies() {
    let addr = start_test_server().await;
    let client = reqwest::Client::new();

    let created: serde_json::Value = client
        .post(format!("http://{addr}/api/multiplayer/sessions"))
        .json(&json!({ "hostName": "Host" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let code = created["code"].as_str().unwrap().to_string();
    let host_id = created["clientId"].as_str().unwrap().to_string();

    let joined: serde_json::Value = client
        .post(format!("http://{addr}/api/multiplayer/sessions/{code}/join"))
        .json(&json!({ "name": "Guest" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let guest_id = joined["clientId"].as_str().unwrap().to_string();

    let mut guest_ws = connect_ws(addr, &code, &guest_id).await;
    let _ = next_server_message(&mut guest_ws).await; // initial snapshot

    send_client_message(&mut guest_ws, json!({ "type": "host_rom", "romId": "sneaky" })).await;

    let snapshot: serde_json::Value = client
        .get(format!("http://{addr}/api/multiplayer/sessions/{code}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(snapshot["romId"].is_null());

    let mut host_ws = connect_ws(addr, &code, &host_id).await;
    let _ = next_server_message(&mut host_ws).await;

    send_client_message(
        &mut host_ws,
        json!({ "type": "host_rom", "romId": "mario-64", "romTitle": "Super Mario 64" }),
    )
    .await;

    let snapshot: serde_json::Value = client
        .get(format!("http://{addr}/api/multiplayer/sessions/{code}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(snapshot["romId"], "mario-64");
}

#[tokio::test]
async fn reconnecting_supersedes_the_prior_connection_with_close_4409() {
    let addr = start_test_server().await;
    let client = reqwest::Client::new();

    let created: serde_json::Value = client
        .post(format!("http://{addr}/api/multiplayer/sessions"))
        .json(&json!({ "hostName": "Host" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let code = created["code"].as_str().unwrap().to_string();
    let host_id = created["clientId"].as_str().unwrap().to_string();

    let mut first = connect_ws(addr, &code, &host_id).await;
    let _ = next_server_message(&mut first).await;

    let mut second = connect_ws(addr, &code, &host_id).await;
    let _ = next_server_message(&mut second).await; // fresh snapshot for the new connection

    let close_frame = tokio::time::timeout(Duration::from_secs(5), first.next())
        .await
        .expect("timed out waiting for close")
        .expect("stream ended without a close frame")
        .expect("frame error");
    match close_frame {
        WsMessage::Close(Some(frame)) => assert_eq!(u16::from(frame.code), 4409),
        other => panic!("expected a 4409 close frame, got {other:?}"),
    }
}

#[tokio::test]
async fn kicking_a_member_closes_their_connection_with_4403() {
    let addr = start_test_server().await;
    let client = reqwest::Client::new();

    let created: serde_json::Value = client
        .post(format!("http://{addr}/api/multiplayer/sessions"))
        .json(&json!({ "hostName": "Host" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let code = created["code"].as_str().unwrap().to_string();
    let host_id = created["clientId"].as_str().unwrap().to_string();

    let joined: serde_json::Value = client
        .post(format!("http://{addr}/api/multiplayer/sessions/{code}/join"))
        .json(&json!({ "name": "Guest" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let guest_id = joined["clientId"].as_str().unwrap().to_string();

    let mut guest_ws = connect_ws(addr, &code, &guest_id).await;
    let _ = next_server_message(&mut guest_ws).await;

    let kick_response: serde_json::Value = client
        .post(format!("http://{addr}/api/multiplayer/sessions/{code}/kick"))
        .json(&json!({ "clientId": host_id, "targetClientId": guest_id }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(kick_response["kicked"], true);

    let close_frame = tokio::time::timeout(Duration::from_secs(5), guest_ws.next())
        .await
        .expect("timed out waiting for close")
        .expect("stream ended without a close frame")
        .expect("frame error");
    match close_frame {
        WsMessage::Close(Some(frame)) => assert_eq!(u16::from(frame.code), 4403),
        other => panic!("expected a 4403 close frame, got {other:?}"),
    }
}

#[tokio::test]
async fn closing_a_session_broadcasts_session_closed_and_evicts_after_grace() {
    let addr = start_test_server().await;
    let client = reqwest::Client::new();

    let created: serde_json::Value = client
        .post(format!("http://{addr}/api/multiplayer/sessions"))
        .json(&json!({ "hostName": "Host" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let code = created["code"].as_str().unwrap().to_string();
    let host_id = created["clientId"].as_str().unwrap().to_string();

    let mut host_ws = connect_ws(addr, &code, &host_id).await;
    let _ = next_server_message(&mut host_ws).await;

    let close_response: serde_json::Value = client
        .post(format!("http://{addr}/api/multiplayer/sessions/{code}/close"))
        .json(&json!({ "clientId": host_id }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(close_response["closed"], true);

    match next_server_message(&mut host_ws).await {
        ServerMessage::SessionClosed { .. } => {}
        other => panic!("expected SessionClosed, got {other:?}"),
    }

    // The session is still look-up-able immediately after close (closed_grace_ms hasn't elapsed).
    let still_there = client
        .get(format!("http://{addr}/api/multiplayer/sessions/{code}"))
        .send()
        .await
        .unwrap();
    assert_eq!(still_there.status(), reqwest::StatusCode::OK);
}

#[tokio::test]
async fn webrtc_signal_relay_is_opaque_and_byte_identical() {
    let addr = start_test_server().await;
    let client = reqwest::Client::new();

    let created: serde_json::Value = client
        .post(format!("http://{addr}/api/multiplayer/sessions"))
        .json(&json!({ "hostName": "Host" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let code = created["code"].as_str().unwrap().to_string();
    let host_id = created["clientId"].as_str().unwrap().to_string();

    let joined: serde_json::Value = client
        .post(format!("http://{addr}/api/multiplayer/sessions/{code}/join"))
        .json(&json!({ "name": "Guest" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let guest_id = joined["clientId"].as_str().unwrap().to_string();

    let mut host_ws = connect_ws(addr, &code, &host_id).await;
    let mut guest_ws = connect_ws(addr, &code, &guest_id).await;
    let _ = next_server_message(&mut host_ws).await;
    let _ = next_server_message(&mut guest_ws).await;
    let _ = next_server_message(&mut host_ws).await; // guest attach broadcast

    let sdp = "v=0\r\no=- 1 1 IN IP4 127.0.0.1\r\n".to_string();
    send_client_message(
        &mut guest_ws,
        json!({
            "type": "webrtc_signal",
            "targetClientId": host_id,
            "payload": { "kind": "offer", "sdp": sdp }
        }),
    )
    .await;

    match next_server_message(&mut host_ws).await {
        ServerMessage::WebrtcSignal { from_client_id, payload } => {
            assert_eq!(from_client_id, guest_id);
            match payload {
                SignalPayload::Offer { sdp: received } => assert_eq!(received, sdp),
                other => panic!("expected Offer, got {other:?}"),
            }
        }
        other => panic!("expected WebrtcSignal, got {other:?}"),
    }
}
