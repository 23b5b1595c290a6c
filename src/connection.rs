//! Connection Endpoint (C4): duplex handshake, heartbeat, and per-frame
//! dispatch for one attached member.
//!
//! Runs as a single task per connection, `select!`-ing between the
//! session's outbound bus queue, a heartbeat timer, and inbound frames —
//! the "dual send/receive" shape from spec §4.4 collapsed onto one task
//! since neither direction ever blocks the other here.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures_util::{SinkExt, StreamExt};

use crate::config::ServerConfig;
use crate::error::{close_code, ErrorCode};
use crate::metrics::Metrics;
use crate::protocol::{ClientId, ClientMessage, InputPayload, ServerMessage};
use crate::registry::{SessionHandle, SessionRegistry};
use crate::session::SessionError;

async fn close_with(socket: &mut WebSocket, code: u16, reason: &str) {
    let _ = socket
        .send(Message::Close(Some(CloseFrame {
            code,
            reason: reason.to_string().into(),
        })))
        .await;
}

async fn send_json(socket: &mut WebSocket, message: &ServerMessage) -> bool {
    match serde_json::to_string(message) {
        Ok(text) => socket.send(Message::Text(text.into())).await.is_ok(),
        Err(err) => {
            tracing::error!(%err, "failed to serialize outbound frame");
            false
        }
    }
}

/// `None` means the value must be rejected, not relayed (§4.7: NaN/Infinity
/// are a validation failure, not a value to coerce to zero).
fn clamp_analog(value: f32, deadzone: f32) -> Option<f32> {
    if !value.is_finite() {
        return None;
    }
    let clamped = value.clamp(-1.0, 1.0);
    Some(if clamped.abs() < deadzone { 0.0 } else { clamped })
}

fn clamp_input(payload: InputPayload, deadzone: f32) -> Result<InputPayload, ()> {
    match payload {
        InputPayload::Digital { .. } => Ok(payload),
        InputPayload::Analog { x, y } => {
            let x = clamp_analog(x, deadzone).ok_or(())?;
            let y = clamp_analog(y, deadzone).ok_or(())?;
            Ok(InputPayload::Analog { x, y })
        }
    }
}

/// Drives one attached connection end to end: handshake, fan-out loop,
/// cleanup. Spawned from the `/ws` upgrade handler.
pub async fn handle_socket(
    mut socket: WebSocket,
    registry: SessionRegistry,
    metrics: Arc<Metrics>,
    config: Arc<ServerConfig>,
    code: String,
    client_id: ClientId,
) {
    let Some(handle) = registry.lookup(&code) else {
        close_with(&mut socket, close_code::AUTH, "session not found").await;
        return;
    };

    let attach = handle.with_mut(|session| session.socket_attach(&client_id)).await;
    if let Err(err) = attach {
        let wire_code = match err {
            SessionError::Closed => close_code::SESSION_CLOSED,
            _ => close_code::AUTH,
        };
        close_with(&mut socket, wire_code, "unknown or closed member").await;
        return;
    }

    let is_host = handle.with_mut(|session| session.is_host(&client_id)).await;
    let mut subscription = handle
        .bus
        .subscribe(client_id.clone(), config.max_chat_backlog.max(8))
        .await;

    metrics.ws_connections_accepted.fetch_add(1, Ordering::Relaxed);
    tracing::info!(%code, %client_id, is_host, "connection attached");

    let initial_snapshot = handle.snapshot().await;
    if !send_json(
        &mut socket,
        &ServerMessage::RoomState {
            session: initial_snapshot,
        },
    )
    .await
    {
        handle.with_mut(|session| session.socket_detach(&client_id)).await.ok();
        handle.bus.unsubscribe(&client_id).await;
        return;
    }
    broadcast_snapshot(&handle).await;

    let mut heartbeat = tokio::time::interval(Duration::from_millis(
        config.socket_heartbeat_interval_ms.max(1),
    ));
    heartbeat.tick().await; // first tick fires immediately; skip it

    loop {
        tokio::select! {
            _ = &mut subscription.superseded => {
                close_with(&mut socket, close_code::SUPERSEDED, "superseded by a newer connection").await;
                break;
            }
            _ = &mut subscription.kicked => {
                close_with(&mut socket, close_code::KICKED, "removed by the host").await;
                break;
            }
            _ = heartbeat.tick() => {
                if socket.send(Message::Ping(Vec::new().into())).await.is_err() {
                    break;
                }
            }
            outgoing = subscription.receiver.recv() => {
                match outgoing {
                    Some(message) => {
                        if !send_json(&mut socket, &message).await {
                            break;
                        }
                    }
                    None => break,
                }
            }
            incoming = socket.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        dispatch_frame(&handle, &metrics, &config, &client_id, is_host, &text).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        tracing::trace!(%err, %client_id, "duplex read error");
                        break;
                    }
                }
            }
        }
    }

    handle.with_mut(|session| session.socket_detach(&client_id)).await.ok();
    handle.bus.unsubscribe(&client_id).await;
    broadcast_snapshot(&handle).await;
    tracing::info!(%code, %client_id, "connection detached");
}

async fn broadcast_snapshot(handle: &SessionHandle) {
    let snapshot = handle.snapshot().await;
    handle
        .bus
        .broadcast_room_state(ServerMessage::RoomState { session: snapshot })
        .await;
}

async fn dispatch_frame(
    handle: &SessionHandle,
    metrics: &Metrics,
    config: &ServerConfig,
    client_id: &str,
    is_host: bool,
    text: &str,
) {
    let message: ClientMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(_) => {
            handle
                .bus
                .send_to(
                    client_id,
                    ServerMessage::Error {
                        code: ErrorCode::InvalidInput,
                        message: "malformed frame".to_string(),
                    },
                )
                .await;
            return;
        }
    };

    match message {
        ClientMessage::Ping => {
            handle.bus.send_to(client_id, ServerMessage::Pong).await;
        }

        // I5/I6: input only ever flows guest -> host, and never back to its
        // sender; a host sending an input frame is a protocol misuse, ignored.
        ClientMessage::Input { payload } => {
            if is_host {
                return;
            }
            let clamped = match clamp_input(payload, config.remote_analog_deadzone) {
                Ok(clamped) => clamped,
                Err(()) => {
                    handle
                        .bus
                        .send_to(
                            client_id,
                            ServerMessage::Error {
                                code: ErrorCode::InvalidInput,
                                message: "analog input must be finite".to_string(),
                            },
                        )
                        .await;
                    return;
                }
            };
            let (host_id, from_slot, from_name) = handle
                .with_mut(|session| {
                    let host_id = session.host_client_id.clone();
                    let member = session.member(client_id);
                    (
                        host_id,
                        member.map_or(0, |m| m.slot),
                        member.map_or_else(String::new, |m| m.name.clone()),
                    )
                })
                .await;
            let delivered = handle
                .bus
                .send_to(
                    &host_id,
                    ServerMessage::RemoteInput {
                        from_client_id: client_id.to_string(),
                        from_slot,
                        from_name,
                        at: crate::clock::now_ms(),
                        payload: clamped,
                    },
                )
                .await;
            if delivered {
                metrics.input_frames_relayed.fetch_add(1, Ordering::Relaxed);
            } else {
                metrics.input_frames_dropped.fetch_add(1, Ordering::Relaxed);
            }
        }

        ClientMessage::Chat { text } => {
            match crate::protocol::validation::validate_chat_text(&text, config) {
                Ok(validated) => {
                    let result = handle.with_mut(|session| session.chat(client_id, validated)).await;
                    if let Ok(entry) = result {
                        let overloaded = handle.bus.broadcast_chat(ServerMessage::Chat { entry }).await;
                        for victim in overloaded {
                            handle.bus.unsubscribe(&victim).await;
                            metrics.chat_disconnects.fetch_add(1, Ordering::Relaxed);
                            tracing::warn!(client_id = %victim, "chat backlog exceeded, disconnecting");
                        }
                        metrics.chat_sent.fetch_add(1, Ordering::Relaxed);
                    }
                }
                Err(reason) => {
                    handle
                        .bus
                        .send_to(
                            client_id,
                            ServerMessage::Error {
                                code: ErrorCode::InvalidChatMessage,
                                message: reason,
                            },
                        )
                        .await;
                }
            }
        }

        ClientMessage::HostRom { rom_id, rom_title } => {
            handle
                .with_mut(|session| session.set_host_rom(client_id, rom_id, rom_title))
                .await;
            broadcast_snapshot(handle).await;
        }

        ClientMessage::WebrtcSignal {
            target_client_id,
            payload,
        } => {
            handle
                .bus
                .send_to(
                    &target_client_id,
                    ServerMessage::WebrtcSignal {
                        from_client_id: client_id.to_string(),
                        payload,
                    },
                )
                .await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analog_deadzone_zeroes_small_magnitudes() {
        assert_eq!(clamp_analog(0.01, 0.03), Some(0.0));
        assert_eq!(clamp_analog(-0.01, 0.03), Some(0.0));
    }

    #[test]
    fn analog_clamps_out_of_range_values() {
        assert_eq!(clamp_analog(2.0, 0.03), Some(1.0));
        assert_eq!(clamp_analog(-5.0, 0.03), Some(-1.0));
    }

    #[test]
    fn analog_nan_and_infinity_are_rejected() {
        assert_eq!(clamp_analog(f32::NAN, 0.03), None);
        assert_eq!(clamp_analog(f32::INFINITY, 0.03), None);
        assert_eq!(clamp_analog(f32::NEG_INFINITY, 0.03), None);
    }

    #[test]
    fn digital_input_passes_through_untouched() {
        let payload = InputPayload::Digital {
            control: crate::protocol::DigitalControl::A,
            pressed: true,
        };
        let clamped = clamp_input(payload.clone(), 0.03).unwrap();
        match clamped {
            InputPayload::Digital { pressed, .. } => assert!(pressed),
            InputPayload::Analog { .. } => panic!("digital payload should not become analog"),
        }
    }

    #[test]
    fn non_finite_analog_input_is_rejected_not_clamped() {
        let payload = InputPayload::Analog { x: f32::NAN, y: 0.0 };
        assert!(clamp_input(payload, 0.03).is_err());
    }
}
