//! WebSocket endpoint for realtime events
//!
//! GET /ws?token=<JWT>
//! Browsers cannot set headers on a WebSocket, so the token travels in the
//! query string.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast;
use tokio::time::Duration;

use crate::error::AppResult;
use crate::middleware::auth::decode_token;
use crate::AppState;

use super::RealtimeEvent;

const PING_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Deserialize)]
pub struct WsAuthQuery {
    token: String,
}

pub async fn ws_handler(
    State(state): State<AppState>,
    Query(query): Query<WsAuthQuery>,
    ws: WebSocketUpgrade,
) -> AppResult<impl IntoResponse> {
    let user = decode_token(&query.token, &state.config.jwt.secret)?;
    let username = user.username;
    Ok(ws.on_upgrade(move |socket| session(socket, state, username)))
}

async fn session(socket: WebSocket, state: AppState, username: String) {
    let (mut sink, mut stream) = socket.split();
    let mut rx = state.hub.subscribe();

    tracing::info!(username = %username, "Realtime client connected");

    let mut ping = tokio::time::interval(PING_INTERVAL);
    ping.tick().await;

    loop {
        tokio::select! {
            _ = ping.tick() => {
                if sink.send(Message::Ping(Vec::new())).await.is_err() {
                    break;
                }
            }

            event = rx.recv() => {
                match event {
                    Ok(event) => {
                        if send_event(&mut sink, &event).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(username = %username, lagged = n, "Realtime client lagged, events skipped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }

            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    _ => {}
                }
            }
        }
    }

    tracing::info!(username = %username, "Realtime client disconnected");
}

async fn send_event<S>(sink: &mut S, event: &RealtimeEvent) -> Result<(), axum::Error>
where
    S: SinkExt<Message, Error = axum::Error> + Unpin,
{
    let text = event.to_frame().to_string();
    sink.send(Message::Text(text)).await
}
