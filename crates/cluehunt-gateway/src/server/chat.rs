//! Room chat WebSocket endpoint.
//!
//! `GET /ws/{room_name}` authenticates the connecting player, checks room
//! ownership, and joins the connection to the room's broadcast group.
//! Inbound frames are queued for persistence and fanned out to the group;
//! the fan-out never waits on the database.

use std::sync::Arc;

use axum::Router;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use cluehunt_core::protocol::{ChatBroadcast, ChatFrame};

use crate::auth::TokenManager;
use crate::persist::{MessageWriter, WriteRequest};
use crate::registry::GroupRegistry;
use crate::storage::HuntDatabase;

/// Shared state behind the gateway routes.
#[derive(Clone)]
pub struct AppState {
    pub db: HuntDatabase,
    pub registry: Arc<GroupRegistry>,
    pub writer: MessageWriter,
    pub tokens: Arc<TokenManager>,
}

/// Build the gateway router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws/{room_name}", get(chat_ws))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct WsParams {
    /// Bearer token; browser WebSocket clients cannot set headers, so the
    /// query parameter is the common path.
    token: Option<String>,
}

/// Group name for a room's broadcast channel.
fn group_name(room_name: &str) -> String {
    format!("chat_{room_name}")
}

/// A player may only join rooms namespaced under their own username.
///
/// Prefix, not equality: "alice" owns "alice_puzzle1", "alice_lobby", and
/// any other room she opens under her own name.
pub(crate) fn authorize_room(room_name: &str, username: &str) -> bool {
    room_name.starts_with(&format!("{username}_"))
}

fn bearer_token<'a>(params: &'a WsParams, headers: &'a HeaderMap) -> Option<&'a str> {
    params.token.as_deref().or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
    })
}

/// `GET /ws/{room_name}` — authenticate, authorize the room, then upgrade.
pub async fn chat_ws(
    State(state): State<AppState>,
    Path(room_name): Path<String>,
    Query(params): Query<WsParams>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    // Rejections happen before the upgrade, so a denied client sees only a
    // closed connection and never holds group membership.
    let Some(token) = bearer_token(&params, &headers) else {
        debug!(room = %room_name, "Rejected connection without token");
        return StatusCode::UNAUTHORIZED.into_response();
    };
    let Ok(claims) = state.tokens.validate(token) else {
        debug!(room = %room_name, "Rejected connection with invalid token");
        return StatusCode::UNAUTHORIZED.into_response();
    };
    if !authorize_room(&room_name, &claims.username) {
        info!(room = %room_name, username = %claims.username, "Rejected connection to foreign room");
        return StatusCode::FORBIDDEN.into_response();
    }

    ws.on_upgrade(move |socket| handle_socket(state, socket, room_name, claims.username))
}

/// Drive one accepted connection until it closes.
async fn handle_socket(state: AppState, socket: WebSocket, room_name: String, username: String) {
    let connection_id = Uuid::new_v4();
    let group = group_name(&room_name);
    let mut queue = state.registry.join(&group, connection_id).await;
    info!(room = %room_name, username = %username, connection_id = %connection_id, "Connection open");

    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            queued = queue.recv() => match queued {
                Some(frame) => {
                    if sink.send(Message::Text(frame.into())).await.is_err() {
                        break;
                    }
                }
                // Evicted from the group (queue overflow); drop the connection.
                None => break,
            },
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    handle_frame(&state, &group, text.as_str()).await;
                }
                Some(Ok(Message::Close(_))) | None => break,
                // Ping/pong and binary frames are ignored.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!(connection_id = %connection_id, error = %e, "Socket error");
                    break;
                }
            },
        }
    }

    state.registry.leave(&group, connection_id).await;
    info!(room = %room_name, username = %username, connection_id = %connection_id, "Connection closed");
}

/// Handle one inbound text frame: queue the write, then fan out.
///
/// The broadcast always targets the connection's own group, while the
/// persisted record carries the frame's `room` and `team` as claimed; the
/// two may legitimately diverge. Malformed frames are dropped and the
/// connection stays open.
pub(crate) async fn handle_frame(state: &AppState, group: &str, text: &str) {
    let Ok(frame) = serde_json::from_str::<ChatFrame>(text) else {
        debug!(group = %group, "Dropping malformed chat frame");
        return;
    };

    state.writer.enqueue(WriteRequest {
        username: frame.username.clone(),
        team: frame.team.clone(),
        room: frame.room.clone(),
        content: frame.message.clone(),
    });

    match serde_json::to_string(&ChatBroadcast::from_frame(&frame)) {
        Ok(outbound) => {
            state.registry.broadcast(group, &outbound).await;
        }
        Err(e) => debug!(group = %group, error = %e, "Failed to serialize broadcast"),
    }
}
