//! axum routes for fight snapshots and live spectating.

use std::sync::Arc;
use std::time::Instant;

use axum::{Json, Router};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::Deserialize;
use tokio::net::TcpListener;

use spoodblort_engine::fight::FightId;

use super::AppState;
use crate::broadcast;
use crate::spectators::{ClapOutcome, SpectatorId};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/fights/:id", get(get_fight))
        .route("/fights/:id/live", get(ws_upgrade))
        .with_state(state)
}

/// Serve until the listener fails. Runs on its own task.
pub async fn start(state: Arc<AppState>, bind: &str) {
    let listener = match TcpListener::bind(bind).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Web server failed to bind to {}: {}", bind, e);
            return;
        }
    };
    tracing::info!("Spectator endpoint listening on http://{}", bind);

    if let Err(e) = axum::serve(listener, router(state)).await {
        tracing::error!("Web server error: {}", e);
    }
}

async fn get_fight(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> Response {
    let fight = match state.repo.fight(FightId(id)) {
        Ok(Some(f)) => f,
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            tracing::error!(fight = id, "lookup failed: {:#}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    match state.snapshot(&fight, state.calendar.now()) {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => {
            tracing::error!(fight = id, "snapshot failed: {:#}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn ws_upgrade(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Response {
    let fight = FightId(id);
    match state.repo.fight(fight) {
        Ok(Some(_)) => ws.on_upgrade(move |socket| handle_socket(socket, state, fight)),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            tracing::error!(fight = id, "lookup failed: {:#}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    Clap,
}

/// Send the arrival snapshot, then relay broadcasts until either side hangs up.
async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>, fight: FightId) {
    let (spectator, mut rx) = state.spectators.join(fight);

    let opening = state
        .load_fight(fight)
        .and_then(|f| state.snapshot(&f, state.calendar.now()));
    match opening {
        Ok(snapshot) => {
            let text = broadcast::snapshot_message(&snapshot);
            if socket.send(Message::Text(text.to_string())).await.is_err() {
                state.spectators.leave(fight, spectator);
                return;
            }
        }
        Err(e) => tracing::warn!(fight = %fight, "no snapshot for spectator: {:#}", e),
    }

    loop {
        tokio::select! {
            outgoing = rx.recv() => {
                let Some(text) = outgoing else { break };
                if socket.send(Message::Text(text.to_string())).await.is_err() {
                    break;
                }
            }

            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => handle_client_message(&state, fight, spectator, &text),
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    _ => {} // pings are answered by axum
                }
            }
        }
    }

    state.spectators.leave(fight, spectator);
}

fn handle_client_message(state: &AppState, fight: FightId, spectator: SpectatorId, text: &str) {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::Clap) => {
            let Some(live) = state.live.live_state(fight).filter(|s| !s.is_complete) else {
                return;
            };
            let outcome = state.spectators.clap(fight, spectator, live.round, Instant::now());
            if outcome != ClapOutcome::Accepted {
                tracing::debug!(fight = %fight, spectator, "clap ignored: {:?}", outcome);
            }
        }
        Err(e) => tracing::debug!(fight = %fight, spectator, "ignoring message: {}", e),
    }
}
