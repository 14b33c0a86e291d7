//! Live updates over WebSocket.
//!
//! The browser connects with `GET /ws?token=<access token>`. After the upgrade
//! every [`LiveEvent`] addressed to that user is forwarded as
//! `{event, payload, timestamp}` JSON.

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

use vital_watch_domain::auth::token::{validate_token_of_type, TokenType};
use vital_watch_domain::events::LiveEvent;

use super::error::ErrorResponse;
use super::handlers::vitals::VitalsService;
use super::state::AppState;

/// Inbound text frame that records a new simulated reading
pub const SIMULATE_COMMAND: &str = "simulate";

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub token: Option<String>,
}

/// Authenticate from the query string, then upgrade
pub async fn ws_handler(
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
) -> Response {
    let Some(token) = query.token.filter(|t| !t.is_empty()) else {
        return ErrorResponse::unauthorized("Missing token").into_response();
    };
    let claims = match validate_token_of_type(&token, TokenType::Access) {
        Ok(claims) => claims,
        Err(e) => {
            debug!(error = %e, "WebSocket token rejected");
            return ErrorResponse::unauthorized("Invalid or expired token").into_response();
        }
    };

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return rejection.into_response(),
    };

    // Subscribe before the upgrade so the first simulated reading is not missed
    let events = state.services.bus.subscribe();
    let vitals = state.services.vitals.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, claims.sub, vitals, events))
}

async fn handle_socket(
    socket: WebSocket,
    user_id: String,
    vitals: VitalsService,
    mut events: broadcast::Receiver<LiveEvent>,
) {
    info!(user_id = %user_id, "WebSocket connected");

    let (mut sink, mut stream) = socket.split();

    let sender_user = user_id.clone();
    let send_task = tokio::spawn(async move {
        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(user_id = %sender_user, skipped, "WebSocket client lagging, events dropped");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            if event.user_id != sender_user {
                continue;
            }
            let text = event.to_message().to_string();
            if sink.send(Message::Text(text)).await.is_err() {
                debug!(user_id = %sender_user, "WebSocket sink closed");
                break;
            }
        }
    });

    simulate(&vitals, &user_id).await;

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Text(text)) if text.trim() == SIMULATE_COMMAND => simulate(&vitals, &user_id).await,
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!(user_id = %user_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    send_task.abort();
    info!(user_id = %user_id, "WebSocket disconnected");
}

/// Record a simulated reading; the service publishes the update on the bus
async fn simulate(vitals: &VitalsService, user_id: &str) {
    if let Err(e) = vitals.simulate(user_id, false).await {
        warn!(user_id, error = %e, "Simulated reading failed");
    }
}
