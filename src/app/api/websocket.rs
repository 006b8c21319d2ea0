//! `/ws`: pushes system stats to the dashboard on a fixed interval.

use super::AppState;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use serde_json::json;

pub async fn stats_socket(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    tracing::debug!("WebSocket connection requested");
    ws.on_upgrade(move |socket| push_stats(socket, state))
}

async fn push_stats(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    // First tick fires immediately
    let mut ticker = tokio::time::interval(state.stats_interval);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let frame = json!({
                    "type": "stats_update",
                    "data": state.stats().await,
                });
                if sender.send(Message::Text(frame.to_string().into())).await.is_err() {
                    break;
                }
            }
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::error!("WebSocket error: {}", e);
                    break;
                }
            },
        }
    }

    tracing::info!("WebSocket client disconnected");
}
