//! WebSocket relay route.
//!
//! One socket per participant. Incoming text frames are decoded into
//! `ClientEvent`s and handed to the relay; everything the relay addresses to
//! this connection is forwarded from its outbox by a separate writer task.

use std::sync::Arc;

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    response::IntoResponse,
    Extension,
};
use futures::{SinkExt, StreamExt};

use crate::protocol::{ClientEvent, ServerEvent};
use crate::relay::{Outbox, Relay};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Extension(relay): Extension<Arc<Relay>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, relay))
}

async fn handle_socket(socket: WebSocket, relay: Arc<Relay>) {
    let (sender, mut receiver) = socket.split();
    let (conn, outbox) = relay.connect();

    let writer = tokio::spawn(forward_outbox(sender, outbox));

    while let Some(Ok(msg)) = receiver.next().await {
        let text = match msg {
            Message::Text(t) => t,
            Message::Close(_) => break,
            _ => continue,
        };

        match serde_json::from_str::<ClientEvent>(text.as_str()) {
            Ok(event) => relay.handle(conn, event),
            Err(e) => {
                tracing::debug!(connection = %conn, "Undecodable frame: {e}");
                relay.send_to(conn, ServerEvent::Error(format!("Invalid message: {e}")));
            }
        }
    }

    relay.disconnect(conn);
    writer.abort();
}

// ---- Helper: drain the outbox into the socket ----

async fn forward_outbox(
    mut sender: futures::stream::SplitSink<WebSocket, Message>,
    mut outbox: Outbox,
) {
    while let Some(event) = outbox.recv().await {
        let json = match serde_json::to_string(&event) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("Failed to encode event: {e}");
                continue;
            }
        };
        if sender.send(Message::Text(json.into())).await.is_err() {
            break;
        }
    }
}
