//! WebSocket plumbing: one reader loop and one writer pump per
//! connection.
//!
//! The writer pump drains the connection's event channel — the same
//! channel the room actor fans out into — so everything a client sees
//! arrives in the order it was emitted. The reader loop decodes
//! [`ClientEvent`]s and hands them to the gateway; when the socket
//! closes, the disconnect is routed into whatever room the connection
//! was part of.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use quizwire_protocol::{ClientEvent, Codec, ConnectionId, JsonCodec, ProtocolError, ServerEvent};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use crate::gateway;
use crate::server::ServerState;
use crate::ServerError;

/// Counter backing connection-scoped identity. Ids are never reused
/// within a process lifetime.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

fn next_connection_id() -> ConnectionId {
    ConnectionId(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
}

/// Serializes a server event into a text frame.
fn to_text_frame(
    codec: &JsonCodec,
    event: &ServerEvent,
) -> Result<Message, ProtocolError> {
    let bytes = codec.encode(event)?;
    let text = String::from_utf8(bytes)
        .map_err(|e| ProtocolError::InvalidMessage(e.to_string()))?;
    Ok(Message::Text(text.into()))
}

/// Drives one client connection from WebSocket upgrade to close.
pub(crate) async fn serve_socket(
    stream: TcpStream,
    state: Arc<ServerState>,
) -> Result<(), ServerError> {
    let ws = tokio_tungstenite::accept_async(stream).await?;
    let (mut ws_sender, mut ws_receiver) = ws.split();

    let conn = next_connection_id();
    let codec = JsonCodec;
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();

    tracing::debug!(%conn, "websocket connection established");

    // Writer pump: event channel → socket.
    let writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let frame = match to_text_frame(&codec, &event) {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to encode event");
                    continue;
                }
            };
            if ws_sender.send(frame).await.is_err() {
                break;
            }
        }
    });

    // Reader loop: socket → gateway.
    while let Some(result) = ws_receiver.next().await {
        let message = match result {
            Ok(message) => message,
            Err(e) => {
                tracing::debug!(%conn, error = %e, "websocket read error");
                break;
            }
        };
        let data: Vec<u8> = match message {
            Message::Text(text) => text.as_bytes().to_vec(),
            Message::Binary(bytes) => bytes.into(),
            Message::Close(_) => break,
            // Ping/pong handled by tungstenite.
            _ => continue,
        };
        match codec.decode::<ClientEvent>(&data) {
            Ok(event) => {
                gateway::handle_event(&state, conn, &tx, event).await;
            }
            Err(e) => {
                tracing::debug!(%conn, error = %e, "undecodable client event");
                let _ = tx.send(ServerEvent::Error {
                    message: "Malformed event.".to_string(),
                });
            }
        }
    }

    gateway::handle_disconnect(&state, conn).await;
    writer.abort();
    tracing::debug!(%conn, "websocket connection closed");
    Ok(())
}
