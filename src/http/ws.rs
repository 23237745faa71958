use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, WebSocketUpgrade};
use axum::response::Response;
use tracing::*;

/// Attempt to establish websocket
pub async fn handle_websocket_request(
    ws: WebSocketUpgrade,
    Path(test_id): Path<String>,
) -> Response {
    ws.on_upgrade(move |socket| echo_test_messages(socket, test_id))
}

/// Pure pass-through: every text frame is echoed back tagged with the test id
async fn echo_test_messages(mut socket: WebSocket, test_id: String) {
    while let Some(Ok(message)) = socket.recv().await {
        if let Message::Text(text) = message {
            let reply = format!("Test {test_id}: {text}");
            if let Err(e) = socket.send(Message::Text(reply.into())).await {
                error!("WebSocket send failed: {e}");
                return;
            }
        }
    }
}
