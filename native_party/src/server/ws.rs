// WebSocket handlers and websocket-specific helpers.
//
// Each connection gets two tasks: this reader, which turns inbound frames
// into intents, and a writer that drains the session's outbound channel.
// The writer is the only code that writes to the socket.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use owo_colors::OwoColorize;
use party_shared::{ServerMsg, SessionToken};
use tokio::sync::{mpsc, oneshot};

use crate::party::{ClientHandle, Intent};
use crate::server::state::AppState;
use crate::transport;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let hello = format!("{} {}", "[CONNECT]".bold().green(), "viewer".bold());
    tracing::info!(%hello);

    let (sink, mut stream) = socket.split();
    let (outbound, rx) = ClientHandle::channel();
    let mut writer = tokio::spawn(write_outbound(sink, rx));

    let (reply, reply_rx) = oneshot::channel();
    if !state.submit(Intent::Join { outbound, reply }) {
        writer.abort();
        return;
    }
    let token = match reply_rx.await {
        Ok(Some(token)) => token,
        Ok(None) | Err(_) => {
            // Refused: let the writer flush the rejection, then hang up.
            let _ = writer.await;
            tracing::info!("connection closed without a seat");
            return;
        }
    };

    loop {
        tokio::select! {
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(txt))) => forward(&state, &token, transport::decode_client_msg(&txt), &txt),
                    Some(Ok(Message::Binary(bytes))) => {
                        let raw = String::from_utf8_lossy(&bytes).into_owned();
                        forward(&state, &token, transport::decode_client_bytes(&bytes), &raw)
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    _ => {}
                }
            }
            _ = &mut writer => {
                tracing::debug!(%token, "writer finished, closing reader");
                break;
            }
        }
    }

    // Disconnects go through the coordinator like every other change.
    state.submit(Intent::Leave {
        token: token.clone(),
    });
    tracing::info!(%token, "client disconnected");
}

fn forward(state: &AppState, token: &SessionToken, decoded: anyhow::Result<party_shared::ClientMsg>, raw: &str) {
    match decoded {
        Ok(msg) => {
            tracing::debug!(%token, ws_received_client_msg = ?msg);
            state.submit(Intent::from_client_msg(token.clone(), msg));
        }
        Err(e) => {
            tracing::warn!(%token, error = %e, "dropping malformed frame");
            tracing::debug!(raw_in = %raw);
        }
    }
}

/// Drain the session's outbound channel into the socket until the
/// coordinator drops the handle or the socket fails.
async fn write_outbound(
    mut sink: SplitSink<WebSocket, Message>,
    mut rx: mpsc::UnboundedReceiver<ServerMsg>,
) {
    while let Some(msg) = rx.recv().await {
        let txt = match transport::encode_server_msg(&msg) {
            Ok(txt) => txt,
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize ServerMsg for websocket send");
                continue;
            }
        };
        if let Err(e) = sink.send(Message::Text(txt)).await {
            tracing::debug!(error = %e, "websocket send failed");
            break;
        }
    }
    let _ = sink.close().await;
}
