use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use native_party::transport::{decode_server_msg, encode_client_msg};
use party_shared::ClientMsg;

use super::utils::MessagePrinter;

/// Try to build a websocket URL from a base string (like "localhost:8080" or "http://host:8080")
pub fn build_ws_url(base: &str) -> anyhow::Result<Url> {
    let mut url = Url::parse(base)
        .ok()
        .filter(|u| matches!(u.scheme(), "http" | "https" | "ws" | "wss"))
        .map(Ok)
        .unwrap_or_else(|| Url::parse(&format!("http://{}", base)))?;

    match url.scheme() {
        "http" => url.set_scheme("ws").ok(),
        "https" => url.set_scheme("wss").ok(),
        "ws" | "wss" => Some(()),
        _ => None,
    }
    .ok_or_else(|| anyhow::anyhow!("Unsupported URL scheme: {}", url.scheme()))?;

    // Force path to /ws
    if url.path() != "/ws" {
        url.set_path("/ws");
    }
    Ok(url)
}

/// Connect, send the provided ClientMsg and pass all responses to the printer until timeout.
///
/// Joining is implicit in connecting; closing the socket leaves the party.
pub async fn run_once_ws(
    server: &str,
    client_msg: ClientMsg,
    wait_ms: u64,
    printer: &mut MessagePrinter,
) -> anyhow::Result<()> {
    let ws_url = build_ws_url(server)?;
    let (ws_stream, _resp) = tokio_tungstenite::connect_async(ws_url.as_str()).await?;
    let (mut write, mut read) = ws_stream.split();

    write.send(Message::Text(encode_client_msg(&client_msg)?)).await?;

    loop {
        match tokio::time::timeout(Duration::from_millis(wait_ms), read.next()).await {
            Ok(Some(Ok(Message::Text(txt)))) => match decode_server_msg(&txt) {
                Ok(sm) => printer.handle(&sm),
                Err(e) => eprintln!("Invalid message from server: {}", e),
            },
            Ok(Some(Ok(_other))) => { /* ignore */ }
            Ok(Some(Err(e))) => {
                eprintln!("WebSocket error: {}", e);
                break;
            }
            Ok(None) => break, // socket closed
            Err(_) => break,   // timeout
        }
    }

    let _ = write.close().await;
    Ok(())
}
