use futures_util::StreamExt;
use tokio_tungstenite::tungstenite::Message;

use native_party::transport::decode_server_msg;

use super::utils::{DisplayMode, MessagePrinter};

fn announce_connection(json: bool, message: &str) {
    if json {
        eprintln!("{}", message);
    } else {
        println!("{}", message);
    }
}

/// Join over websocket and print events as they arrive until the server hangs up.
pub async fn watch_ws(server: &str, json: bool) -> anyhow::Result<()> {
    let ws_url = super::transport::build_ws_url(server)?;
    let (ws_stream, _resp) = tokio_tungstenite::connect_async(ws_url.as_str()).await?;
    let (_write, mut read) = ws_stream.split();

    announce_connection(json, &format!("Connected to WebSocket {}", ws_url));

    let mut printer = MessagePrinter::new(json, DisplayMode::Chart);
    loop {
        match read.next().await {
            Some(Ok(Message::Text(txt))) => {
                if let Ok(sm) = decode_server_msg(&txt) {
                    printer.handle(&sm);
                }
            }
            Some(Ok(_other)) => { /* ignore non-text frames */ }
            Some(Err(e)) => {
                eprintln!("WebSocket error: {}", e);
                break;
            }
            None => break, // closed
        }
    }

    Ok(())
}
