//! Frame encoding shared by the websocket handler and `party-cli`.
//!
//! A frame is one JSON document per websocket message. Inbound frames may
//! arrive as text or as binary UTF-8.

use anyhow::{Context, Result};
use party_shared::{ClientMsg, ServerMsg};

pub fn encode_server_msg(msg: &ServerMsg) -> Result<String> {
    serde_json::to_string(msg).with_context(|| format!("serializing '{}' frame", msg.kind()))
}

pub fn decode_client_msg(text: &str) -> Result<ClientMsg> {
    serde_json::from_str(text).context("decoding client frame")
}

pub fn decode_client_bytes(bytes: &[u8]) -> Result<ClientMsg> {
    let text = std::str::from_utf8(bytes).context("client frame is not UTF-8")?;
    decode_client_msg(text)
}

pub fn encode_client_msg(msg: &ClientMsg) -> Result<String> {
    serde_json::to_string(msg).context("serializing client frame")
}

pub fn decode_server_msg(text: &str) -> Result<ServerMsg> {
    serde_json::from_str(text).context("decoding server frame")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_frames_decode_like_text() {
        let msg = decode_client_bytes(br#"{"type":"chat","data":{"message":"hi"}}"#).unwrap();
        assert_eq!(
            msg,
            ClientMsg::Chat {
                message: "hi".into()
            }
        );
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(decode_client_msg("not json").is_err());
        assert!(decode_client_bytes(&[0xff, 0xfe]).is_err());
    }
}
