//! Client-server messaging protocol for the watch party.

use serde::{Deserialize, Serialize};

use crate::media::MediaEntry;
use crate::seat::SeatingUpdate;

/// Playback state as carried on the wire in both directions.
///
/// Clients send it to request a change; the server sends it as the
/// authoritative state, in which case `video` is always set.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PlaybackUpdate {
    pub playing: bool,
    pub progress: f64,
    /// Absent means "keep the current video".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ChatRelay {
    pub message: String,
    pub row: usize,
    pub column: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ClapRelay {
    pub sprite: String,
    pub row: usize,
    pub column: usize,
}

/// Messages that clients can send to the server
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum ClientMsg {
    RequestPlay(PlaybackUpdate),
    ChangeVideo {
        video: String,
    },
    /// The client finished buffering at the last requested position.
    Ready,
    Chat {
        message: String,
    },
    Clap {
        sprite: String,
    },
    /// Ask for a fresh seating chart and playback state.
    UpdateState,
    VideoList,
    ImageList,
}

/// Messages that the server can send to clients
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum ServerMsg {
    UpdateState(SeatingUpdate),
    RequestPlay(PlaybackUpdate),
    /// Every connected client is buffered; start (or stay paused) together.
    #[serde(rename = "ready")]
    Resume,
    Chat(ChatRelay),
    Clap(ClapRelay),
    VideoList(Vec<MediaEntry>),
    ImageList(Vec<MediaEntry>),
    Rejected {
        reason: String,
    },
}

impl ServerMsg {
    /// Wire discriminator, handy for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMsg::UpdateState(_) => "update-state",
            ServerMsg::RequestPlay(_) => "request-play",
            ServerMsg::Resume => "ready",
            ServerMsg::Chat(_) => "chat",
            ServerMsg::Clap(_) => "clap",
            ServerMsg::VideoList(_) => "video-list",
            ServerMsg::ImageList(_) => "image-list",
            ServerMsg::Rejected { .. } => "rejected",
        }
    }
}
