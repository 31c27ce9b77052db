//! Normalized inbound events queued for the coordinator.

use party_shared::{ClientMsg, SessionToken};
use tokio::sync::oneshot;

use super::relay::ClientHandle;

#[derive(Debug)]
pub enum Intent {
    /// A new connection. The coordinator answers with the issued token, or
    /// `None` when the join was refused.
    Join {
        outbound: ClientHandle,
        reply: oneshot::Sender<Option<SessionToken>>,
    },
    Leave {
        token: SessionToken,
    },
    Chat {
        token: SessionToken,
        message: String,
    },
    Clap {
        token: SessionToken,
        sprite: String,
    },
    PlayRequest {
        token: SessionToken,
        playing: bool,
        progress: f64,
        /// `None` keeps the current video.
        video: Option<String>,
    },
    VideoChange {
        token: SessionToken,
        video: String,
    },
    Ready {
        token: SessionToken,
    },
    Refresh {
        token: SessionToken,
    },
    VideoList {
        token: SessionToken,
    },
    ImageList {
        token: SessionToken,
    },
}

impl Intent {
    /// Translate a decoded client frame from the session `token`.
    pub fn from_client_msg(token: SessionToken, msg: ClientMsg) -> Self {
        match msg {
            ClientMsg::RequestPlay(update) => Intent::PlayRequest {
                token,
                playing: update.playing,
                progress: update.progress,
                video: update.video.filter(|v| !v.is_empty()),
            },
            ClientMsg::ChangeVideo { video } => Intent::VideoChange { token, video },
            ClientMsg::Ready => Intent::Ready { token },
            ClientMsg::Chat { message } => Intent::Chat { token, message },
            ClientMsg::Clap { sprite } => Intent::Clap { token, sprite },
            ClientMsg::UpdateState => Intent::Refresh { token },
            ClientMsg::VideoList => Intent::VideoList { token },
            ClientMsg::ImageList => Intent::ImageList { token },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Intent::Join { .. } => "join",
            Intent::Leave { .. } => "leave",
            Intent::Chat { .. } => "chat",
            Intent::Clap { .. } => "clap",
            Intent::PlayRequest { .. } => "play-request",
            Intent::VideoChange { .. } => "video-change",
            Intent::Ready { .. } => "ready",
            Intent::Refresh { .. } => "refresh",
            Intent::VideoList { .. } => "video-list",
            Intent::ImageList { .. } => "image-list",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use party_shared::PlaybackUpdate;

    #[test]
    fn empty_video_override_means_keep_current() {
        let intent = Intent::from_client_msg(
            SessionToken("a".into()),
            ClientMsg::RequestPlay(PlaybackUpdate {
                playing: true,
                progress: 3.0,
                video: Some(String::new()),
            }),
        );
        match intent {
            Intent::PlayRequest { video, .. } => assert_eq!(video, None),
            other => panic!("unexpected intent {}", other.name()),
        }
    }
}
