// The coordination loop.
//
// One `Coordinator` owns every piece of shared party state: the session
// registry (with readiness flags), the seating chart and the playback
// timeline. Connection tasks never touch that state; they push `Intent`s
// into one unbounded queue and the coordinator applies them strictly one at
// a time, in arrival order, emitting outbound frames through the relay.
//
// Concurrent requests from different clients resolve as last-applied-wins
// in whatever order they were enqueued.

use std::sync::Arc;
use std::time::Instant;

use party_shared::{ChatRelay, ClapRelay, MediaEntry, ServerMsg, SessionToken};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::mpsc;

use super::error::PartyError;
use super::intent::Intent;
use super::playback::PlaybackTimeline;
use super::readiness;
use super::registry::SessionRegistry;
use super::relay::{self, ClientHandle};
use super::seating::SeatAllocator;
use crate::catalog::MediaCatalog;
use crate::pretty;

/// Static party layout and defaults, taken from the server config.
#[derive(Debug, Clone, PartialEq)]
pub struct PartySettings {
    pub row_seats: Vec<usize>,
    pub stage_rows: usize,
    pub default_video: String,
}

pub struct Coordinator {
    registry: SessionRegistry,
    seats: SeatAllocator,
    playback: PlaybackTimeline,
    catalog: Arc<dyn MediaCatalog>,
    rng: StdRng,
}

impl Coordinator {
    pub fn new(settings: PartySettings, catalog: Arc<dyn MediaCatalog>) -> Self {
        Self::with_rng(settings, catalog, StdRng::from_os_rng())
    }

    /// Seat placement draws from `rng`; tests pass a seeded one.
    pub fn with_rng(settings: PartySettings, catalog: Arc<dyn MediaCatalog>, rng: StdRng) -> Self {
        Self {
            registry: SessionRegistry::new(),
            seats: SeatAllocator::new(settings.row_seats, settings.stage_rows),
            playback: PlaybackTimeline::new(settings.default_video, Instant::now()),
            catalog,
            rng,
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn seats(&self) -> &SeatAllocator {
        &self.seats
    }

    pub fn playback(&self) -> &PlaybackTimeline {
        &self.playback
    }

    /// Consume intents until every producer is gone. Returns early only on a
    /// fatal error.
    pub async fn run(mut self, mut intents: mpsc::UnboundedReceiver<Intent>) -> Result<(), PartyError> {
        tracing::info!("coordinator started");
        while let Some(intent) = intents.recv().await {
            if let Err(e) = self.handle(intent) {
                tracing::error!(error = %e, "coordinator stopping");
                return Err(e);
            }
        }
        tracing::info!("coordinator stopped: no more producers");
        Ok(())
    }

    /// Apply one intent. Unknown tokens and unseated senders are no-ops.
    pub fn handle(&mut self, intent: Intent) -> Result<(), PartyError> {
        tracing::trace!(intent = intent.name(), "handling intent");
        match intent {
            Intent::Join { outbound, reply } => {
                let token = self.join(outbound)?;
                if let Err(Some(token)) = reply.send(token) {
                    // Nobody is left to send the leave for this seat.
                    tracing::debug!(%token, "joining connection went away before its token arrived");
                    self.leave(&token);
                }
            }
            Intent::Leave { token } => self.leave(&token),
            Intent::Chat { token, message } => self.chat(&token, message),
            Intent::Clap { token, sprite } => self.clap(&token, sprite),
            Intent::PlayRequest {
                token,
                playing,
                progress,
                video,
            } => self.play_request(&token, playing, progress, video),
            Intent::VideoChange { token, video } => self.video_change(&token, video),
            Intent::Ready { token } => self.ready(&token),
            Intent::Refresh { token } => self.refresh(&token),
            Intent::VideoList { token } => self.video_list(&token),
            Intent::ImageList { token } => self.image_list(&token),
        }
        Ok(())
    }

    fn join(&mut self, outbound: ClientHandle) -> Result<Option<SessionToken>, PartyError> {
        let token = self.registry.issue_token()?;

        if let Err(e) = self.seats.place_viewer(&token, &mut self.rng) {
            tracing::warn!(%token, error = %e, "refusing join");
            let rejected = ServerMsg::Rejected {
                reason: e.to_string(),
            };
            if outbound.deliver(rejected).is_err() {
                tracing::debug!(%token, "refused client already disconnected");
            }
            return Ok(None);
        }

        self.registry.register(token.clone(), outbound);
        tracing::info!(%token, viewers = self.registry.len(), "joined watch party");
        tracing::debug!(
            "seating chart\n{}",
            pretty::format_seating_chart(&self.seats.snapshot(Some(&token)), self.seats.row_seats(), false)
        );

        let state = self.playback.restamp(Instant::now());
        readiness::reset_all(&mut self.registry);
        self.broadcast_seating();
        relay::broadcast_all(&self.registry, &ServerMsg::RequestPlay(state.to_update()));
        Ok(Some(token))
    }

    fn leave(&mut self, token: &SessionToken) {
        let was_ready = readiness::all_ready(&self.registry);
        if !self.registry.unregister(token) {
            tracing::debug!(%token, "leave for unknown session ignored");
            return;
        }
        self.seats.remove_player(token);
        tracing::info!(%token, viewers = self.registry.len(), "left watch party");
        self.broadcast_seating();

        // The last viewer still buffering may be the one who left.
        if !was_ready && readiness::all_ready(&self.registry) {
            tracing::info!(viewers = self.registry.len(), "remaining viewers buffered, resuming");
            relay::broadcast_all(&self.registry, &ServerMsg::Resume);
        }
    }

    fn chat(&mut self, token: &SessionToken, message: String) {
        let Some(seat) = self.seated(token) else {
            return;
        };
        let msg = ServerMsg::Chat(ChatRelay {
            message,
            row: seat.row,
            column: seat.column,
        });
        relay::broadcast_except(&self.registry, token, &msg);
    }

    fn clap(&mut self, token: &SessionToken, sprite: String) {
        let Some(seat) = self.seated(token) else {
            return;
        };
        let msg = ServerMsg::Clap(ClapRelay {
            sprite,
            row: seat.row,
            column: seat.column,
        });
        relay::broadcast_except(&self.registry, token, &msg);
    }

    fn play_request(&mut self, token: &SessionToken, playing: bool, progress: f64, video: Option<String>) {
        let state = self
            .playback
            .apply_play_request(playing, progress, video, Instant::now());
        readiness::reset_all(&mut self.registry);
        tracing::info!(
            %token,
            playing = state.playing,
            progress = state.progress,
            video = %state.video,
            "playback requested"
        );
        relay::broadcast_except(&self.registry, token, &ServerMsg::RequestPlay(state.to_update()));
    }

    fn video_change(&mut self, token: &SessionToken, video: String) {
        let state = self.playback.apply_video_change(video, Instant::now());
        readiness::reset_all(&mut self.registry);
        tracing::info!(%token, video = %state.video, "video changed");
        relay::broadcast_except(&self.registry, token, &ServerMsg::RequestPlay(state.to_update()));
    }

    fn ready(&mut self, token: &SessionToken) {
        if !readiness::mark_ready(&mut self.registry, token) {
            tracing::debug!(%token, "ready from unknown session ignored");
            return;
        }
        if readiness::all_ready(&self.registry) {
            tracing::info!(viewers = self.registry.len(), "everyone buffered, resuming");
            relay::broadcast_all(&self.registry, &ServerMsg::Resume);
        }
    }

    fn refresh(&mut self, token: &SessionToken) {
        if !self.registry.contains(token) {
            return;
        }
        let state = self.playback.restamp(Instant::now());
        relay::send_to(&self.registry, token, ServerMsg::UpdateState(self.seats.snapshot(Some(token))));
        relay::send_to(&self.registry, token, ServerMsg::RequestPlay(state.to_update()));
    }

    fn video_list(&mut self, token: &SessionToken) {
        self.answer_from_catalog(token, |c| c.list_videos(), ServerMsg::VideoList);
    }

    fn image_list(&mut self, token: &SessionToken) {
        self.answer_from_catalog(token, |c| c.list_images(), ServerMsg::ImageList);
    }

    /// Listing may hit the filesystem, so it runs on the blocking pool and
    /// the answer goes straight to the requester's handle.
    fn answer_from_catalog(
        &self,
        token: &SessionToken,
        list: fn(&dyn MediaCatalog) -> anyhow::Result<Vec<MediaEntry>>,
        wrap: fn(Vec<MediaEntry>) -> ServerMsg,
    ) {
        let Some(handle) = self.registry.handle(token).cloned() else {
            return;
        };
        let catalog = Arc::clone(&self.catalog);
        let token = token.clone();
        tokio::task::spawn_blocking(move || {
            let entries = list(&*catalog).unwrap_or_else(|e| {
                tracing::warn!(%token, error = %e, "media catalog unavailable");
                Vec::new()
            });
            let msg = wrap(entries);
            let kind = msg.kind();
            if handle.deliver(msg).is_err() {
                tracing::debug!(%token, kind, "requester left before the listing was ready");
            }
        });
    }

    /// Seat of a registered sender. Spatial events from anyone else are dropped.
    fn seated(&self, token: &SessionToken) -> Option<party_shared::Seat> {
        if !self.registry.contains(token) {
            return None;
        }
        let seat = self.seats.seat_for(token);
        if seat.is_none() {
            tracing::debug!(%token, "dropping spatial event from unseated session");
        }
        seat
    }

    /// Personalised seating chart to every session.
    fn broadcast_seating(&self) {
        for token in self.registry.tokens() {
            relay::send_to(&self.registry, token, ServerMsg::UpdateState(self.seats.snapshot(Some(token))));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticCatalog;
    use party_shared::{PlaybackUpdate, Seat};
    use std::time::Duration;
    use tokio::sync::oneshot;

    struct Viewer {
        token: SessionToken,
        rx: mpsc::UnboundedReceiver<ServerMsg>,
    }

    impl Viewer {
        fn drain(&mut self) -> Vec<ServerMsg> {
            let mut out = Vec::new();
            while let Ok(msg) = self.rx.try_recv() {
                out.push(msg);
            }
            out
        }
    }

    fn settings() -> PartySettings {
        PartySettings {
            row_seats: vec![16, 16, 14, 12, 10, 8, 6],
            stage_rows: 2,
            default_video: "intro.mp4".into(),
        }
    }

    fn coordinator_with(settings: PartySettings) -> Coordinator {
        let catalog = StaticCatalog {
            videos: vec![MediaEntry {
                title: "intro".into(),
                file: "intro.mp4".into(),
                thumbnail: "intro.jpg".into(),
            }],
            images: Vec::new(),
        };
        Coordinator::with_rng(settings, Arc::new(catalog), StdRng::seed_from_u64(11))
    }

    fn coordinator() -> Coordinator {
        coordinator_with(settings())
    }

    fn join(c: &mut Coordinator) -> Option<Viewer> {
        let (outbound, rx) = ClientHandle::channel();
        let (reply, mut reply_rx) = oneshot::channel();
        c.handle(Intent::Join { outbound, reply }).unwrap();
        let token = reply_rx.try_recv().unwrap()?;
        Some(Viewer { token, rx })
    }

    fn seating_of(msgs: &[ServerMsg]) -> Option<&party_shared::SeatingUpdate> {
        msgs.iter().rev().find_map(|m| match m {
            ServerMsg::UpdateState(s) => Some(s),
            _ => None,
        })
    }

    fn playback_of(msgs: &[ServerMsg]) -> Option<&PlaybackUpdate> {
        msgs.iter().rev().find_map(|m| match m {
            ServerMsg::RequestPlay(p) => Some(p),
            _ => None,
        })
    }

    #[test]
    fn join_sends_seating_and_playback() {
        let mut c = coordinator();
        let mut a = join(&mut c).unwrap();
        let msgs = a.drain();

        let seating = seating_of(&msgs).unwrap();
        assert_eq!(seating.your_token.as_ref(), Some(&a.token));
        assert_eq!(seating.seats_not_free.len(), 1);
        assert!(seating.your_seat.unwrap().row >= 2);

        let playback = playback_of(&msgs).unwrap();
        assert!(!playback.playing);
        assert_eq!(playback.progress, 0.0);
        assert_eq!(playback.video.as_deref(), Some("intro.mp4"));
    }

    #[test]
    fn second_join_updates_everyone_and_chat_skips_sender() {
        let mut c = coordinator();
        let mut a = join(&mut c).unwrap();
        a.drain();
        let mut b = join(&mut c).unwrap();

        let a_msgs = a.drain();
        let b_msgs = b.drain();
        let a_view = seating_of(&a_msgs).unwrap();
        let b_view = seating_of(&b_msgs).unwrap();
        assert_eq!(a_view.seats_not_free.len(), 2);
        assert_eq!(b_view.seats_not_free, a_view.seats_not_free);
        assert_ne!(a_view.your_seat, b_view.your_seat);

        c.handle(Intent::Chat {
            token: b.token.clone(),
            message: "hi".into(),
        })
        .unwrap();

        let b_seat = c.seats().seat_for(&b.token).unwrap();
        assert_eq!(
            a.drain(),
            vec![ServerMsg::Chat(ChatRelay {
                message: "hi".into(),
                row: b_seat.row,
                column: b_seat.column,
            })]
        );
        assert!(b.drain().is_empty());
    }

    #[test]
    fn clap_is_tagged_with_seat() {
        let mut c = coordinator();
        let mut a = join(&mut c).unwrap();
        let mut b = join(&mut c).unwrap();
        a.drain();
        b.drain();

        c.handle(Intent::Clap {
            token: a.token.clone(),
            sprite: "confetti".into(),
        })
        .unwrap();
        let seat: Seat = c.seats().seat_for(&a.token).unwrap();
        assert_eq!(
            b.drain(),
            vec![ServerMsg::Clap(ClapRelay {
                sprite: "confetti".into(),
                row: seat.row,
                column: seat.column,
            })]
        );
        assert!(a.drain().is_empty());
    }

    #[test]
    fn events_from_unknown_tokens_are_dropped() {
        let mut c = coordinator();
        let mut a = join(&mut c).unwrap();
        a.drain();
        let ghost = SessionToken("ghost".into());

        c.handle(Intent::Chat {
            token: ghost.clone(),
            message: "boo".into(),
        })
        .unwrap();
        c.handle(Intent::Clap {
            token: ghost.clone(),
            sprite: "x".into(),
        })
        .unwrap();
        c.handle(Intent::Ready { token: ghost.clone() }).unwrap();
        c.handle(Intent::VideoList { token: ghost.clone() }).unwrap();
        c.handle(Intent::Refresh { token: ghost }).unwrap();
        assert!(a.drain().is_empty());
    }

    #[test]
    fn play_request_reaches_others_and_resets_readiness() {
        let mut c = coordinator();
        let mut a = join(&mut c).unwrap();
        let mut b = join(&mut c).unwrap();
        c.handle(Intent::Ready { token: a.token.clone() }).unwrap();
        c.handle(Intent::Ready { token: b.token.clone() }).unwrap();
        a.drain();
        b.drain();

        c.handle(Intent::PlayRequest {
            token: a.token.clone(),
            playing: true,
            progress: 0.0,
            video: None,
        })
        .unwrap();

        assert!(a.drain().is_empty());
        assert_eq!(
            b.drain(),
            vec![ServerMsg::RequestPlay(PlaybackUpdate {
                playing: true,
                progress: 0.0,
                video: Some("intro.mp4".into()),
            })]
        );
        assert_eq!(c.registry().is_ready(&a.token), Some(false));
        assert_eq!(c.registry().is_ready(&b.token), Some(false));
    }

    #[test]
    fn video_change_pauses_and_resets_readiness() {
        let mut c = coordinator();
        let mut a = join(&mut c).unwrap();
        let mut b = join(&mut c).unwrap();
        c.handle(Intent::PlayRequest {
            token: a.token.clone(),
            playing: true,
            progress: 30.0,
            video: None,
        })
        .unwrap();
        c.handle(Intent::Ready { token: b.token.clone() }).unwrap();
        a.drain();
        b.drain();

        c.handle(Intent::VideoChange {
            token: a.token.clone(),
            video: "feature.mp4".into(),
        })
        .unwrap();

        assert!(a.drain().is_empty());
        assert_eq!(
            b.drain(),
            vec![ServerMsg::RequestPlay(PlaybackUpdate {
                playing: false,
                progress: 0.0,
                video: Some("feature.mp4".into()),
            })]
        );
        assert_eq!(c.registry().is_ready(&b.token), Some(false));
        assert_eq!(c.playback().current_video(), "feature.mp4");
    }

    #[test]
    fn resume_only_once_everyone_is_ready() {
        let mut c = coordinator();
        let mut a = join(&mut c).unwrap();
        let mut b = join(&mut c).unwrap();
        a.drain();
        b.drain();

        c.handle(Intent::Ready { token: a.token.clone() }).unwrap();
        assert!(a.drain().is_empty());
        assert!(b.drain().is_empty());

        c.handle(Intent::Ready { token: b.token.clone() }).unwrap();
        assert_eq!(a.drain(), vec![ServerMsg::Resume]);
        assert_eq!(b.drain(), vec![ServerMsg::Resume]);
        // Flags stay Ready until the next playback change.
        assert_eq!(c.registry().is_ready(&a.token), Some(true));
    }

    #[test]
    fn late_joiner_must_buffer_before_resume() {
        let mut c = coordinator();
        let mut a = join(&mut c).unwrap();
        c.handle(Intent::Ready { token: a.token.clone() }).unwrap();
        assert!(a.drain().contains(&ServerMsg::Resume));

        let mut b = join(&mut c).unwrap();
        assert_eq!(c.registry().is_ready(&a.token), Some(false));
        assert!(playback_of(&b.drain()).is_some());

        c.handle(Intent::Ready { token: b.token.clone() }).unwrap();
        assert!(!b.drain().contains(&ServerMsg::Resume));
        c.handle(Intent::Ready { token: a.token.clone() }).unwrap();
        assert!(b.drain().contains(&ServerMsg::Resume));
    }

    #[test]
    fn leave_releases_seat_and_updates_remaining() {
        let mut c = coordinator();
        let mut a = join(&mut c).unwrap();
        let b = join(&mut c).unwrap();
        a.drain();

        c.handle(Intent::Leave { token: b.token.clone() }).unwrap();
        assert!(!c.registry().contains(&b.token));
        assert_eq!(c.seats().seat_for(&b.token), None);

        let msgs = a.drain();
        assert_eq!(msgs.len(), 1);
        assert_eq!(seating_of(&msgs).unwrap().seats_not_free.len(), 1);
    }

    #[test]
    fn leave_for_unknown_token_has_no_effect() {
        let mut c = coordinator();
        let mut a = join(&mut c).unwrap();
        a.drain();

        c.handle(Intent::Leave {
            token: SessionToken("ghost".into()),
        })
        .unwrap();
        c.handle(Intent::Leave { token: a.token.clone() }).unwrap();
        c.handle(Intent::Leave { token: a.token.clone() }).unwrap();
        assert!(a.drain().is_empty());
        assert!(c.registry().is_empty());
    }

    #[test]
    fn full_room_rejects_join() {
        let mut c = coordinator_with(PartySettings {
            row_seats: vec![5, 1],
            stage_rows: 1,
            default_video: "intro.mp4".into(),
        });
        let mut a = join(&mut c).unwrap();
        a.drain();

        let (outbound, mut rx) = ClientHandle::channel();
        let (reply, mut reply_rx) = oneshot::channel();
        c.handle(Intent::Join { outbound, reply }).unwrap();

        assert_eq!(reply_rx.try_recv().unwrap(), None);
        assert!(matches!(rx.try_recv().unwrap(), ServerMsg::Rejected { .. }));
        assert_eq!(c.registry().len(), 1);
        assert!(a.drain().is_empty());
    }

    async fn next_msg(viewer: &mut Viewer) -> ServerMsg {
        tokio::time::timeout(Duration::from_secs(2), viewer.rx.recv())
            .await
            .expect("no message within two seconds")
            .expect("handle dropped")
    }

    #[tokio::test]
    async fn refresh_and_lists_go_to_requester_only() {
        let mut c = coordinator();
        let mut a = join(&mut c).unwrap();
        let mut b = join(&mut c).unwrap();
        a.drain();
        b.drain();

        c.handle(Intent::Refresh { token: a.token.clone() }).unwrap();
        let refreshed = a.drain();
        assert_eq!(refreshed.len(), 2);
        assert_eq!(seating_of(&refreshed).unwrap().your_token.as_ref(), Some(&a.token));
        assert!(playback_of(&refreshed).is_some());

        c.handle(Intent::VideoList { token: a.token.clone() }).unwrap();
        assert!(matches!(next_msg(&mut a).await, ServerMsg::VideoList(v) if v.len() == 1));
        c.handle(Intent::ImageList { token: a.token.clone() }).unwrap();
        assert_eq!(next_msg(&mut a).await, ServerMsg::ImageList(Vec::new()));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(b.drain().is_empty());
    }

    struct SlowCatalog;

    impl MediaCatalog for SlowCatalog {
        fn list_videos(&self) -> anyhow::Result<Vec<MediaEntry>> {
            std::thread::sleep(Duration::from_millis(500));
            Ok(vec![MediaEntry {
                title: "late".into(),
                file: "late.mp4".into(),
                thumbnail: "late.jpg".into(),
            }])
        }

        fn list_images(&self) -> anyhow::Result<Vec<MediaEntry>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn slow_catalog_does_not_hold_up_other_intents() {
        let mut c = Coordinator::with_rng(settings(), Arc::new(SlowCatalog), StdRng::seed_from_u64(3));
        let mut a = join(&mut c).unwrap();
        a.drain();

        let started = std::time::Instant::now();
        c.handle(Intent::VideoList { token: a.token.clone() }).unwrap();
        let b = join(&mut c).unwrap();
        assert!(started.elapsed() < Duration::from_millis(250));
        assert!(c.registry().contains(&b.token));

        let listing = loop {
            match next_msg(&mut a).await {
                ServerMsg::VideoList(v) => break v,
                _ => continue,
            }
        };
        assert_eq!(listing[0].file, "late.mp4");
    }

    #[test]
    fn leave_of_last_unready_viewer_resumes_the_rest() {
        let mut c = coordinator();
        let mut a = join(&mut c).unwrap();
        let b = join(&mut c).unwrap();
        c.handle(Intent::Ready { token: a.token.clone() }).unwrap();
        a.drain();

        c.handle(Intent::Leave { token: b.token.clone() }).unwrap();
        let msgs = a.drain();
        assert_eq!(seating_of(&msgs).unwrap().seats_not_free.len(), 1);
        assert_eq!(msgs.last(), Some(&ServerMsg::Resume));

        // Already satisfied barriers are not announced twice.
        let late = join(&mut c).unwrap();
        c.handle(Intent::Ready { token: a.token.clone() }).unwrap();
        a.drain();
        c.handle(Intent::Ready { token: late.token.clone() }).unwrap();
        assert!(a.drain().contains(&ServerMsg::Resume));
        c.handle(Intent::Leave { token: late.token.clone() }).unwrap();
        assert!(!a.drain().contains(&ServerMsg::Resume));
    }

    #[test]
    fn join_abandoned_before_reply_frees_the_seat() {
        let mut c = coordinator();
        let mut a = join(&mut c).unwrap();
        a.drain();

        let (outbound, _rx) = ClientHandle::channel();
        let (reply, reply_rx) = oneshot::channel();
        drop(reply_rx);
        c.handle(Intent::Join { outbound, reply }).unwrap();

        assert_eq!(c.registry().len(), 1);
        assert_eq!(c.seats().occupied_count(), 1);
        assert_eq!(
            seating_of(&a.drain()).unwrap().seats_not_free,
            vec![c.seats().seat_for(&a.token).unwrap()]
        );

        // The ghost no longer blocks the barrier.
        c.handle(Intent::Ready { token: a.token.clone() }).unwrap();
        assert!(a.drain().contains(&ServerMsg::Resume));
    }

    #[test]
    fn run_stops_when_producers_are_gone() {
        let c = coordinator();
        let (tx, rx) = mpsc::unbounded_channel();
        let (outbound, mut out_rx) = ClientHandle::channel();
        let (reply, mut reply_rx) = oneshot::channel();
        tx.send(Intent::Join { outbound, reply }).unwrap();
        drop(tx);

        tokio_test::block_on(c.run(rx)).unwrap();
        assert!(reply_rx.try_recv().unwrap().is_some());
        assert!(out_rx.try_recv().is_ok());
    }
}
