// Authoritative playback timeline.
//
// Progress is only exact as of `last_update`; readers extrapolate by the
// wall-clock time elapsed since then, and only while playing. Every change
// replaces the whole state so a stale progress value can never survive next
// to a newly selected video.

use std::time::Instant;

use party_shared::PlaybackUpdate;

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    pub playing: bool,
    pub progress: f64,
    pub last_update: Instant,
    pub video: String,
}

impl PlaybackState {
    pub fn to_update(&self) -> PlaybackUpdate {
        PlaybackUpdate {
            playing: self.playing,
            progress: self.progress,
            video: Some(self.video.clone()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlaybackTimeline {
    state: PlaybackState,
}

impl PlaybackTimeline {
    /// Paused at the start of `default_video`.
    pub fn new(default_video: impl Into<String>, now: Instant) -> Self {
        Self {
            state: PlaybackState {
                playing: false,
                progress: 0.0,
                last_update: now,
                video: default_video.into(),
            },
        }
    }

    /// Copy of the state with progress extrapolated to `now`. Does not mutate.
    pub fn snapshot_at(&self, now: Instant) -> PlaybackState {
        let mut snapshot = self.state.clone();
        if snapshot.playing {
            snapshot.progress += now.saturating_duration_since(snapshot.last_update).as_secs_f64();
            snapshot.last_update = now;
        }
        snapshot
    }

    /// Write the extrapolated progress back so drift does not pile up
    /// between state changes.
    pub fn restamp(&mut self, now: Instant) -> PlaybackState {
        let mut fresh = self.snapshot_at(now);
        fresh.last_update = now;
        self.state = fresh.clone();
        fresh
    }

    /// Replace the state with the requested one. `video: None` keeps the
    /// current video.
    pub fn apply_play_request(
        &mut self,
        playing: bool,
        progress: f64,
        video: Option<String>,
        now: Instant,
    ) -> PlaybackState {
        let video = video.unwrap_or_else(|| self.state.video.clone());
        self.state = PlaybackState {
            playing,
            progress,
            last_update: now,
            video,
        };
        self.state.clone()
    }

    /// Switch to `video`, paused at the beginning.
    pub fn apply_video_change(&mut self, video: String, now: Instant) -> PlaybackState {
        self.state = PlaybackState {
            playing: false,
            progress: 0.0,
            last_update: now,
            video,
        };
        self.state.clone()
    }

    pub fn current_video(&self) -> &str {
        &self.state.video
    }
}
