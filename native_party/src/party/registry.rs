// Session registry: token -> connected client.
//
// The registry is the only place that associates a token with a client
// handle. It also carries each session's buffering flag, which the
// readiness barrier reads and resets.

use std::collections::HashMap;

use party_shared::SessionToken;
use rand::rngs::OsRng;
use rand::TryRngCore;

use super::error::PartyError;
use super::relay::ClientHandle;

/// Raw token length in bytes before hex encoding.
pub const TOKEN_BYTES: usize = 16;

#[derive(Debug)]
struct SessionEntry {
    handle: ClientHandle,
    ready: bool,
}

#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<SessionToken, SessionEntry>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw a fresh random token that no registered session holds.
    pub fn issue_token(&self) -> Result<SessionToken, PartyError> {
        self.issue_token_with(|bytes| {
            OsRng
                .try_fill_bytes(bytes)
                .map_err(|e| PartyError::Entropy(e.to_string()))
        })
    }

    /// Same as [`issue_token`](Self::issue_token) with a caller-supplied byte source.
    pub fn issue_token_with<F>(&self, mut fill: F) -> Result<SessionToken, PartyError>
    where
        F: FnMut(&mut [u8]) -> Result<(), PartyError>,
    {
        loop {
            let mut bytes = [0u8; TOKEN_BYTES];
            fill(&mut bytes)?;
            let token = SessionToken(hex::encode(bytes));
            if self.sessions.contains_key(&token) {
                tracing::warn!(%token, "token collision, drawing again");
                continue;
            }
            return Ok(token);
        }
    }

    /// New sessions start not ready.
    pub fn register(&mut self, token: SessionToken, handle: ClientHandle) {
        self.sessions.insert(
            token,
            SessionEntry {
                handle,
                ready: false,
            },
        );
    }

    /// Returns whether the token was registered.
    pub fn unregister(&mut self, token: &SessionToken) -> bool {
        self.sessions.remove(token).is_some()
    }

    pub fn contains(&self, token: &SessionToken) -> bool {
        self.sessions.contains_key(token)
    }

    pub fn handle(&self, token: &SessionToken) -> Option<&ClientHandle> {
        self.sessions.get(token).map(|e| &e.handle)
    }

    pub fn all(&self) -> impl Iterator<Item = (&SessionToken, &ClientHandle)> {
        self.sessions.iter().map(|(t, e)| (t, &e.handle))
    }

    pub fn tokens(&self) -> impl Iterator<Item = &SessionToken> {
        self.sessions.keys()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn is_ready(&self, token: &SessionToken) -> Option<bool> {
        self.sessions.get(token).map(|e| e.ready)
    }

    pub(crate) fn set_ready(&mut self, token: &SessionToken, ready: bool) -> bool {
        match self.sessions.get_mut(token) {
            Some(entry) => {
                entry.ready = ready;
                true
            }
            None => false,
        }
    }

    pub(crate) fn ready_flags_mut(&mut self) -> impl Iterator<Item = &mut bool> {
        self.sessions.values_mut().map(|e| &mut e.ready)
    }

    pub(crate) fn ready_flags(&self) -> impl Iterator<Item = bool> + '_ {
        self.sessions.values().map(|e| e.ready)
    }
}
