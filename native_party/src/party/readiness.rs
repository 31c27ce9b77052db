// Cross-client buffering barrier.
//
// A session is Ready once it reports that it has buffered the last
// requested position. Any playback change knocks every session back to
// NotReady in the same step. The all-ready predicate is recomputed from the
// flags each time rather than tracked with a counter.

use party_shared::SessionToken;

use super::registry::SessionRegistry;

/// Knock every connected session back to NotReady.
pub fn reset_all(registry: &mut SessionRegistry) {
    for ready in registry.ready_flags_mut() {
        *ready = false;
    }
}

/// Mark `token` Ready. Returns false for unknown tokens.
pub fn mark_ready(registry: &mut SessionRegistry, token: &SessionToken) -> bool {
    registry.set_ready(token, true)
}

/// True when at least one session is connected and all of them are Ready.
pub fn all_ready(registry: &SessionRegistry) -> bool {
    !registry.is_empty() && registry.ready_flags().all(|ready| ready)
}
