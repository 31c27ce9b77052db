// Outbound fan-out.
//
// Every session owns one `ClientHandle`, the sending half of the channel
// drained by that connection's writer task. Only the writer task touches
// the socket, so frames for one client are never interleaved. A closed
// handle only affects its own recipient.

use party_shared::{ServerMsg, SessionToken};
use tokio::sync::mpsc;

use super::error::DeliveryError;
use super::registry::SessionRegistry;

#[derive(Debug, Clone)]
pub struct ClientHandle {
    tx: mpsc::UnboundedSender<ServerMsg>,
}

impl ClientHandle {
    /// A handle plus the receiver its connection writer should drain.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ServerMsg>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn deliver(&self, msg: ServerMsg) -> Result<(), DeliveryError> {
        self.tx.send(msg).map_err(|_| DeliveryError)
    }
}

/// Send `msg` to a single session. Returns whether it was handed off.
pub fn send_to(registry: &SessionRegistry, token: &SessionToken, msg: ServerMsg) -> bool {
    let Some(handle) = registry.handle(token) else {
        tracing::debug!(%token, kind = msg.kind(), "dropping message for unknown session");
        return false;
    };
    deliver_logged(token, handle, msg)
}

/// Send `msg` to every connected session. Returns the number of deliveries.
pub fn broadcast_all(registry: &SessionRegistry, msg: &ServerMsg) -> usize {
    broadcast_filtered(registry, None, msg)
}

/// Send `msg` to everyone except `except`.
pub fn broadcast_except(registry: &SessionRegistry, except: &SessionToken, msg: &ServerMsg) -> usize {
    broadcast_filtered(registry, Some(except), msg)
}

fn broadcast_filtered(
    registry: &SessionRegistry,
    except: Option<&SessionToken>,
    msg: &ServerMsg,
) -> usize {
    let mut delivered = 0;
    for (token, handle) in registry.all() {
        if Some(token) == except {
            continue;
        }
        if deliver_logged(token, handle, msg.clone()) {
            delivered += 1;
        }
    }
    delivered
}

fn deliver_logged(token: &SessionToken, handle: &ClientHandle, msg: ServerMsg) -> bool {
    let kind = msg.kind();
    match handle.deliver(msg) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(%token, kind, error = %e, "failed to deliver message");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(s: &str) -> SessionToken {
        SessionToken(s.to_string())
    }

    #[test]
    fn broadcast_except_skips_sender() {
        let mut registry = SessionRegistry::new();
        let (a, mut rx_a) = ClientHandle::channel();
        let (b, mut rx_b) = ClientHandle::channel();
        registry.register(token("a"), a);
        registry.register(token("b"), b);

        let sent = broadcast_except(&registry, &token("a"), &ServerMsg::Resume);
        assert_eq!(sent, 1);
        assert!(rx_a.try_recv().is_err());
        assert_eq!(rx_b.try_recv().unwrap(), ServerMsg::Resume);
    }

    #[test]
    fn closed_recipient_does_not_block_others() {
        let mut registry = SessionRegistry::new();
        let (a, rx_a) = ClientHandle::channel();
        let (b, mut rx_b) = ClientHandle::channel();
        let (c, mut rx_c) = ClientHandle::channel();
        registry.register(token("a"), a);
        registry.register(token("b"), b);
        registry.register(token("c"), c);
        drop(rx_a);

        assert_eq!(broadcast_all(&registry, &ServerMsg::Resume), 2);
        assert_eq!(rx_b.try_recv().unwrap(), ServerMsg::Resume);
        assert_eq!(rx_c.try_recv().unwrap(), ServerMsg::Resume);
        assert!(!send_to(&registry, &token("a"), ServerMsg::Resume));
    }

    #[test]
    fn send_to_unknown_token_is_dropped() {
        let registry = SessionRegistry::new();
        assert!(!send_to(&registry, &token("ghost"), ServerMsg::Resume));
    }
}
