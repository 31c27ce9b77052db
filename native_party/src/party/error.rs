use thiserror::Error;

/// Failures raised by the coordination core.
///
/// Only [`PartyError::Entropy`] is fatal; everything else is handled where it
/// occurs and never leaves the coordinator loop.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PartyError {
    #[error("no free seat left in the eligible rows")]
    SeatingFull,
    #[error("entropy source failed while issuing a session token: {0}")]
    Entropy(String),
}

/// A frame could not be handed to a client's outbound writer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("client connection is closed")]
pub struct DeliveryError;
