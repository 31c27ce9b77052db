//! Party coordination engine: seating, playback, readiness, sessions and
//! the single-writer loop that ties them together.

pub mod coordinator;
pub mod error;
pub mod intent;
pub mod playback;
pub mod readiness;
pub mod registry;
pub mod relay;
pub mod seating;

pub use coordinator::{Coordinator, PartySettings};
pub use error::{DeliveryError, PartyError};
pub use intent::Intent;
pub use playback::{PlaybackState, PlaybackTimeline};
pub use registry::SessionRegistry;
pub use relay::ClientHandle;
pub use seating::SeatAllocator;
