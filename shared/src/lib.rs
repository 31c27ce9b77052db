//! Wire protocol for the watch party.
//!
//! Both the server (`native_party`) and headless clients speak these types.
//! Every frame is an adjacently tagged JSON object: `{"type": ..., "data": ...}`.

mod media;
mod messages;
mod seat;

pub use media::MediaEntry;
pub use messages::{ChatRelay, ClapRelay, ClientMsg, PlaybackUpdate, ServerMsg};
pub use seat::{Seat, SeatingUpdate, SessionToken};
