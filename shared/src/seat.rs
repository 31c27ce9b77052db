use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque per-session identifier handed out by the server on join.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct SessionToken(pub String);

impl SessionToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A `(row, column)` slot in the auditorium. Row 0 is closest to the screen.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Seat {
    pub row: usize,
    pub column: usize,
}

impl Seat {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {} seat {}", self.row, self.column)
    }
}

/// Seating chart as seen by one recipient.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SeatingUpdate {
    pub seats_not_free: Vec<Seat>,
    #[serde(default)]
    pub your_token: Option<SessionToken>,
    /// `None` when the recipient has no seat (never joined or already left).
    #[serde(default)]
    pub your_seat: Option<Seat>,
}
