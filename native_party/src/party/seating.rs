// Seating chart: which session sits where.
//
// Occupancy is keyed by session token. Seats are only ever handed out from
// the rows behind the stage prefix, and a seat is never given to two
// sessions at once.

use std::collections::{HashMap, HashSet};

use party_shared::{Seat, SeatingUpdate, SessionToken};
use rand::Rng;

use super::error::PartyError;

/// Random draws attempted before falling back to an exhaustive scan.
const RANDOM_DRAWS: usize = 64;

#[derive(Debug, Clone)]
pub struct SeatAllocator {
    row_seats: Vec<usize>,
    stage_rows: usize,
    occupied: HashMap<SessionToken, Seat>,
    taken: HashSet<Seat>,
}

impl SeatAllocator {
    /// `row_seats[r]` is the number of seats in row `r`; the first
    /// `stage_rows` rows are never assigned automatically.
    pub fn new(row_seats: Vec<usize>, stage_rows: usize) -> Self {
        Self {
            row_seats,
            stage_rows,
            occupied: HashMap::new(),
            taken: HashSet::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.eligible_rows().map(|r| self.row_seats[r]).sum()
    }

    pub fn occupied_count(&self) -> usize {
        self.occupied.len()
    }

    fn eligible_rows(&self) -> impl Iterator<Item = usize> + '_ {
        (self.stage_rows..self.row_seats.len()).filter(|&r| self.row_seats[r] > 0)
    }

    /// Seat `token` on a random free seat. A token that is already seated
    /// keeps its seat.
    pub fn place_viewer<R: Rng + ?Sized>(
        &mut self,
        token: &SessionToken,
        rng: &mut R,
    ) -> Result<Seat, PartyError> {
        if let Some(seat) = self.occupied.get(token) {
            return Ok(*seat);
        }

        let rows: Vec<usize> = self.eligible_rows().collect();
        if rows.is_empty() || self.free_eligible_seats() == 0 {
            return Err(PartyError::SeatingFull);
        }

        let mut chosen = None;
        for _ in 0..RANDOM_DRAWS {
            let row = rows[rng.random_range(0..rows.len())];
            let seat = Seat::new(row, rng.random_range(0..self.row_seats[row]));
            if !self.taken.contains(&seat) {
                chosen = Some(seat);
                break;
            }
        }

        // A nearly full room makes random probing slow; pick among what is left.
        let seat = match chosen {
            Some(seat) => seat,
            None => {
                let free: Vec<Seat> = rows
                    .iter()
                    .flat_map(|&row| (0..self.row_seats[row]).map(move |c| Seat::new(row, c)))
                    .filter(|seat| !self.taken.contains(seat))
                    .collect();
                if free.is_empty() {
                    return Err(PartyError::SeatingFull);
                }
                free[rng.random_range(0..free.len())]
            }
        };

        self.taken.insert(seat);
        self.occupied.insert(token.clone(), seat);
        tracing::info!(%token, row = seat.row, column = seat.column, "assigned seat");
        Ok(seat)
    }

    fn free_eligible_seats(&self) -> usize {
        let taken_eligible = self
            .taken
            .iter()
            .filter(|seat| seat.row >= self.stage_rows)
            .count();
        self.capacity().saturating_sub(taken_eligible)
    }

    /// Release the seat held by `token`, if any.
    pub fn remove_player(&mut self, token: &SessionToken) -> Option<Seat> {
        let seat = self.occupied.remove(token)?;
        self.taken.remove(&seat);
        Some(seat)
    }

    pub fn seat_for(&self, token: &SessionToken) -> Option<Seat> {
        self.occupied.get(token).copied()
    }

    /// Seating chart for `for_token`. Occupied seats are sorted so every
    /// recipient sees the same ordering.
    pub fn snapshot(&self, for_token: Option<&SessionToken>) -> SeatingUpdate {
        let mut seats_not_free: Vec<Seat> = self.taken.iter().copied().collect();
        seats_not_free.sort();
        SeatingUpdate {
            seats_not_free,
            your_token: for_token.cloned(),
            your_seat: for_token.and_then(|t| self.seat_for(t)),
        }
    }

    pub fn row_seats(&self) -> &[usize] {
        &self.row_seats
    }
}
