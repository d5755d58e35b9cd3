//! Seat arbitration and turn waiting on top of a [`SessionStore`].
//!
//! Both protocols are explicit loops over store reads. Joins rely on the
//! store's conditional claim for atomicity; turn waits re-read on a fixed
//! interval until the stored sequence's parity favors the waiting seat.

use crate::error::LudusError;
use crate::store::{ClaimOutcome, SessionEntry, SessionStore, StoreError};
use derive_getters::Getters;
use ludus_rules::Color;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

/// Seats per game. Each lost claim means one more seat was filled.
const SEAT_COUNT: u32 = 2;

/// First backoff step after a storage conflict; doubles per retry.
const CONFLICT_BACKOFF: Duration = Duration::from_millis(10);

/// Outcome of a successful join.
#[derive(Debug, Clone, Getters)]
pub struct JoinedSeat {
    /// Record after the claim.
    entry: SessionEntry,
    /// Opaque id of the claimed seat.
    seat_id: String,
    /// Color of the claimed seat.
    color: Color,
}

/// Runs join arbitration and turn waits against a store.
#[derive(Debug, Clone)]
pub struct Coordinator {
    store: Arc<dyn SessionStore>,
    poll_interval: Duration,
    join_conflict_retries: u32,
}

impl Coordinator {
    /// Creates a coordinator.
    pub fn new(
        store: Arc<dyn SessionStore>,
        poll_interval: Duration,
        join_conflict_retries: u32,
    ) -> Self {
        Self {
            store,
            poll_interval,
            join_conflict_retries,
        }
    }

    /// Claims the first open seat (white, then black) for `name`.
    ///
    /// Of any number of concurrent joins on one game exactly the first two
    /// succeed. A lost claim re-reads the record and tries the next seat.
    ///
    /// # Errors
    ///
    /// - `Malformed` if `name` is empty.
    /// - `GameDoesntExist` if the id is unknown.
    /// - `GameFull` with both names once both seats are taken.
    /// - `Internal` if storage conflicts persist past the retry budget or
    ///   storage fails otherwise.
    #[instrument(skip(self), fields(retries = self.join_conflict_retries))]
    pub async fn join_game(&self, id: &str, name: &str) -> Result<JoinedSeat, LudusError> {
        if name.is_empty() {
            return Err(LudusError::malformed("Must provide id and name in json."));
        }

        let mut conflicts = 0;
        let mut lost_claims = 0;
        let max_attempts = SEAT_COUNT + self.join_conflict_retries + 1;

        for attempt in 1..=max_attempts {
            let entry = match self.store.get_game(id).await {
                Ok(entry) => entry,
                Err(e) => {
                    self.absorb_conflict(e, &mut conflicts).await?;
                    continue;
                }
            };

            let Some(color) = entry.open_seat() else {
                warn!(
                    white = %entry.white_name(),
                    black = %entry.black_name(),
                    "Join rejected, game full"
                );
                return Err(LudusError::game_full(
                    entry.white_name().clone(),
                    entry.black_name().clone(),
                ));
            };

            debug!(attempt, %color, "Claiming seat");
            match self.store.claim_seat(id, color, name).await {
                Ok(ClaimOutcome::Claimed(entry)) => {
                    let seat_id = entry.seat_id(color).to_string();
                    info!(game_id = %id, %color, player = %name, "Seat claimed");
                    return Ok(JoinedSeat {
                        entry,
                        seat_id,
                        color,
                    });
                }
                Ok(ClaimOutcome::Taken) => {
                    lost_claims += 1;
                    debug!(lost_claims, %color, "Seat taken by a concurrent join");
                }
                Err(e) => self.absorb_conflict(e, &mut conflicts).await?,
            }
        }

        Err(LudusError::internal(format!(
            "Seat arbitration for game {} did not settle after {} attempts",
            id, max_attempts
        )))
    }

    /// Waits until it is `seat_id`'s turn or `cancel` fires.
    ///
    /// Returns `Ok(None)` once `cancel` holds `true` or its sender is dropped.
    /// Otherwise returns the first record read whose move parity makes it the
    /// seat's turn, which is at most one poll interval after that write.
    ///
    /// # Errors
    ///
    /// - `GameDoesntExist` if the id is unknown.
    /// - `Unauthorized` if the seat is not part of the game.
    /// - `Internal` on storage failure or an unreadable stored sequence.
    #[instrument(skip(self, cancel), fields(poll_ms = self.poll_interval.as_millis() as u64))]
    pub async fn await_turn(
        &self,
        id: &str,
        seat_id: &str,
        mut cancel: watch::Receiver<bool>,
    ) -> Result<Option<SessionEntry>, LudusError> {
        let mut polls: u64 = 0;
        loop {
            if *cancel.borrow_and_update() {
                debug!(polls, "Wait cancelled");
                return Ok(None);
            }

            let entry = self.store.get_game(id).await?;
            let seat = entry.seat_color(seat_id).ok_or_else(LudusError::unauthorized)?;
            let turn = entry.turn().map_err(|e| {
                LudusError::internal(format!("Stored move sequence for game {} is unreadable: {}", id, e))
            })?;
            if seat == turn {
                debug!(polls, %turn, "Turn reached");
                return Ok(Some(entry));
            }

            polls += 1;
            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                changed = cancel.changed() => {
                    if changed.is_err() {
                        debug!(polls, "Wait abandoned, cancel sender dropped");
                        return Ok(None);
                    }
                }
            }
        }
    }

    /// Sleeps off a storage conflict if the retry budget allows, otherwise
    /// surfaces the error.
    async fn absorb_conflict(&self, err: StoreError, conflicts: &mut u32) -> Result<(), LudusError> {
        if !err.is_conflict() || *conflicts >= self.join_conflict_retries {
            return Err(err.into());
        }
        *conflicts += 1;
        let backoff = CONFLICT_BACKOFF * 2u32.pow(*conflicts - 1);
        warn!(conflicts = *conflicts, ?backoff, error = %err, "Storage conflict during join, retrying");
        tokio::time::sleep(backoff).await;
        Ok(())
    }
}
