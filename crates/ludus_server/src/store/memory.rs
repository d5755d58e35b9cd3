//! Process-local session store.

use super::{ClaimOutcome, SessionEntry, SessionStore, StoreError};
use async_trait::async_trait;
use ludus_rules::{Color, GameConfig, MoveSequence};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

/// Games held in a map behind an async lock. Lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    games: RwLock<HashMap<String, SessionEntry>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn missing(id: &str) -> StoreError {
    StoreError::not_found(format!("No game with id '{}'", id))
}

#[async_trait]
impl SessionStore for MemoryStore {
    #[instrument(skip(self), fields(config = %config))]
    async fn add_game(&self, config: &GameConfig) -> Result<SessionEntry, StoreError> {
        let entry = SessionEntry::fresh(config);
        self.games
            .write()
            .await
            .insert(entry.id().clone(), entry.clone());
        info!(game_id = %entry.id(), "Game stored");
        Ok(entry)
    }

    #[instrument(skip(self))]
    async fn get_game(&self, id: &str) -> Result<SessionEntry, StoreError> {
        self.games
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| missing(id))
    }

    #[instrument(skip(self, moves), fields(moves = %moves))]
    async fn set_move_seq(
        &self,
        id: &str,
        moves: &MoveSequence,
    ) -> Result<SessionEntry, StoreError> {
        let mut games = self.games.write().await;
        let entry = games.get_mut(id).ok_or_else(|| missing(id))?;
        entry.set_move_seq(moves);
        debug!(count = moves.len(), "Move sequence replaced");
        Ok(entry.clone())
    }

    #[instrument(skip(self))]
    async fn claim_seat(
        &self,
        id: &str,
        color: Color,
        name: &str,
    ) -> Result<ClaimOutcome, StoreError> {
        let mut games = self.games.write().await;
        let entry = games.get_mut(id).ok_or_else(|| missing(id))?;
        if !entry.name(color).is_empty() {
            debug!("Seat already taken");
            return Ok(ClaimOutcome::Taken);
        }
        entry.set_name(color, name);
        Ok(ClaimOutcome::Claimed(entry.clone()))
    }
}
