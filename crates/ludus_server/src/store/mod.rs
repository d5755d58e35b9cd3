//! Session persistence: the store contract and its backends.
//!
//! A [`SessionStore`] only ever holds compressed text (config and move
//! sequence) plus seat bookkeeping. Game state is rebuilt from that text on
//! every request.

mod error;
mod memory;
mod models;
mod schema;
mod sqlite;

pub use error::{StoreError, StoreErrorKind};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::config::StorageConfig;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use derive_new::new;
use ludus_rules::{Color, GameConfig, MoveSequence, RulesError};
use std::sync::Arc;
use tracing::{info, instrument};

/// One stored game: seats, names and the authoritative record.
#[derive(Debug, Clone, PartialEq, Eq, Getters, new)]
pub struct SessionEntry {
    /// Game id.
    id: String,
    /// Opaque seat id for white.
    white_id: String,
    /// Opaque seat id for black.
    black_id: String,
    /// Display name in the white seat; empty while unclaimed.
    white_name: String,
    /// Display name in the black seat; empty while unclaimed.
    black_name: String,
    /// Compressed [`GameConfig`].
    config: String,
    /// Compressed [`MoveSequence`].
    move_seq: String,
    /// When the store created the record.
    created_at: DateTime<Utc>,
}

impl SessionEntry {
    /// Creates an unclaimed record with fresh ids and no moves.
    #[instrument(fields(config = %config))]
    pub fn fresh(config: &GameConfig) -> Self {
        Self {
            id: new_id(),
            white_id: new_id(),
            black_id: new_id(),
            white_name: String::new(),
            black_name: String::new(),
            config: config.to_compressed(),
            move_seq: String::new(),
            created_at: Utc::now(),
        }
    }

    /// Seat id for `color`.
    pub fn seat_id(&self, color: Color) -> &str {
        match color {
            Color::White => &self.white_id,
            Color::Black => &self.black_id,
        }
    }

    /// Display name for `color`; empty if unclaimed.
    pub fn name(&self, color: Color) -> &str {
        match color {
            Color::White => &self.white_name,
            Color::Black => &self.black_name,
        }
    }

    /// Color owning `seat_id`, if it belongs to this game.
    pub fn seat_color(&self, seat_id: &str) -> Option<Color> {
        if seat_id == self.white_id {
            Some(Color::White)
        } else if seat_id == self.black_id {
            Some(Color::Black)
        } else {
            None
        }
    }

    /// First unclaimed seat, white before black.
    pub fn open_seat(&self) -> Option<Color> {
        [Color::White, Color::Black]
            .into_iter()
            .find(|&color| self.name(color).is_empty())
    }

    /// Side to move according to the stored sequence's parity.
    ///
    /// # Errors
    ///
    /// Returns [`RulesError::Malformed`] if the stored sequence is unreadable.
    pub fn turn(&self) -> Result<Color, RulesError> {
        let moves = MoveSequence::from_compressed(&self.move_seq)?;
        Ok(if moves.len() % 2 == 0 {
            Color::Black
        } else {
            Color::White
        })
    }

    pub(crate) fn set_name(&mut self, color: Color, name: &str) {
        match color {
            Color::White => self.white_name = name.to_string(),
            Color::Black => self.black_name = name.to_string(),
        }
    }

    pub(crate) fn set_move_seq(&mut self, moves: &MoveSequence) {
        self.move_seq = moves.to_compressed();
    }
}

/// Result of a conditional seat claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The seat was empty and now holds the caller's name.
    Claimed(SessionEntry),
    /// Another caller filled the seat first.
    Taken,
}

/// Abstract persistence boundary for game sessions.
///
/// Implementations must make [`SessionStore::claim_seat`] atomic: of any
/// number of concurrent claims on one seat at most one returns
/// [`ClaimOutcome::Claimed`].
#[async_trait]
pub trait SessionStore: Send + Sync + std::fmt::Debug {
    /// Stores a new game with fresh seat ids, empty names and no moves.
    async fn add_game(&self, config: &GameConfig) -> Result<SessionEntry, StoreError>;

    /// Reads a game.
    ///
    /// Fails with [`StoreErrorKind::NotFound`] if the id is unknown.
    async fn get_game(&self, id: &str) -> Result<SessionEntry, StoreError>;

    /// Replaces the stored move sequence and returns the updated record.
    ///
    /// Fails with [`StoreErrorKind::NotFound`] if the id is unknown.
    async fn set_move_seq(&self, id: &str, moves: &MoveSequence)
    -> Result<SessionEntry, StoreError>;

    /// Sets the name for `color` only if that seat is still empty.
    ///
    /// May fail with [`StoreErrorKind::Conflict`] when the write raced and
    /// should be retried.
    async fn claim_seat(
        &self,
        id: &str,
        color: Color,
        name: &str,
    ) -> Result<ClaimOutcome, StoreError>;
}

/// Opens the backend selected by configuration.
///
/// # Errors
///
/// Returns [`StoreError`] if the SQLite file cannot be opened or migrated.
#[instrument]
pub fn open_store(config: &StorageConfig) -> Result<Arc<dyn SessionStore>, StoreError> {
    let store: Arc<dyn SessionStore> = match config {
        StorageConfig::Memory => Arc::new(MemoryStore::new()),
        StorageConfig::Sqlite { path } => Arc::new(SqliteStore::open(path.clone())?),
    };
    info!(?store, "Session store ready");
    Ok(store)
}

fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
