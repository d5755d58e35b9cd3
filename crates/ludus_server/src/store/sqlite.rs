//! SQLite-backed session store.

use async_trait::async_trait;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use ludus_rules::{Color, GameConfig, MoveSequence};
use tracing::{debug, info, instrument, warn};

use super::models::{GameRow, NewGameRow};
use super::{ClaimOutcome, SessionEntry, SessionStore, StoreError, schema::games};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// How long a connection waits on a locked database before reporting busy.
const BUSY_TIMEOUT_MS: u32 = 5_000;

/// Session store persisted to a SQLite file.
///
/// Each operation opens its own connection on tokio's blocking pool.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    db_path: String,
}

impl SqliteStore {
    /// Opens the database at `db_path`, creating it and applying pending
    /// migrations as needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file cannot be opened or migrated.
    #[instrument(skip(db_path), fields(db_path = %db_path))]
    pub fn open(db_path: String) -> Result<Self, StoreError> {
        let store = Self { db_path };
        let mut conn = store.connection()?;
        conn.batch_execute("PRAGMA journal_mode = WAL;")?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| StoreError::backend(format!("Migrations failed: {}", e)))?;
        info!(path = %store.db_path, migrations = applied.len(), "SQLite store opened");
        Ok(store)
    }

    /// Establishes a database connection.
    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, StoreError> {
        debug!(path = %self.db_path, "Establishing connection");
        let mut conn = SqliteConnection::establish(&self.db_path).map_err(|e| {
            StoreError::backend(format!("Failed to connect to '{}': {}", self.db_path, e))
        })?;
        conn.batch_execute(&format!("PRAGMA busy_timeout = {};", BUSY_TIMEOUT_MS))?;
        Ok(conn)
    }

    /// Runs `op` with a fresh connection on the blocking pool.
    async fn with_connection<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqliteConnection) -> Result<T, StoreError> + Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = store.connection()?;
            op(&mut conn)
        })
        .await
        .map_err(|e| StoreError::backend(format!("Blocking task failed: {}", e)))?
    }
}

#[async_trait]
impl SessionStore for SqliteStore {
    #[instrument(skip(self), fields(config = %config))]
    async fn add_game(&self, config: &GameConfig) -> Result<SessionEntry, StoreError> {
        let row = NewGameRow::from(&SessionEntry::fresh(config));
        let stored = self
            .with_connection(move |conn| {
                Ok(diesel::insert_into(games::table)
                    .values(&row)
                    .returning(GameRow::as_returning())
                    .get_result(conn)?)
            })
            .await?;
        let entry = SessionEntry::from(stored);
        info!(game_id = %entry.id(), "Game stored");
        Ok(entry)
    }

    #[instrument(skip(self))]
    async fn get_game(&self, id: &str) -> Result<SessionEntry, StoreError> {
        let id = id.to_string();
        let row = self
            .with_connection(move |conn| {
                games::table
                    .find(&id)
                    .select(GameRow::as_select())
                    .first(conn)
                    .optional()?
                    .ok_or_else(|| StoreError::not_found(format!("No game with id '{}'", id)))
            })
            .await?;
        Ok(row.into())
    }

    #[instrument(skip(self, moves), fields(moves = %moves))]
    async fn set_move_seq(
        &self,
        id: &str,
        moves: &MoveSequence,
    ) -> Result<SessionEntry, StoreError> {
        let id = id.to_string();
        let compressed = moves.to_compressed();
        let row = self
            .with_connection(move |conn| {
                diesel::update(games::table.find(&id))
                    .set(games::move_seq.eq(&compressed))
                    .returning(GameRow::as_returning())
                    .get_result(conn)
                    .optional()?
                    .ok_or_else(|| StoreError::not_found(format!("No game with id '{}'", id)))
            })
            .await?;
        debug!(count = moves.len(), "Move sequence replaced");
        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn claim_seat(
        &self,
        id: &str,
        color: Color,
        name: &str,
    ) -> Result<ClaimOutcome, StoreError> {
        let id = id.to_string();
        let name = name.to_string();
        self.with_connection(move |conn| {
            let target = games::table.find(&id);
            let claimed = match color {
                Color::White => diesel::update(target.filter(games::white_name.eq("")))
                    .set(games::white_name.eq(&name))
                    .returning(GameRow::as_returning())
                    .get_result(conn)
                    .optional()?,
                Color::Black => diesel::update(target.filter(games::black_name.eq("")))
                    .set(games::black_name.eq(&name))
                    .returning(GameRow::as_returning())
                    .get_result(conn)
                    .optional()?,
            };
            if let Some(row) = claimed {
                return Ok(ClaimOutcome::Claimed(row.into()));
            }

            // Nothing updated: either the seat is taken or the game is gone.
            let exists = games::table
                .find(&id)
                .select(games::id)
                .first::<String>(conn)
                .optional()?
                .is_some();
            if exists {
                warn!(game_id = %id, %color, "Seat claim lost");
                Ok(ClaimOutcome::Taken)
            } else {
                Err(StoreError::not_found(format!("No game with id '{}'", id)))
            }
        })
        .await
    }
}
