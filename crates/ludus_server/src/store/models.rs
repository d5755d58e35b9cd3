//! Database row types for the SQLite backend.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use super::{SessionEntry, schema};

/// A row of the `games` table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = schema::games)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct GameRow {
    id: String,
    white_id: String,
    black_id: String,
    white_name: String,
    black_name: String,
    config: String,
    move_seq: String,
    created_at: NaiveDateTime,
}

/// Insertable row for a freshly created game.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::games)]
pub struct NewGameRow {
    id: String,
    white_id: String,
    black_id: String,
    white_name: String,
    black_name: String,
    config: String,
    move_seq: String,
    created_at: NaiveDateTime,
}

impl From<&SessionEntry> for NewGameRow {
    fn from(entry: &SessionEntry) -> Self {
        Self {
            id: entry.id().clone(),
            white_id: entry.white_id().clone(),
            black_id: entry.black_id().clone(),
            white_name: entry.white_name().clone(),
            black_name: entry.black_name().clone(),
            config: entry.config().clone(),
            move_seq: entry.move_seq().clone(),
            created_at: entry.created_at().naive_utc(),
        }
    }
}

impl From<GameRow> for SessionEntry {
    fn from(row: GameRow) -> Self {
        SessionEntry::new(
            row.id,
            row.white_id,
            row.black_id,
            row.white_name,
            row.black_name,
            row.config,
            row.move_seq,
            row.created_at.and_utc(),
        )
    }
}
