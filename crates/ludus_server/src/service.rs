//! Request-level game operations.

use crate::config::{ConfigError, ServerConfig};
use crate::coordination::Coordinator;
use crate::error::LudusError;
use crate::store::{SessionEntry, SessionStore};
use derive_getters::Getters;
use ludus_rules::{Board, Color, GameConfig, GameState, Move, MoveSequence, RulesError};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

/// A game as seen from one seat.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateView {
    game_id: String,
    player_id: String,
    player_name: String,
    opponent_name: String,
    player_color: Color,
    turn: Color,
    winner: Option<Color>,
    board: Board,
}

impl StateView {
    fn new(entry: &SessionEntry, seat_id: &str, color: Color, state: GameState) -> Self {
        Self {
            game_id: entry.id().clone(),
            player_id: seat_id.to_string(),
            player_name: entry.name(color).to_string(),
            opponent_name: entry.name(color.opponent()).to_string(),
            player_color: color,
            turn: state.turn(),
            winner: state.winner(),
            board: state.board().clone(),
        }
    }
}

/// Create, join, read, move and wait, composed over a [`SessionStore`].
///
/// Holds no game state; every call rebuilds state from the stored record.
#[derive(Debug, Clone)]
pub struct GameService {
    store: Arc<dyn SessionStore>,
    coordinator: Coordinator,
    default_config: GameConfig,
    max_board_dimension: usize,
}

impl GameService {
    /// Creates a service.
    pub fn new(
        store: Arc<dyn SessionStore>,
        coordinator: Coordinator,
        default_config: GameConfig,
        max_board_dimension: usize,
    ) -> Self {
        Self {
            store,
            coordinator,
            default_config,
            max_board_dimension,
        }
    }

    /// Creates a service using the settings in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the default game config is invalid.
    #[instrument(skip(store, config))]
    pub fn from_config(
        store: Arc<dyn SessionStore>,
        config: &ServerConfig,
    ) -> Result<Self, ConfigError> {
        let coordinator = Coordinator::new(
            Arc::clone(&store),
            config.poll_interval(),
            *config.join_conflict_retries(),
        );
        Ok(Self::new(
            store,
            coordinator,
            config.game_config()?,
            *config.max_board_dimension(),
        ))
    }

    /// Stores a new game and returns its id.
    ///
    /// `config` is compressed config text; the default config is used when it
    /// is absent.
    ///
    /// # Errors
    ///
    /// - `Malformed` or `InvalidConfig` for bad config text.
    /// - `InvalidConfig` if a dimension exceeds the server's maximum.
    /// - `Internal` on storage failure.
    #[instrument(skip(self))]
    pub async fn create_game(&self, config: Option<&str>) -> Result<String, LudusError> {
        let config = match config {
            Some(text) => GameConfig::from_compressed(text)?,
            None => self.default_config,
        };
        if config.rank_count() > self.max_board_dimension
            || config.file_count() > self.max_board_dimension
        {
            warn!(%config, max = self.max_board_dimension, "Board too large");
            return Err(LudusError::invalid_config(format!(
                "Rank and file counts must be at most {}.",
                self.max_board_dimension
            )));
        }

        let entry = self.store.add_game(&config).await?;
        info!(game_id = %entry.id(), %config, "Game created");
        Ok(entry.id().clone())
    }

    /// Claims a seat for `name` and returns that seat's view.
    ///
    /// # Errors
    ///
    /// See [`Coordinator::join_game`].
    #[instrument(skip(self))]
    pub async fn join_game(&self, id: &str, name: &str) -> Result<StateView, LudusError> {
        let joined = self.coordinator.join_game(id, name).await?;
        self.view(joined.entry(), joined.seat_id())
    }

    /// Returns the game as seen by `seat_id`.
    ///
    /// # Errors
    ///
    /// - `GameDoesntExist` if the id is unknown.
    /// - `Unauthorized` if the seat is not part of the game.
    #[instrument(skip(self))]
    pub async fn fetch_state(&self, id: &str, seat_id: &str) -> Result<StateView, LudusError> {
        let entry = self.store.get_game(id).await?;
        self.view(&entry, seat_id)
    }

    /// Validates `move_text` for `seat_id`, then commits the extended
    /// sequence.
    ///
    /// # Errors
    ///
    /// - `Unauthorized` if the seat is not part of the game.
    /// - `IllegalMove` if it is not the seat's turn or the rules reject it.
    /// - `Malformed` if `move_text` is not a compressed move.
    #[instrument(skip(self))]
    pub async fn submit_move(
        &self,
        id: &str,
        seat_id: &str,
        move_text: &str,
    ) -> Result<StateView, LudusError> {
        let entry = self.store.get_game(id).await?;
        let color = authorize(&entry, seat_id)?;
        let (mut moves, mut state) = replay(&entry)?;

        if color != state.turn() {
            warn!(%color, turn = %state.turn(), "Move out of turn");
            return Err(LudusError::illegal_move(format!(
                "Cannot make move on {}'s turn.",
                state.turn()
            )));
        }

        let mv = Move::from_compressed(move_text)?;
        state.apply_move(&mv)?;
        moves.push(mv);

        let entry = self.store.set_move_seq(id, &moves).await?;
        info!(game_id = %id, %color, mv = %mv, moves = moves.len(), "Move committed");
        self.view(&entry, seat_id)
    }

    /// Waits until it is `seat_id`'s turn, then returns its view.
    ///
    /// Returns `Ok(None)` when `cancel` fires first.
    ///
    /// # Errors
    ///
    /// - `Unauthorized` if the seat is not part of the game; checked before
    ///   waiting.
    /// - `GameDoesntExist` or `Internal` from the store.
    #[instrument(skip(self, cancel))]
    pub async fn wait_for_turn(
        &self,
        id: &str,
        seat_id: &str,
        cancel: watch::Receiver<bool>,
    ) -> Result<Option<StateView>, LudusError> {
        let entry = self.store.get_game(id).await?;
        authorize(&entry, seat_id)?;

        match self.coordinator.await_turn(id, seat_id, cancel).await? {
            Some(entry) => self.view(&entry, seat_id).map(Some),
            None => {
                debug!("Wait ended without a turn");
                Ok(None)
            }
        }
    }

    fn view(&self, entry: &SessionEntry, seat_id: &str) -> Result<StateView, LudusError> {
        let color = authorize(entry, seat_id)?;
        let (_, state) = replay(entry)?;
        Ok(StateView::new(entry, seat_id, color, state))
    }
}

fn authorize(entry: &SessionEntry, seat_id: &str) -> Result<Color, LudusError> {
    entry.seat_color(seat_id).ok_or_else(|| {
        warn!(game_id = %entry.id(), "Seat not in game");
        LudusError::unauthorized()
    })
}

/// Rebuilds state from a stored record. A record that does not replay was
/// corrupted in storage, so failures are internal.
fn replay(entry: &SessionEntry) -> Result<(MoveSequence, GameState), LudusError> {
    let corrupt = |e: RulesError| {
        LudusError::internal(format!("Stored game {} cannot be replayed: {}", entry.id(), e))
    };
    let config = GameConfig::from_compressed(entry.config()).map_err(corrupt)?;
    let moves = MoveSequence::from_compressed(entry.move_seq()).map_err(corrupt)?;
    let state = GameState::replay(&config, &moves).map_err(corrupt)?;
    Ok((moves, state))
}
