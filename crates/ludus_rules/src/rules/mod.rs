//! Game state and the rules of play.
//!
//! [`GameState`] is a projection of a config plus a move sequence. Every
//! applied move is validated, then captures resolve, the turn flips, and the
//! winner is recomputed from scratch.

mod capture;
mod win;

use crate::action::{Move, MoveSequence};
use crate::config::GameConfig;
use crate::error::RulesError;
use crate::types::{Board, Color, PieceKind, Square};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

pub use capture::captured_by;
pub use win::check_winner;

/// Orthogonal unit steps.
pub(crate) const ORTHOGONAL: [(i32, i32); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];

/// Phase of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    /// Moves can still be applied.
    InProgress,
    /// A dux was blocked; terminal.
    Won(Color),
}

/// Board, side to move, and winner.
///
/// Serializes as `{"turn": ..., "winner": ..., "board": ...}`. Deserializing
/// validates the board structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    turn: Color,
    winner: Option<Color>,
    board: Board,
}

impl GameState {
    /// Builds the start-of-game position.
    ///
    /// Rank 0 holds black men, the last rank white men, rank 1 the black dux
    /// and the second-to-last rank the white dux. Black moves first.
    #[instrument]
    pub fn new(config: &GameConfig) -> Self {
        let ranks = config.rank_count();
        let mut board = Board::empty(ranks, config.file_count());
        for file in 0..config.file_count() {
            board.place(square(0, file), PieceKind::Man, Color::Black);
            board.place(square(ranks - 1, file), PieceKind::Man, Color::White);
        }
        board.place(square(1, config.black_dux_file()), PieceKind::Dux, Color::Black);
        board.place(
            square(ranks - 2, config.white_dux_file()),
            PieceKind::Dux,
            Color::White,
        );

        Self {
            turn: Color::Black,
            winner: None,
            board,
        }
    }

    /// Derives the state reached by playing `moves` from the start of a game
    /// with `config`.
    ///
    /// # Errors
    ///
    /// Returns the first [`RulesError::IllegalMove`] met during replay.
    #[instrument(skip(moves), fields(config = %config, moves = moves.len()))]
    pub fn replay(config: &GameConfig, moves: &MoveSequence) -> Result<Self, RulesError> {
        let mut state = Self::new(config);
        state.apply_sequence(moves)?;
        Ok(state)
    }

    /// Imports a state from its JSON form, validating its structure.
    ///
    /// # Errors
    ///
    /// Returns [`RulesError::Malformed`] for unknown turn/winner values, a
    /// ragged board, or misplaced pieces.
    #[instrument(skip(json))]
    pub fn from_json(json: &str) -> Result<Self, RulesError> {
        serde_json::from_str(json).map_err(|e| {
            debug!(error = %e, "Rejected game state");
            RulesError::malformed("Malformed gameState.")
        })
    }

    /// Renders the JSON form.
    pub fn to_json(&self) -> String {
        serde_json::json!({
            "turn": self.turn,
            "winner": self.winner,
            "board": self.board,
        })
        .to_string()
    }

    /// Side to move.
    pub fn turn(&self) -> Color {
        self.turn
    }

    /// Winning side, if a dux is blocked.
    pub fn winner(&self) -> Option<Color> {
        self.winner
    }

    /// Current board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Phase of the game.
    pub fn status(&self) -> GameStatus {
        match self.winner {
            Some(color) => GameStatus::Won(color),
            None => GameStatus::InProgress,
        }
    }

    /// Validates and applies one move.
    ///
    /// # Errors
    ///
    /// Returns [`RulesError::IllegalMove`] if the game is won, an endpoint is
    /// off the board, the origin is empty or holds the wrong color, the move
    /// is null or not a straight orthogonal slide, or the path is blocked.
    /// The state is unchanged on error.
    #[instrument(skip(self, mv), fields(turn = %self.turn, mv = %mv))]
    pub fn apply_move(&mut self, mv: &Move) -> Result<(), RulesError> {
        self.check_legal(mv)?;

        let piece = self
            .board
            .take(mv.origin)
            .ok_or_else(|| RulesError::illegal_move("No piece at origin position"))?;
        self.board.place(mv.destination, piece.kind, piece.color);

        let captured = captured_by(&self.board, mv.destination);
        for square in &captured {
            self.board.take(*square);
        }
        if !captured.is_empty() {
            debug!(count = captured.len(), ?captured, "Pieces captured");
        }

        self.turn = self.turn.opponent();
        self.winner = check_winner(&self.board);
        debug!(next = %self.turn, winner = ?self.winner, "Move applied");
        Ok(())
    }

    /// Applies moves in order, stopping at the first illegal one.
    ///
    /// # Errors
    ///
    /// Returns the first error from [`GameState::apply_move`]; earlier moves
    /// stay applied.
    pub fn apply_sequence(&mut self, moves: &MoveSequence) -> Result<(), RulesError> {
        moves.iter().try_for_each(|mv| self.apply_move(mv))
    }

    /// Empty squares a piece standing on `(rank, file)` could slide to.
    ///
    /// Walks up, down, left and right, collecting empty squares until the
    /// first occupied one or the edge. Ignores turn and ownership. Returns
    /// nothing for an off-board square.
    pub fn unblocked_move_coordinates(&self, rank: i32, file: i32) -> Vec<Square> {
        let from = Square::new(rank, file);
        if !self.board.contains(from) {
            return Vec::new();
        }

        let mut squares = Vec::new();
        for (rank_step, file_step) in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
            let mut cursor = from.offset(rank_step, file_step);
            while self.board.contains(cursor) && !self.board.is_occupied(cursor) {
                squares.push(cursor);
                cursor = cursor.offset(rank_step, file_step);
            }
        }
        squares
    }

    fn check_legal(&self, mv: &Move) -> Result<(), RulesError> {
        if self.winner.is_some() {
            return Err(RulesError::illegal_move(
                "Cannot move after game has been won.",
            ));
        }
        if !self.board.contains(mv.origin) {
            return Err(RulesError::illegal_move("Out of bounds origin position."));
        }
        if !self.board.contains(mv.destination) {
            return Err(RulesError::illegal_move(
                "Out of bounds destination position.",
            ));
        }

        let piece = self
            .board
            .get(mv.origin)
            .ok_or_else(|| RulesError::illegal_move("No piece at origin position"))?;
        if piece.color != self.turn {
            return Err(RulesError::illegal_move(format!(
                "Attempt to move {} piece on {}'s turn.",
                piece.color, self.turn
            )));
        }

        let (origin, destination) = (mv.origin, mv.destination);
        if origin == destination {
            return Err(RulesError::illegal_move(
                "Move must have different destination and origin.",
            ));
        }
        if origin.rank != destination.rank && origin.file != destination.file {
            return Err(RulesError::illegal_move(
                "Move cannot have both horizontal and vertical components.",
            ));
        }

        // Walks every square after the origin up to and including the destination.
        let step = (
            (destination.rank - origin.rank).signum(),
            (destination.file - origin.file).signum(),
        );
        let mut cursor = origin;
        while cursor != destination {
            cursor = cursor.offset(step.0, step.1);
            if self.board.is_occupied(cursor) {
                return Err(RulesError::illegal_move("Move is obstructed."));
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for GameState {
    /// ASCII rendering: `O@` white man/dux, `X#` black man/dux, `·` empty.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for rank in self.board.ranks() {
            for cell in rank {
                let symbol = cell.as_ref().map_or('·', |piece| piece.symbol());
                write!(f, "{symbol}")?;
            }
            writeln!(f)?;
        }
        writeln!(f, "turn: {}", self.turn)?;
        match self.winner {
            Some(color) => writeln!(f, "winner: {color}")?,
            None => writeln!(f, "winner: none")?,
        }
        write!(f, "white: O@, black: X#")
    }
}

fn square(rank: usize, file: usize) -> Square {
    Square::new(rank as i32, file as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> GameConfig {
        GameConfig::new(5, 5, 3, 2).unwrap()
    }

    fn illegal(state: &mut GameState, mv: &str) -> String {
        let before = state.clone();
        let err = state
            .apply_move(&mv.parse().unwrap())
            .expect_err("move should be illegal");
        assert_eq!(*state, before, "failed move must not change the state");
        match err {
            RulesError::IllegalMove(message) => message,
            other => panic!("expected IllegalMove, got {other:?}"),
        }
    }

    #[test]
    fn test_initial_layout() {
        let state = GameState::new(&small());
        let rendered = state.to_string();
        let rows: Vec<&str> = rendered.lines().take(5).collect();
        assert_eq!(rows, vec!["XXXXX", "··#··", "·····", "···@·", "OOOOO"]);
        assert_eq!(state.turn(), Color::Black);
        assert_eq!(state.winner(), None);
        assert_eq!(state.status(), GameStatus::InProgress);
    }

    #[test]
    fn test_rendering_footer() {
        let rendered = GameState::new(&small()).to_string();
        assert!(rendered.ends_with("turn: black\nwinner: none\nwhite: O@, black: X#"));
    }

    #[test]
    fn test_out_of_bounds_rejected() {
        let mut state = GameState::new(&small());
        assert!(illegal(&mut state, "5,0,4,0").contains("origin"));
        assert!(illegal(&mut state, "0,0,0,9").contains("destination"));
        let mut state = GameState::new(&small());
        let err = state.apply_move(&Move::new(-1, 0, 0, 0)).unwrap_err();
        assert!(matches!(err, RulesError::IllegalMove(_)));
    }

    #[test]
    fn test_empty_origin_rejected() {
        let mut state = GameState::new(&small());
        assert!(illegal(&mut state, "2,2,2,3").contains("No piece"));
    }

    #[test]
    fn test_wrong_color_rejected() {
        let mut state = GameState::new(&small());
        assert!(illegal(&mut state, "4,0,3,0").contains("white piece on black's turn"));
    }

    #[test]
    fn test_null_and_diagonal_moves_rejected() {
        let mut state = GameState::new(&small());
        assert!(illegal(&mut state, "0,0,0,0").contains("different"));
        assert!(illegal(&mut state, "0,0,2,1").contains("both"));
    }

    #[test]
    fn test_obstructed_moves_rejected() {
        let mut state = GameState::new(&small());
        // Black dux at (1,2) blocks the man at (0,2).
        assert!(illegal(&mut state, "0,2,3,2").contains("obstructed"));
        // Destination occupied.
        assert!(illegal(&mut state, "0,0,0,1").contains("obstructed"));
    }

    #[test]
    fn test_unblocked_coordinates_from_corner() {
        let state = GameState::new(&small());
        // Man at (0,0): down the file until the white man on rank 4.
        assert_eq!(
            state.unblocked_move_coordinates(0, 0),
            vec![Square::new(1, 0), Square::new(2, 0), Square::new(3, 0)]
        );
    }

    #[test]
    fn test_unblocked_coordinates_order() {
        let state = GameState::new(&small());
        // Empty square (2,2): up stops at the black dux, down reaches (3,2),
        // left and right reach the edges.
        assert_eq!(
            state.unblocked_move_coordinates(2, 2),
            vec![
                Square::new(3, 2),
                Square::new(2, 1),
                Square::new(2, 0),
                Square::new(2, 3),
                Square::new(2, 4),
            ]
        );
        assert!(state.unblocked_move_coordinates(9, 9).is_empty());
    }

    #[test]
    fn test_state_json_round_trip() {
        let state = GameState::replay(&small(), &"0,0,1,0".parse().unwrap()).unwrap();
        assert_eq!(GameState::from_json(&state.to_json()).unwrap(), state);
    }
}
