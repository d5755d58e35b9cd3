//! Ludus rules - the deterministic engine behind ludus latrunculorum.
//!
//! A game is fully described by its [`GameConfig`] and the [`MoveSequence`]
//! played so far. [`GameState`] is always derived from that pair by replay and
//! is never the source of truth.
//!
//! # Architecture
//!
//! - **Types**: [`Board`], [`Piece`], [`Square`], [`Color`], [`PieceKind`]
//! - **Config**: [`GameConfig`] and its compressed text form
//! - **Actions**: [`Move`] and [`MoveSequence`] with compressed and JSON forms
//! - **Rules**: [`GameState`] move validation, captures and win detection
//!
//! # Example
//!
//! ```
//! use ludus_rules::{Color, GameConfig, GameState, MoveSequence};
//!
//! # fn example() -> Result<(), ludus_rules::RulesError> {
//! let config: GameConfig = "5,5,3,2".parse()?;
//! let moves: MoveSequence = "0,0,1,0/4,4,3,4".parse()?;
//! let state = GameState::replay(&config, &moves)?;
//! assert_eq!(state.turn(), Color::Black);
//! assert_eq!(state.winner(), None);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod action;
mod config;
mod error;
mod rules;
mod types;

pub use action::{Move, MoveSequence};
pub use config::GameConfig;
pub use error::RulesError;
pub use rules::{GameState, GameStatus};
pub use types::{Board, Color, Piece, PieceKind, Square};
