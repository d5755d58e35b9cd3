//! Moves and move sequences.
//!
//! A [`MoveSequence`] is the authoritative record of a game. Replaying it onto
//! the board built from the game's config always yields the same state.

use crate::config::parse_quad;
use crate::error::RulesError;
use crate::types::Square;
use serde::{Deserialize, Serialize};
use std::num::{IntErrorKind, ParseIntError};
use std::str::FromStr;
use tracing::instrument;

const MALFORMED_MOVE: &str = "Malformed move.";

/// Relocation of one piece from `origin` to `destination`.
///
/// Compressed form: `"originRank,originFile,destRank,destFile"`.
/// JSON form: `{"origin":{"rank":r,"file":f},"destination":{"rank":r,"file":f}}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    /// Square the piece leaves.
    pub origin: Square,
    /// Square the piece arrives on.
    pub destination: Square,
}

impl Move {
    /// Creates a move from four coordinates.
    pub fn new(origin_rank: i32, origin_file: i32, dest_rank: i32, dest_file: i32) -> Self {
        Self {
            origin: Square::new(origin_rank, origin_file),
            destination: Square::new(dest_rank, dest_file),
        }
    }

    /// Builds a move from an already-parsed JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`RulesError::Malformed`] unless both endpoints are present and
    /// have integral `rank` and `file` fields.
    pub fn from_value(value: serde_json::Value) -> Result<Self, RulesError> {
        serde_json::from_value(value).map_err(|_| RulesError::malformed(MALFORMED_MOVE))
    }

    /// Parses the JSON form.
    ///
    /// # Errors
    ///
    /// Returns [`RulesError::Malformed`] if the text is not valid JSON or does
    /// not describe a move.
    #[instrument]
    pub fn from_json(json: &str) -> Result<Self, RulesError> {
        serde_json::from_str(json).map_err(|_| RulesError::malformed(MALFORMED_MOVE))
    }

    /// Renders the JSON form.
    pub fn to_json(&self) -> String {
        serde_json::json!({
            "origin": { "rank": self.origin.rank, "file": self.origin.file },
            "destination": { "rank": self.destination.rank, "file": self.destination.file },
        })
        .to_string()
    }

    /// Parses the compressed form.
    ///
    /// # Errors
    ///
    /// Returns [`RulesError::Malformed`] unless the text is four
    /// comma-separated unsigned integers.
    #[instrument]
    pub fn from_compressed(compressed: &str) -> Result<Self, RulesError> {
        let [origin_rank, origin_file, dest_rank, dest_file] =
            parse_quad::<Coordinate>(compressed, MALFORMED_MOVE)?;
        Ok(Self::new(
            origin_rank.0,
            origin_file.0,
            dest_rank.0,
            dest_file.0,
        ))
    }

    /// Renders the compressed form.
    pub fn to_compressed(&self) -> String {
        self.to_string()
    }
}

/// Compressed move coordinate. Values past `i32::MAX` saturate, leaving
/// them off the board for the rules to reject.
struct Coordinate(i32);

impl FromStr for Coordinate {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<i32>() {
            Ok(value) => Ok(Self(value)),
            Err(e) if *e.kind() == IntErrorKind::PosOverflow => Ok(Self(i32::MAX)),
            Err(e) => Err(e),
        }
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.origin.rank, self.origin.file, self.destination.rank, self.destination.file
        )
    }
}

impl FromStr for Move {
    type Err = RulesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_compressed(s)
    }
}

/// Ordered history of moves; insertion order is play order.
///
/// Compressed form: per-move compressed strings joined by `/`, with the empty
/// string standing for the empty sequence. JSON form: an array of moves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MoveSequence {
    moves: Vec<Move>,
}

impl MoveSequence {
    /// Creates an empty sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sequence from moves in play order.
    pub fn from_moves(moves: Vec<Move>) -> Self {
        Self { moves }
    }

    /// Builds a sequence from a JSON array of move objects.
    ///
    /// # Errors
    ///
    /// Returns [`RulesError::Malformed`] if the value is not an array or any
    /// element is not a move.
    pub fn from_value(value: serde_json::Value) -> Result<Self, RulesError> {
        let serde_json::Value::Array(items) = value else {
            return Err(RulesError::malformed("Malformed move sequence."));
        };
        items
            .into_iter()
            .map(Move::from_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Self::from_moves)
    }

    /// Parses the JSON form.
    ///
    /// # Errors
    ///
    /// Returns [`RulesError::Malformed`] if the text is not a JSON array of moves.
    #[instrument]
    pub fn from_json(json: &str) -> Result<Self, RulesError> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|_| RulesError::malformed("Malformed move sequence."))?;
        Self::from_value(value)
    }

    /// Renders the JSON form.
    pub fn to_json(&self) -> String {
        // Squares hold only integers, so serialization cannot fail.
        serde_json::to_string(&self.moves).unwrap_or_else(|_| String::from("[]"))
    }

    /// Parses the compressed form.
    ///
    /// # Errors
    ///
    /// Returns [`RulesError::Malformed`] if any `/`-separated part is not a
    /// compressed move.
    #[instrument]
    pub fn from_compressed(compressed: &str) -> Result<Self, RulesError> {
        if compressed.is_empty() {
            return Ok(Self::new());
        }
        compressed
            .split('/')
            .map(Move::from_compressed)
            .collect::<Result<Vec<_>, _>>()
            .map(Self::from_moves)
    }

    /// Renders the compressed form.
    pub fn to_compressed(&self) -> String {
        self.to_string()
    }

    /// Appends a move at the end of play.
    pub fn push(&mut self, mv: Move) {
        self.moves.push(mv);
    }

    /// Number of moves played.
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    /// Whether no move has been played.
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Moves in play order.
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// Iterates moves in play order.
    pub fn iter(&self) -> std::slice::Iter<'_, Move> {
        self.moves.iter()
    }
}

impl std::fmt::Display for MoveSequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, mv) in self.moves.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{mv}")?;
        }
        Ok(())
    }
}

impl FromStr for MoveSequence {
    type Err = RulesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_compressed(s)
    }
}

impl<'a> IntoIterator for &'a MoveSequence {
    type Item = &'a Move;
    type IntoIter = std::slice::Iter<'a, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.moves.iter()
    }
}

impl FromIterator<Move> for MoveSequence {
    fn from_iter<I: IntoIterator<Item = Move>>(iter: I) -> Self {
        Self::from_moves(iter.into_iter().collect())
    }
}
