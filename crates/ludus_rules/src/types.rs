//! Core domain types: colors, pieces, squares and the board grid.

use crate::error::RulesError;
use serde::{Deserialize, Serialize};

/// Side in the game. Black moves first.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Color {
    /// White side, starts on the last rank.
    White,
    /// Black side, starts on rank 0 and moves first.
    Black,
}

impl Color {
    /// Returns the other side.
    pub fn opponent(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

/// Kind of piece.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PieceKind {
    /// Ordinary piece; the only kind that can be captured.
    Man,
    /// King piece; its side loses when it is fully blocked.
    Dux,
}

/// A board coordinate. Signed so that off-board input can be represented and
/// rejected instead of failing to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Square {
    /// Row index.
    #[serde(deserialize_with = "coordinate")]
    pub rank: i32,
    /// Column index.
    #[serde(deserialize_with = "coordinate")]
    pub file: i32,
}

/// Accepts any integral JSON number, including `1.0`. Values outside the
/// `i32` range clamp, which keeps them off the board.
fn coordinate<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Number {
        Integer(i64),
        Float(f64),
    }

    let value = match Number::deserialize(deserializer)? {
        Number::Integer(value) => value,
        // Float to int casts saturate.
        Number::Float(value) if value.fract() == 0.0 => value as i64,
        Number::Float(value) => {
            return Err(serde::de::Error::custom(format!(
                "coordinate {value} is not an integer"
            )));
        }
    };
    Ok(value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32)
}

impl Square {
    /// Creates a square.
    pub const fn new(rank: i32, file: i32) -> Self {
        Self { rank, file }
    }

    /// Returns the square shifted by the given deltas.
    pub fn offset(self, rank_delta: i32, file_delta: i32) -> Self {
        Self::new(self.rank + rank_delta, self.file + file_delta)
    }
}

impl std::fmt::Display for Square {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.rank, self.file)
    }
}

/// A piece on the board. Carries its own coordinates, which always match the
/// cell holding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    /// Row of the cell holding the piece.
    pub rank: usize,
    /// Column of the cell holding the piece.
    pub file: usize,
    /// Man or dux.
    #[serde(rename = "type")]
    pub kind: PieceKind,
    /// Owning side.
    pub color: Color,
}

impl Piece {
    /// Returns the square this piece stands on.
    pub fn square(&self) -> Square {
        Square::new(self.rank as i32, self.file as i32)
    }

    /// Single-character rendering used by the ASCII board.
    pub fn symbol(&self) -> char {
        match (self.color, self.kind) {
            (Color::White, PieceKind::Man) => 'O',
            (Color::White, PieceKind::Dux) => '@',
            (Color::Black, PieceKind::Man) => 'X',
            (Color::Black, PieceKind::Dux) => '#',
        }
    }
}

/// Rectangular grid of optional pieces, rank-major.
///
/// Dimensions are fixed at construction. Serializes as an array of ranks,
/// each an array of `null` or a piece object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<Vec<Option<Piece>>>", try_from = "Vec<Vec<Option<Piece>>>")]
pub struct Board {
    ranks: Vec<Vec<Option<Piece>>>,
}

impl Board {
    /// Creates an empty board. Dimensions must be non-zero.
    pub fn empty(rank_count: usize, file_count: usize) -> Self {
        Self {
            ranks: vec![vec![None; file_count]; rank_count],
        }
    }

    /// Builds a board from rank rows, validating its structure.
    ///
    /// # Errors
    ///
    /// Returns [`RulesError::Malformed`] if the board is empty, ragged, or a
    /// piece's coordinates disagree with its cell.
    pub fn from_ranks(ranks: Vec<Vec<Option<Piece>>>) -> Result<Self, RulesError> {
        let malformed = || RulesError::malformed("Malformed board.");
        let file_count = ranks.first().map(Vec::len).ok_or_else(malformed)?;
        if file_count == 0 {
            return Err(malformed());
        }
        for (r, rank) in ranks.iter().enumerate() {
            if rank.len() != file_count {
                return Err(malformed());
            }
            for (f, cell) in rank.iter().enumerate() {
                if let Some(piece) = cell
                    && (piece.rank != r || piece.file != f)
                {
                    return Err(RulesError::malformed("Malformed board location."));
                }
            }
        }
        Ok(Self { ranks })
    }

    /// Number of ranks (rows).
    pub fn rank_count(&self) -> usize {
        self.ranks.len()
    }

    /// Number of files (columns).
    pub fn file_count(&self) -> usize {
        self.ranks.first().map_or(0, Vec::len)
    }

    /// Rank rows, rank-major.
    pub fn ranks(&self) -> &[Vec<Option<Piece>>] {
        &self.ranks
    }

    /// Whether the square lies on the board.
    pub fn contains(&self, square: Square) -> bool {
        self.index(square).is_some()
    }

    /// Returns the piece on the square, or `None` if it is empty or off-board.
    pub fn get(&self, square: Square) -> Option<&Piece> {
        let (r, f) = self.index(square)?;
        self.ranks[r][f].as_ref()
    }

    /// Whether a piece stands on the square.
    pub fn is_occupied(&self, square: Square) -> bool {
        self.get(square).is_some()
    }

    /// All pieces in rank-then-file order.
    pub fn pieces(&self) -> impl Iterator<Item = &Piece> {
        self.ranks.iter().flatten().flatten()
    }

    /// Puts a new piece on an on-board square, replacing whatever was there.
    pub(crate) fn place(&mut self, square: Square, kind: PieceKind, color: Color) {
        if let Some((rank, file)) = self.index(square) {
            self.ranks[rank][file] = Some(Piece {
                rank,
                file,
                kind,
                color,
            });
        }
    }

    /// Empties the square, returning what stood there.
    pub(crate) fn take(&mut self, square: Square) -> Option<Piece> {
        let (r, f) = self.index(square)?;
        self.ranks[r][f].take()
    }

    fn index(&self, square: Square) -> Option<(usize, usize)> {
        let rank = usize::try_from(square.rank).ok()?;
        let file = usize::try_from(square.file).ok()?;
        (rank < self.rank_count() && file < self.file_count()).then_some((rank, file))
    }
}

impl From<Board> for Vec<Vec<Option<Piece>>> {
    fn from(board: Board) -> Self {
        board.ranks
    }
}

impl TryFrom<Vec<Vec<Option<Piece>>>> for Board {
    type Error = RulesError;

    fn try_from(ranks: Vec<Vec<Option<Piece>>>) -> Result<Self, Self::Error> {
        Self::from_ranks(ranks)
    }
}
