//! Win detection: a fully blocked dux loses.

use super::ORTHOGONAL;
use crate::types::{Board, Color, Piece, PieceKind};
use tracing::instrument;

/// Returns the winner, if any dux is blocked.
///
/// A dux is blocked when each orthogonal neighbor is occupied or off the
/// board. Duxes are scanned in rank-then-file order and the first blocked one
/// decides: its opponent wins.
#[instrument(skip(board))]
pub fn check_winner(board: &Board) -> Option<Color> {
    board
        .pieces()
        .find(|piece| piece.kind == PieceKind::Dux && is_blocked(board, piece))
        .map(|dux| dux.color.opponent())
}

fn is_blocked(board: &Board, piece: &Piece) -> bool {
    let square = piece.square();
    ORTHOGONAL.iter().all(|&(rank_step, file_step)| {
        let neighbor = square.offset(rank_step, file_step);
        !board.contains(neighbor) || board.is_occupied(neighbor)
    })
}
