//! Flanking captures.

use super::ORTHOGONAL;
use crate::types::{Board, PieceKind, Square};
use tracing::instrument;

/// Squares whose men are captured by the piece that just arrived on `mover`.
///
/// Each orthogonal neighbor of `mover` is checked against the same board, so
/// the result does not depend on the order the directions are visited in.
/// A neighbor is captured when it is a man and both of its surrounding
/// squares hold pieces of one color that differs from its own. Normally the
/// surrounders are `mover` and the square beyond the neighbor; on a corner
/// they are the corner's two orthogonal neighbors. A dux is never captured.
#[instrument(skip(board))]
pub fn captured_by(board: &Board, mover: Square) -> Vec<Square> {
    ORTHOGONAL
        .iter()
        .filter_map(|&(rank_step, file_step)| {
            let target = mover.offset(rank_step, file_step);
            let victim = board.get(target)?;
            if victim.kind != PieceKind::Man {
                return None;
            }

            let (a, b) = surrounders(board, mover, target, (rank_step, file_step));
            let (a, b) = (board.get(a)?, board.get(b)?);
            (a.color == b.color && a.color != victim.color).then_some(target)
        })
        .collect()
}

fn surrounders(
    board: &Board,
    mover: Square,
    target: Square,
    (rank_step, file_step): (i32, i32),
) -> (Square, Square) {
    let last_rank = board.rank_count() as i32 - 1;
    let last_file = board.file_count() as i32 - 1;
    let on_rank_edge = target.rank == 0 || target.rank == last_rank;
    let on_file_edge = target.file == 0 || target.file == last_file;

    if on_rank_edge && on_file_edge {
        let inward_rank = if target.rank == 0 { 1 } else { -1 };
        let inward_file = if target.file == 0 { 1 } else { -1 };
        (target.offset(inward_rank, 0), target.offset(0, inward_file))
    } else {
        (mover, target.offset(rank_step, file_step))
    }
}
