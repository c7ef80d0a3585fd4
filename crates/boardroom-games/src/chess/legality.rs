//! Advisory move candidates.
//!
//! Pseudo-legal only: pieces move by their movement pattern, never onto a
//! friendly piece, and sliders stop at the first occupied square. Checks,
//! pins and castling are left to the server, which accepts or rejects the
//! submitted move.

use std::collections::BTreeSet;

use super::board::{Board, Color, PieceKind, Square};

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

const KING_OFFSETS: [(i8, i8); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

const ROOK_RAYS: [(i8, i8); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];
const BISHOP_RAYS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, -1), (-1, 1)];

/// Candidate destinations for the piece on `from`.
///
/// Empty if `from` is empty.
pub fn legal_targets(board: &Board, from: Square) -> BTreeSet<Square> {
    let Some(piece) = board.piece_at(from) else {
        return BTreeSet::new();
    };

    let mut out = BTreeSet::new();
    match piece.kind {
        PieceKind::Pawn => pawn_targets(board, from, piece.color, &mut out),
        PieceKind::Knight => step_targets(board, from, piece.color, &KNIGHT_OFFSETS, &mut out),
        PieceKind::King => step_targets(board, from, piece.color, &KING_OFFSETS, &mut out),
        PieceKind::Bishop => ray_targets(board, from, piece.color, &BISHOP_RAYS, &mut out),
        PieceKind::Rook => ray_targets(board, from, piece.color, &ROOK_RAYS, &mut out),
        PieceKind::Queen => {
            ray_targets(board, from, piece.color, &ROOK_RAYS, &mut out);
            ray_targets(board, from, piece.color, &BISHOP_RAYS, &mut out);
        }
    }
    out
}

/// Whether `from → to` is a pawn reaching the far rank.
pub fn is_promotion(board: &Board, from: Square, to: Square) -> bool {
    match board.piece_at(from) {
        Some(piece) if piece.kind == PieceKind::Pawn => {
            let last_rank = match piece.color {
                Color::White => 7,
                Color::Black => 0,
            };
            to.rank == last_rank
        }
        _ => false,
    }
}

fn pawn_targets(board: &Board, from: Square, color: Color, out: &mut BTreeSet<Square>) {
    let dir = color.forward();
    let start_rank = match color {
        Color::White => 1,
        Color::Black => 6,
    };

    if let Some(one) = from.offset(0, dir).filter(|&s| board.is_empty(s)) {
        out.insert(one);
        if from.rank == start_rank {
            if let Some(two) = from.offset(0, 2 * dir).filter(|&s| board.is_empty(s)) {
                out.insert(two);
            }
        }
    }

    for df in [-1, 1] {
        let Some(diag) = from.offset(df, dir) else {
            continue;
        };
        let enemy = board.color_at(diag) == Some(color.opponent());
        if enemy || board.en_passant == Some(diag) {
            out.insert(diag);
        }
    }
}

fn step_targets(
    board: &Board,
    from: Square,
    color: Color,
    offsets: &[(i8, i8)],
    out: &mut BTreeSet<Square>,
) {
    for &(df, dr) in offsets {
        if let Some(to) = from.offset(df, dr) {
            if board.color_at(to) != Some(color) {
                out.insert(to);
            }
        }
    }
}

fn ray_targets(
    board: &Board,
    from: Square,
    color: Color,
    rays: &[(i8, i8)],
    out: &mut BTreeSet<Square>,
) {
    for &(df, dr) in rays {
        let mut cursor = from;
        while let Some(next) = cursor.offset(df, dr) {
            match board.color_at(next) {
                None => {
                    out.insert(next);
                    cursor = next;
                }
                Some(c) => {
                    if c != color {
                        out.insert(next);
                    }
                    break;
                }
            }
        }
    }
}
