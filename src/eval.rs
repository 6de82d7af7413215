//! Static evaluation: material, piece-square tables, mobility and king safety
//!
//! Tables are written from White's side with a1 at index 0. Black pieces
//! read them through a vertical flip (`sq ^ 56`), so the whole score is
//! colour-symmetric and the starting position evaluates to exactly 0.

use crate::board::{Board, Color, PieceKind, Square};
use crate::movegen::mobility;

// ============================================================================
// PIECE-SQUARE TABLES (White's view, rank 1 first)
// ============================================================================

#[rustfmt::skip]
const PAWN_PSQT: [i16; 64] = [
      0,   0,   0,   0,   0,   0,   0,   0,
      5,  10,  10, -20, -20,  10,  10,   5,
      5,  -5, -10,   0,   0, -10,  -5,   5,
      0,   0,   0,  20,  20,   0,   0,   0,
      5,   5,  10,  25,  25,  10,   5,   5,
     10,  10,  20,  30,  30,  20,  10,  10,
     50,  50,  50,  50,  50,  50,  50,  50,
      0,   0,   0,   0,   0,   0,   0,   0,
];

#[rustfmt::skip]
const KNIGHT_PSQT: [i16; 64] = [
    -50, -40, -30, -30, -30, -30, -40, -50,
    -40, -20,   0,   5,   5,   0, -20, -40,
    -30,   5,  10,  15,  15,  10,   5, -30,
    -30,   0,  15,  20,  20,  15,   0, -30,
    -30,   5,  15,  20,  20,  15,   5, -30,
    -30,   0,  10,  15,  15,  10,   0, -30,
    -40, -20,   0,   0,   0,   0, -20, -40,
    -50, -40, -30, -30, -30, -30, -40, -50,
];

#[rustfmt::skip]
const BISHOP_PSQT: [i16; 64] = [
    -20, -10, -10, -10, -10, -10, -10, -20,
    -10,   5,   0,   0,   0,   0,   5, -10,
    -10,  10,  10,  10,  10,  10,  10, -10,
    -10,   0,  10,  10,  10,  10,   0, -10,
    -10,   5,   5,  10,  10,   5,   5, -10,
    -10,   0,   5,  10,  10,   5,   0, -10,
    -10,   0,   0,   0,   0,   0,   0, -10,
    -20, -10, -10, -10, -10, -10, -10, -20,
];

#[rustfmt::skip]
const ROOK_PSQT: [i16; 64] = [
      0,   0,   0,   5,   5,   0,   0,   0,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
      5,  10,  10,  10,  10,  10,  10,   5,
      0,   0,   0,   0,   0,   0,   0,   0,
];

#[rustfmt::skip]
const QUEEN_PSQT: [i16; 64] = [
    -20, -10, -10,  -5,  -5, -10, -10, -20,
    -10,   0,   5,   0,   0,   0,   0, -10,
    -10,   5,   5,   5,   5,   5,   0, -10,
      0,   0,   5,   5,   5,   5,   0,  -5,
     -5,   0,   5,   5,   5,   5,   0,  -5,
    -10,   0,   5,   5,   5,   5,   0, -10,
    -10,   0,   0,   0,   0,   0,   0, -10,
    -20, -10, -10,  -5,  -5, -10, -10, -20,
];

#[rustfmt::skip]
const KING_PSQT: [i16; 64] = [
     20,  30,  10,   0,   0,  10,  30,  20,
     20,  20,   0,   0,   0,   0,  20,  20,
    -10, -20, -20, -20, -20, -20, -20, -10,
    -20, -30, -30, -40, -40, -30, -30, -20,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
];

fn psqt(kind: PieceKind) -> &'static [i16; 64] {
    match kind {
        PieceKind::Pawn => &PAWN_PSQT,
        PieceKind::Knight => &KNIGHT_PSQT,
        PieceKind::Bishop => &BISHOP_PSQT,
        PieceKind::Rook => &ROOK_PSQT,
        PieceKind::Queen => &QUEEN_PSQT,
        PieceKind::King => &KING_PSQT,
    }
}

/// Table value of `kind` standing on `sq` for `color`.
pub fn psqt_value(kind: PieceKind, color: Color, sq: Square) -> i32 {
    let idx = match color {
        Color::White => sq.index(),
        Color::Black => sq.index() ^ 56,
    };
    psqt(kind)[idx] as i32
}

// ============================================================================
// POSITIONAL TERMS
// ============================================================================

const CENTER_BONUS: i32 = 6;
const SHIELD_PAWN_BONUS: i32 = 6;
const CENTRAL_KING_PENALTY: i32 = 15;
/// Per reachable square of a minor or major piece.
const MOBILITY_BONUS: i32 = 2;

fn is_center(sq: Square) -> bool {
    (3..=4).contains(&sq.rank()) && (3..=4).contains(&sq.file())
}

/// Friendly pawns on the three squares directly in front of the king.
fn count_pawn_shield(board: &Board, king: Square, color: Color) -> i32 {
    (-1..=1)
        .filter_map(|df| king.offset(color.forward(), df))
        .filter(|&sq| {
            board
                .get(sq)
                .is_some_and(|p| p.kind == PieceKind::Pawn && p.color == color)
        })
        .count() as i32
}

/// Shield bonus, minus a penalty for a king wandering the central 4x4 block.
fn king_safety(board: &Board, color: Color) -> i32 {
    let Some(king) = board.king_square(color) else {
        return 0;
    };
    let mut safety = SHIELD_PAWN_BONUS * count_pawn_shield(board, king, color);
    if (2..=5).contains(&king.rank()) && (2..=5).contains(&king.file()) {
        safety -= CENTRAL_KING_PENALTY;
    }
    safety
}

/// Static score in centipawns, positive when White is better.
pub fn score(board: &Board) -> i32 {
    let mut total = 0;
    for (sq, cell) in board.pieces() {
        let piece = cell.piece;
        let mut value = piece.kind.value() + psqt_value(piece.kind, piece.color, sq);
        if is_center(sq) {
            value += CENTER_BONUS;
        }
        match piece.color {
            Color::White => total += value,
            Color::Black => total -= value,
        }
    }
    let mobility_diff =
        mobility(board, Color::White) as i32 - mobility(board, Color::Black) as i32;
    total + MOBILITY_BONUS * mobility_diff + king_safety(board, Color::White)
        - king_safety(board, Color::Black)
}

/// Score from `side`'s point of view, as negamax wants it.
pub fn score_for(board: &Board, side: Color) -> i32 {
    match side {
        Color::White => score(board),
        Color::Black => -score(board),
    }
}
