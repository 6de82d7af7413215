//! Move generation
//!
//! Legality is checked in two phases: piece geometry first (`pseudo_legal`),
//! then king safety on a copied board. Every movement rule lives in the one
//! match inside `pseudo_legal`; the enumerators only propose candidates.

use crate::board::{
    AuxState, Board, CastleSide, Cell, Color, Move, Piece, PieceKind, Square, KING_HOME_FILE,
};
use crate::error::{ChessError, Result};
use crate::utils::{iter_squares, king_attacks, knight_attacks, BISHOP_DIRECTIONS, ROOK_DIRECTIONS};

/// Board, state and capture produced by applying a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Applied {
    pub board: Board,
    pub aux: AuxState,
    pub captured: Option<Piece>,
}

/// True iff the piece on `from` may go to `to` by its movement rules,
/// without asking whether its own king is left in check.
///
/// Castling is included here together with its attack conditions: the king
/// may not castle out of, through, or into check.
pub fn pseudo_legal(board: &Board, aux: &AuxState, from: Square, to: Square) -> bool {
    let Some(cell) = board.cell(from) else {
        return false;
    };
    if from == to {
        return false;
    }
    let piece = cell.piece;
    if board.get(to).is_some_and(|target| target.color == piece.color) {
        return false;
    }
    let dr = to.rank() as i8 - from.rank() as i8;
    let df = to.file() as i8 - from.file() as i8;
    match piece.kind {
        PieceKind::Pawn => pawn_move(board, aux, piece.color, from, to, dr, df),
        PieceKind::Knight => is_knight_step(dr, df),
        PieceKind::Bishop => dr.abs() == df.abs() && path_clear(board, from, to),
        PieceKind::Rook => (dr == 0 || df == 0) && path_clear(board, from, to),
        PieceKind::Queen => {
            (dr == 0 || df == 0 || dr.abs() == df.abs()) && path_clear(board, from, to)
        }
        PieceKind::King => (dr.abs() <= 1 && df.abs() <= 1) || castling_move(board, cell, from, to),
    }
}

/// Attack-only geometry: does the piece on `from` hit `to`? Pawns attack
/// diagonally whatever stands there, and castling never attacks.
pub fn attacks(board: &Board, from: Square, to: Square) -> bool {
    let Some(piece) = board.get(from) else {
        return false;
    };
    if from == to {
        return false;
    }
    let dr = to.rank() as i8 - from.rank() as i8;
    let df = to.file() as i8 - from.file() as i8;
    match piece.kind {
        PieceKind::Pawn => dr == piece.color.forward() && df.abs() == 1,
        PieceKind::Knight => is_knight_step(dr, df),
        PieceKind::Bishop => dr.abs() == df.abs() && path_clear(board, from, to),
        PieceKind::Rook => (dr == 0 || df == 0) && path_clear(board, from, to),
        PieceKind::Queen => {
            (dr == 0 || df == 0 || dr.abs() == df.abs()) && path_clear(board, from, to)
        }
        PieceKind::King => dr.abs() <= 1 && df.abs() <= 1,
    }
}

fn is_knight_step(dr: i8, df: i8) -> bool {
    matches!((dr.abs(), df.abs()), (1, 2) | (2, 1))
}

/// Squares strictly between `from` and `to` on a line are all empty.
fn path_clear(board: &Board, from: Square, to: Square) -> bool {
    let dr = (to.rank() as i8 - from.rank() as i8).signum();
    let df = (to.file() as i8 - from.file() as i8).signum();
    let mut cur = from;
    loop {
        match cur.offset(dr, df) {
            Some(next) if next == to => return true,
            Some(next) => {
                if !board.is_empty(next) {
                    return false;
                }
                cur = next;
            }
            None => return false,
        }
    }
}

fn pawn_move(
    board: &Board,
    aux: &AuxState,
    color: Color,
    from: Square,
    to: Square,
    dr: i8,
    df: i8,
) -> bool {
    let fwd = color.forward();
    if df == 0 {
        if !board.is_empty(to) {
            return false;
        }
        if dr == fwd {
            return true;
        }
        return dr == 2 * fwd
            && from.rank() == color.pawn_rank()
            && from.offset(fwd, 0).is_some_and(|mid| board.is_empty(mid));
    }
    if df.abs() != 1 || dr != fwd {
        return false;
    }
    match board.get(to) {
        Some(target) => target.color != color,
        None => is_en_passant(board, aux, color, from, to),
    }
}

/// Diagonal pawn step onto the en-passant target with the double-pushed
/// enemy pawn standing beside the capturer.
fn is_en_passant(board: &Board, aux: &AuxState, color: Color, from: Square, to: Square) -> bool {
    aux.en_passant == Some(to)
        && board.get(Square::new(from.rank(), to.file()))
            == Some(Piece::new(PieceKind::Pawn, color.opponent()))
}

fn castling_move(board: &Board, king: Cell, from: Square, to: Square) -> bool {
    let color = king.piece.color;
    let rank = color.back_rank();
    if king.has_moved || from != Square::new(rank, KING_HOME_FILE) || to.rank() != rank {
        return false;
    }
    let side = match to.file() {
        6 => CastleSide::King,
        2 => CastleSide::Queen,
        _ => return false,
    };
    if !board.castling_right(color, side) {
        return false;
    }
    let rook_file = side.rook_file();
    let (lo, hi) = if rook_file > KING_HOME_FILE {
        (KING_HOME_FILE + 1, rook_file)
    } else {
        (rook_file + 1, KING_HOME_FILE)
    };
    if (lo..hi).any(|file| !board.is_empty(Square::new(rank, file))) {
        return false;
    }
    let enemy = color.opponent();
    let step: i8 = if side == CastleSide::King { 1 } else { -1 };
    [0, step, 2 * step].iter().all(|&d| {
        let sq = Square::new(rank, (KING_HOME_FILE as i8 + d) as u8);
        !square_attacked_by(board, sq, enemy)
    })
}

/// True iff any piece of `by` attacks `sq`. Scans outward from the target.
pub fn square_attacked_by(board: &Board, sq: Square, by: Color) -> bool {
    let pawn = Some(Piece::new(PieceKind::Pawn, by));
    for df in [-1, 1] {
        if sq
            .offset(-by.forward(), df)
            .is_some_and(|from| board.get(from) == pawn)
        {
            return true;
        }
    }
    let knight = Some(Piece::new(PieceKind::Knight, by));
    if iter_squares(knight_attacks(sq)).any(|from| board.get(from) == knight) {
        return true;
    }
    let king = Some(Piece::new(PieceKind::King, by));
    if iter_squares(king_attacks(sq)).any(|from| board.get(from) == king) {
        return true;
    }
    let sliders = [
        (ROOK_DIRECTIONS, PieceKind::Rook),
        (BISHOP_DIRECTIONS, PieceKind::Bishop),
    ];
    for (directions, kind) in sliders {
        for (dr, df) in directions {
            let mut cur = sq;
            while let Some(next) = cur.offset(dr, df) {
                if let Some(piece) = board.get(next) {
                    if piece.color == by && (piece.kind == kind || piece.kind == PieceKind::Queen) {
                        return true;
                    }
                    break;
                }
                cur = next;
            }
        }
    }
    false
}

/// A side without a king on the board is never in check.
pub fn in_check(board: &Board, color: Color) -> bool {
    board
        .king_square(color)
        .is_some_and(|king| square_attacked_by(board, king, color.opponent()))
}

// Geometric destination proposals; pseudo_legal has the final word.
fn candidate_targets(board: &Board, from: Square, piece: Piece) -> Vec<Square> {
    let mut out = Vec::with_capacity(28);
    match piece.kind {
        PieceKind::Pawn => {
            let fwd = piece.color.forward();
            for (dr, df) in [(fwd, 0), (2 * fwd, 0), (fwd, -1), (fwd, 1)] {
                if let Some(to) = from.offset(dr, df) {
                    out.push(to);
                }
            }
        }
        PieceKind::Knight => out.extend(iter_squares(knight_attacks(from))),
        PieceKind::King => {
            out.extend(iter_squares(king_attacks(from)));
            let rank = piece.color.back_rank();
            if from == Square::new(rank, KING_HOME_FILE) {
                out.push(Square::new(rank, CastleSide::King.king_target_file()));
                out.push(Square::new(rank, CastleSide::Queen.king_target_file()));
            }
        }
        PieceKind::Bishop | PieceKind::Rook | PieceKind::Queen => {
            let straight = piece.kind != PieceKind::Bishop;
            let diagonal = piece.kind != PieceKind::Rook;
            let directions = ROOK_DIRECTIONS
                .iter()
                .filter(|_| straight)
                .chain(BISHOP_DIRECTIONS.iter().filter(|_| diagonal));
            for &(dr, df) in directions {
                let mut cur = from;
                while let Some(next) = cur.offset(dr, df) {
                    out.push(next);
                    if !board.is_empty(next) {
                        break;
                    }
                    cur = next;
                }
            }
        }
    }
    out
}

/// Destinations open to the knights, bishops, rooks and queens of `color`:
/// empty or enemy-occupied squares in reach, pins ignored.
pub fn mobility(board: &Board, color: Color) -> usize {
    board
        .pieces_of(color)
        .filter(|(_, cell)| !matches!(cell.piece.kind, PieceKind::Pawn | PieceKind::King))
        .map(|(from, cell)| {
            candidate_targets(board, from, cell.piece)
                .into_iter()
                .filter(|&to| board.get(to).map_or(true, |p| p.color != color))
                .count()
        })
        .sum()
}

fn keeps_king_safe(board: &Board, aux: &AuxState, color: Color, from: Square, to: Square) -> bool {
    let after = apply_move(board, aux, Move::new(from, to));
    !in_check(&after.board, color)
}

/// Destinations from `from` that are pseudo-legal for `color` and do not
/// leave that color's king in check.
pub fn legal_moves_from(board: &Board, aux: &AuxState, color: Color, from: Square) -> Vec<Square> {
    let piece = match board.get(from) {
        Some(piece) if piece.color == color => piece,
        _ => return Vec::new(),
    };
    candidate_targets(board, from, piece)
        .into_iter()
        .filter(|&to| pseudo_legal(board, aux, from, to))
        .filter(|&to| keeps_king_safe(board, aux, color, from, to))
        .collect()
}

/// Every legal move of `color`, one entry per promotion choice.
pub fn all_legal_moves(board: &Board, aux: &AuxState, color: Color) -> Vec<Move> {
    let mut moves = Vec::with_capacity(64);
    for (from, cell) in board.pieces_of(color) {
        let promotes = cell.piece.kind == PieceKind::Pawn;
        for to in legal_moves_from(board, aux, color, from) {
            if promotes && to.rank() == color.promotion_rank() {
                for kind in PieceKind::PROMOTIONS {
                    moves.push(Move::with_promotion(from, to, kind));
                }
            } else {
                moves.push(Move::new(from, to));
            }
        }
    }
    moves
}

/// Short-circuiting form of `!all_legal_moves(..).is_empty()`.
pub fn has_legal_move(board: &Board, aux: &AuxState, color: Color) -> bool {
    board.pieces_of(color).any(|(from, cell)| {
        candidate_targets(board, from, cell.piece)
            .into_iter()
            .any(|to| pseudo_legal(board, aux, from, to) && keeps_king_safe(board, aux, color, from, to))
    })
}

/// Check a requested move for the side to move and return it normalized:
/// a pawn reaching the last rank without a promotion kind becomes a queen.
pub fn validate(board: &Board, aux: &AuxState, mv: Move) -> Result<Move> {
    let piece = match board.get(mv.from) {
        Some(piece) if piece.color == aux.side => piece,
        Some(_) => {
            return Err(ChessError::IllegalMove {
                mv,
                reason: "piece belongs to the side not on move",
            })
        }
        None => {
            return Err(ChessError::IllegalMove {
                mv,
                reason: "no piece on the origin square",
            })
        }
    };
    if !pseudo_legal(board, aux, mv.from, mv.to) {
        return Err(ChessError::IllegalMove {
            mv,
            reason: "piece cannot move that way",
        });
    }
    if !keeps_king_safe(board, aux, aux.side, mv.from, mv.to) {
        return Err(ChessError::IllegalMove {
            mv,
            reason: "own king would be in check",
        });
    }
    let promotes = piece.kind == PieceKind::Pawn && mv.to.rank() == piece.color.promotion_rank();
    match (promotes, mv.promotion) {
        (true, None) => Ok(Move::with_promotion(mv.from, mv.to, PieceKind::Queen)),
        (true, Some(kind)) if PieceKind::PROMOTIONS.contains(&kind) => Ok(mv),
        (true, Some(_)) => Err(ChessError::IllegalMove {
            mv,
            reason: "invalid promotion piece",
        }),
        (false, Some(_)) => Err(ChessError::IllegalMove {
            mv,
            reason: "only a pawn reaching the last rank promotes",
        }),
        (false, None) => Ok(mv),
    }
}

/// Apply a move without validating it. The origin square must hold a piece;
/// an empty origin returns the inputs unchanged.
///
/// Handles en-passant removal, castling rook relocation, promotion (queen if
/// unspecified), `has_moved` flags and the side/clock state.
pub fn apply_move(board: &Board, aux: &AuxState, mv: Move) -> Applied {
    let mut next = *board;
    let Some(cell) = next.take(mv.from) else {
        debug_assert!(false, "apply_move from an empty square");
        return Applied {
            board: next,
            aux: *aux,
            captured: None,
        };
    };
    let mover = cell.piece;
    let mut captured = next.take(mv.to).map(|c| c.piece);

    if mover.kind == PieceKind::Pawn
        && mv.from.file() != mv.to.file()
        && captured.is_none()
        && aux.en_passant == Some(mv.to)
    {
        captured = next
            .take(Square::new(mv.from.rank(), mv.to.file()))
            .map(|c| c.piece);
    }

    let df = mv.to.file() as i8 - mv.from.file() as i8;
    if mover.kind == PieceKind::King && df.abs() == 2 {
        let side = if df > 0 {
            CastleSide::King
        } else {
            CastleSide::Queen
        };
        let rank = mv.from.rank();
        if let Some(mut rook) = next.take(Square::new(rank, side.rook_file())) {
            rook.has_moved = true;
            next.set_cell(Square::new(rank, side.rook_target_file()), Some(rook));
        }
    }

    let kind = if mover.kind == PieceKind::Pawn && mv.to.rank() == mover.color.promotion_rank() {
        mv.promotion.unwrap_or(PieceKind::Queen)
    } else {
        mover.kind
    };
    next.set_cell(
        mv.to,
        Some(Cell {
            piece: Piece::new(kind, mover.color),
            has_moved: true,
        }),
    );

    let dr = mv.to.rank() as i8 - mv.from.rank() as i8;
    let en_passant = if mover.kind == PieceKind::Pawn && dr.abs() == 2 {
        mv.from.offset(dr / 2, 0)
    } else {
        None
    };
    let halfmove = if mover.kind == PieceKind::Pawn || captured.is_some() {
        0
    } else {
        aux.halfmove.saturating_add(1)
    };
    let fullmove = if mover.color == Color::Black {
        aux.fullmove.saturating_add(1)
    } else {
        aux.fullmove
    };

    Applied {
        board: next,
        aux: AuxState {
            side: mover.color.opponent(),
            en_passant,
            halfmove,
            fullmove,
        },
        captured,
    }
}

/// Leaf count of the legal move tree to `depth` plies.
pub fn perft(board: &Board, aux: &AuxState, depth: u8) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = all_legal_moves(board, aux, aux.side);
    if depth == 1 {
        return moves.len() as u64;
    }
    moves
        .into_iter()
        .map(|mv| {
            let next = apply_move(board, aux, mv);
            perft(&next.board, &next.aux, depth - 1)
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fen::decode;

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    #[test]
    fn twenty_moves_from_the_start() {
        let board = Board::standard();
        let aux = AuxState::default();
        assert_eq!(all_legal_moves(&board, &aux, Color::White).len(), 20);
        assert_eq!(all_legal_moves(&board, &aux, Color::Black).len(), 20);
    }

    #[test]
    fn pinned_knight_has_no_moves() {
        let (board, aux) = decode("4k3/4r3/8/8/8/8/4N3/4K3 w - - 0 1").unwrap();
        assert!(legal_moves_from(&board, &aux, Color::White, sq("e2")).is_empty());
        // geometry alone would allow it
        assert!(pseudo_legal(&board, &aux, sq("e2"), sq("c3")));
    }

    #[test]
    fn castling_both_sides_when_clear() {
        let (board, aux) = decode("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let targets = legal_moves_from(&board, &aux, Color::White, sq("e1"));
        assert!(targets.contains(&sq("g1")));
        assert!(targets.contains(&sq("c1")));

        let after = apply_move(&board, &aux, Move::new(sq("e1"), sq("g1")));
        assert_eq!(after.board.get(sq("f1")).map(|p| p.kind), Some(PieceKind::Rook));
        assert!(after.board.is_empty(sq("h1")));
        assert!(!after.board.castling_right(Color::White, CastleSide::Queen));
    }

    #[test]
    fn no_castling_through_attacked_square() {
        // black rook on f8 covers f1
        let (board, aux) = decode("4kr2/8/8/8/8/8/8/4K2R w K - 0 1").unwrap();
        let targets = legal_moves_from(&board, &aux, Color::White, sq("e1"));
        assert!(!targets.contains(&sq("g1")));
    }

    #[test]
    fn no_castling_out_of_check() {
        let (board, aux) = decode("4k3/8/8/8/8/8/4r3/R3K2R w KQ - 0 1").unwrap();
        let targets = legal_moves_from(&board, &aux, Color::White, sq("e1"));
        assert!(!targets.contains(&sq("g1")));
        assert!(!targets.contains(&sq("c1")));
    }

    #[test]
    fn queenside_castling_needs_b_file_empty_but_not_safe() {
        // b1 attacked is fine, b1 occupied is not
        let (board, aux) = decode("1r2k3/8/8/8/8/8/8/R3K3 w Q - 0 1").unwrap();
        assert!(legal_moves_from(&board, &aux, Color::White, sq("e1")).contains(&sq("c1")));
        let (board, aux) = decode("4k3/8/8/8/8/8/8/RN2K3 w Q - 0 1").unwrap();
        assert!(!legal_moves_from(&board, &aux, Color::White, sq("e1")).contains(&sq("c1")));
    }

    #[test]
    fn en_passant_capture_removes_the_pawn() {
        let (board, aux) = decode("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2").unwrap();
        let targets = legal_moves_from(&board, &aux, Color::White, sq("e5"));
        assert!(targets.contains(&sq("d6")));
        let after = apply_move(&board, &aux, Move::new(sq("e5"), sq("d6")));
        assert!(after.board.is_empty(sq("d5")));
        assert_eq!(after.captured, Some(Piece::new(PieceKind::Pawn, Color::Black)));
        assert_eq!(after.aux.halfmove, 0);
    }

    #[test]
    fn promotions_expand_to_four_moves() {
        let (board, aux) = decode("8/P6k/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let moves: Vec<Move> = all_legal_moves(&board, &aux, Color::White)
            .into_iter()
            .filter(|m| m.from == sq("a7"))
            .collect();
        assert_eq!(moves.len(), 4);
        let after = apply_move(&board, &aux, Move::with_promotion(sq("a7"), sq("a8"), PieceKind::Knight));
        assert_eq!(after.board.get(sq("a8")).map(|p| p.kind), Some(PieceKind::Knight));
    }

    #[test]
    fn validate_defaults_promotion_to_queen() {
        let (board, aux) = decode("8/P6k/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let mv = validate(&board, &aux, Move::new(sq("a7"), sq("a8"))).unwrap();
        assert_eq!(mv.promotion, Some(PieceKind::Queen));
        assert!(validate(&board, &aux, Move::with_promotion(sq("a7"), sq("a8"), PieceKind::King)).is_err());
        assert!(validate(&board, &aux, Move::with_promotion(sq("a1"), sq("a2"), PieceKind::Queen)).is_err());
    }

    #[test]
    fn validate_rejects_wrong_side_and_self_check() {
        let board = Board::standard();
        let aux = AuxState::default();
        assert!(matches!(
            validate(&board, &aux, Move::new(sq("e7"), sq("e5"))),
            Err(ChessError::IllegalMove { .. })
        ));
        let (board, aux) = decode("4k3/4r3/8/8/8/8/4N3/4K3 w - - 0 1").unwrap();
        assert!(validate(&board, &aux, Move::new(sq("e2"), sq("c3"))).is_err());
    }

    #[test]
    fn double_push_sets_target_and_counters() {
        let board = Board::standard();
        let aux = AuxState::default();
        let after = apply_move(&board, &aux, Move::new(sq("e2"), sq("e4")));
        assert_eq!(after.aux.en_passant, Some(sq("e3")));
        assert_eq!(after.aux.side, Color::Black);
        assert_eq!(after.aux.fullmove, 1);
        let after = apply_move(&after.board, &after.aux, Move::new(sq("g8"), sq("f6")));
        assert_eq!(after.aux.en_passant, None);
        assert_eq!(after.aux.halfmove, 1);
        assert_eq!(after.aux.fullmove, 2);
    }

    #[test]
    fn attack_scan_matches_geometry() {
        let (board, _) =
            decode("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1").unwrap();
        for target in Square::all() {
            for color in Color::BOTH {
                let by_geometry = board
                    .pieces_of(color)
                    .any(|(from, _)| attacks(&board, from, target));
                assert_eq!(
                    square_attacked_by(&board, target, color),
                    by_geometry,
                    "attack mismatch on {} by {}",
                    target,
                    color
                );
            }
        }
    }

    #[test]
    fn perft_start_shallow() {
        let board = Board::standard();
        let aux = AuxState::default();
        assert_eq!(perft(&board, &aux, 1), 20);
        assert_eq!(perft(&board, &aux, 2), 400);
        assert_eq!(perft(&board, &aux, 3), 8902);
    }
}
