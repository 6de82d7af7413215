//! Position text codec
//!
//! Six space-separated fields: placement (rank 8 first), side, castling,
//! en-passant, half-move clock, full-move number. Castling letters are derived
//! from `has_moved` flags when encoding and turned back into flags when
//! decoding.

use crate::board::{AuxState, Board, CastleSide, Cell, Color, Piece, PieceKind, Square, KING_HOME_FILE};
use crate::error::{ChessError, Result};
use crate::movegen::in_check;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Repetition key: placement, side, castling and en-passant, no counters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PositionKey(String);

impl PositionKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PositionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

const CASTLING_LETTERS: [(char, Color, CastleSide); 4] = [
    ('K', Color::White, CastleSide::King),
    ('Q', Color::White, CastleSide::Queen),
    ('k', Color::Black, CastleSide::King),
    ('q', Color::Black, CastleSide::Queen),
];

fn placement(board: &Board) -> String {
    let mut out = String::with_capacity(64);
    for rank in (0..8u8).rev() {
        let mut empty = 0;
        for file in 0..8u8 {
            match board.get(Square::new(rank, file)) {
                Some(piece) => {
                    if empty > 0 {
                        out.push(char::from(b'0' + empty));
                        empty = 0;
                    }
                    out.push(piece.fen_char());
                }
                None => empty += 1,
            }
        }
        if empty > 0 {
            out.push(char::from(b'0' + empty));
        }
        if rank > 0 {
            out.push('/');
        }
    }
    out
}

fn castling_field(board: &Board) -> String {
    let letters: String = CASTLING_LETTERS
        .iter()
        .filter(|(_, color, side)| board.castling_right(*color, *side))
        .map(|(ch, _, _)| *ch)
        .collect();
    if letters.is_empty() {
        "-".to_string()
    } else {
        letters
    }
}

fn side_char(color: Color) -> char {
    match color {
        Color::White => 'w',
        Color::Black => 'b',
    }
}

fn key_fields(board: &Board, aux: &AuxState) -> String {
    let ep = aux
        .en_passant
        .map_or_else(|| "-".to_string(), |sq| sq.to_string());
    format!(
        "{} {} {} {}",
        placement(board),
        side_char(aux.side),
        castling_field(board),
        ep
    )
}

pub fn encode(board: &Board, aux: &AuxState) -> String {
    format!(
        "{} {} {}",
        key_fields(board, aux),
        aux.halfmove,
        aux.fullmove
    )
}

pub fn position_key(board: &Board, aux: &AuxState) -> PositionKey {
    PositionKey(key_fields(board, aux))
}

fn malformed(msg: impl Into<String>) -> ChessError {
    ChessError::MalformedPosition(msg.into())
}

/// Parse position text. Nothing is returned unless every field is valid and
/// the placement is consistent (one king each, no pawn on a back rank,
/// castling letters backed by pieces, a plausible en-passant square).
pub fn decode(text: &str) -> Result<(Board, AuxState)> {
    let fields: Vec<&str> = text.split_whitespace().collect();
    if fields.len() != 6 {
        return Err(malformed(format!(
            "expected 6 fields, found {}",
            fields.len()
        )));
    }

    let mut board = parse_placement(fields[0])?;

    let side = match fields[1] {
        "w" => Color::White,
        "b" => Color::Black,
        other => return Err(malformed(format!("invalid side '{}'", other))),
    };

    for color in Color::BOTH {
        if board.count(PieceKind::King, color) != 1 {
            return Err(malformed(format!("{} must have exactly one king", color)));
        }
    }
    for (sq, cell) in board.pieces() {
        if cell.piece.kind == PieceKind::Pawn && (sq.rank() == 0 || sq.rank() == 7) {
            return Err(malformed(format!("pawn on back rank at {}", sq)));
        }
    }
    // the king of the side that just moved can never be left attacked
    if in_check(&board, side.opponent()) {
        return Err(malformed(format!(
            "{} is in check with {} to move",
            side.opponent(),
            side
        )));
    }

    let rights = parse_castling(fields[2])?;
    mark_moved(&mut board, &rights)?;

    let en_passant = parse_en_passant(fields[3], &board, side)?;

    let halfmove: u16 = fields[4]
        .parse()
        .map_err(|_| malformed(format!("invalid half-move clock '{}'", fields[4])))?;
    let fullmove: u16 = fields[5]
        .parse()
        .map_err(|_| malformed(format!("invalid full-move number '{}'", fields[5])))?;
    if fullmove == 0 {
        return Err(malformed("full-move number starts at 1"));
    }

    Ok((
        board,
        AuxState {
            side,
            en_passant,
            halfmove,
            fullmove,
        },
    ))
}

fn parse_placement(field: &str) -> Result<Board> {
    let rows: Vec<&str> = field.split('/').collect();
    if rows.len() != 8 {
        return Err(malformed(format!("expected 8 ranks, found {}", rows.len())));
    }
    let mut board = Board::empty();
    for (i, row) in rows.iter().enumerate() {
        let rank = 7 - i as u8;
        let mut file: u8 = 0;
        for ch in row.chars() {
            if let Some(run) = ch.to_digit(10) {
                if !(1..=8).contains(&run) {
                    return Err(malformed(format!("invalid empty run '{}'", ch)));
                }
                file += run as u8;
            } else {
                let piece = Piece::from_fen_char(ch)
                    .ok_or_else(|| malformed(format!("invalid piece char '{}'", ch)))?;
                if file >= 8 {
                    return Err(malformed(format!("rank {} overflows", rank + 1)));
                }
                board.set(Square::new(rank, file), Some(piece));
                file += 1;
            }
            if file > 8 {
                return Err(malformed(format!("rank {} overflows", rank + 1)));
            }
        }
        if file != 8 {
            return Err(malformed(format!("rank {} has {} files", rank + 1, file)));
        }
    }
    Ok(board)
}

fn parse_castling(field: &str) -> Result<Vec<(Color, CastleSide)>> {
    if field == "-" {
        return Ok(Vec::new());
    }
    let mut rights = Vec::with_capacity(4);
    for ch in field.chars() {
        let (_, color, side) = CASTLING_LETTERS
            .iter()
            .find(|(letter, _, _)| *letter == ch)
            .ok_or_else(|| malformed(format!("invalid castling letter '{}'", ch)))?;
        if rights.contains(&(*color, *side)) {
            return Err(malformed(format!("repeated castling letter '{}'", ch)));
        }
        rights.push((*color, *side));
    }
    Ok(rights)
}

// Kings and rooks count as moved unless a castling right names them. The flag
// means nothing for the other kinds, so they stay unmoved.
fn mark_moved(board: &mut Board, rights: &[(Color, CastleSide)]) -> Result<()> {
    let squares: Vec<(Square, Cell)> = board.pieces().collect();
    for (sq, mut cell) in squares {
        cell.has_moved = matches!(cell.piece.kind, PieceKind::King | PieceKind::Rook);
        board.set_cell(sq, Some(cell));
    }
    for &(color, side) in rights {
        let rank = color.back_rank();
        let king_sq = Square::new(rank, KING_HOME_FILE);
        let rook_sq = Square::new(rank, side.rook_file());
        let backed = board.get(king_sq) == Some(Piece::new(PieceKind::King, color))
            && board.get(rook_sq) == Some(Piece::new(PieceKind::Rook, color));
        if !backed {
            return Err(malformed(format!(
                "castling right for {} without king and rook at home",
                color
            )));
        }
        for sq in [king_sq, rook_sq] {
            if let Some(mut cell) = board.cell(sq) {
                cell.has_moved = false;
                board.set_cell(sq, Some(cell));
            }
        }
    }
    Ok(())
}

fn parse_en_passant(field: &str, board: &Board, side: Color) -> Result<Option<Square>> {
    if field == "-" {
        return Ok(None);
    }
    let sq: Square = field
        .parse()
        .map_err(|_| malformed(format!("invalid en-passant square '{}'", field)))?;
    let pusher = side.opponent();
    // the skipped square sits one step behind the pushed pawn
    let expected_rank = pusher.pawn_rank() as i8 + pusher.forward();
    if sq.rank() as i8 != expected_rank {
        return Err(malformed(format!(
            "en-passant square {} on the wrong rank",
            sq
        )));
    }
    let pawn_sq = sq.offset(pusher.forward(), 0);
    let pawn_there = pawn_sq.is_some_and(|p| board.get(p) == Some(Piece::new(PieceKind::Pawn, pusher)));
    if !pawn_there || !board.is_empty(sq) {
        return Err(malformed(format!(
            "en-passant square {} without a pushed pawn",
            sq
        )));
    }
    Ok(Some(sq))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::START_FEN;

    #[test]
    fn start_position_round_trip() {
        let (board, aux) = decode(START_FEN).unwrap();
        assert_eq!(board, Board::standard());
        assert_eq!(aux, AuxState::default());
        assert_eq!(encode(&board, &aux), START_FEN);
    }

    #[test]
    fn key_drops_counters() {
        let (board, aux) = decode("4k3/8/8/8/8/8/8/4K3 b - - 37 90").unwrap();
        assert_eq!(position_key(&board, &aux).as_str(), "4k3/8/8/8/8/8/8/4K3 b - -");
    }

    #[test]
    fn rights_drive_moved_flags() {
        let (board, _) = decode("r3k2r/8/8/8/8/8/8/R3K2R w Kq - 0 1").unwrap();
        assert!(board.castling_right(Color::White, CastleSide::King));
        assert!(!board.castling_right(Color::White, CastleSide::Queen));
        assert!(!board.castling_right(Color::Black, CastleSide::King));
        assert!(board.castling_right(Color::Black, CastleSide::Queen));
    }

    #[test]
    fn attacked_king_only_for_side_to_move() {
        assert!(decode("4k3/8/8/8/8/8/4R3/4K3 b - - 0 1").is_ok());
        assert!(matches!(
            decode("4k3/8/8/8/8/8/4R3/4K3 w - - 0 1"),
            Err(ChessError::MalformedPosition(_))
        ));
    }

    #[test]
    fn rejects_malformed_text() {
        let bad = [
            "",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP w KQkq - 0 1",
            "rnbqkbnr/pppppppp/9/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "rnbqkbnr/ppppxppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "rnbqkbnr/ppppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkx - 0 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq e9 0 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - x 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 0",
            "8/8/8/8/8/8/8/4K3 w - - 0 1",
            "4k3/8/8/8/8/8/8/4KK2 w - - 0 1",
            "P3k3/8/8/8/8/8/8/4K3 w - - 0 1",
            "4k3/8/8/8/8/8/8/4K3 w K - 0 1",
            "4k3/8/8/8/8/8/8/4K3 w - e6 0 1",
            "4k3/8/8/8/8/8/8/4K3 w - e3 0 1",
            "4k3/8/8/8/8/8/4R3/4K3 w - - 0 1",
        ];
        for text in bad {
            assert!(
                matches!(decode(text), Err(ChessError::MalformedPosition(_))),
                "accepted '{}'",
                text
            );
        }
    }

    #[test]
    fn accepts_en_passant_after_push() {
        let text = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6 0 2";
        let (board, aux) = decode(text).unwrap();
        assert_eq!(aux.en_passant, Some("e6".parse().unwrap()));
        assert_eq!(encode(&board, &aux), text);
    }
}
