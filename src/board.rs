// Square mapping: rank 0 is White's back rank, file 0 is the a-file.
// Index form (rank * 8 + file) gives A1=0, B1=1, ..., H8=63.

use crate::error::ChessError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    White = 0,
    Black = 1,
}

impl Color {
    pub const BOTH: [Color; 2] = [Color::White, Color::Black];

    pub fn opponent(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Rank delta of a single pawn step.
    pub fn forward(self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    pub fn back_rank(self) -> u8 {
        match self {
            Color::White => 0,
            Color::Black => 7,
        }
    }

    pub fn pawn_rank(self) -> u8 {
        match self {
            Color::White => 1,
            Color::Black => 6,
        }
    }

    pub fn promotion_rank(self) -> u8 {
        match self {
            Color::White => 7,
            Color::Black => 0,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PieceKind {
    Pawn = 0,
    Knight = 1,
    Bishop = 2,
    Rook = 3,
    Queen = 4,
    King = 5,
}

impl PieceKind {
    pub const ALL: [PieceKind; 6] = [
        PieceKind::Pawn,
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
        PieceKind::King,
    ];

    /// Kinds a pawn may promote to, strongest first.
    pub const PROMOTIONS: [PieceKind; 4] = [
        PieceKind::Queen,
        PieceKind::Rook,
        PieceKind::Bishop,
        PieceKind::Knight,
    ];

    /// Material value in centipawns. The king is excluded from material.
    pub fn value(self) -> i32 {
        match self {
            PieceKind::Pawn => 100,
            PieceKind::Knight => 320,
            PieceKind::Bishop => 330,
            PieceKind::Rook => 500,
            PieceKind::Queen => 900,
            PieceKind::King => 0,
        }
    }

    /// Upper-case letter used by position text and notation.
    pub fn letter(self) -> char {
        match self {
            PieceKind::Pawn => 'P',
            PieceKind::Knight => 'N',
            PieceKind::Bishop => 'B',
            PieceKind::Rook => 'R',
            PieceKind::Queen => 'Q',
            PieceKind::King => 'K',
        }
    }

    pub fn from_letter(ch: char) -> Option<PieceKind> {
        match ch.to_ascii_uppercase() {
            'P' => Some(PieceKind::Pawn),
            'N' => Some(PieceKind::Knight),
            'B' => Some(PieceKind::Bishop),
            'R' => Some(PieceKind::Rook),
            'Q' => Some(PieceKind::Queen),
            'K' => Some(PieceKind::King),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
}

impl Piece {
    pub fn new(kind: PieceKind, color: Color) -> Self {
        Self { kind, color }
    }

    /// Position-text character: upper case for White, lower case for Black.
    pub fn fen_char(self) -> char {
        match self.color {
            Color::White => self.kind.letter(),
            Color::Black => self.kind.letter().to_ascii_lowercase(),
        }
    }

    pub fn from_fen_char(ch: char) -> Option<Piece> {
        let kind = PieceKind::from_letter(ch)?;
        let color = if ch.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        Some(Piece { kind, color })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Square {
    rank: u8,
    file: u8,
}

impl Square {
    /// Both coordinates must be in 0..8.
    pub fn new(rank: u8, file: u8) -> Self {
        debug_assert!(rank < 8 && file < 8, "square out of range");
        Self { rank, file }
    }

    /// Bounds-checked constructor for computed coordinates.
    pub fn try_new(rank: i8, file: i8) -> Option<Self> {
        if (0..8).contains(&rank) && (0..8).contains(&file) {
            Some(Self {
                rank: rank as u8,
                file: file as u8,
            })
        } else {
            None
        }
    }

    pub fn from_index(idx: usize) -> Self {
        Self::new((idx / 8) as u8, (idx % 8) as u8)
    }

    pub fn index(self) -> usize {
        self.rank as usize * 8 + self.file as usize
    }

    pub fn rank(self) -> u8 {
        self.rank
    }

    pub fn file(self) -> u8 {
        self.file
    }

    pub fn offset(self, dr: i8, df: i8) -> Option<Self> {
        Self::try_new(self.rank as i8 + dr, self.file as i8 + df)
    }

    /// a1 is dark, so light squares have odd rank + file.
    pub fn is_light(self) -> bool {
        (self.rank + self.file) % 2 == 1
    }

    pub fn all() -> impl Iterator<Item = Square> {
        (0..64).map(Square::from_index)
    }

    pub fn file_char(self) -> char {
        (b'a' + self.file) as char
    }

    pub fn rank_char(self) -> char {
        (b'1' + self.rank) as char
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file_char(), self.rank_char())
    }
}

impl FromStr for Square {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(ChessError::InvalidMoveText(format!("bad square '{}'", s)));
        }
        let (file, rank) = (bytes[0], bytes[1]);
        if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) {
            return Err(ChessError::InvalidMoveText(format!("bad square '{}'", s)));
        }
        Ok(Square::new(rank - b'1', file - b'a'))
    }
}

/// An occupied square: the piece plus whether it has ever moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub piece: Piece,
    pub has_moved: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CastleSide {
    King,
    Queen,
}

impl CastleSide {
    pub fn rook_file(self) -> u8 {
        match self {
            CastleSide::King => 7,
            CastleSide::Queen => 0,
        }
    }

    pub fn king_target_file(self) -> u8 {
        match self {
            CastleSide::King => 6,
            CastleSide::Queen => 2,
        }
    }

    pub fn rook_target_file(self) -> u8 {
        match self {
            CastleSide::King => 5,
            CastleSide::Queen => 3,
        }
    }
}

pub const KING_HOME_FILE: u8 = 4;

/// 8x8 placement grid. Value type: clones never alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Board {
    squares: [[Option<Cell>; 8]; 8],
}

impl Default for Board {
    fn default() -> Self {
        Self::empty()
    }
}

impl Board {
    pub fn empty() -> Self {
        Self {
            squares: [[None; 8]; 8],
        }
    }

    /// Standard starting array with every piece unmoved.
    pub fn standard() -> Self {
        const BACK: [PieceKind; 8] = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        let mut board = Self::empty();
        for color in Color::BOTH {
            for file in 0..8u8 {
                board.set(
                    Square::new(color.back_rank(), file),
                    Some(Piece::new(BACK[file as usize], color)),
                );
                board.set(
                    Square::new(color.pawn_rank(), file),
                    Some(Piece::new(PieceKind::Pawn, color)),
                );
            }
        }
        board
    }

    pub fn get(&self, sq: Square) -> Option<Piece> {
        self.cell(sq).map(|c| c.piece)
    }

    pub fn cell(&self, sq: Square) -> Option<Cell> {
        self.squares[sq.rank as usize][sq.file as usize]
    }

    /// Place (or clear) a piece. A placed piece counts as unmoved.
    pub fn set(&mut self, sq: Square, piece: Option<Piece>) {
        self.set_cell(
            sq,
            piece.map(|piece| Cell {
                piece,
                has_moved: false,
            }),
        );
    }

    pub fn set_cell(&mut self, sq: Square, cell: Option<Cell>) {
        self.squares[sq.rank as usize][sq.file as usize] = cell;
    }

    /// Remove and return whatever stands on `sq`.
    pub fn take(&mut self, sq: Square) -> Option<Cell> {
        self.squares[sq.rank as usize][sq.file as usize].take()
    }

    pub fn is_empty(&self, sq: Square) -> bool {
        self.cell(sq).is_none()
    }

    pub fn find(&self, kind: PieceKind, color: Color) -> Option<Square> {
        self.pieces()
            .find(|(_, cell)| cell.piece == Piece::new(kind, color))
            .map(|(sq, _)| sq)
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.find(PieceKind::King, color)
    }

    /// Occupied squares in index order (a1, b1, ..., h8).
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Cell)> + '_ {
        Square::all().filter_map(move |sq| self.cell(sq).map(|cell| (sq, cell)))
    }

    pub fn pieces_of(&self, color: Color) -> impl Iterator<Item = (Square, Cell)> + '_ {
        self.pieces().filter(move |(_, cell)| cell.piece.color == color)
    }

    pub fn count(&self, kind: PieceKind, color: Color) -> usize {
        self.pieces()
            .filter(|(_, cell)| cell.piece == Piece::new(kind, color))
            .count()
    }

    /// Castling right derived from `has_moved` flags: unmoved king on its
    /// home square and unmoved rook in the matching corner.
    pub fn castling_right(&self, color: Color, side: CastleSide) -> bool {
        let rank = color.back_rank();
        let king = self.cell(Square::new(rank, KING_HOME_FILE));
        let rook = self.cell(Square::new(rank, side.rook_file()));
        matches!(
            (king, rook),
            (Some(k), Some(r))
                if k.piece == Piece::new(PieceKind::King, color)
                    && !k.has_moved
                    && r.piece == Piece::new(PieceKind::Rook, color)
                    && !r.has_moved
        )
    }

    /// Same pieces on the same squares, ignoring `has_moved`.
    pub fn same_placement(&self, other: &Board) -> bool {
        Square::all().all(|sq| self.get(sq) == other.get(sq))
    }
}

/// Side to move, en-passant target and move counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuxState {
    pub side: Color,
    pub en_passant: Option<Square>,
    pub halfmove: u16,
    pub fullmove: u16,
}

impl Default for AuxState {
    fn default() -> Self {
        Self {
            side: Color::White,
            en_passant: None,
            halfmove: 0,
            fullmove: 1,
        }
    }
}

impl AuxState {
    pub fn new(side: Color) -> Self {
        Self {
            side,
            ..Self::default()
        }
    }
}

/// Move intent: from, to and an optional promotion kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
}

impl Move {
    pub fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    pub fn with_promotion(from: Square, to: Square, kind: PieceKind) -> Self {
        Self {
            from,
            to,
            promotion: Some(kind),
        }
    }
}

/// Coordinate notation, e.g. "e2e4" or "e7e8q".
impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(kind) = self.promotion {
            write!(f, "{}", kind.letter().to_ascii_lowercase())?;
        }
        Ok(())
    }
}

impl FromStr for Move {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if !(4..=5).contains(&s.len()) || !s.is_ascii() {
            return Err(ChessError::InvalidMoveText(format!("bad move '{}'", s)));
        }
        let from: Square = s[0..2].parse()?;
        let to: Square = s[2..4].parse()?;
        let promotion = match s[4..].chars().next() {
            None => None,
            Some(ch) => match PieceKind::from_letter(ch) {
                Some(kind) if PieceKind::PROMOTIONS.contains(&kind) => Some(kind),
                _ => {
                    return Err(ChessError::InvalidMoveText(format!(
                        "bad promotion piece in '{}'",
                        s
                    )))
                }
            },
        };
        Ok(Move {
            from,
            to,
            promotion,
        })
    }
}

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

// Simple display: rank 8 at the top
impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..8).rev() {
            for file in 0..8 {
                match self.get(Square::new(rank, file)) {
                    Some(piece) => write!(f, "{} ", piece.fen_char())?,
                    None => write!(f, ". ")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_text_and_index_agree() {
        let e4: Square = "e4".parse().unwrap();
        assert_eq!(e4.rank(), 3);
        assert_eq!(e4.file(), 4);
        assert_eq!(e4.index(), 28);
        assert_eq!(Square::from_index(28), e4);
        assert_eq!(e4.to_string(), "e4");
        assert!("i1".parse::<Square>().is_err());
        assert!("a9".parse::<Square>().is_err());
    }

    #[test]
    fn square_colors() {
        assert!(!Square::new(0, 0).is_light()); // a1
        assert!(Square::new(0, 7).is_light()); // h1
        assert!(Square::new(7, 0).is_light()); // a8
    }

    #[test]
    fn move_text() {
        let mv: Move = "e7e8q".parse().unwrap();
        assert_eq!(mv.promotion, Some(PieceKind::Queen));
        assert_eq!(mv.to_string(), "e7e8q");
        assert!("e7e8k".parse::<Move>().is_err());
        assert!("e2".parse::<Move>().is_err());
    }

    #[test]
    fn standard_board_layout() {
        let board = Board::standard();
        assert_eq!(board.pieces().count(), 32);
        assert_eq!(board.king_square(Color::White), Some(Square::new(0, 4)));
        assert_eq!(board.king_square(Color::Black), Some(Square::new(7, 4)));
        assert!(board.castling_right(Color::White, CastleSide::King));
        assert!(board.castling_right(Color::Black, CastleSide::Queen));
    }

    #[test]
    fn clone_does_not_alias() {
        let board = Board::standard();
        let mut copy = board.clone();
        copy.set(Square::new(1, 4), None);
        assert!(board.get(Square::new(1, 4)).is_some());
        assert!(copy.get(Square::new(1, 4)).is_none());
    }

    #[test]
    fn moved_rook_loses_castling_right() {
        let mut board = Board::standard();
        let h1 = Square::new(0, 7);
        let mut rook = board.cell(h1).unwrap();
        rook.has_moved = true;
        board.set_cell(h1, Some(rook));
        assert!(!board.castling_right(Color::White, CastleSide::King));
        assert!(board.castling_right(Color::White, CastleSide::Queen));
    }
}
