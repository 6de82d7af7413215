//! Game state machine
//!
//! A `Game` owns the current board, the committed record and everything
//! needed to classify the position after each move and to take moves back.

use crate::board::{AuxState, Board, Color, Move, Piece, PieceKind, Square, START_FEN};
use crate::error::{ChessError, Result};
use crate::fen::{self, PositionKey};
use crate::movegen::{self, has_legal_move, in_check};
use crate::notation;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Plies without a capture or pawn move that end the game.
pub const MOVE_RULE_PLIES: u16 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DrawReason {
    InsufficientMaterial,
    Repetition,
    MoveRule,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameStatus {
    Playing,
    Check,
    Checkmate { winner: Color },
    Stalemate,
    Draw(DrawReason),
}

impl GameStatus {
    /// Checkmate, stalemate and draws absorb: no move is accepted after them.
    pub fn is_terminal(self) -> bool {
        !matches!(self, GameStatus::Playing | GameStatus::Check)
    }

    /// Result token used in transcripts.
    pub fn result_token(self) -> &'static str {
        match self {
            GameStatus::Checkmate {
                winner: Color::White,
            } => "1-0",
            GameStatus::Checkmate {
                winner: Color::Black,
            } => "0-1",
            GameStatus::Stalemate | GameStatus::Draw(_) => "1/2-1/2",
            GameStatus::Playing | GameStatus::Check => "*",
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameStatus::Playing => write!(f, "playing"),
            GameStatus::Check => write!(f, "check"),
            GameStatus::Checkmate { winner } => write!(f, "checkmate, {} wins", winner),
            GameStatus::Stalemate => write!(f, "stalemate"),
            GameStatus::Draw(DrawReason::InsufficientMaterial) => {
                write!(f, "draw by insufficient material")
            }
            GameStatus::Draw(DrawReason::Repetition) => write!(f, "draw by repetition"),
            GameStatus::Draw(DrawReason::MoveRule) => write!(f, "draw by the move rule"),
        }
    }
}

/// One committed move with what is needed to display it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordEntry {
    pub mv: Move,
    pub san: String,
    pub piece: Piece,
    pub captured: Option<Piece>,
}

/// Pieces taken by each side, in capture order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Captured {
    pub by_white: Vec<Piece>,
    pub by_black: Vec<Piece>,
}

impl Captured {
    fn list_mut(&mut self, capturer: Color) -> &mut Vec<Piece> {
        match capturer {
            Color::White => &mut self.by_white,
            Color::Black => &mut self.by_black,
        }
    }

    pub fn by(&self, capturer: Color) -> &[Piece] {
        match capturer {
            Color::White => &self.by_white,
            Color::Black => &self.by_black,
        }
    }
}

// Position before a committed move.
#[derive(Debug, Clone)]
struct Frame {
    board: Board,
    aux: AuxState,
    status: GameStatus,
}

#[derive(Debug, Clone)]
pub struct Game {
    start_fen: String,
    board: Board,
    aux: AuxState,
    status: GameStatus,
    record: Vec<RecordEntry>,
    frames: Vec<Frame>,
    keys: Vec<PositionKey>,
    captured: Captured,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    /// Standard starting position, White to move.
    pub fn new() -> Self {
        let board = Board::standard();
        let aux = AuxState::default();
        Self::with_position(START_FEN.to_string(), board, aux)
    }

    pub fn from_fen(text: &str) -> Result<Self> {
        let (board, aux) = fen::decode(text)?;
        Ok(Self::with_position(fen::encode(&board, &aux), board, aux))
    }

    fn with_position(start_fen: String, board: Board, aux: AuxState) -> Self {
        let keys = vec![fen::position_key(&board, &aux)];
        let status = classify(&board, &aux, &keys);
        Self {
            start_fen,
            board,
            aux,
            status,
            record: Vec::new(),
            frames: Vec::new(),
            keys,
            captured: Captured::default(),
        }
    }

    /// Back to the standard starting position with an empty record.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn aux(&self) -> &AuxState {
        &self.aux
    }

    pub fn side_to_move(&self) -> Color {
        self.aux.side
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn record(&self) -> &[RecordEntry] {
        &self.record
    }

    pub fn captured(&self) -> &Captured {
        &self.captured
    }

    pub fn start_fen(&self) -> &str {
        &self.start_fen
    }

    pub fn starts_from_standard(&self) -> bool {
        self.start_fen == START_FEN
    }

    pub fn fen(&self) -> String {
        fen::encode(&self.board, &self.aux)
    }

    pub fn position_keys(&self) -> &[PositionKey] {
        &self.keys
    }

    pub fn ply(&self) -> usize {
        self.record.len()
    }

    pub fn moves(&self) -> Vec<Move> {
        self.record.iter().map(|entry| entry.mv).collect()
    }

    pub fn san_history(&self) -> Vec<&str> {
        self.record.iter().map(|entry| entry.san.as_str()).collect()
    }

    pub fn in_check(&self) -> bool {
        in_check(&self.board, self.aux.side)
    }

    /// Legal moves for the side to move; empty once the game is over.
    pub fn legal_moves(&self) -> Vec<Move> {
        if self.status.is_terminal() {
            return Vec::new();
        }
        movegen::all_legal_moves(&self.board, &self.aux, self.aux.side)
    }

    pub fn legal_moves_from(&self, from: Square) -> Vec<Square> {
        if self.status.is_terminal() {
            return Vec::new();
        }
        movegen::legal_moves_from(&self.board, &self.aux, self.aux.side, from)
    }

    /// Validate and play a move, then reclassify the position. On error the
    /// game is left exactly as it was.
    pub fn commit(&mut self, mv: Move) -> Result<&RecordEntry> {
        if self.status.is_terminal() {
            return Err(ChessError::GameOver(self.status));
        }
        let mv = movegen::validate(&self.board, &self.aux, mv)?;
        let Some(piece) = self.board.get(mv.from) else {
            return Err(ChessError::IllegalMove {
                mv,
                reason: "no piece on the origin square",
            });
        };
        let san = notation::san(&self.board, &self.aux, mv);
        let applied = movegen::apply_move(&self.board, &self.aux, mv);

        self.frames.push(Frame {
            board: self.board,
            aux: self.aux,
            status: self.status,
        });
        self.board = applied.board;
        self.aux = applied.aux;
        self.keys
            .push(fen::position_key(&self.board, &self.aux));
        if let Some(taken) = applied.captured {
            self.captured.list_mut(piece.color).push(taken);
        }
        self.status = classify(&self.board, &self.aux, &self.keys);
        self.record.push(RecordEntry {
            mv,
            san,
            piece,
            captured: applied.captured,
        });
        Ok(&self.record[self.record.len() - 1])
    }

    /// Parse coordinate text ("e2e4", "e7e8n") and commit it.
    pub fn commit_text(&mut self, text: &str) -> Result<&RecordEntry> {
        let mv: Move = text.parse()?;
        self.commit(mv)
    }

    /// Parse algebraic text ("Nf3", "exd5", "O-O") and commit it.
    pub fn commit_san(&mut self, text: &str) -> Result<&RecordEntry> {
        let mv = notation::parse_san(&self.board, &self.aux, text)?;
        self.commit(mv)
    }

    /// Take back the last committed move. Leaves terminal states too.
    pub fn undo(&mut self) -> Option<RecordEntry> {
        let frame = self.frames.pop()?;
        let entry = self.record.pop()?;
        self.board = frame.board;
        self.aux = frame.aux;
        self.status = frame.status;
        self.keys.pop();
        if entry.captured.is_some() {
            self.captured.list_mut(entry.piece.color).pop();
        }
        Some(entry)
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            start_fen: self.start_fen.clone(),
            moves: self.moves(),
            fen: self.fen(),
            captured: self.captured.clone(),
            status: self.status,
        }
    }

    /// Rebuild a game by replaying a snapshot's moves from its start
    /// position. The replayed result must match the stored position.
    pub fn restore(snapshot: &GameSnapshot) -> Result<Self> {
        let mut game = Game::from_fen(&snapshot.start_fen)
            .map_err(|e| ChessError::Snapshot(format!("start position: {}", e)))?;
        for (ply, &mv) in snapshot.moves.iter().enumerate() {
            game.commit(mv)
                .map_err(|e| ChessError::Snapshot(format!("ply {}: {}", ply + 1, e)))?;
        }
        if game.fen() != snapshot.fen {
            return Err(ChessError::Snapshot(format!(
                "replay ends at '{}', snapshot says '{}'",
                game.fen(),
                snapshot.fen
            )));
        }
        if game.status != snapshot.status || game.captured != snapshot.captured {
            return Err(ChessError::Snapshot(
                "replayed status or captures differ".to_string(),
            ));
        }
        Ok(game)
    }
}

/// Everything needed to resume a game exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub start_fen: String,
    pub moves: Vec<Move>,
    pub fen: String,
    pub captured: Captured,
    pub status: GameStatus,
}

impl GameSnapshot {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ChessError::Snapshot(e.to_string()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| ChessError::Snapshot(e.to_string()))
    }
}

/// Status of the side to move. `keys` is the repetition history ending with
/// the current position.
pub fn classify(board: &Board, aux: &AuxState, keys: &[PositionKey]) -> GameStatus {
    let side = aux.side;
    let check = in_check(board, side);
    if !has_legal_move(board, aux, side) {
        return if check {
            GameStatus::Checkmate {
                winner: side.opponent(),
            }
        } else {
            GameStatus::Stalemate
        };
    }
    if is_insufficient_material(board) {
        return GameStatus::Draw(DrawReason::InsufficientMaterial);
    }
    if let Some(current) = keys.last() {
        if keys.iter().filter(|key| *key == current).count() >= 3 {
            return GameStatus::Draw(DrawReason::Repetition);
        }
    }
    if aux.halfmove >= MOVE_RULE_PLIES {
        return GameStatus::Draw(DrawReason::MoveRule);
    }
    if check {
        GameStatus::Check
    } else {
        GameStatus::Playing
    }
}

/// Piece-count draw rule: K v K, one minor alone,
/// one bishop each on the same square color, and two knights against a bare
/// king are insufficient. Everything else counts as sufficient.
pub fn is_insufficient_material(board: &Board) -> bool {
    let mut bishops: [Vec<bool>; 2] = [Vec::new(), Vec::new()];
    let mut knights = [0usize; 2];
    for (sq, cell) in board.pieces() {
        let side = cell.piece.color as usize;
        match cell.piece.kind {
            PieceKind::Queen | PieceKind::Rook | PieceKind::Pawn => return false,
            PieceKind::Bishop => bishops[side].push(sq.is_light()),
            PieceKind::Knight => knights[side] += 1,
            PieceKind::King => {}
        }
    }
    let total_bishops = bishops[0].len() + bishops[1].len();
    let total_knights = knights[0] + knights[1];

    if total_bishops + total_knights <= 1 {
        return true;
    }
    if total_knights == 0 && bishops[0].len() == 1 && bishops[1].len() == 1 {
        return bishops[0][0] == bishops[1][0];
    }
    total_bishops == 0 && total_knights == 2 && (knights[0] == 2 || knights[1] == 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play(game: &mut Game, moves: &[&str]) {
        for text in moves {
            game.commit_text(text).unwrap();
        }
    }

    #[test]
    fn new_game_is_playing() {
        let game = Game::new();
        assert_eq!(game.status(), GameStatus::Playing);
        assert_eq!(game.legal_moves().len(), 20);
        assert_eq!(game.position_keys().len(), 1);
    }

    #[test]
    fn illegal_move_leaves_game_untouched() {
        let mut game = Game::new();
        let before = game.fen();
        assert!(matches!(
            game.commit_text("e2e5"),
            Err(ChessError::IllegalMove { .. })
        ));
        assert!(matches!(
            game.commit_text("e7e5"),
            Err(ChessError::IllegalMove { .. })
        ));
        assert_eq!(game.fen(), before);
        assert!(game.record().is_empty());
    }

    #[test]
    fn fools_mate_is_absorbing() {
        let mut game = Game::new();
        play(&mut game, &["f2f3", "e7e5", "g2g4", "d8h4"]);
        assert_eq!(
            game.status(),
            GameStatus::Checkmate {
                winner: Color::Black
            }
        );
        assert_eq!(game.record()[3].san, "Qh4#");
        assert!(game.legal_moves().is_empty());
        assert!(matches!(
            game.commit_text("a2a3"),
            Err(ChessError::GameOver(_))
        ));
    }

    #[test]
    fn undo_restores_captures_and_status() {
        let mut game = Game::new();
        play(&mut game, &["e2e4", "d7d5", "e4d5"]);
        assert_eq!(game.captured().by_white.len(), 1);
        let entry = game.undo().unwrap();
        assert_eq!(entry.san, "exd5");
        assert!(game.captured().by_white.is_empty());
        assert_eq!(
            game.fen(),
            "rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2"
        );
        assert_eq!(game.position_keys().len(), 3);
    }

    #[test]
    fn insufficient_material_table() {
        let cases = [
            ("4k3/8/8/8/8/8/8/4K3 w - - 0 1", true),
            ("4k3/8/8/8/8/8/8/4KB2 w - - 0 1", true),
            ("4k3/8/8/8/8/8/8/4KN2 w - - 0 1", true),
            // both bishops on light squares: f1 and c8
            ("2b1k3/8/8/8/8/8/8/4KB2 w - - 0 1", true),
            // light f1 against dark f8
            ("4kb2/8/8/8/8/8/8/4KB2 w - - 0 1", false),
            ("4k3/8/8/8/8/8/8/3NKN2 w - - 0 1", true),
            ("4kn2/8/8/8/8/8/8/4KN2 w - - 0 1", false),
            ("4k3/8/8/8/8/8/8/3BKB2 w - - 0 1", false),
            ("4k3/8/8/8/8/8/8/3BKN2 w - - 0 1", false),
            ("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1", false),
            ("4k3/8/8/8/8/8/8/4KR2 w - - 0 1", false),
        ];
        for (text, expected) in cases {
            let (board, _) = fen::decode(text).unwrap();
            assert_eq!(is_insufficient_material(&board), expected, "{}", text);
        }
    }
}
