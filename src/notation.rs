//! Algebraic move notation and game transcripts

use crate::board::{AuxState, Board, Color, Move, PieceKind, Square};
use crate::error::{ChessError, Result};
use crate::fen;
use crate::game::Game;
use crate::movegen::{all_legal_moves, apply_move, has_legal_move, in_check, legal_moves_from};

/// Render a legal move in standard algebraic notation, check suffix included.
/// `board` and `aux` describe the position before the move.
pub fn san(board: &Board, aux: &AuxState, mv: Move) -> String {
    let Some(piece) = board.get(mv.from) else {
        return mv.to_string();
    };
    let color = piece.color;
    let mut out = String::with_capacity(8);
    let df = mv.to.file() as i8 - mv.from.file() as i8;

    if piece.kind == PieceKind::King && df.abs() == 2 {
        out.push_str(if df > 0 { "O-O" } else { "O-O-O" });
    } else {
        let is_pawn = piece.kind == PieceKind::Pawn;
        let capture = board.get(mv.to).is_some() || (is_pawn && df != 0);
        if is_pawn {
            if capture {
                out.push(mv.from.file_char());
            }
        } else {
            out.push(piece.kind.letter());
            push_disambiguation(&mut out, board, aux, color, piece.kind, mv);
        }
        if capture {
            out.push('x');
        }
        out.push_str(&mv.to.to_string());
        if is_pawn && mv.to.rank() == color.promotion_rank() {
            out.push('=');
            out.push(mv.promotion.unwrap_or(PieceKind::Queen).letter());
        }
    }

    let after = apply_move(board, aux, mv);
    let defender = color.opponent();
    if in_check(&after.board, defender) {
        if has_legal_move(&after.board, &after.aux, defender) {
            out.push('+');
        } else {
            out.push('#');
        }
    }
    out
}

// File first, then rank, then both, as needed to tell same-kind pieces apart.
fn push_disambiguation(
    out: &mut String,
    board: &Board,
    aux: &AuxState,
    color: Color,
    kind: PieceKind,
    mv: Move,
) {
    let rivals: Vec<Square> = board
        .pieces_of(color)
        .filter(|(sq, cell)| *sq != mv.from && cell.piece.kind == kind)
        .map(|(sq, _)| sq)
        .filter(|&sq| legal_moves_from(board, aux, color, sq).contains(&mv.to))
        .collect();
    if rivals.is_empty() {
        return;
    }
    let shares_file = rivals.iter().any(|sq| sq.file() == mv.from.file());
    let shares_rank = rivals.iter().any(|sq| sq.rank() == mv.from.rank());
    if !shares_file {
        out.push(mv.from.file_char());
    } else if !shares_rank {
        out.push(mv.from.rank_char());
    } else {
        out.push(mv.from.file_char());
        out.push(mv.from.rank_char());
    }
}

// Comparison form: no check marks, annotations or '='; zeros castle as O.
fn bare(text: &str) -> String {
    text.trim()
        .trim_end_matches(['+', '#', '!', '?'])
        .replace("0-0-0", "O-O-O")
        .replace("0-0", "O-O")
        .replace('=', "")
}

/// Resolve algebraic text against the legal moves of the side to move.
pub fn parse_san(board: &Board, aux: &AuxState, text: &str) -> Result<Move> {
    let wanted = bare(text);
    if wanted.is_empty() {
        return Err(ChessError::InvalidMoveText(text.to_string()));
    }
    all_legal_moves(board, aux, aux.side)
        .into_iter()
        .find(|&mv| bare(&san(board, aux, mv)) == wanted)
        .ok_or_else(|| ChessError::InvalidMoveText(format!("no legal move matches '{}'", text)))
}

/// Tag values written at the top of a transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptHeader {
    pub event: String,
    pub site: String,
    pub date: String,
    pub round: String,
    pub white: String,
    pub black: String,
}

impl Default for TranscriptHeader {
    fn default() -> Self {
        Self {
            event: "Casual Game".to_string(),
            site: "Local".to_string(),
            date: "????.??.??".to_string(),
            round: "1".to_string(),
            white: "White".to_string(),
            black: "Black".to_string(),
        }
    }
}

const LINE_WIDTH: usize = 80;

/// Tag section, blank line, numbered movetext and the result token.
pub fn transcript(game: &Game, header: &TranscriptHeader) -> String {
    let result = game.status().result_token();
    let mut out = String::new();
    let mut tag = |name: &str, value: &str| {
        out.push_str(&format!("[{} \"{}\"]\n", name, value));
    };
    tag("Event", &header.event);
    tag("Site", &header.site);
    tag("Date", &header.date);
    tag("Round", &header.round);
    tag("White", &header.white);
    tag("Black", &header.black);
    tag("Result", result);
    if !game.starts_from_standard() {
        tag("SetUp", "1");
        tag("FEN", game.start_fen());
    }
    out.push('\n');

    let start = fen::decode(game.start_fen())
        .map(|(_, aux)| aux)
        .unwrap_or_default();
    let mut tokens = Vec::with_capacity(game.ply() * 3 / 2 + 1);
    let mut number = start.fullmove;
    let mut side = start.side;
    for (i, entry) in game.record().iter().enumerate() {
        match side {
            Color::White => tokens.push(format!("{}.", number)),
            Color::Black if i == 0 => tokens.push(format!("{}...", number)),
            Color::Black => {}
        }
        tokens.push(entry.san.clone());
        if side == Color::Black {
            number += 1;
        }
        side = side.opponent();
    }
    tokens.push(result.to_string());

    let mut line_len = 0;
    for token in tokens {
        if line_len > 0 && line_len + 1 + token.len() > LINE_WIDTH {
            out.push('\n');
            line_len = 0;
        } else if line_len > 0 {
            out.push(' ');
            line_len += 1;
        }
        line_len += token.len();
        out.push_str(&token);
    }
    out.push('\n');
    out
}
