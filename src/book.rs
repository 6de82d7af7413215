//! Small static opening book, matched on the algebraic move history

use crate::board::Move;
use crate::game::Game;
use crate::notation::parse_san;

pub struct BookLine {
    pub name: &'static str,
    pub moves: &'static [&'static str],
}

pub const BOOK: &[BookLine] = &[
    BookLine {
        name: "Ruy Lopez",
        moves: &["e4", "e5", "Nf3", "Nc6", "Bb5"],
    },
    BookLine {
        name: "Italian Game",
        moves: &["e4", "e5", "Nf3", "Nc6", "Bc4", "Bc5", "c3"],
    },
    BookLine {
        name: "Sicilian Najdorf",
        moves: &["e4", "c5", "Nf3", "d6", "d4", "cxd4", "Nxd4", "Nf6", "Nc3", "a6"],
    },
    BookLine {
        name: "French Defence",
        moves: &["e4", "e6", "d4", "d5", "Nc3", "Bb4"],
    },
    BookLine {
        name: "Caro-Kann",
        moves: &["e4", "c6", "d4", "d5", "Nc3", "dxe4", "Nxe4"],
    },
];

/// First line whose opening plies equal `history` and that still has a move
/// to offer.
pub fn lookup<S: AsRef<str>>(history: &[S]) -> Option<&'static BookLine> {
    BOOK.iter().find(|line| {
        history.len() < line.moves.len()
            && history
                .iter()
                .zip(line.moves.iter())
                .all(|(played, book)| played.as_ref() == *book)
    })
}

/// Next book move in algebraic notation for the given history.
pub fn next_move<S: AsRef<str>>(history: &[S]) -> Option<&'static str> {
    lookup(history).map(|line| line.moves[history.len()])
}

/// Book move for the game's current position, resolved to a legal move.
/// Games set up from a custom position never use the book.
pub fn book_move(game: &Game) -> Option<Move> {
    if !game.starts_from_standard() || game.status().is_terminal() {
        return None;
    }
    let history = game.san_history();
    let san = next_move(history.as_slice())?;
    parse_san(game.board(), game.aux(), san).ok()
}
