pub mod board;
pub mod book;
pub mod error;
pub mod eval;
pub mod fen;
pub mod game;
pub mod movegen;
pub mod notation;
pub mod search;
pub mod time;
pub mod uci;
pub mod utils;

pub use board::{AuxState, Board, Color, Move, Piece, PieceKind, Square, START_FEN};
pub use error::{ChessError, Result};
pub use game::{Game, GameStatus};

pub fn init() {
    utils::init_attack_tables();
}
