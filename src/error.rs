//! Error types for the rules engine
//!
//! Every fallible core operation returns one of these to its immediate
//! caller. Nothing here is logged or retried inside the crate.

use crate::board::Move;
use crate::game::GameStatus;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChessError {
    /// The move breaks movement rules or leaves the mover's king in check.
    #[error("illegal move {mv}: {reason}")]
    IllegalMove { mv: Move, reason: &'static str },

    /// Position text that does not describe a consistent position.
    #[error("malformed position: {0}")]
    MalformedPosition(String),

    /// A move was demanded from a position that has none.
    #[error("no legal moves in this position")]
    NoLegalMoves,

    /// The game already reached an absorbing state.
    #[error("game is over ({0})")]
    GameOver(GameStatus),

    /// Coordinate or algebraic move text that cannot be read.
    #[error("invalid move text: {0}")]
    InvalidMoveText(String),

    /// A stored game that cannot be decoded or replayed.
    #[error("invalid game snapshot: {0}")]
    Snapshot(String),
}

pub type Result<T> = std::result::Result<T, ChessError>;
