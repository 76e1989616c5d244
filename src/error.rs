//! Error types for the engine and its session boundary.

use crate::board::TerminalStatus;
use crate::session::GameStatus;
use std::fmt;
use thiserror::Error;

/// Why a move was rejected.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum IllegalMoveReason {
    OutOfRange,
    Occupied,
    GameOver,
}

impl fmt::Display for IllegalMoveReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IllegalMoveReason::OutOfRange => f.write_str("position is out of bounds (must be 0-8)"),
            IllegalMoveReason::Occupied => f.write_str("position is already occupied"),
            IllegalMoveReason::GameOver => f.write_str("game already over"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[non_exhaustive]
pub enum Error {
    #[error("illegal move at position {position}: {reason}")]
    IllegalMove {
        position: usize,
        reason: IllegalMoveReason,
    },

    #[error("no legal move available, game status is {status:?}")]
    NoLegalMove { status: TerminalStatus },

    #[error("search budget must be positive")]
    InvalidBudget,

    #[error("game already finished: {status:?}")]
    GameFinished { status: GameStatus },

    #[error("board has wrong size: expected {expected} cells, got {got}")]
    InvalidBoardLength { expected: usize, got: usize },

    #[error("invalid symbol '{symbol}' at position {position} (expected '-', 'X' or 'O')")]
    InvalidSymbol { symbol: String, position: usize },

    #[error("invalid piece counts: X={x_count}, O={o_count} (must be equal or X ahead by 1)")]
    InvalidPieceCounts { x_count: usize, o_count: usize },

    #[error("invalid coordinate '{coordinate}' (expected a column A-C and a row 1-3, e.g. A2)")]
    InvalidCoordinate { coordinate: String },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
