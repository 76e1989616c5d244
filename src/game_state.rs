use crate::board::{Board, CELL_COUNT, Player, TerminalStatus};
use crate::error::{Error, IllegalMoveReason, Result};

/// A legal tic-tac-toe position: a board plus the turn derived from it.
///
/// The player to move is never stored. `X` moves whenever both players have placed the same
/// number of markers, `O` otherwise.
#[derive(Debug, Default, PartialEq, Eq, Hash, Copy, Clone)]
pub struct GameState {
    board: Board,
}

impl GameState {
    /// Creates the starting position.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a board, checking that it could have been reached by alternating turns.
    pub fn from_board(board: Board) -> Result<Self> {
        let x_count = board.count(Player::X);
        let o_count = board.count(Player::O);
        if x_count != o_count && x_count != o_count + 1 {
            return Err(Error::InvalidPieceCounts { x_count, o_count });
        }

        Ok(Self { board })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Returns the player whose turn it is.
    pub fn current_player(&self) -> Player {
        if self.board.count(Player::X) == self.board.count(Player::O) {
            Player::X
        } else {
            Player::O
        }
    }

    pub fn moves_played(&self) -> usize {
        CELL_COUNT - self.board.empty_count()
    }

    /// Classifies the position. Computed from the board on every call.
    ///
    /// A board with lines for both players cannot come out of legal play; for such input the
    /// first line in row, column, diagonal order decides.
    pub fn terminal_status(&self) -> TerminalStatus {
        if let Some(winner) = self.board.winner() {
            return TerminalStatus::Won(winner);
        }

        if self.board.empty_count() == 0 {
            TerminalStatus::Tied
        } else {
            TerminalStatus::InProgress
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal_status().is_terminal()
    }

    /// Returns the empty cells in ascending order, or nothing once the game is over.
    pub fn legal_moves(&self) -> Vec<u8> {
        if self.is_terminal() {
            return Vec::new();
        }

        self.board
            .cells()
            .iter()
            .enumerate()
            .filter(|(_, x)| x.is_none())
            .map(|(i, _)| i as u8)
            .collect()
    }

    /// Returns the position after the current player marks `index`.
    pub fn apply_move(&self, index: usize) -> Result<Self> {
        let reason = if index >= CELL_COUNT {
            Some(IllegalMoveReason::OutOfRange)
        } else if self.is_terminal() {
            Some(IllegalMoveReason::GameOver)
        } else if !self.board.is_empty_at(index) {
            Some(IllegalMoveReason::Occupied)
        } else {
            None
        };

        match reason {
            Some(reason) => Err(Error::IllegalMove {
                position: index,
                reason,
            }),
            None => Ok(self.advance(index as u8)),
        }
    }

    /// Applies a move taken from [`GameState::legal_moves`] without re-validating it.
    pub(crate) fn advance(&self, b_move: u8) -> Self {
        let mut board = self.board;
        board.place(b_move as usize, self.current_player());
        Self { board }
    }
}

impl TryFrom<Board> for GameState {
    type Error = Error;

    fn try_from(board: Board) -> Result<Self> {
        GameState::from_board(board)
    }
}
