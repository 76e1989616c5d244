//! The boundary consumed by request handlers.
//!
//! Handlers receive the board from the client on every request, so the operations here take a
//! [`Board`] and hand back the next one together with a [`GameStatus`]. A finished game is a
//! status, not an error. [`Error::GameFinished`] is only returned when a request arrives for a
//! board that was already finished.

use crate::board::{Board, Player, TerminalStatus};
use crate::config::{Budget, SearchConfig};
use crate::error::{Error, Result};
use crate::game_state::GameState;
use crate::mcts::MonteCarloTreeSearch;
use crate::random::{RandomGenerator, StandardRandomGenerator};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// State of the game after a move, from the point of view of the caller.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Continue,
    Won(Player),
    Tied,
}

impl From<TerminalStatus> for GameStatus {
    fn from(status: TerminalStatus) -> Self {
        match status {
            TerminalStatus::InProgress => GameStatus::Continue,
            TerminalStatus::Won(player) => GameStatus::Won(player),
            TerminalStatus::Tied => GameStatus::Tied,
        }
    }
}

impl GameStatus {
    pub fn is_finished(self) -> bool {
        self != GameStatus::Continue
    }

    /// Message shown to the human when the engine plays `engine`.
    pub fn describe_for(self, engine: Player) -> &'static str {
        match self {
            GameStatus::Continue => "continue",
            GameStatus::Won(winner) if winner == engine => "the engine wins",
            GameStatus::Won(_) => "you win",
            GameStatus::Tied => "tied",
        }
    }
}

/// Board and status after a move.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub board: Board,
    pub status: GameStatus,
    /// Cell that was played.
    pub b_move: u8,
}

/// One game between a human and the engine.
///
/// The session owns its engine; two games must not share a session.
pub struct GameSession<K: RandomGenerator = StandardRandomGenerator> {
    engine: MonteCarloTreeSearch<K>,
}

impl GameSession<StandardRandomGenerator> {
    pub fn new() -> Result<Self> {
        Self::from_config(SearchConfig::default())
    }

    pub fn from_config(config: SearchConfig) -> Result<Self> {
        Ok(Self::with_engine(MonteCarloTreeSearch::from_config(config)?))
    }
}

impl<K: RandomGenerator> GameSession<K> {
    pub fn with_engine(engine: MonteCarloTreeSearch<K>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &MonteCarloTreeSearch<K> {
        &self.engine
    }

    /// Forgets the search tree, e.g. when the client starts a new game.
    pub fn reset(&mut self) {
        self.engine.reset();
    }

    /// Applies the human's move to `board`.
    pub fn submit_human_move(&mut self, board: &Board, index: usize) -> Result<Turn> {
        let state = Self::playable_state(board)?;
        let next = state.apply_move(index)?;
        Ok(Self::turn(next, index as u8))
    }

    /// Lets the engine pick and play a move on `board`.
    pub fn request_engine_move(&mut self, board: &Board, budget: Budget) -> Result<Turn> {
        let state = Self::playable_state(board)?;
        let b_move = self.engine.select_move(&state, budget)?;
        let next = state.apply_move(b_move as usize)?;
        debug!(board = %next.board(), b_move, "engine moved");
        Ok(Self::turn(next, b_move))
    }

    /// Applies the human's move and, unless that ended the game, answers it using the
    /// configured default budget.
    pub fn play_turn(&mut self, board: &Board, index: usize) -> Result<Turn> {
        let human = self.submit_human_move(board, index)?;
        if human.status.is_finished() {
            return Ok(human);
        }

        let budget = self.engine.config().default_budget;
        self.request_engine_move(&human.board, budget)
    }

    fn playable_state(board: &Board) -> Result<GameState> {
        let state = GameState::from_board(*board)?;
        let status = state.terminal_status();
        if status.is_terminal() {
            return Err(Error::GameFinished {
                status: status.into(),
            });
        }
        Ok(state)
    }

    fn turn(state: GameState, b_move: u8) -> Turn {
        Turn {
            board: *state.board(),
            status: state.terminal_status().into(),
            b_move,
        }
    }
}
