use crate::board::{Player, TerminalStatus};
use crate::game_state::GameState;
use std::collections::VecDeque;

/// Represents a single node in the Monte Carlo search tree.
///
/// Statistics are kept from the point of view of the player who made [`SearchNode::prev_move`],
/// which is the player choosing between this node and its siblings.
#[derive(Debug, Clone)]
pub struct SearchNode {
    /// The position this node represents.
    pub state: GameState,
    /// The move that led here from the parent. `None` for a fresh root.
    pub prev_move: Option<u8>,
    /// Outcome of the position, computed once when the node is created.
    pub status: TerminalStatus,
    /// How many simulations passed through this node.
    pub visits: u32,
    /// Sum of simulation rewards: +1 win, 0 tie, -1 loss.
    pub reward: f64,
    /// Legal moves without a child yet, in ascending order.
    untried_moves: VecDeque<u8>,
}

impl SearchNode {
    pub fn new(state: GameState, prev_move: Option<u8>) -> Self {
        Self {
            state,
            prev_move,
            status: state.terminal_status(),
            visits: 0,
            reward: 0.0,
            untried_moves: state.legal_moves().into(),
        }
    }

    /// The player whose choice this node's statistics evaluate.
    pub fn mover(&self) -> Player {
        self.state.current_player().opponent()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn is_fully_expanded(&self) -> bool {
        self.untried_moves.is_empty()
    }

    pub(crate) fn take_untried_move(&mut self) -> Option<u8> {
        self.untried_moves.pop_front()
    }

    pub fn mean_reward(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.reward / (self.visits as f64)
        }
    }

    /// Reward this node receives for a simulation that ended in `outcome`.
    pub fn reward_for(&self, outcome: TerminalStatus) -> f64 {
        match outcome {
            TerminalStatus::Won(winner) if winner == self.mover() => 1.0,
            TerminalStatus::Won(_) => -1.0,
            TerminalStatus::Tied | TerminalStatus::InProgress => 0.0,
        }
    }

    pub(crate) fn record(&mut self, outcome: TerminalStatus) {
        self.visits += 1;
        self.reward += self.reward_for(outcome);
    }

    /// UCB1 score of this node as seen from a parent with `parent_visits` visits.
    ///
    /// Unvisited nodes score infinity so they are always tried before visited siblings.
    pub fn ucb_value(&self, parent_visits: u32, exploration_constant: f64) -> f64 {
        if self.visits == 0 {
            return f64::INFINITY;
        }

        let exploration = if parent_visits == 0 {
            0.0
        } else {
            f64::sqrt(f64::ln(parent_visits as f64) / (self.visits as f64))
        };
        self.mean_reward() + exploration_constant * exploration
    }
}
