//! A Monte Carlo tree search engine that plays tic-tac-toe against a human.
//!
//! The crate is split into the game itself ([`GameState`] over a [`Board`]), the search
//! ([`MonteCarloTreeSearch`]) and a thin session layer ([`GameSession`]) for request handlers
//! that pass the board back and forth with a client.
//!
//! # Example
//!
//! ```rust
//! use ttt_mcts::config::Budget;
//! use ttt_mcts::game_state::GameState;
//! use ttt_mcts::mcts::MonteCarloTreeSearch;
//! use ttt_mcts::random::CustomNumberGenerator;
//!
//! // Human plays the centre
//! let state = GameState::new().apply_move(4).unwrap();
//!
//! // Create and configure a new MCTS search instance using the builder
//! let mut mcts = MonteCarloTreeSearch::builder()
//!     .with_random_generator(CustomNumberGenerator::default())
//!     .with_tree_reuse(true)
//!     .build()
//!     .unwrap();
//!
//! // Pick the engine's answer
//! let best_move = mcts.select_move(&state, Budget::Simulations(1000)).unwrap();
//! assert!(state.apply_move(best_move as usize).is_ok());
//! ```

/// Board representation, players and line detection.
pub mod board;
/// Search budget and tunables.
pub mod config;
/// The crate-wide `Error` type and `Result` alias.
pub mod error;
/// Turn order, legal moves and terminal detection.
pub mod game_state;
/// The `MonteCarloTreeSearch` implementation.
pub mod mcts;
/// The `SearchNode` struct, which represents a node in the search tree.
pub mod mcts_node;
/// Traits and implementations for random number generation.
pub mod random;
/// `GameSession`, the entry point for request handlers.
pub mod session;

pub use board::{Board, Player, TerminalStatus};
pub use config::{Budget, SearchConfig};
pub use error::{Error, Result};
pub use game_state::GameState;
pub use mcts::MonteCarloTreeSearch;
pub use session::{GameSession, GameStatus, Turn};
