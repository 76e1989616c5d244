//! Search configuration.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default exploration constant for the UCB1 formula.
pub const DEFAULT_EXPLORATION_CONSTANT: f64 = std::f64::consts::SQRT_2;
/// Default number of tree nodes to pre-allocate for a fresh search.
pub const DEFAULT_NODE_CAPACITY: usize = 4096;
/// Default number of simulations per decision.
pub const DEFAULT_SIMULATIONS: u32 = 10_000;

/// How much work a single decision may spend.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Budget {
    /// Run exactly this many simulations.
    Simulations(u32),
    /// Keep simulating until this much wall-clock time has passed.
    Time(Duration),
}

impl Budget {
    /// Fails with [`Error::InvalidBudget`] for a budget that allows no simulation at all.
    pub fn validate(&self) -> Result<()> {
        let is_empty = match self {
            Budget::Simulations(n) => *n == 0,
            Budget::Time(limit) => limit.is_zero(),
        };

        if is_empty {
            Err(Error::InvalidBudget)
        } else {
            Ok(())
        }
    }
}

impl Default for Budget {
    fn default() -> Self {
        Budget::Simulations(DEFAULT_SIMULATIONS)
    }
}

fn d_exploration_constant() -> f64 {
    DEFAULT_EXPLORATION_CONSTANT
}
fn d_reuse_tree() -> bool {
    true
}
fn d_node_capacity() -> usize {
    DEFAULT_NODE_CAPACITY
}

/// Tunables for [`crate::mcts::MonteCarloTreeSearch`].
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// `C` in `mean + C * sqrt(ln(parent visits) / visits)`.
    #[serde(default = "d_exploration_constant")]
    pub exploration_constant: f64,

    /// Keep the subtree of the chosen move as the root of the next decision.
    #[serde(default = "d_reuse_tree")]
    pub reuse_tree: bool,

    #[serde(default = "d_node_capacity")]
    pub node_capacity: usize,

    /// Budget used when a caller does not pass one explicitly.
    #[serde(default)]
    pub default_budget: Budget,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            exploration_constant: DEFAULT_EXPLORATION_CONSTANT,
            reuse_tree: true,
            node_capacity: DEFAULT_NODE_CAPACITY,
            default_budget: Budget::default(),
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.exploration_constant.is_finite() || self.exploration_constant < 0.0 {
            return Err(Error::InvalidConfiguration {
                message: format!(
                    "exploration_constant must be finite and non-negative, got {}",
                    self.exploration_constant
                ),
            });
        }

        self.default_budget
            .validate()
            .map_err(|_| Error::InvalidConfiguration {
                message: "default_budget must allow at least one simulation".to_string(),
            })
    }
}
