use crate::board::TerminalStatus;
use crate::config::{Budget, SearchConfig};
use crate::error::{Error, Result};
use crate::game_state::GameState;
use crate::mcts_node::SearchNode;
use crate::random::{RandomGenerator, StandardRandomGenerator};
use ego_tree::{NodeId, NodeRef, Tree};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{debug, trace};

/// The main struct for running the Monte Carlo Tree Search algorithm.
///
/// It owns the search tree between decisions, the random number generator used by rollouts,
/// and the configuration for the search. One instance serves one game.
pub struct MonteCarloTreeSearch<K: RandomGenerator> {
    tree: Option<Tree<SearchNode>>,
    random: K,
    config: SearchConfig,
    stop_signal: Option<Arc<AtomicBool>>,
}

impl<K: RandomGenerator> Default for MonteCarloTreeSearch<K> {
    fn default() -> Self {
        Self {
            tree: None,
            random: K::default(),
            config: SearchConfig::default(),
            stop_signal: None,
        }
    }
}

/// A builder for creating instances of `MonteCarloTreeSearch`.
pub struct MonteCarloTreeSearchBuilder<K: RandomGenerator> {
    random_generator: K,
    config: SearchConfig,
    stop_signal: Option<Arc<AtomicBool>>,
}

impl<K: RandomGenerator> Default for MonteCarloTreeSearchBuilder<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: RandomGenerator> MonteCarloTreeSearchBuilder<K> {
    /// Creates a builder with the default generator and configuration.
    pub fn new() -> Self {
        Self {
            random_generator: K::default(),
            config: SearchConfig::default(),
            stop_signal: None,
        }
    }

    /// Sets the random number generator used by rollouts.
    pub fn with_random_generator(mut self, rg: K) -> Self {
        self.random_generator = rg;
        self
    }

    /// Replaces the whole configuration.
    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the exploration constant `C` of the UCB1 formula.
    pub fn with_exploration_constant(mut self, c: f64) -> Self {
        self.config.exploration_constant = c;
        self
    }

    /// Enables or disables keeping the chosen subtree between decisions.
    pub fn with_tree_reuse(mut self, reuse: bool) -> Self {
        self.config.reuse_tree = reuse;
        self
    }

    /// Sets how many nodes a fresh tree pre-allocates.
    pub fn with_node_capacity(mut self, capacity: usize) -> Self {
        self.config.node_capacity = capacity;
        self
    }

    /// Sets the budget used by `select_move_with_default_budget` and `GameSession::play_turn`.
    pub fn with_default_budget(mut self, budget: Budget) -> Self {
        self.config.default_budget = budget;
        self
    }

    /// Installs a flag that stops the search between two simulations once it is set.
    pub fn with_stop_signal(mut self, signal: Arc<AtomicBool>) -> Self {
        self.stop_signal = Some(signal);
        self
    }

    /// Builds the `MonteCarloTreeSearch` instance, failing on an invalid configuration.
    pub fn build(self) -> Result<MonteCarloTreeSearch<K>> {
        self.config.validate()?;
        Ok(MonteCarloTreeSearch {
            tree: None,
            random: self.random_generator,
            config: self.config,
            stop_signal: self.stop_signal,
        })
    }
}

/// What a call to [`MonteCarloTreeSearch::search`] did.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct SearchSummary {
    pub simulations: u32,
    /// Whether the search continued from a tree kept from an earlier decision.
    pub reused_tree: bool,
}

/// Statistics of one move available at the root.
#[derive(Debug, PartialEq, Copy, Clone)]
pub struct ChildStats {
    pub b_move: u8,
    pub visits: u32,
    pub mean_reward: f64,
}

impl<K: RandomGenerator> MonteCarloTreeSearch<K> {
    /// Returns a new builder for `MonteCarloTreeSearch`.
    pub fn builder() -> MonteCarloTreeSearchBuilder<K> {
        MonteCarloTreeSearchBuilder::new()
    }

    /// Returns the configuration the engine was built with.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// The tree kept since the last search, if any.
    pub fn tree(&self) -> Option<&Tree<SearchNode>> {
        self.tree.as_ref()
    }

    /// Returns the root node of the kept tree, if any.
    pub fn root(&self) -> Option<&SearchNode> {
        self.tree.as_ref().map(|tree| tree.root().value())
    }

    /// Drops any kept tree.
    pub fn reset(&mut self) {
        self.tree = None;
    }

    /// Picks a move for the player to move in `state`, spending `budget`.
    ///
    /// Fails without touching the kept tree if the budget is empty or the game is over.
    pub fn select_move(&mut self, state: &GameState, budget: Budget) -> Result<u8> {
        let summary = self.search(state, budget)?;
        let b_move = self.best_move().ok_or(Error::NoLegalMove {
            status: state.terminal_status(),
        })?;

        if let Some(stats) = self.child_stats().iter().find(|x| x.b_move == b_move) {
            debug!(
                simulations = summary.simulations,
                reused_tree = summary.reused_tree,
                b_move,
                visits = stats.visits,
                mean_reward = stats.mean_reward,
                "selected move"
            );
        }

        self.commit(b_move);
        Ok(b_move)
    }

    /// Same as [`MonteCarloTreeSearch::select_move`] with the configured default budget.
    pub fn select_move_with_default_budget(&mut self, state: &GameState) -> Result<u8> {
        let budget = self.config.default_budget;
        self.select_move(state, budget)
    }

    /// Runs simulations from `state` until `budget` is spent or the stop signal is raised.
    ///
    /// At least one simulation always runs. The tree stays in place afterwards so it can be
    /// inspected with [`MonteCarloTreeSearch::child_stats`] or resolved with
    /// [`MonteCarloTreeSearch::best_move`] and [`MonteCarloTreeSearch::commit`].
    pub fn search(&mut self, state: &GameState, budget: Budget) -> Result<SearchSummary> {
        budget.validate()?;
        let status = state.terminal_status();
        if status.is_terminal() {
            return Err(Error::NoLegalMove { status });
        }

        let (mut tree, reused_tree) = self.take_root_for(state);
        let exploration_constant = self.config.exploration_constant;
        let started = Instant::now();
        let mut simulations = 0u32;
        loop {
            Self::iterate(&mut tree, &mut self.random, exploration_constant);
            simulations += 1;

            let exhausted = match budget {
                Budget::Simulations(n) => simulations >= n,
                Budget::Time(limit) => started.elapsed() >= limit,
            };
            if exhausted || self.is_stopped() {
                break;
            }
        }
        self.tree = Some(tree);

        Ok(SearchSummary {
            simulations,
            reused_tree,
        })
    }

    /// Returns the most visited move at the root, the first one in move order on a tie.
    pub fn best_move(&self) -> Option<u8> {
        let tree = self.tree.as_ref()?;
        most_visited_child(tree.root())?.value().prev_move
    }

    /// Statistics for every expanded move at the root, in move order.
    pub fn child_stats(&self) -> Vec<ChildStats> {
        let Some(tree) = self.tree.as_ref() else {
            return Vec::new();
        };

        tree.root()
            .children()
            .filter_map(|child| {
                let node = child.value();
                Some(ChildStats {
                    b_move: node.prev_move?,
                    visits: node.visits,
                    mean_reward: node.mean_reward(),
                })
            })
            .collect()
    }

    /// Advances the kept tree past `b_move`: its subtree becomes the new root when tree reuse
    /// is on, everything else is dropped.
    pub fn commit(&mut self, b_move: u8) {
        let Some(tree) = self.tree.take() else {
            return;
        };
        if !self.config.reuse_tree {
            return;
        }

        let retained = tree
            .root()
            .children()
            .find(|child| child.value().prev_move == Some(b_move))
            .map(|child| copy_subtree(child, self.config.node_capacity));
        self.tree = retained;
    }

    fn is_stopped(&self) -> bool {
        self.stop_signal
            .as_ref()
            .is_some_and(|signal| signal.load(Ordering::Relaxed))
    }

    /// Returns a tree rooted at `state`, reusing the kept one when it describes the same board
    /// or has `state` as a direct child.
    fn take_root_for(&mut self, state: &GameState) -> (Tree<SearchNode>, bool) {
        if let Some(tree) = self.tree.take() {
            if tree.root().value().state == *state {
                trace!(visits = tree.root().value().visits, "continuing kept tree");
                return (tree, true);
            }

            let reply = tree
                .root()
                .children()
                .find(|child| child.value().state == *state)
                .map(|child| copy_subtree(child, self.config.node_capacity));
            if let Some(subtree) = reply {
                trace!(
                    visits = subtree.root().value().visits,
                    "re-rooted kept tree at the opponent's reply"
                );
                return (subtree, true);
            }

            trace!("kept tree does not contain the position, starting over");
        }

        let root = SearchNode::new(*state, None);
        (Tree::with_capacity(root, self.config.node_capacity), false)
    }

    /// Performs one full iteration: selection, expansion, simulation, backpropagation.
    fn iterate(tree: &mut Tree<SearchNode>, random: &mut K, exploration_constant: f64) {
        let selected = Self::select_next_node(tree, exploration_constant);
        let expanded = Self::expand_node(tree, selected);
        let start = match tree.get(expanded) {
            Some(node) => node.value().state,
            None => return,
        };
        let outcome = Self::simulate(random, start);
        Self::backpropagate(tree, expanded, outcome);
    }

    /// Descends through fully expanded nodes, following the highest UCB1 value.
    fn select_next_node(tree: &Tree<SearchNode>, exploration_constant: f64) -> NodeId {
        let mut node = tree.root();
        while !node.value().is_terminal() && node.value().is_fully_expanded() {
            let parent_visits = node.value().visits;
            let mut best_child: Option<NodeRef<'_, SearchNode>> = None;
            let mut max_ucb = f64::NEG_INFINITY;
            for child in node.children() {
                let current_ucb = child.value().ucb_value(parent_visits, exploration_constant);
                if best_child.is_none() || current_ucb > max_ucb {
                    max_ucb = current_ucb;
                    best_child = Some(child);
                }
            }

            match best_child {
                Some(child) => node = child,
                None => break,
            }
        }

        node.id()
    }

    /// Adds a child for the first untried move of `node_id`. Terminal nodes are returned as is.
    fn expand_node(tree: &mut Tree<SearchNode>, node_id: NodeId) -> NodeId {
        let Some(mut node) = tree.get_mut(node_id) else {
            return node_id;
        };
        if node.value().is_terminal() {
            return node_id;
        }
        let Some(b_move) = node.value().take_untried_move() else {
            return node_id;
        };

        let child_state = node.value().state.advance(b_move);
        node.append(SearchNode::new(child_state, Some(b_move))).id()
    }

    /// Plays uniformly random moves from `state` until the game ends.
    fn simulate(random: &mut K, mut state: GameState) -> TerminalStatus {
        let mut outcome = state.terminal_status();
        while outcome == TerminalStatus::InProgress {
            let moves = state.legal_moves();
            let Some(&random_move) = random.choose(&moves) else {
                break;
            };
            state = state.advance(random_move);
            outcome = state.terminal_status();
        }
        outcome
    }

    /// Records `outcome` on every node from `node_id` up to the root.
    fn backpropagate(tree: &mut Tree<SearchNode>, node_id: NodeId, outcome: TerminalStatus) {
        let mut current = Some(node_id);
        while let Some(id) = current {
            let Some(mut node) = tree.get_mut(id) else {
                break;
            };
            node.value().record(outcome);
            current = node.parent().map(|parent| parent.id());
        }
    }
}

impl MonteCarloTreeSearch<StandardRandomGenerator> {
    /// Builds an engine with the thread-local generator and the given configuration.
    pub fn from_config(config: SearchConfig) -> Result<Self> {
        MonteCarloTreeSearchBuilder::new().with_config(config).build()
    }
}

/// Robust-child policy: highest visit count, first in child order on a tie.
fn most_visited_child(node: NodeRef<'_, SearchNode>) -> Option<NodeRef<'_, SearchNode>> {
    let mut best: Option<NodeRef<'_, SearchNode>> = None;
    for child in node.children() {
        let is_better = match best {
            None => true,
            Some(current) => child.value().visits > current.value().visits,
        };
        if is_better {
            best = Some(child);
        }
    }
    best
}

/// Copies the subtree under `source` into a new tree, keeping child order.
fn copy_subtree(source: NodeRef<'_, SearchNode>, capacity: usize) -> Tree<SearchNode> {
    let mut tree = Tree::with_capacity(source.value().clone(), capacity);
    let mut pending = vec![(source, tree.root().id())];
    while let Some((from, to)) = pending.pop() {
        for child in from.children() {
            let Some(mut parent) = tree.get_mut(to) else {
                continue;
            };
            let id = parent.append(child.value().clone()).id();
            pending.push((child, id));
        }
    }
    tree
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, Player};
    use crate::config::DEFAULT_EXPLORATION_CONSTANT;
    use crate::random::{CustomNumberGenerator, ScriptedGenerator};
    use std::time::Duration;

    fn state(s: &str) -> GameState {
        let board: Board = s.parse().unwrap();
        GameState::from_board(board).unwrap()
    }

    fn scripted_engine() -> MonteCarloTreeSearch<ScriptedGenerator> {
        MonteCarloTreeSearch::builder()
            .with_random_generator(ScriptedGenerator::new(vec![0]))
            .build()
            .unwrap()
    }

    fn seeded_engine() -> MonteCarloTreeSearch<CustomNumberGenerator> {
        MonteCarloTreeSearch::builder()
            .with_random_generator(CustomNumberGenerator::default())
            .build()
            .unwrap()
    }

    #[test]
    fn backpropagation_arithmetic_with_first_move_rollouts() {
        // arrange
        let mut mcts = scripted_engine();
        let position = state("XX-OO----");

        // act
        mcts.search(&position, Budget::Simulations(6)).unwrap();

        // assert
        let stats = mcts.child_stats();
        let expected = [(2, 2, 1.0), (5, 1, 0.0), (6, 1, 0.0), (7, 1, -1.0), (8, 1, -1.0)];
        assert_eq!(stats.len(), expected.len());
        for (stats, (b_move, visits, mean_reward)) in stats.iter().zip(expected) {
            assert_eq!(stats.b_move, b_move);
            assert_eq!(stats.visits, visits);
            assert_eq!(stats.mean_reward, mean_reward);
        }

        let root = mcts.root().unwrap();
        assert_eq!(root.visits, 6);
        assert_eq!(root.reward, 0.0);
        assert_eq!(mcts.best_move(), Some(2));
    }

    #[test]
    fn expands_one_child_per_simulation_in_move_order() {
        let mut mcts = scripted_engine();

        mcts.search(&GameState::new(), Budget::Simulations(3)).unwrap();

        let moves: Vec<u8> = mcts.child_stats().iter().map(|x| x.b_move).collect();
        assert_eq!(moves, vec![0, 1, 2]);
        assert_eq!(mcts.root().unwrap().visits, 3);
    }

    #[test]
    fn root_visits_equal_sum_of_child_visits() {
        let mut mcts = seeded_engine();

        mcts.search(&GameState::new(), Budget::Simulations(500)).unwrap();

        let total: u32 = mcts.child_stats().iter().map(|x| x.visits).sum();
        assert_eq!(total, 500);
        assert_eq!(mcts.root().unwrap().visits, 500);
    }

    #[test]
    fn takes_the_winning_move() {
        let mut mcts = seeded_engine();
        let b_move = mcts
            .select_move(&state("XX-OO----"), Budget::Simulations(2000))
            .unwrap();
        assert_eq!(b_move, 2);
    }

    #[test]
    fn blocks_the_opponent() {
        // O to move, X threatens the top row
        let mut mcts = seeded_engine();
        let b_move = mcts
            .select_move(&state("XX--O----"), Budget::Simulations(20000))
            .unwrap();
        assert_eq!(b_move, 2);
    }

    #[test]
    fn rejects_terminal_state() {
        let mut mcts = seeded_engine();
        let err = mcts
            .select_move(&state("XXXOO----"), Budget::Simulations(10))
            .unwrap_err();
        assert_eq!(
            err,
            Error::NoLegalMove {
                status: TerminalStatus::Won(Player::X)
            }
        );
        assert!(mcts.tree().is_none());
    }

    #[test]
    fn empty_budget_leaves_kept_tree_alone() {
        let mut mcts = seeded_engine();
        let position = GameState::new();
        mcts.search(&position, Budget::Simulations(300)).unwrap();
        let node_count = mcts.tree().unwrap().root().descendants().count();

        let err = mcts.select_move(&position, Budget::Simulations(0)).unwrap_err();

        assert_eq!(err, Error::InvalidBudget);
        assert_eq!(mcts.root().unwrap().visits, 300);
        assert_eq!(mcts.tree().unwrap().root().descendants().count(), node_count);
    }

    #[test]
    fn keeps_chosen_subtree_and_reuses_it_after_the_reply() {
        let mut mcts = seeded_engine();
        let start = state("----X----");

        let b_move = mcts.select_move(&start, Budget::Simulations(2000)).unwrap();

        let after_engine = start.apply_move(b_move as usize).unwrap();
        let kept = mcts.root().unwrap();
        assert_eq!(kept.state, after_engine);
        assert_eq!(kept.prev_move, Some(b_move));
        assert!(kept.visits > 0);

        let reply = after_engine.legal_moves()[0];
        let after_reply = after_engine.apply_move(reply as usize).unwrap();
        let summary = mcts.search(&after_reply, Budget::Simulations(10)).unwrap();

        assert!(summary.reused_tree);
        assert!(mcts.root().unwrap().visits > 10);
        assert_eq!(mcts.root().unwrap().state, after_reply);
    }

    #[test]
    fn unrelated_position_starts_a_fresh_tree() {
        let mut mcts = seeded_engine();
        mcts.select_move(&GameState::new(), Budget::Simulations(200))
            .unwrap();

        let summary = mcts
            .search(&state("XO-------"), Budget::Simulations(5))
            .unwrap();

        assert!(!summary.reused_tree);
        assert_eq!(mcts.root().unwrap().visits, 5);
        assert_eq!(mcts.root().unwrap().prev_move, None);
    }

    #[test]
    fn drops_tree_when_reuse_is_off() {
        let mut mcts: MonteCarloTreeSearch<CustomNumberGenerator> =
            MonteCarloTreeSearch::builder().with_tree_reuse(false).build().unwrap();

        mcts.select_move(&GameState::new(), Budget::Simulations(100))
            .unwrap();

        assert!(mcts.tree().is_none());
    }

    #[test]
    fn stop_signal_ends_search_after_one_simulation() {
        let signal = Arc::new(AtomicBool::new(true));
        let mut mcts: MonteCarloTreeSearch<CustomNumberGenerator> =
            MonteCarloTreeSearch::builder()
                .with_stop_signal(signal.clone())
                .build()
                .unwrap();

        let summary = mcts
            .search(&GameState::new(), Budget::Simulations(1_000_000))
            .unwrap();

        assert_eq!(summary.simulations, 1);
        assert_eq!(mcts.best_move(), Some(0));
    }

    #[test]
    fn time_budget_returns_a_legal_move() {
        let mut mcts = seeded_engine();
        let position = state("X---O----");

        let b_move = mcts
            .select_move(&position, Budget::Time(Duration::from_millis(20)))
            .unwrap();

        assert!(position.apply_move(b_move as usize).is_ok());
    }

    #[test]
    fn invalid_exploration_constant_fails_to_build() {
        let result: Result<MonteCarloTreeSearch<CustomNumberGenerator>> =
            MonteCarloTreeSearch::builder()
                .with_exploration_constant(-0.5)
                .build();
        assert!(matches!(result, Err(Error::InvalidConfiguration { .. })));
    }

    #[test]
    fn robust_child_depends_only_on_visits_and_order() {
        fn child(b_move: u8, visits: u32, reward: f64) -> SearchNode {
            let mut node = SearchNode::new(GameState::new().advance(b_move), Some(b_move));
            node.visits = visits;
            node.reward = reward;
            node
        }

        let mut tree = Tree::new(SearchNode::new(GameState::new(), None));
        {
            let mut root = tree.root_mut();
            root.append(child(0, 3, 3.0));
            root.append(child(4, 7, -2.0));
            root.append(child(8, 7, 7.0));
        }
        let picked = most_visited_child(tree.root()).unwrap();
        assert_eq!(picked.value().prev_move, Some(4));

        let mut shuffled = Tree::new(SearchNode::new(GameState::new(), None));
        {
            let mut root = shuffled.root_mut();
            root.append(child(4, 7, 1.0));
            root.append(child(0, 3, -3.0));
            root.append(child(8, 7, 0.0));
        }
        let picked = most_visited_child(shuffled.root()).unwrap();
        assert_eq!(picked.value().prev_move, Some(4));
    }

    fn fully_expanded_root(s: &str, children: &[(u32, f64)]) -> Tree<SearchNode> {
        let position = state(s);
        let mut root_node = SearchNode::new(position, None);
        root_node.visits = children.iter().map(|(visits, _)| visits).sum();
        let mut moves = vec![];
        while let Some(b_move) = root_node.take_untried_move() {
            moves.push(b_move);
        }
        assert_eq!(moves.len(), children.len());

        let mut tree = Tree::new(root_node);
        {
            let mut root = tree.root_mut();
            for (&b_move, &(visits, reward)) in moves.iter().zip(children) {
                let mut node = SearchNode::new(position.advance(b_move), Some(b_move));
                node.visits = visits;
                node.reward = reward;
                root.append(node);
            }
        }
        tree
    }

    #[test]
    fn ucb_tie_goes_to_first_child() {
        // arrange: X to move with 6, 7 and 8 free, every child scored the same
        let tree = fully_expanded_root("XOXOXO---", &[(2, 1.0), (2, 1.0), (2, 1.0)]);

        // act
        let selected = MonteCarloTreeSearch::<ScriptedGenerator>::select_next_node(
            &tree,
            DEFAULT_EXPLORATION_CONSTANT,
        );

        // assert
        let first = tree.root().first_child().unwrap();
        assert_eq!(selected, first.id());
        assert_eq!(first.value().prev_move, Some(6));
    }

    #[test]
    fn ucb_tie_skips_weaker_leading_child() {
        let tree = fully_expanded_root("XOXOXO---", &[(2, -1.0), (2, 1.0), (2, 1.0)]);

        let selected = MonteCarloTreeSearch::<ScriptedGenerator>::select_next_node(&tree, 1.0);

        let picked = tree.get(selected).unwrap();
        assert_eq!(picked.value().prev_move, Some(7));
    }

    #[test]
    fn unvisited_children_are_tried_first_in_order() {
        let tree = fully_expanded_root("XOXOXO---", &[(3, 3.0), (0, 0.0), (0, 0.0)]);

        let selected = MonteCarloTreeSearch::<ScriptedGenerator>::select_next_node(&tree, 1.0);

        let picked = tree.get(selected).unwrap();
        assert_eq!(picked.value().prev_move, Some(7));
    }

    #[test]
    fn copy_subtree_keeps_structure() {
        let mut mcts = seeded_engine();
        mcts.search(&GameState::new(), Budget::Simulations(400)).unwrap();
        let tree = mcts.tree().unwrap();
        let first = tree.root().first_child().unwrap();

        let copy = copy_subtree(first, 16);

        assert_eq!(
            copy.root().descendants().count(),
            first.descendants().count()
        );
        let original: Vec<Option<u8>> = first.children().map(|c| c.value().prev_move).collect();
        let copied: Vec<Option<u8>> = copy.root().children().map(|c| c.value().prev_move).collect();
        assert_eq!(original, copied);
        assert_eq!(copy.root().value().visits, first.value().visits);
    }
}
