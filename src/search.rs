//! The search driver: select, expand, evaluate, backpropagate, until a solve turns up or the
//! iteration budget runs out.

use crate::error::{Result, SolverError};
use crate::heuristic::{DistanceEstimator, Estimator};
use crate::moves::format_move;
use crate::pool::Evaluator;
use crate::rotation::Rotation;
use crate::state::PuzzleState;
use crate::tree::{NodeId, SearchTree, SOLVED_REWARD};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::sync::Arc;

/// Knobs for one search run.
#[derive(typed_builder::TypedBuilder, Clone, Debug, PartialEq)]
pub struct SearchConfig {
    /// Maximum select/expand/evaluate/backpropagate rounds.
    #[builder(default = 1000)]
    pub iterations: usize,

    /// Softmax temperature for child selection. Zero always takes the best child.
    #[builder(default = 0.1)]
    pub explore_param: f64,

    /// Seed for every random choice the search makes. None seeds from the OS.
    #[builder(default, setter(strip_option))]
    pub seed: Option<u64>,

    /// Reward workers. Zero evaluates on the driver thread.
    #[builder(default = 0)]
    pub workers: usize,

    /// Plies of greedy lookahead per iteration. One is a plain `rollout`.
    #[builder(default = 1)]
    pub rollout_depth: usize,

    /// Built-in estimator used when no external one is supplied.
    #[builder(default)]
    pub estimator: Estimator,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig::builder().build()
    }
}

impl SearchConfig {
    /// Checks every parameter is in range.
    ///
    /// # Errors
    /// `InvalidConfig` naming the first bad parameter.
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(SolverError::InvalidConfig {
                msg: "iterations must be > 0",
            });
        }
        if !(self.explore_param.is_finite() && self.explore_param >= 0.0) {
            return Err(SolverError::InvalidConfig {
                msg: "explore_param must be finite and >= 0",
            });
        }
        if self.rollout_depth == 0 {
            return Err(SolverError::InvalidConfig {
                msg: "rollout_depth must be > 0",
            });
        }
        Ok(())
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

/// Runs up to |iterations| rounds of tree policy, rollout and backpropagation on |tree|. Stops as
/// soon as a solved state is evaluated. Returns whether one was found.
///
/// A tree whose root is already solved returns true without expanding anything.
///
/// # Errors
/// Whatever the tree or the evaluator reports; all of them end the search.
pub fn mcts_search<R: Rng + ?Sized>(
    tree: &mut SearchTree,
    iterations: usize,
    explore_param: f64,
    rollout_depth: usize,
    evaluator: &Evaluator,
    rng: &mut R,
) -> Result<bool> {
    let root = tree.root();
    if tree.is_terminal(root) {
        debug!("root is already solved");
        return Ok(true);
    }
    for iteration in 0..iterations {
        let node = tree.tree_policy(explore_param, rng)?;
        let (leaf, reward) = if rollout_depth > 1 {
            tree.deep_rollout(node, rollout_depth, evaluator)?
        } else {
            (node, tree.rollout(node, evaluator)?)
        };
        let propagated = tree.backpropagate(leaf, reward);
        if propagated >= SOLVED_REWARD && reaches_solved(tree, leaf) {
            info!(
                "solved after {} iterations, {} nodes",
                iteration + 1,
                tree.node_count()
            );
            return Ok(true);
        }
    }
    warn!(
        "no solve within {iterations} iterations; best reward {:.3}",
        tree.best_reward()
    );
    Ok(false)
}

/// True iff |leaf| or one of the children just scored under it is solved. A reward of 1 alone
/// is not trusted: an estimator overriding `DistanceEstimator::reward` may hand it out freely.
fn reaches_solved(tree: &SearchTree, leaf: NodeId) -> bool {
    let found = tree.is_terminal(leaf)
        || tree
            .node(leaf)
            .children()
            .iter()
            .any(|child| tree.is_terminal(*child));
    if !found {
        warn!("node {leaf} scored a solved reward without being solved");
    }
    found
}

/// The outcome of one solve attempt.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchReport {
    /// Whether a solved state was reached.
    pub solved: bool,
    /// Nodes in the tree when the search stopped.
    pub node_count: usize,
    /// Depth of the deepest node.
    pub max_depth: usize,
    /// Best reward anywhere in the tree.
    pub best_reward: f64,
    /// Length of the scramble that was solved.
    pub scramble_depth: usize,
    /// Expansions performed.
    pub expansions: usize,
    /// Greedy path from the root. Solves the cube iff `solved`.
    pub path: Vec<Rotation>,
}

/// Owns the configuration, the evaluator and the random source for a series of searches.
pub struct Searcher {
    config: SearchConfig,
    evaluator: Evaluator,
    rng: StdRng,
}

impl Searcher {
    /// A searcher scoring states with the configured built-in estimator.
    ///
    /// # Errors
    /// `InvalidConfig` for out-of-range parameters, `SearchAborted` if workers cannot start.
    pub fn new(config: SearchConfig) -> Result<Searcher> {
        let estimator = Arc::new(config.estimator);
        Searcher::with_estimator(config, estimator)
    }

    /// A searcher scoring states with |estimator|, e.g. a trained model.
    ///
    /// # Errors
    /// As `Searcher::new`.
    pub fn with_estimator(
        config: SearchConfig,
        estimator: Arc<dyn DistanceEstimator>,
    ) -> Result<Searcher> {
        config.validate()?;
        let evaluator = Evaluator::with_workers(estimator, config.workers)?;
        let rng = config.rng();
        Ok(Searcher {
            config,
            evaluator,
            rng,
        })
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Builds a fresh tree for |state|.
    #[must_use]
    pub fn tree(&self, state: PuzzleState) -> SearchTree {
        SearchTree::new(state, &self.evaluator)
    }

    /// Searches |tree| with the configured budget.
    ///
    /// # Errors
    /// See `mcts_search`.
    pub fn search(&mut self, tree: &mut SearchTree) -> Result<bool> {
        mcts_search(
            tree,
            self.config.iterations,
            self.config.explore_param,
            self.config.rollout_depth,
            &self.evaluator,
            &mut self.rng,
        )
    }

    /// Scrambles a solved cube with |scramble|, searches for a way back and reports.
    ///
    /// # Errors
    /// See `mcts_search`.
    pub fn solve(&mut self, scramble: &[Rotation]) -> Result<SearchReport> {
        info!(
            "solving scramble [{}] with {} iterations",
            format_move(scramble),
            self.config.iterations
        );
        let mut tree = self.tree(PuzzleState::scrambled(scramble));
        let solved = self.search(&mut tree)?;
        Ok(SearchReport {
            solved,
            node_count: tree.node_count(),
            max_depth: tree.max_depth(),
            best_reward: tree.best_reward(),
            scramble_depth: scramble.len(),
            expansions: tree.expansions(),
            path: tree.solve_path(),
        })
    }
}

/// Solves every scramble independently, in parallel. Attempt `i` is seeded with the configured
/// seed plus `i`, so a seeded batch is reproducible regardless of scheduling.
///
/// # Errors
/// The first error any attempt hits.
pub fn solve_batch(
    scrambles: &[Vec<Rotation>],
    config: &SearchConfig,
) -> Result<Vec<SearchReport>> {
    config.validate()?;
    scrambles
        .par_iter()
        .enumerate()
        .map(|(i, scramble)| {
            let mut attempt = config.clone();
            attempt.seed = config.seed.map(|s| s.wrapping_add(i as u64));
            Searcher::new(attempt)?.solve(scramble)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::parse_move;

    #[test]
    fn test_default_config() {
        let config = SearchConfig::default();
        assert_eq!(1000, config.iterations);
        assert_eq!(0.1, config.explore_param);
        assert_eq!(None, config.seed);
        assert_eq!(0, config.workers);
        assert_eq!(1, config.rollout_depth);
        assert_eq!(Estimator::Composite, config.estimator);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_configs() {
        for config in [
            SearchConfig::builder().iterations(0).build(),
            SearchConfig::builder().explore_param(-0.5).build(),
            SearchConfig::builder().explore_param(f64::NAN).build(),
            SearchConfig::builder().rollout_depth(0).build(),
        ] {
            assert!(matches!(
                Searcher::new(config),
                Err(SolverError::InvalidConfig { .. })
            ));
        }
    }

    #[test]
    fn test_solved_root_needs_no_expansion() {
        let mut searcher = Searcher::new(SearchConfig::builder().seed(1).build()).unwrap();
        let report = searcher.solve(&[]).unwrap();
        assert!(report.solved);
        assert_eq!(0, report.expansions);
        assert_eq!(1, report.node_count);
        assert!(report.path.is_empty());
        assert_eq!(1.0, report.best_reward);
    }

    #[test]
    fn test_budget_exhausted_is_not_an_error() {
        let config = SearchConfig::builder().iterations(3).seed(5).build();
        let mut searcher = Searcher::new(config).unwrap();
        let scramble = parse_move("R1 U2 F1 L3 B2 D1 R3 F2").unwrap();
        let report = searcher.solve(&scramble).unwrap();
        assert!(!report.solved);
        assert_eq!(3, report.expansions);
        assert_eq!(8, report.scramble_depth);
        assert!(report.best_reward < 1.0);
        let mut state = PuzzleState::scrambled(&scramble);
        state.apply_move(&report.path);
        assert!(!state.is_solved());
    }

    #[test]
    fn test_seeded_runs_repeat() {
        let scramble = parse_move("U1 R1 F1").unwrap();
        let config = SearchConfig::builder().iterations(50).seed(9).build();
        let a = Searcher::new(config.clone()).unwrap().solve(&scramble).unwrap();
        let b = Searcher::new(config).unwrap().solve(&scramble).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_external_estimator() {
        let estimator: Arc<dyn DistanceEstimator> =
            Arc::new(|state: &PuzzleState| f64::from(crate::heuristic::naive(state)));
        let config = SearchConfig::builder().iterations(20).seed(2).build();
        let mut searcher = Searcher::with_estimator(config, estimator).unwrap();
        let report = searcher.solve(&parse_move("D2").unwrap()).unwrap();
        assert!(report.solved);
        assert_eq!("D2", format_move(&report.path));
    }

    #[test]
    fn test_overconfident_estimator_cannot_fake_a_solve() {
        let estimator: Arc<dyn DistanceEstimator> = Arc::new(|_: &PuzzleState| 0.0);
        let config = SearchConfig::builder().iterations(50).seed(1).build();
        let mut searcher = Searcher::with_estimator(config, estimator).unwrap();
        let scramble = parse_move("U1 R1 F1 L1").unwrap();
        let report = searcher.solve(&scramble).unwrap();
        assert!(report.solved || report.best_reward < 1.0);
        let mut state = PuzzleState::scrambled(&scramble);
        state.apply_move(&report.path);
        assert_eq!(report.solved, state.is_solved());
    }

    struct Flattering;

    impl DistanceEstimator for Flattering {
        fn estimate(&self, _: &PuzzleState) -> f64 {
            0.0
        }

        fn reward(&self, _: &PuzzleState) -> f64 {
            1.0
        }
    }

    #[test]
    fn test_solved_reward_needs_a_solved_state() {
        let config = SearchConfig::builder().iterations(5).seed(1).build();
        let mut searcher = Searcher::with_estimator(config, Arc::new(Flattering)).unwrap();
        let report = searcher.solve(&parse_move("U1 R1 F1 L1").unwrap()).unwrap();
        assert!(!report.solved);
        assert_eq!(5, report.expansions);
    }

    #[test]
    fn test_batch_matches_sequential() {
        let scrambles: Vec<Vec<Rotation>> = ["R1", "U1 R1", "F3 D2"]
            .iter()
            .map(|s| parse_move(s).unwrap())
            .collect();
        let config = SearchConfig::builder().iterations(500).seed(100).build();
        let batch = solve_batch(&scrambles, &config).unwrap();
        assert_eq!(3, batch.len());
        for (i, (scramble, report)) in scrambles.iter().zip(&batch).enumerate() {
            let mut attempt = config.clone();
            attempt.seed = Some(100 + i as u64);
            let single = Searcher::new(attempt).unwrap().solve(scramble).unwrap();
            assert_eq!(&single, report);
            assert_eq!(scramble.len(), report.scramble_depth);
        }
    }
}
