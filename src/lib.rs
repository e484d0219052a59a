#![warn(clippy::all, clippy::pedantic)]
// Run with `cargo clippy --all -- -D warnings`.
#![deny(missing_docs)]
//! Solving scrambled 3x3x3 cubes with a best-first tree search.
//!
//! The state engine (`rotation`, `state`, `heuristic`) turns faces and scores how far a state is
//! from solved. The search (`tree`, `search`, `pool`) grows a tree of states from a scramble,
//! always following the most promising rewards, until it reaches the solved cube or runs out of
//! iterations. `greedy` is a tree-free baseline that plays the best move of a fixed-depth
//! lookahead. `moves` normalizes and prints rotation sequences at the edges.

pub mod error;
pub mod greedy;
pub mod heuristic;
pub mod moves;
pub mod pool;
pub mod rotation;
pub mod search;
pub mod state;
pub mod tree;

pub use error::{Result, SolverError};
pub use greedy::{best_move, greedy_solve};
pub use heuristic::{
    align, estimate_distance, matrix, naive, reward, DistanceEstimator, Estimator,
};
pub use moves::{compress, format_move, invert, parse_move, random_move};
pub use pool::{Evaluator, WorkerPool};
pub use rotation::{Face, Rotation, FACES};
pub use search::{mcts_search, solve_batch, SearchConfig, SearchReport, Searcher};
pub use state::PuzzleState;
pub use tree::{NodeId, SearchNode, SearchTree, SOLVED_REWARD};
