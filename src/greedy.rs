//! Greedy solving by exhaustive lookahead, without a search tree.
//!
//! Each step scores every rotation sequence up to a fixed depth and plays the first rotation of
//! the best one. Cheap for shallow scrambles, and a baseline to compare the tree search against.

use crate::error::{Result, SolverError};
use crate::heuristic::DistanceEstimator;
use crate::moves::format_move;
use crate::rotation::Rotation;
use crate::state::PuzzleState;
use log::{debug, info, warn};
use rand::seq::SliceRandom;
use rand::Rng;

/// Scores all 18 rotations of |state|, looking |max_depth - level| further plies below each.
/// A leaf scores its estimated distance plus the plies it took to get there; a rotation that
/// solves the cube scores 0 and ends the scan. Ties go to |rng|.
#[allow(clippy::cast_precision_loss)]
fn lookahead<R: Rng + ?Sized>(
    state: &PuzzleState,
    level: usize,
    max_depth: usize,
    estimator: &dyn DistanceEstimator,
    rng: &mut R,
) -> (f64, Rotation) {
    let mut scores = Vec::with_capacity(Rotation::all().len());
    for r in Rotation::all() {
        let next = state.apply_rotation(*r);
        if next.is_solved() {
            return (0.0, *r);
        }
        let score = if level < max_depth {
            lookahead(&next, level + 1, max_depth, estimator, rng).0
        } else {
            estimator.estimate(&next) + level as f64
        };
        scores.push((score, *r));
    }

    let best = scores
        .iter()
        .map(|(score, _)| *score)
        .fold(f64::INFINITY, f64::min);
    let ties: Vec<Rotation> = scores
        .iter()
        .filter(|(score, _)| *score == best)
        .map(|(_, r)| *r)
        .collect();
    // Empty only if every score is NaN.
    let choice = ties.choose(rng).copied().unwrap_or(scores[0].1);
    (best, choice)
}

/// The most promising rotation from |state| and its score, looking |max_depth| plies ahead.
///
/// # Errors
/// `InvalidConfig` if |max_depth| is zero.
pub fn best_move<R: Rng + ?Sized>(
    state: &PuzzleState,
    max_depth: usize,
    estimator: &dyn DistanceEstimator,
    rng: &mut R,
) -> Result<(f64, Rotation)> {
    if max_depth == 0 {
        return Err(SolverError::InvalidConfig {
            msg: "lookahead depth must be > 0",
        });
    }
    Ok(lookahead(state, 1, max_depth, estimator, rng))
}

/// Plays `best_move` from |state| until the cube is solved or |max_moves| rotations have been
/// played. Returns the rotations played; they solve the cube iff the last one left it solved.
/// An already solved |state| needs no rotations.
///
/// # Errors
/// `InvalidConfig` if |max_depth| is zero.
pub fn greedy_solve<R: Rng + ?Sized>(
    state: &PuzzleState,
    max_depth: usize,
    max_moves: usize,
    estimator: &dyn DistanceEstimator,
    rng: &mut R,
) -> Result<Vec<Rotation>> {
    let mut current = state.clone();
    let mut played = Vec::new();
    if current.is_solved() {
        return Ok(played);
    }
    for _ in 0..max_moves {
        let (score, r) = best_move(&current, max_depth, estimator, rng)?;
        debug!("playing {r} (score {score:.2})");
        current.rotate(r);
        played.push(r);
        if current.is_solved() {
            info!("greedy solve in {} moves: {}", played.len(), format_move(&played));
            return Ok(played);
        }
    }
    warn!("no greedy solve within {max_moves} moves");
    Ok(played)
}
