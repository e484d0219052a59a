//! Scrambledness scores and the reward the search maximizes.
//!
//! Three raw measures are combined:
//! - `naive`: facelets out of place, 0..=54.
//! - `align`: corner alignment checks that fail, 0..=32.
//! - `matrix`: Euclidean distance between facelet vectors, roughly 6..=22 once scrambled.
//!
//! `estimate_distance` rescales each onto an estimated move count in `[1, 20]` and takes a 3:1:1
//! weighted average. `reward` maps that distance into `(0, 1]`, with 1 only for the solved cube.

use crate::state::{PuzzleState, SOLVED};

/// Each check is `[a, b, c, d]`: it holds when facelet `a` matches `b` and `c` matches `d`.
/// Four checks per corner cubicle: against its three neighbouring edges and against the centers.
#[rustfmt::skip]
const CORNER_CHECKS: [[usize; 4]; 32] = [
    // UFL
    [6, 7, 18, 19], [11, 14, 18, 21], [6, 3, 11, 10], [6, 4, 18, 22],
    // URF
    [8, 5, 27, 28], [27, 30, 20, 23], [8, 7, 20, 19], [8, 4, 27, 31],
    // ULB
    [0, 3, 9, 10], [9, 12, 38, 41], [0, 1, 38, 37], [0, 4, 9, 13],
    // UBR
    [2, 1, 36, 37], [36, 39, 29, 32], [2, 5, 29, 28], [2, 4, 36, 40],
    // DLF
    [45, 48, 17, 16], [17, 14, 24, 21], [45, 46, 24, 25], [45, 49, 17, 13],
    // DFR
    [47, 46, 26, 25], [26, 23, 33, 30], [47, 50, 33, 34], [47, 49, 26, 22],
    // DLB
    [51, 48, 15, 16], [15, 12, 44, 41], [51, 52, 44, 43], [51, 49, 15, 13],
    // DBR
    [53, 52, 42, 43], [42, 39, 35, 32], [53, 50, 35, 34], [53, 49, 42, 40],
];

/// Maximum `align` score.
pub const MAX_ALIGN: u32 = 32;

// Empirical ranges of the raw measures on scrambled cubes, mapped onto [1, 20] moves.
const ALIGN_RANGE: (f64, f64) = (8.0, 32.0);
const NAIVE_RANGE: (f64, f64) = (12.0, 54.0);
const MATRIX_RANGE: (f64, f64) = (6.0, 22.0);
const DISTANCE_RANGE: (f64, f64) = (1.0, 20.0);
const MIN_UNSOLVED_DISTANCE: f64 = DISTANCE_RANGE.0;

// align : naive : matrix
const WEIGHTS: [f64; 3] = [3.0, 1.0, 1.0];

/// Number of facelets that differ from the solved cube.
#[must_use]
pub fn naive(state: &PuzzleState) -> u32 {
    let misplaced = state
        .facelets()
        .iter()
        .zip(SOLVED.iter())
        .filter(|(a, b)| a != b)
        .count();
    // At most 54.
    u32::try_from(misplaced).unwrap_or(u32::MAX)
}

/// `32` minus the number of corner alignment checks that hold.
#[must_use]
pub fn align(state: &PuzzleState) -> u32 {
    let f = state.facelets();
    let aligned = CORNER_CHECKS
        .iter()
        .filter(|[a, b, c, d]| f[*a] == f[*b] && f[*c] == f[*d])
        .count();
    MAX_ALIGN - u32::try_from(aligned).unwrap_or(MAX_ALIGN)
}

/// Euclidean distance between the facelet ids of |state| and of the solved cube.
#[must_use]
pub fn matrix(state: &PuzzleState) -> f64 {
    state
        .facelets()
        .iter()
        .zip(SOLVED.iter())
        .map(|(a, b)| {
            let d = f64::from(*a) - f64::from(*b);
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

/// Linear interpolation of |x| from |from| onto |to|, clamped at both ends.
fn rescale(x: f64, from: (f64, f64), to: (f64, f64)) -> f64 {
    if x <= from.0 {
        to.0
    } else if x >= from.1 {
        to.1
    } else {
        to.0 + (x - from.0) * (to.1 - to.0) / (from.1 - from.0)
    }
}

fn rescaled_align(state: &PuzzleState) -> f64 {
    rescale(f64::from(align(state)), ALIGN_RANGE, DISTANCE_RANGE)
}

fn rescaled_naive(state: &PuzzleState) -> f64 {
    rescale(f64::from(naive(state)), NAIVE_RANGE, DISTANCE_RANGE)
}

fn rescaled_matrix(state: &PuzzleState) -> f64 {
    rescale(matrix(state), MATRIX_RANGE, DISTANCE_RANGE)
}

/// Estimated number of rotations to the solved cube: 0 when solved, else in `[1, 20]`.
#[must_use]
pub fn estimate_distance(state: &PuzzleState) -> f64 {
    if state.is_solved() {
        return 0.0;
    }
    let values = [
        rescaled_align(state),
        rescaled_naive(state),
        rescaled_matrix(state),
    ];
    let total: f64 = WEIGHTS.iter().sum();
    values.iter().zip(WEIGHTS.iter()).map(|(v, w)| v * w).sum::<f64>() / total
}

/// Maps a distance onto a reward: 0 gives 1, 20 gives a third.
#[must_use]
pub fn distance_to_reward(distance: f64) -> f64 {
    10.0 / (distance + 10.0)
}

/// Reward of |state| under the composite estimate. Exactly 1 iff solved.
#[must_use]
pub fn reward(state: &PuzzleState) -> f64 {
    distance_to_reward(estimate_distance(state))
}

/// A source of distance estimates. Anything that can score a state synchronously, including a
/// trained model loaded once at startup, can drive the search through this trait.
pub trait DistanceEstimator: Send + Sync {
    /// Estimated rotations from |state| to solved. Smaller is closer.
    fn estimate(&self, state: &PuzzleState) -> f64;

    /// Reward of |state|. Solved states always score exactly 1, whatever the estimate says.
    /// Unsolved states are at least one rotation away, so their estimate is floored at 1 and
    /// their reward stays below 1.
    fn reward(&self, state: &PuzzleState) -> f64 {
        if state.is_solved() {
            1.0
        } else {
            distance_to_reward(self.estimate(state).max(MIN_UNSOLVED_DISTANCE))
        }
    }
}

/// The built-in estimators.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Estimator {
    /// Rescaled `naive`.
    Naive,
    /// Rescaled `align`.
    Align,
    /// Rescaled `matrix`.
    Matrix,
    /// `estimate_distance`.
    #[default]
    Composite,
}

impl DistanceEstimator for Estimator {
    fn estimate(&self, state: &PuzzleState) -> f64 {
        if state.is_solved() {
            return 0.0;
        }
        match self {
            Estimator::Naive => rescaled_naive(state),
            Estimator::Align => rescaled_align(state),
            Estimator::Matrix => rescaled_matrix(state),
            Estimator::Composite => estimate_distance(state),
        }
    }
}

impl<F> DistanceEstimator for F
where
    F: Fn(&PuzzleState) -> f64 + Send + Sync,
{
    fn estimate(&self, state: &PuzzleState) -> f64 {
        self(state)
    }
}
