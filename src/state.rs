//! The puzzle state: 54 facelets and the log of rotations that produced them.

use crate::error::Result;
use crate::rotation::{Rotation, QUARTER_TURNS};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Number of facelets on the cube.
pub const FACELETS: usize = 54;

/// The facelets of the solved cube: every facelet on face `i` has color `i`.
#[allow(clippy::cast_possible_truncation)]
pub const SOLVED: [u8; FACELETS] = {
    let mut facelets = [0; FACELETS];
    let mut i = 0;
    while i < FACELETS {
        facelets[i] = (i / 9) as u8;
        i += 1;
    }
    facelets
};

/// cycles facelets according to |permutations|.
fn apply_permutation(facelets: &mut [u8; FACELETS], permutations: &[Vec<usize>]) {
    permutations
        .iter()
        .filter(|p| !p.is_empty())
        .for_each(|perm| {
            let start = facelets[perm[0]];
            for i in 0..perm.len() - 1 {
                facelets[perm[i]] = facelets[perm[i + 1]];
            }
            facelets[perm[perm.len() - 1]] = start;
        });
}

/// A cube configuration. Facelets are only ever changed by rotations, so every state holds
/// exactly nine facelets of each color.
///
/// Equality and hashing look at the facelets only; the move log is history, not state.
#[derive(Clone, Debug)]
pub struct PuzzleState {
    facelets: [u8; FACELETS],
    moves: Vec<Rotation>,
}

impl PuzzleState {
    /// The solved cube with an empty move log.
    #[must_use]
    pub fn solved() -> PuzzleState {
        PuzzleState {
            facelets: SOLVED,
            moves: Vec::new(),
        }
    }

    /// The solved cube with |scramble| applied.
    #[must_use]
    pub fn scrambled(scramble: &[Rotation]) -> PuzzleState {
        let mut state = PuzzleState::solved();
        state.apply_move(scramble);
        state
    }

    /// Restores the solved configuration and clears the move log.
    pub fn reset(&mut self) {
        self.facelets = SOLVED;
        self.moves.clear();
    }

    /// Read-only view of the facelets, indexed `face * 9 + row * 3 + column`.
    #[must_use]
    pub fn facelets(&self) -> &[u8; FACELETS] {
        &self.facelets
    }

    /// Color of the facelet at |face|, |row|, |col|.
    #[must_use]
    pub fn facelet(&self, face: usize, row: usize, col: usize) -> u8 {
        self.facelets[face * 9 + row * 3 + col]
    }

    /// Every rotation applied at the top level, in order.
    #[must_use]
    pub fn moves(&self) -> &[Rotation] {
        &self.moves
    }

    /// The last rotation applied, if any.
    #[must_use]
    pub fn last_move(&self) -> Option<Rotation> {
        self.moves.last().copied()
    }

    /// True iff every face is uniform and carries its own color.
    #[must_use]
    pub fn is_solved(&self) -> bool {
        self.facelets == SOLVED
    }

    /// Turns the cube in place by |rotation| and logs it as one token. Half and three-quarter
    /// turns are the quarter turn repeated.
    pub fn rotate(&mut self, rotation: Rotation) {
        let cycles = &QUARTER_TURNS[&rotation.face()];
        for _ in 0..rotation.turns() {
            apply_permutation(&mut self.facelets, cycles);
        }
        self.moves.push(rotation);
    }

    /// Returns a copy of this state turned by |rotation|.
    #[must_use]
    pub fn apply_rotation(&self, rotation: Rotation) -> PuzzleState {
        let mut next = self.clone();
        next.rotate(rotation);
        next
    }

    /// Decodes |token| and turns the cube by it.
    ///
    /// # Errors
    /// `InvalidRotation` if |token| is not a valid rotation; the state is left untouched.
    pub fn apply_token(&mut self, token: &str) -> Result<()> {
        let rotation: Rotation = token.parse()?;
        self.rotate(rotation);
        Ok(())
    }

    /// Applies every rotation of |sequence| in order.
    pub fn apply_move(&mut self, sequence: &[Rotation]) {
        for rotation in sequence {
            self.rotate(*rotation);
        }
    }
}

impl Default for PuzzleState {
    fn default() -> Self {
        Self::solved()
    }
}

impl PartialEq for PuzzleState {
    fn eq(&self, other: &Self) -> bool {
        self.facelets == other.facelets
    }
}

impl Eq for PuzzleState {}

impl Hash for PuzzleState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.facelets.hash(state);
    }
}

impl fmt::Display for PuzzleState {
    /// Prints the six faces as an unfolded net: U on top, L F R B across, D underneath.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let row = |face: usize, r: usize| -> String {
            (0..3).map(|c| self.facelet(face, r, c).to_string()).collect()
        };
        for r in 0..3 {
            writeln!(f, "    {}", row(0, r))?;
        }
        for r in 0..3 {
            writeln!(f, "{} {} {} {}", row(1, r), row(2, r), row(3, r), row(4, r))?;
        }
        for r in 0..3 {
            writeln!(f, "    {}", row(5, r))?;
        }
        Ok(())
    }
}
