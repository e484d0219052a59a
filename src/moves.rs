//! Moves: sequences of rotations, their notation and normalization.

use crate::error::Result;
use crate::rotation::Rotation;
use rand::seq::SliceRandom;
use rand::Rng;

/// Merges runs of rotations on the same face by summing their quarter turns mod 4. Runs that add
/// up to a full turn disappear, which may bring two blocks on the same face together; those merge
/// too, so the output never has two adjacent rotations of one face. Blocks on distinct faces keep
/// their order.
#[must_use]
pub fn compress(sequence: &[Rotation]) -> Vec<Rotation> {
    let mut out: Vec<Rotation> = Vec::with_capacity(sequence.len());
    for rotation in sequence {
        match out.last().copied() {
            Some(last) if last.face() == rotation.face() => {
                out.pop();
                let turns = (last.turns() + rotation.turns()) % 4;
                // A zero total cancels the block.
                if let Ok(merged) = Rotation::new(last.face(), turns) {
                    out.push(merged);
                }
            }
            _ => out.push(*rotation),
        }
    }
    out
}

/// The sequence that undoes |sequence|: inverse rotations in reverse order.
#[must_use]
pub fn invert(sequence: &[Rotation]) -> Vec<Rotation> {
    sequence.iter().rev().map(|r| r.inverse()).collect()
}

/// Decodes a move written as tokens separated by whitespace or commas, e.g. `"R1 U3, F2"`.
///
/// # Errors
/// `InvalidRotation` for the first token that is not a valid rotation.
pub fn parse_move(text: &str) -> Result<Vec<Rotation>> {
    text.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .map(str::parse)
        .collect()
}

/// Writes |sequence| as space separated tokens.
#[must_use]
pub fn format_move(sequence: &[Rotation]) -> String {
    sequence
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// A random move of |k| rotations where no two consecutive rotations turn the same face, so the
/// result is already compressed.
pub fn random_move<R: Rng + ?Sized>(k: usize, rng: &mut R) -> Vec<Rotation> {
    let mut sequence: Vec<Rotation> = Vec::with_capacity(k);
    while sequence.len() < k {
        let candidates = Rotation::possible_after(sequence.last().copied());
        match candidates.choose(rng) {
            Some(rotation) => sequence.push(*rotation),
            None => break,
        }
    }
    sequence
}
