//! The rotation vocabulary: six faces, three turn amounts, and the facelet
//! permutation that a quarter turn of each face performs.

use crate::error::{Result, SolverError};
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

lazy_static! {
    /// Each entry maps a face to the cycle-notation permutation of facelet indices performed by a
    /// 90° clockwise turn of that face. A cycle `[a, b, c, d]` moves the facelet at `b` into `a`,
    /// `c` into `b`, `d` into `c` and `a` into `d`. Facelet `i` lives on face `i / 9`, row
    /// `(i % 9) / 3`, column `i % 3`.
    pub(crate) static ref QUARTER_TURNS: HashMap<Face, Vec<Vec<usize>>> = HashMap::from([
        (Face::U, vec![ vec![0, 6, 8, 2], vec![1, 3, 7, 5], vec![9, 18, 27, 36], vec![10, 19, 28, 37], vec![11, 20, 29, 38], ]),
        (Face::L, vec![ vec![9, 15, 17, 11], vec![10, 12, 16, 14], vec![0, 44, 45, 18], vec![3, 41, 48, 21], vec![6, 38, 51, 24], ]),
        (Face::F, vec![ vec![18, 24, 26, 20], vec![19, 21, 25, 23], vec![6, 17, 47, 27], vec![7, 14, 46, 30], vec![8, 11, 45, 33], ]),
        (Face::R, vec![ vec![27, 33, 35, 29], vec![28, 30, 34, 32], vec![2, 20, 47, 42], vec![5, 23, 50, 39], vec![8, 26, 53, 36], ]),
        (Face::B, vec![ vec![36, 42, 44, 38], vec![37, 39, 43, 41], vec![0, 29, 53, 15], vec![1, 32, 52, 12], vec![2, 35, 51, 9], ]),
        (Face::D, vec![ vec![45, 51, 53, 47], vec![46, 48, 52, 50], vec![15, 42, 33, 24], vec![16, 43, 34, 25], vec![17, 44, 35, 26], ]),
    ]);

    /// All 18 valid rotations, face-major in `FACES` order.
    static ref ROTATIONS: Vec<Rotation> = FACES
        .iter()
        .flat_map(|face| (1..=3).map(move |turns| Rotation { face: *face, turns }))
        .collect();
}

/// The faces in canonical order. A face's index is also the color of its facelets when solved.
pub const FACES: [Face; 6] = [Face::U, Face::L, Face::F, Face::R, Face::B, Face::D];

/// All the faces on a Rubik's cube.
#[derive(Clone, Copy, Debug, PartialOrd, Ord, Eq, PartialEq, Hash)]
pub enum Face {
    /// Up.
    U,
    /// Left.
    L,
    /// Front.
    F,
    /// Right.
    R,
    /// Back.
    B,
    /// Down.
    D,
}

impl Face {
    /// Position of this face in `FACES`, which doubles as its solved color id.
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Parses one of `U`, `L`, `F`, `R`, `B`, `D`.
    #[must_use]
    pub fn from_char(c: char) -> Option<Face> {
        match c {
            'U' => Some(Face::U),
            'L' => Some(Face::L),
            'F' => Some(Face::F),
            'R' => Some(Face::R),
            'B' => Some(Face::B),
            'D' => Some(Face::D),
            _ => None,
        }
    }

    fn as_char(self) -> char {
        match self {
            Face::U => 'U',
            Face::L => 'L',
            Face::F => 'F',
            Face::R => 'R',
            Face::B => 'B',
            Face::D => 'D',
        }
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A clockwise turn of one face by 1, 2 or 3 quarter turns.
#[derive(Clone, Copy, Debug, PartialOrd, Ord, Eq, PartialEq, Hash)]
pub struct Rotation {
    face: Face,
    // Always in 1..=3.
    turns: u8,
}

impl Rotation {
    /// Builds the rotation of |face| by |turns| quarter turns. Only 1, 2 and 3 are valid.
    ///
    /// # Errors
    /// `InvalidRotation` when |turns| is outside `1..=3`.
    pub fn new(face: Face, turns: u8) -> Result<Rotation> {
        if (1..=3).contains(&turns) {
            Ok(Rotation { face, turns })
        } else {
            Err(SolverError::InvalidRotation {
                token: format!("{face}{turns}"),
            })
        }
    }

    /// The 18 valid rotations.
    #[must_use]
    pub fn all() -> &'static [Rotation] {
        &ROTATIONS
    }

    /// The face this rotation turns.
    #[must_use]
    pub fn face(self) -> Face {
        self.face
    }

    /// Number of clockwise quarter turns, in `1..=3`.
    #[must_use]
    pub fn turns(self) -> u8 {
        self.turns
    }

    /// The rotation that undoes this one: same face, `4 - turns` quarter turns.
    #[must_use]
    pub fn inverse(self) -> Rotation {
        Rotation {
            face: self.face,
            turns: 4 - self.turns,
        }
    }

    /// Every rotation that may follow |last|: all 18 at the root, otherwise the 15 that turn a
    /// different face.
    #[must_use]
    pub fn possible_after(last: Option<Rotation>) -> Vec<Rotation> {
        ROTATIONS
            .iter()
            .filter(|r| last.map_or(true, |l| l.face != r.face))
            .copied()
            .collect()
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.face, self.turns)
    }
}

impl FromStr for Rotation {
    type Err = SolverError;

    fn from_str(token: &str) -> Result<Rotation> {
        let invalid = || SolverError::InvalidRotation {
            token: token.to_string(),
        };
        let mut chars = token.chars();
        let (Some(face), Some(turns), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(invalid());
        };
        let face = Face::from_char(face).ok_or_else(invalid)?;
        let turns = turns
            .to_digit(10)
            .and_then(|d| u8::try_from(d).ok())
            .ok_or_else(invalid)?;
        Rotation::new(face, turns).map_err(|_| invalid())
    }
}
