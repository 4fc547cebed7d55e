//! Die faces and three-dice roll results.

use crate::{DICE_PER_ROUND, FACES};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum DieFaceError {
    #[error("die face out of range: {0} (expected 1-6)")]
    OutOfRange(u8),
    #[error("expected {expected} dice, got {got}")]
    WrongCount { expected: usize, got: usize },
}

/// A single die face in `1..=6`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct DieFace(u8);

impl DieFace {
    pub const ONE: Self = Self(1);
    pub const TWO: Self = Self(2);
    pub const THREE: Self = Self(3);
    pub const FOUR: Self = Self(4);
    pub const FIVE: Self = Self(5);
    pub const SIX: Self = Self(6);

    /// Every face, in ascending order.
    pub const ALL: [Self; FACES as usize] = [
        Self::ONE,
        Self::TWO,
        Self::THREE,
        Self::FOUR,
        Self::FIVE,
        Self::SIX,
    ];

    pub fn new(value: u8) -> Result<Self, DieFaceError> {
        if (1..=FACES).contains(&value) {
            Ok(Self(value))
        } else {
            Err(DieFaceError::OutOfRange(value))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for DieFace {
    type Error = DieFaceError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DieFace> for u8 {
    fn from(face: DieFace) -> Self {
        face.0
    }
}

impl fmt::Display for DieFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The ordered faces produced by one roll of three dice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RollResult([DieFace; DICE_PER_ROUND]);

impl RollResult {
    pub fn new(faces: [DieFace; DICE_PER_ROUND]) -> Self {
        Self(faces)
    }

    pub fn faces(&self) -> &[DieFace; DICE_PER_ROUND] {
        &self.0
    }

    /// Count how many dice landed on `face`.
    pub fn count(&self, face: DieFace) -> u8 {
        self.0.iter().filter(|&&d| d == face).count() as u8
    }

    pub fn is_triple(&self) -> bool {
        self.0[0] == self.0[1] && self.0[1] == self.0[2]
    }
}

impl TryFrom<&[DieFace]> for RollResult {
    type Error = DieFaceError;

    fn try_from(faces: &[DieFace]) -> Result<Self, Self::Error> {
        let faces: [DieFace; DICE_PER_ROUND] =
            faces.try_into().map_err(|_| DieFaceError::WrongCount {
                expected: DICE_PER_ROUND,
                got: faces.len(),
            })?;
        Ok(Self(faces))
    }
}

impl TryFrom<[u8; DICE_PER_ROUND]> for RollResult {
    type Error = DieFaceError;

    fn try_from(values: [u8; DICE_PER_ROUND]) -> Result<Self, Self::Error> {
        Ok(Self([
            DieFace::new(values[0])?,
            DieFace::new(values[1])?,
            DieFace::new(values[2])?,
        ]))
    }
}

impl fmt::Display for RollResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.0[0], self.0[1], self.0[2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_die_face_range() {
        for value in 1..=6 {
            assert_eq!(DieFace::new(value).unwrap().get(), value);
        }
        assert_eq!(DieFace::new(0), Err(DieFaceError::OutOfRange(0)));
        assert_eq!(DieFace::new(7), Err(DieFaceError::OutOfRange(7)));
    }

    #[test]
    fn test_die_face_serde_rejects_out_of_range() {
        let face: DieFace = serde_json::from_str("4").unwrap();
        assert_eq!(face, DieFace::FOUR);
        assert!(serde_json::from_str::<DieFace>("9").is_err());
        assert_eq!(serde_json::to_string(&DieFace::SIX).unwrap(), "6");
    }

    #[test]
    fn test_count_and_triple() {
        let roll = RollResult::try_from([4, 4, 2]).unwrap();
        assert_eq!(roll.count(DieFace::FOUR), 2);
        assert_eq!(roll.count(DieFace::TWO), 1);
        assert_eq!(roll.count(DieFace::ONE), 0);
        assert!(!roll.is_triple());

        let triple = RollResult::try_from([6, 6, 6]).unwrap();
        assert_eq!(triple.count(DieFace::SIX), 3);
        assert!(triple.is_triple());
    }

    #[test]
    fn test_roll_from_slice_requires_three_dice() {
        let faces = [DieFace::ONE, DieFace::TWO];
        assert_eq!(
            RollResult::try_from(&faces[..]),
            Err(DieFaceError::WrongCount {
                expected: 3,
                got: 2
            })
        );
        let faces = [DieFace::ONE, DieFace::TWO, DieFace::THREE];
        assert_eq!(RollResult::try_from(&faces[..]).unwrap().to_string(), "[1, 2, 3]");
    }
}
