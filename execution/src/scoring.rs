//! Scoring policy: a fixed award per number of dice matching the chosen face.

use dice_types::{DieFace, RollResult, DICE_PER_ROUND};

/// Points awarded per hit count, indexed by the number of matching dice.
pub const AWARDS: [u64; DICE_PER_ROUND + 1] = [0, 100, 300, 1_000];

/// Points awarded for a round with `hits` matching dice.
///
/// # Panics
///
/// Panics if `hits` exceeds the number of dice in a round.
pub fn award(hits: u8) -> u64 {
    assert!(
        (hits as usize) <= DICE_PER_ROUND,
        "hit count {hits} exceeds dice per round"
    );
    AWARDS[hits as usize]
}

/// Number of dice in `roll` matching `chosen` (zero when nothing is chosen).
pub fn hit_count(chosen: Option<DieFace>, roll: &RollResult) -> u8 {
    chosen.map_or(0, |face| roll.count(face))
}
