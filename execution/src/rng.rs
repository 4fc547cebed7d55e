use dice_types::{DieFace, RollResult, DICE_PER_ROUND};
use rand::{rngs::StdRng, Rng, RngCore, SeedableRng};

/// Source of uniformly distributed die faces.
pub trait RandomSource {
    /// Draw a single face in `1..=6`.
    fn roll_die(&mut self) -> DieFace;

    /// Draw `n` independent faces.
    fn roll_dice(&mut self, n: usize) -> Vec<DieFace> {
        (0..n).map(|_| self.roll_die()).collect()
    }

    /// Draw the three dice of one round.
    fn roll(&mut self) -> RollResult {
        let mut faces = [DieFace::ONE; DICE_PER_ROUND];
        for face in faces.iter_mut() {
            *face = self.roll_die();
        }
        RollResult::new(faces)
    }
}

impl<T: RandomSource + ?Sized> RandomSource for Box<T> {
    fn roll_die(&mut self) -> DieFace {
        (**self).roll_die()
    }
}

/// [`RandomSource`] backed by any `rand` generator.
#[derive(Clone, Debug)]
pub struct DiceRng<R = StdRng> {
    rng: R,
}

impl DiceRng<StdRng> {
    /// Generator seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Reproducible generator, for replaying a session.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: RngCore> DiceRng<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: RngCore> RandomSource for DiceRng<R> {
    fn roll_die(&mut self) -> DieFace {
        DieFace::ALL[self.rng.gen_range(0..DieFace::ALL.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_faces_in_range_and_all_reachable() {
        let mut rng = DiceRng::seeded(7);
        let mut seen = [0u32; 6];
        for face in rng.roll_dice(6_000) {
            let value = face.get();
            assert!((1..=6).contains(&value));
            seen[(value - 1) as usize] += 1;
        }
        // 1000 expected per face; a fair die stays well inside this band.
        for count in seen {
            assert!((800..1200).contains(&count), "skewed count {count}");
        }
    }

    #[test]
    fn test_roll_dice_length() {
        let mut rng = DiceRng::seeded(1);
        assert!(rng.roll_dice(0).is_empty());
        assert_eq!(rng.roll_dice(3).len(), 3);
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let mut a = DiceRng::seeded(42);
        let mut b = DiceRng::seeded(42);
        for _ in 0..20 {
            assert_eq!(a.roll(), b.roll());
        }
    }
}
