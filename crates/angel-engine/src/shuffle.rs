//! Secure shuffling.

use rand::seq::SliceRandom;
use rand::{CryptoRng, Rng};

/// Shuffle `items` in place with a uniform Fisher-Yates permutation.
///
/// The `CryptoRng` bound keeps seed-predictable generators out of
/// production paths; tests may still pass a seeded `StdRng`.
pub fn shuffle<T, R>(items: &mut [T], rng: &mut R)
where
    R: Rng + CryptoRng + ?Sized,
{
    items.shuffle(rng);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::{OsRng, StdRng};
    use rand::SeedableRng;

    fn shuffle_secure<T>(items: &mut [T]) {
        shuffle(items, &mut OsRng);
    }

    #[test]
    fn test_empty_and_single_are_noops() {
        let mut empty: Vec<u32> = Vec::new();
        shuffle_secure(&mut empty);
        assert!(empty.is_empty());

        let mut single = vec![7];
        shuffle_secure(&mut single);
        assert_eq!(single, vec![7]);
    }

    #[test]
    fn test_shuffle_is_a_permutation() {
        let mut items: Vec<u32> = (0..50).collect();
        shuffle_secure(&mut items);
        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_seeded_shuffle_is_reproducible() {
        let mut a: Vec<u32> = (0..20).collect();
        let mut b = a.clone();
        shuffle(&mut a, &mut StdRng::seed_from_u64(7));
        shuffle(&mut b, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn test_every_position_is_reachable() {
        // First element of a 3-item list should land everywhere eventually.
        let mut seen = [false; 3];
        for _ in 0..200 {
            let mut items = [0, 1, 2];
            shuffle_secure(&mut items);
            let pos = items.iter().position(|&x| x == 0).unwrap();
            seen[pos] = true;
        }
        assert_eq!(seen, [true, true, true]);
    }
}
