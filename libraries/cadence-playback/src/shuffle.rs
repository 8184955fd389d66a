//! Shuffle for queue randomization
//!
//! Pure random permutation (Fisher-Yates). A fresh order is drawn every time;
//! there is no stability guarantee between calls.

use rand::seq::SliceRandom;
use rand::Rng;

/// Shuffle in place with a caller-supplied generator
///
/// Each element has equal probability of landing at any position.
pub fn shuffle_tracks_with<T, R: Rng + ?Sized>(tracks: &mut [T], rng: &mut R) {
    tracks.shuffle(rng);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn shuffle_preserves_all_elements() {
        let mut items: Vec<u32> = (0..20).collect();
        shuffle_tracks_with(&mut items, &mut rand::thread_rng());

        let set: HashSet<u32> = items.iter().copied().collect();
        assert_eq!(set.len(), 20);
        assert!((0..20).all(|i| set.contains(&i)));
    }

    #[test]
    fn seeded_shuffle_is_reproducible() {
        let mut a: Vec<u32> = (0..10).collect();
        let mut b = a.clone();
        shuffle_tracks_with(&mut a, &mut StdRng::seed_from_u64(42));
        shuffle_tracks_with(&mut b, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn shuffle_changes_order_for_some_seed() {
        let original: Vec<u32> = (0..8).collect();
        let changed = (0..10u64).any(|seed| {
            let mut items = original.clone();
            shuffle_tracks_with(&mut items, &mut StdRng::seed_from_u64(seed));
            items != original
        });
        assert!(changed);
    }

    #[test]
    fn empty_and_single_are_untouched() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut empty: Vec<u32> = Vec::new();
        shuffle_tracks_with(&mut empty, &mut rng);
        assert!(empty.is_empty());

        let mut one = vec![7];
        shuffle_tracks_with(&mut one, &mut rng);
        assert_eq!(one, vec![7]);
    }
}
