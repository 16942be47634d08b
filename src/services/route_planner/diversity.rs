use crate::constants::INTEREST_HASH_MASK;
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Hash of the interest text that does not change between runs of a build.
pub fn stable_hash(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}

/// Seed for one request: caller entropy mixed with the interest text.
///
/// Changing the entropy (e.g. the current time on "regenerate") changes the
/// subset; the interest hash keeps the ordering basis tied to the topic.
pub fn diversity_seed(entropy: u64, interests: &str) -> u64 {
    entropy ^ (stable_hash(interests) & INTEREST_HASH_MASK)
}

/// Deterministically shuffle a copy of `items` and keep the first `max_stops`.
/// The same seed and input always give the same selection.
pub fn pick<T: Clone>(items: &[T], seed: u64, max_stops: usize) -> Vec<T> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut shuffled = items.to_vec();
    shuffled.shuffle(&mut rng);
    shuffled.truncate(max_stops);
    shuffled
}
