use std::fmt::Debug;
use std::ops::Range;

use rand::Rng;
use rand::SeedableRng;

/// A trait for generating random values; used by the branching layer to implement randomized
/// search (e.g. drawing uniformly among tied candidates).
///
/// # Testing
/// A scripted implementation which replays a provided list of values is available in tests so
/// that randomized behaviour can be pinned down deterministically.
pub trait Random: Debug {
    /// Generates a bool with probability `probability` of being true.
    fn generate_bool(&mut self, probability: f64) -> bool;

    /// Generates a random usize sampled uniformly from `[range.start, range.end)`.
    fn generate_usize_in_range(&mut self, range: Range<usize>) -> usize;
}

// Blanket implementation so that any "regular" seedable random generator can be used where an
// implementation of Random is expected.
impl<T> Random for T
where
    T: SeedableRng + Rng + Debug,
{
    fn generate_bool(&mut self, probability: f64) -> bool {
        self.gen_bool(probability)
    }

    fn generate_usize_in_range(&mut self, range: Range<usize>) -> usize {
        self.gen_range(range)
    }
}
