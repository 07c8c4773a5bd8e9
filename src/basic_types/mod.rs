mod hash_structures;
mod keyed_vec;
mod propagation_status;
mod random;
mod sparse_bitset;
mod trail;

pub use hash_structures::HashMap;
pub use hash_structures::HashSet;
pub use keyed_vec::KeyedVec;
pub use keyed_vec::StorageKey;
pub use propagation_status::Inconsistency;
pub use propagation_status::PropagationStatusCP;
pub use propagation_status::Reason;
pub use random::Random;
pub use sparse_bitset::SparseBitset;
pub(crate) use trail::Trail;

#[cfg(test)]
pub(crate) use random::tests::TestRandom;
