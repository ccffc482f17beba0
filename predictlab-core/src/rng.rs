//! Deterministic seed tree.
//!
//! A master seed is expanded into sub-seeds for each `(scope, index)` pair,
//! e.g. `("tree", 17)` inside a forest or `("random_forest/fold", 3)` during
//! cross-validation. Sub-seeds are derived via BLAKE3 hashing, independently of
//! thread scheduling order, so results are identical regardless of whether
//! work runs sequentially or on a rayon pool.

use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedTree {
    master_seed: u64,
}

impl SeedTree {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Derive a deterministic sub-seed for `(scope, index)`.
    ///
    /// The scope length is hashed first so that ("ab", ..) and ("a", ..)
    /// can never collide through concatenation.
    pub fn sub_seed(&self, scope: &str, index: u64) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master_seed.to_le_bytes());
        hasher.update(&(scope.len() as u64).to_le_bytes());
        hasher.update(scope.as_bytes());
        hasher.update(&index.to_le_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(bytes)
    }

    /// A child tree rooted at the sub-seed for `(scope, index)`.
    pub fn child(&self, scope: &str, index: u64) -> Self {
        Self::new(self.sub_seed(scope, index))
    }

    /// Create a seeded StdRng for `(scope, index)`.
    pub fn rng_for(&self, scope: &str, index: u64) -> StdRng {
        StdRng::seed_from_u64(self.sub_seed(scope, index))
    }
}
