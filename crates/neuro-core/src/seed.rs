//! Deterministic seed derivation for reproducible episodes.
//!
//! [`SeedHierarchy`] derives every random source from one run seed:
//!
//! ```text
//! Run seed
//! ├── Subsystem seed (goal sampling, policy, ...)
//! └── Episode seed (per episode number)
//!     └── Subsystem seed
//! ```
//!
//! Child seeds are derived via hashing, so the whole run is reproducible
//! from the root seed alone.

use std::hash::{DefaultHasher, Hash, Hasher};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Derive a child seed from a parent seed and a string key.
///
/// Uses `DefaultHasher` (SipHash-1-3) for fast, deterministic mixing.
///
/// # Example
///
/// ```
/// use neuro_core::seed::derive_seed;
///
/// let child = derive_seed(42, "goal");
/// assert_ne!(child, 42);
/// assert_eq!(child, derive_seed(42, "goal"));
/// ```
#[must_use]
pub fn derive_seed(parent: u64, key: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    parent.hash(&mut hasher);
    key.hash(&mut hasher);
    hasher.finish()
}

/// Derive a child seed from a parent seed and a numeric index.
#[must_use]
pub fn derive_seed_indexed(parent: u64, index: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    parent.hash(&mut hasher);
    index.hash(&mut hasher);
    hasher.finish()
}

/// Draw a fresh seed from OS entropy.
#[must_use]
pub fn entropy_seed() -> u64 {
    rand::random()
}

/// Hierarchical seed manager.
///
/// # Example
///
/// ```
/// use neuro_core::seed::SeedHierarchy;
///
/// let seeds = SeedHierarchy::new(42);
/// let goal_rng = seeds.subsystem_rng("goal");
/// let ep_seed = seeds.episode_seed(5);
/// # let _ = (goal_rng, ep_seed);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedHierarchy {
    root: u64,
}

impl SeedHierarchy {
    #[must_use]
    pub const fn new(root: u64) -> Self {
        Self { root }
    }

    /// Use `seed` if given, otherwise draw the root from entropy.
    #[must_use]
    pub fn from_optional(seed: Option<u64>) -> Self {
        Self::new(seed.unwrap_or_else(entropy_seed))
    }

    /// The root (run-level) seed.
    #[must_use]
    pub const fn root(&self) -> u64 {
        self.root
    }

    /// Seed for a named subsystem at run level.
    #[must_use]
    pub fn subsystem_seed(&self, subsystem: &str) -> u64 {
        derive_seed(self.root, subsystem)
    }

    /// Seed for a specific episode number.
    #[must_use]
    pub fn episode_seed(&self, episode_number: u64) -> u64 {
        derive_seed_indexed(self.root, episode_number)
    }

    /// Seed for a named subsystem within an episode.
    #[must_use]
    pub fn episode_subsystem_seed(&self, episode_number: u64, subsystem: &str) -> u64 {
        derive_seed(self.episode_seed(episode_number), subsystem)
    }

    /// `ChaCha8Rng` seeded directly from the root.
    #[must_use]
    pub fn root_rng(&self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.root)
    }

    /// `ChaCha8Rng` for a named run-level subsystem.
    #[must_use]
    pub fn subsystem_rng(&self, subsystem: &str) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.subsystem_seed(subsystem))
    }
}

impl Default for SeedHierarchy {
    fn default() -> Self {
        Self::new(0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
