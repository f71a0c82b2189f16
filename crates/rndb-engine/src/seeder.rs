//! Deterministic per-cell seeding.
//!
//! Every (table, attribute, identifier) cell gets its own seed, derived from
//! the session seed with SHA-256. Reseeding the generator from this seed
//! immediately before a derivation makes the derived value independent of
//! which other cells were computed first, in this process or any other.

use rand::rngs::StdRng;
use rand::SeedableRng;
use sha2::{Digest, Sha256};

/// Derive the seed of one cell.
///
/// The digest of `"{seed}-{table}-{attribute}-{id}"` is read as a big-endian
/// integer and reduced modulo 2^64, which keeps its low eight bytes.
pub fn cell_seed(seed: u64, table: &str, attribute: &str, id: u64) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(format!("{seed}-{table}-{attribute}-{id}").as_bytes());
    let digest = hasher.finalize();

    let mut low = [0u8; 8];
    low.copy_from_slice(&digest[digest.len() - 8..]);
    u64::from_be_bytes(low)
}

/// Seeds generators for the cells of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Seeder {
    seed: u64,
}

impl Seeder {
    /// Create a seeder for a session seed.
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// The session seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Seed of one cell.
    pub fn cell_seed(&self, table: &str, attribute: &str, id: u64) -> u64 {
        cell_seed(self.seed, table, attribute, id)
    }

    /// Reseed `rng` for one cell and return the seed used.
    pub fn reseed(&self, rng: &mut StdRng, table: &str, attribute: &str, id: u64) -> u64 {
        let seed = self.cell_seed(table, attribute, id);
        tracing::trace!(table, attribute, id, seed, "Reseeding generator");
        *rng = StdRng::seed_from_u64(seed);
        seed
    }

    /// A fresh generator for one cell.
    pub fn rng_for(&self, table: &str, attribute: &str, id: u64) -> StdRng {
        StdRng::seed_from_u64(self.cell_seed(table, attribute, id))
    }
}
