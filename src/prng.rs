//! Seed descriptors for regenerating uniform polynomials.

use crate::params::ParmsId;
use rand::{CryptoRng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

pub const PRNG_SEED_BYTES: usize = 32;
/// Wire size of a [`PrngDescriptor`]: four `parms_id` words, then the seed.
pub const PRNG_DESCRIPTOR_BYTES: usize = 4 * 8 + PRNG_SEED_BYTES;

/// Everything needed to replay the uniform sampler that produced a
/// polynomial: the parameter level it was drawn for, and a ChaCha20 seed.
///
/// The ChaCha20 key stream is fixed by RFC 8439, so a descriptor regenerates
/// the same words on every platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrngDescriptor {
    parms_id: ParmsId,
    seed: [u8; PRNG_SEED_BYTES],
}

impl PrngDescriptor {
    pub fn new(parms_id: ParmsId, seed: [u8; PRNG_SEED_BYTES]) -> Self {
        Self { parms_id, seed }
    }

    /// Draws a fresh seed from `rng`.
    pub fn from_rng<R: RngCore + CryptoRng + ?Sized>(parms_id: ParmsId, rng: &mut R) -> Self {
        let mut seed = [0u8; PRNG_SEED_BYTES];
        rng.fill_bytes(&mut seed);
        Self { parms_id, seed }
    }

    pub fn parms_id(&self) -> ParmsId {
        self.parms_id
    }

    pub fn seed(&self) -> &[u8; PRNG_SEED_BYTES] {
        &self.seed
    }

    pub fn make_prng(&self) -> ChaCha20Rng {
        ChaCha20Rng::from_seed(self.seed)
    }

    pub fn to_bytes(&self) -> [u8; PRNG_DESCRIPTOR_BYTES] {
        let mut out = [0u8; PRNG_DESCRIPTOR_BYTES];
        for (chunk, word) in out.chunks_exact_mut(8).zip(self.parms_id.words()) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        out[4 * 8..].copy_from_slice(&self.seed);
        out
    }

    pub fn from_bytes(bytes: &[u8; PRNG_DESCRIPTOR_BYTES]) -> Self {
        let mut words = [0u64; 4];
        for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(8)) {
            let mut le = [0u8; 8];
            le.copy_from_slice(chunk);
            *word = u64::from_le_bytes(le);
        }
        let mut seed = [0u8; PRNG_SEED_BYTES];
        seed.copy_from_slice(&bytes[4 * 8..]);
        Self {
            parms_id: ParmsId::from_words(words),
            seed,
        }
    }
}
