//! Deterministic RNG for reference signals.
//!
//! PCG32 seeded from a 32-bit value, with BLAKE3 used to derive independent
//! streams for differently named signals from one user seed.

use rand::SeedableRng;
use rand_pcg::Pcg32;

/// Creates a PCG32 RNG from a 32-bit seed.
///
/// The seed is duplicated into both halves of the 64-bit state seed.
pub fn create_rng(seed: u32) -> Pcg32 {
    let seed64 = (seed as u64) | ((seed as u64) << 32);
    Pcg32::seed_from_u64(seed64)
}

/// Derives a seed for a named signal from a base seed.
///
/// # Arguments
/// * `base_seed` - User-supplied seed
/// * `key` - Name of the signal (e.g. "noise_burst")
pub fn derive_seed(base_seed: u32, key: &str) -> u32 {
    let mut input = Vec::with_capacity(4 + key.len());
    input.extend_from_slice(&base_seed.to_le_bytes());
    input.extend_from_slice(key.as_bytes());

    let hash = blake3::hash(&input);
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&hash.as_bytes()[..4]);
    u32::from_le_bytes(bytes)
}

/// Creates the RNG for a named signal.
pub fn create_keyed_rng(base_seed: u32, key: &str) -> Pcg32 {
    create_rng(derive_seed(base_seed, key))
}
