//! Round constants for MiMC-7.

use std::sync::OnceLock;

use ark_bn254::Fr;
use ark_ff::{PrimeField, Zero};
use sha3::{Digest, Keccak256};

/// Number of rounds of the permutation.
pub const ROUNDS: usize = 91;

/// Seed of the Keccak-256 chain the constants are drawn from.
pub const SEED: &[u8] = b"mimc";

/// The round constant table, computed once per process.
///
/// `c[0] = 0`; for `i >= 1`, `c[i]` is the `(i + 1)`-th Keccak-256 iterate of
/// the seed, read big-endian and reduced modulo the field order. The chain
/// itself runs over the unreduced digests.
pub fn round_constants() -> &'static [Fr] {
    static CONSTANTS: OnceLock<Vec<Fr>> = OnceLock::new();
    CONSTANTS.get_or_init(generate_round_constants)
}

fn generate_round_constants() -> Vec<Fr> {
    let mut constants = Vec::with_capacity(ROUNDS);
    constants.push(Fr::zero());

    let mut digest = Keccak256::digest(SEED);
    for _ in 1..ROUNDS {
        digest = Keccak256::digest(digest.as_slice());
        constants.push(Fr::from_be_bytes_mod_order(digest.as_slice()));
    }

    constants
}
