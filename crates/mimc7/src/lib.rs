//! MiMC-7 hash function for BN254 in the circomlib construction.
//!
//! This crate provides:
//! - Keccak-derived round constants (`round_constants`)
//! - The keyed permutation `mimc7_hash(x, k)` and the sponge-like
//!   `mimc7_multi_hash(values, key)` over `ark_bn254::Fr`
//! - R1CS gadgets computing the same values in-circuit
//!
//! The native and in-circuit versions share the same constant table, so a
//! hash computed off-chain always matches the witness produced by the gadget.

mod constants;
mod gadget;
mod hash;

pub use constants::{round_constants, ROUNDS, SEED};
pub use gadget::{mimc7_hash_var, mimc7_multi_hash_var};
pub use hash::{mimc7_hash, mimc7_multi_hash};
