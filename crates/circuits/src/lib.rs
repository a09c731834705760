//! ZK circuits for the Merkle accumulator.
//!
//! This crate provides:
//! - Hash and Merkle path gadgets that agree bit-for-bit with the off-chain
//!   tree (`gadgets`)
//! - BabyJubJub key derivation, ECDH and EdDSA verification (`babyjubjub`)
//! - In-circuit decryption of leaf payloads (`decrypt`)
//! - `UpdateLeafCircuit`: prove a leaf update or insertion between two roots
//! - Groth16 setup, proving and verification helpers (`prover`)

pub mod babyjubjub;
pub mod decrypt;
pub mod gadgets;
pub mod prover;
pub mod update;


pub use babyjubjub::{
    derive_public_key_var, ecdh_var, public_key_witness, scalar_bits_witness,
    verify_signature_var, SignatureVar, SCALAR_BITS,
};
pub use decrypt::{decrypt_var, CiphertextVar};
pub use gadgets::{
    compute_root_from_path, hash_left_right_var, multi_hash_var, verify_and_update,
    verify_membership, MerklePathVar,
};
pub use mimc7::{mimc7_hash_var, mimc7_multi_hash_var};
pub use prover::{
    export_verifying_key, import_verifying_key, prove_update, setup_update, verify_update,
    ProverError, UpdateKeys, UpdateProof,
};
pub use update::UpdateLeafCircuit;

use ark_bn254::Fr;

/// Common type aliases
pub type ConstraintF = Fr;
