//! Primitive layer for the off-chain accumulator replica.
//!
//! Everything here is a pure function of its inputs:
//! - `field`: decimal conversion and reduction into the BN254 scalar field
//! - `hasher`: the pluggable `FieldHasher` trait (MiMC-7, Poseidon)
//! - `keys`: BabyJubJub key pairs and ECDH
//! - `encryption`: keystream encryption of leaf payloads
//! - `eddsa`: signatures over BabyJubJub

pub mod eddsa;
pub mod encryption;
pub mod error;
pub mod field;
pub mod hasher;
pub mod keys;

pub use eddsa::{sign, verify, verify_checked, Signature};
pub use encryption::{decrypt, encrypt, encrypt_with_key, Ciphertext};
pub use error::CryptoError;
pub use hasher::{hash_left_right, multi_hash, FieldHasher, Mimc7, Poseidon};
pub use keys::{ecdh, private_to_public_key, random_private_key, Keypair, PrivateKey, PublicKey};

/// Scalar field of BN254; every tree node and hash output lives here.
pub use ark_bn254::Fr;
