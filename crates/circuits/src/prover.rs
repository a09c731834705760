//! Groth16 setup, proving and verification for `UpdateLeafCircuit`.

use ark_bn254::{Bn254, Fr};
use ark_groth16::{Groth16, Proof, ProvingKey, VerifyingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::SNARK;
use rand::{CryptoRng, RngCore};
use thiserror::Error;

use crate::update::UpdateLeafCircuit;

/// Errors during setup, proving or verification
#[derive(Error, Debug)]
pub enum ProverError {
    #[error("Setup failed: {0}")]
    Setup(String),
    #[error("Proof generation failed: {0}")]
    Proving(String),
    #[error("Verification failed: {0}")]
    Verification(String),
    #[error("Circuit has no public inputs assigned")]
    MissingInputs,
    #[error("Serialization failed: {0}")]
    Serialization(String),
}

/// Key pair for one tree depth.
#[derive(Clone)]
pub struct UpdateKeys {
    pub proving_key: ProvingKey<Bn254>,
    pub verifying_key: VerifyingKey<Bn254>,
    pub depth: usize,
}

/// A proof with the public inputs it was produced for.
#[derive(Clone, Debug)]
pub struct UpdateProof {
    pub proof: Proof<Bn254>,
    pub public_inputs: Vec<Fr>,
}

/// Circuit-specific setup for trees of `depth`.
pub fn setup_update<R: RngCore + CryptoRng>(
    rng: &mut R,
    depth: usize,
) -> Result<UpdateKeys, ProverError> {
    let (proving_key, verifying_key) =
        Groth16::<Bn254>::circuit_specific_setup(UpdateLeafCircuit::empty(depth), rng)
            .map_err(|e| ProverError::Setup(e.to_string()))?;
    Ok(UpdateKeys {
        proving_key,
        verifying_key,
        depth,
    })
}

pub fn prove_update<R: RngCore + CryptoRng>(
    pk: &ProvingKey<Bn254>,
    circuit: UpdateLeafCircuit,
    rng: &mut R,
) -> Result<UpdateProof, ProverError> {
    let public_inputs = circuit.public_inputs().ok_or(ProverError::MissingInputs)?;
    let proof = Groth16::<Bn254>::prove(pk, circuit, rng)
        .map_err(|e| ProverError::Proving(e.to_string()))?;
    Ok(UpdateProof {
        proof,
        public_inputs,
    })
}

/// Verify an update proof against the roots before and after.
pub fn verify_update(
    vk: &VerifyingKey<Bn254>,
    proof: &Proof<Bn254>,
    old_root: Fr,
    new_root: Fr,
) -> Result<bool, ProverError> {
    let public_inputs = vec![old_root, new_root];

    Groth16::<Bn254>::verify(vk, &public_inputs, proof)
        .map_err(|e| ProverError::Verification(e.to_string()))
}

/// Compressed verifying key, hex encoded, for shipping to a verifier.
pub fn export_verifying_key(vk: &VerifyingKey<Bn254>) -> Result<String, ProverError> {
    let mut bytes = Vec::new();
    vk.serialize_compressed(&mut bytes)
        .map_err(|e| ProverError::Serialization(e.to_string()))?;
    Ok(hex::encode(bytes))
}

pub fn import_verifying_key(encoded: &str) -> Result<VerifyingKey<Bn254>, ProverError> {
    let bytes = hex::decode(encoded).map_err(|e| ProverError::Serialization(e.to_string()))?;
    VerifyingKey::deserialize_compressed(bytes.as_slice())
        .map_err(|e| ProverError::Serialization(e.to_string()))
}
