//! In-circuit hashing and Merkle path gadgets.
//!
//! These mirror `accumulator_crypto::{multi_hash, hash_left_right}` and
//! `accumulator_tree::compute_root` constraint for constraint, so a path
//! taken from the off-chain tree always satisfies them.

use accumulator_tree::MerkleProof;
use ark_bn254::Fr;
use ark_r1cs_std::{boolean::Boolean, fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};
use mimc7::mimc7_multi_hash_var;

/// `multiHash` in-circuit (MiMC-7 multi-hash, zero key).
pub fn multi_hash_var(values: &[FpVar<Fr>]) -> Result<FpVar<Fr>, SynthesisError> {
    mimc7_multi_hash_var(values, &FpVar::zero())
}

/// `hashLeftRight` in-circuit.
pub fn hash_left_right_var(
    left: &FpVar<Fr>,
    right: &FpVar<Fr>,
) -> Result<FpVar<Fr>, SynthesisError> {
    multi_hash_var(&[left.clone(), right.clone()])
}

/// Circuit variable representation of a Merkle path.
#[derive(Clone)]
pub struct MerklePathVar {
    /// Sibling hashes, leaf level first
    path: Vec<FpVar<Fr>>,
    /// `true` where the path node is a right child
    indices: Vec<Boolean<Fr>>,
}

impl MerklePathVar {
    /// Allocate a Merkle path as witness variables.
    pub fn new_witness(
        cs: ConstraintSystemRef<Fr>,
        proof: &MerkleProof,
    ) -> Result<Self, SynthesisError> {
        let path = proof
            .path()
            .iter()
            .map(|h| FpVar::new_witness(cs.clone(), || Ok(*h)))
            .collect::<Result<Vec<_>, _>>()?;

        let indices = proof
            .indices()
            .iter()
            .map(|&b| Boolean::new_witness(cs.clone(), || Ok(b)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { path, indices })
    }

    pub fn path(&self) -> &[FpVar<Fr>] {
        &self.path
    }

    pub fn indices(&self) -> &[Boolean<Fr>] {
        &self.indices
    }

    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Leaf index as a field element, recomposed from the direction bits.
    pub fn leaf_index(&self) -> Result<FpVar<Fr>, SynthesisError> {
        Boolean::le_bits_to_fp_var(&self.indices)
    }
}

/// Fold `leaf` up the path to a root.
pub fn compute_root_from_path(
    leaf: &FpVar<Fr>,
    path: &MerklePathVar,
) -> Result<FpVar<Fr>, SynthesisError> {
    let mut current = leaf.clone();

    for (sibling, is_right) in path.path.iter().zip(path.indices.iter()) {
        let left = is_right.select(sibling, &current)?;
        let right = is_right.select(&current, sibling)?;
        current = hash_left_right_var(&left, &right)?;
    }

    Ok(current)
}

/// Enforce that `leaf` sits at the path's position under `expected_root`.
pub fn verify_membership(
    expected_root: &FpVar<Fr>,
    leaf: &FpVar<Fr>,
    path: &MerklePathVar,
) -> Result<(), SynthesisError> {
    let computed_root = compute_root_from_path(leaf, path)?;
    computed_root.enforce_equal(expected_root)
}

/// Check `old_leaf` against `old_root`, then return the root obtained by
/// swapping in `new_leaf` along the same path.
pub fn verify_and_update(
    old_root: &FpVar<Fr>,
    old_leaf: &FpVar<Fr>,
    new_leaf: &FpVar<Fr>,
    path: &MerklePathVar,
) -> Result<FpVar<Fr>, SynthesisError> {
    verify_membership(old_root, old_leaf, path)?;
    compute_root_from_path(new_leaf, path)
}
