//! UpdateLeafCircuit: proves a single-slot state transition of the tree.

use accumulator_tree::{MerkleProof, MerkleTree, Mimc7, TreeError};
use ark_bn254::Fr;
use ark_ff::Zero;
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

use crate::gadgets::{verify_and_update, MerklePathVar};

/// Circuit that proves: "replacing `old_leaf` by `new_leaf` at the path's
/// slot turns `old_root` into `new_root`"
///
/// Public inputs:
/// - old_root: Root before the transition
/// - new_root: Root after the transition
///
/// Private witnesses:
/// - old_leaf, new_leaf: Slot contents before and after
/// - proof: Sibling path and direction bits of the slot
///
/// An insertion is the update of a slot still holding the zero value.
#[derive(Clone)]
pub struct UpdateLeafCircuit {
    /// Private: Current slot content
    pub old_leaf: Option<Fr>,
    /// Private: Replacement slot content
    pub new_leaf: Option<Fr>,
    /// Private: Path of the slot under `old_root`
    pub proof: Option<MerkleProof>,

    /// Public: Root before the transition
    pub old_root: Option<Fr>,
    /// Public: Root after the transition
    pub new_root: Option<Fr>,

    /// Tree depth; fixes the circuit shape
    pub depth: usize,
}

impl UpdateLeafCircuit {
    pub fn new(
        old_leaf: Fr,
        new_leaf: Fr,
        proof: MerkleProof,
        old_root: Fr,
        new_root: Fr,
    ) -> Self {
        Self {
            depth: proof.depth(),
            old_leaf: Some(old_leaf),
            new_leaf: Some(new_leaf),
            proof: Some(proof),
            old_root: Some(old_root),
            new_root: Some(new_root),
        }
    }

    /// Create an empty circuit for setup.
    pub fn empty(depth: usize) -> Self {
        Self {
            old_leaf: None,
            new_leaf: None,
            proof: None,
            old_root: None,
            new_root: None,
            depth,
        }
    }

    /// Witness for replacing leaf `leaf_index` of `tree` with `new_leaf`.
    pub fn for_update(
        tree: &MerkleTree<Mimc7>,
        leaf_index: u64,
        new_leaf: Fr,
    ) -> Result<Self, TreeError> {
        let proof = tree.get_path_update(leaf_index)?;
        let new_root = proof.compute_root(tree.hasher(), new_leaf);
        Ok(Self::new(tree.leaf(leaf_index)?, new_leaf, proof, tree.root(), new_root))
    }

    /// Witness for inserting `leaf` at the next free slot of `tree`.
    pub fn for_insert(tree: &MerkleTree<Mimc7>, leaf: Fr) -> Result<Self, TreeError> {
        let insert_path = tree.get_path_insert()?;
        let new_root = insert_path.compute_root(tree.hasher(), leaf);
        Ok(Self::new(
            tree.zero_value(),
            leaf,
            insert_path.as_proof(),
            tree.root(),
            new_root,
        ))
    }

    /// Public inputs in allocation order.
    pub fn public_inputs(&self) -> Option<Vec<Fr>> {
        Some(vec![self.old_root?, self.new_root?])
    }
}

impl ConstraintSynthesizer<Fr> for UpdateLeafCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        // 1. Allocate private witnesses
        let depth = self.depth;
        let proof = self
            .proof
            .unwrap_or_else(|| MerkleProof::new(vec![Fr::zero(); depth], vec![false; depth]));
        if proof.depth() != depth {
            return Err(SynthesisError::Unsatisfiable);
        }
        let path_var = MerklePathVar::new_witness(cs.clone(), &proof)?;

        let old_leaf_var = FpVar::new_witness(cs.clone(), || {
            self.old_leaf.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let new_leaf_var = FpVar::new_witness(cs.clone(), || {
            self.new_leaf.ok_or(SynthesisError::AssignmentMissing)
        })?;

        // 2. Allocate public inputs
        let old_root_var = FpVar::new_input(cs.clone(), || {
            self.old_root.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let new_root_var = FpVar::new_input(cs.clone(), || {
            self.new_root.ok_or(SynthesisError::AssignmentMissing)
        })?;

        // 3. Verify the old leaf and derive the new root along the same path
        let computed_new_root =
            verify_and_update(&old_root_var, &old_leaf_var, &new_leaf_var, &path_var)?;
        computed_new_root.enforce_equal(&new_root_var)?;

        Ok(())
    }
}
