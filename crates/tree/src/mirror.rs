//! In-memory stand-in for the on-chain verifier contract.
//!
//! The contract stores only what it must: the padding table, the filled
//! subtrees, the leaves and the root. It never caches paths, so update
//! callers supply one, and it is checked against the stored leaf and root.

use accumulator_crypto::{FieldHasher, Fr, Mimc7};
use tracing::debug;

use crate::error::TreeError;
use crate::tree::MAX_DEPTH;

/// The contract surface the replica has to agree with.
pub trait VerifierContract {
    fn insert(&mut self, leaf: Fr) -> Result<u64, TreeError>;

    fn update(&mut self, leaf_index: u64, new_leaf: Fr, path: &[Fr]) -> Result<(), TreeError>;

    fn get_leaf_at(&self, leaf_index: u64) -> Result<Fr, TreeError>;

    fn get_root(&self) -> Fr;
}

#[derive(Clone, Debug)]
pub struct ContractMirror<H: FieldHasher = Mimc7> {
    hasher: H,
    depth: usize,
    zeros: Vec<Fr>,
    filled_subtrees: Vec<Fr>,
    leaves: Vec<Fr>,
    root: Fr,
}

impl<H: FieldHasher> ContractMirror<H> {
    /// Deploy a fresh contract instance.
    pub fn deploy(depth: usize, zero_value: Fr, hasher: H) -> Result<Self, TreeError> {
        if depth == 0 || depth > MAX_DEPTH {
            return Err(TreeError::InvalidDepth(depth));
        }

        let mut zeros = vec![zero_value; depth];
        let mut current = zero_value;
        for zero in zeros.iter_mut().skip(1) {
            current = hasher.hash_left_right(current, current);
            *zero = current;
        }
        let root = hasher.hash_left_right(current, current);

        Ok(Self {
            hasher,
            depth,
            filled_subtrees: zeros.clone(),
            zeros,
            leaves: Vec::new(),
            root,
        })
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn leaf_count(&self) -> u64 {
        self.leaves.len() as u64
    }

    fn fold(&self, mut index: u64, leaf: Fr, path: &[Fr]) -> Fr {
        let mut node = leaf;
        for sibling in path {
            node = if index & 1 == 0 {
                self.hasher.hash_left_right(node, *sibling)
            } else {
                self.hasher.hash_left_right(*sibling, node)
            };
            index >>= 1;
        }
        node
    }
}

impl<H: FieldHasher> VerifierContract for ContractMirror<H> {
    fn insert(&mut self, leaf: Fr) -> Result<u64, TreeError> {
        let capacity = 1u64 << self.depth;
        let leaf_index = self.leaves.len() as u64;
        if leaf_index >= capacity {
            return Err(TreeError::CapacityExceeded { capacity });
        }

        let mut index = leaf_index;
        let mut node = leaf;
        for level in 0..self.depth {
            node = if index & 1 == 0 {
                self.filled_subtrees[level] = node;
                self.hasher.hash_left_right(node, self.zeros[level])
            } else {
                self.hasher
                    .hash_left_right(self.filled_subtrees[level], node)
            };
            index >>= 1;
        }

        self.leaves.push(leaf);
        self.root = node;
        debug!(leaf_index, "contract insert");
        Ok(leaf_index)
    }

    fn update(&mut self, leaf_index: u64, new_leaf: Fr, path: &[Fr]) -> Result<(), TreeError> {
        let old_leaf = self.get_leaf_at(leaf_index)?;
        if path.len() != self.depth {
            return Err(TreeError::InvalidPathLength {
                expected: self.depth,
                actual: path.len(),
            });
        }

        let computed = self.fold(leaf_index, old_leaf, path);
        if computed != self.root {
            return Err(TreeError::RootMismatch {
                expected: self.root,
                computed,
            });
        }

        // Keep the left siblings used by future inserts in step with the edit.
        let last = self.leaf_count() - 1;
        let mut index = leaf_index;
        let mut node = new_leaf;
        for (level, sibling) in path.iter().enumerate() {
            if index & 1 == 0 && index == (last >> level) & !1 {
                self.filled_subtrees[level] = node;
            }
            node = if index & 1 == 0 {
                self.hasher.hash_left_right(node, *sibling)
            } else {
                self.hasher.hash_left_right(*sibling, node)
            };
            index >>= 1;
        }

        self.leaves[leaf_index as usize] = new_leaf;
        self.root = node;
        debug!(leaf_index, "contract update");
        Ok(())
    }

    fn get_leaf_at(&self, leaf_index: u64) -> Result<Fr, TreeError> {
        self.leaves
            .get(leaf_index as usize)
            .copied()
            .ok_or(TreeError::InvalidIndex {
                index: leaf_index,
                next_index: self.leaf_count(),
            })
    }

    fn get_root(&self) -> Fr {
        self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::root_from_leaves;
    use ark_ff::Zero;

    #[test]
    fn test_deploy_root_matches_empty_fold() {
        let contract = ContractMirror::deploy(4, Fr::zero(), Mimc7).unwrap();
        assert_eq!(
            contract.get_root(),
            root_from_leaves(&Mimc7, 4, Fr::zero(), &[]).unwrap()
        );
        assert!(ContractMirror::deploy(0, Fr::zero(), Mimc7).is_err());
    }

    #[test]
    fn test_insert_until_full() {
        let mut contract = ContractMirror::deploy(2, Fr::zero(), Mimc7).unwrap();
        let leaves: Vec<Fr> = (1..=4u64).map(Fr::from).collect();
        for (i, leaf) in leaves.iter().enumerate() {
            assert_eq!(contract.insert(*leaf).unwrap(), i as u64);
            assert_eq!(
                contract.get_root(),
                root_from_leaves(&Mimc7, 2, Fr::zero(), &leaves[..=i]).unwrap()
            );
        }
        assert!(matches!(
            contract.insert(Fr::from(5u64)),
            Err(TreeError::CapacityExceeded { capacity: 4 })
        ));
    }

    #[test]
    fn test_update_requires_valid_path() {
        let mut contract = ContractMirror::deploy(2, Fr::zero(), Mimc7).unwrap();
        contract.insert(Fr::from(1u64)).unwrap();
        contract.insert(Fr::from(2u64)).unwrap();

        let zeros = contract.zeros.clone();
        let good = vec![Fr::from(2u64), zeros[1]];
        let bad = vec![Fr::from(3u64), zeros[1]];

        let root = contract.get_root();
        assert!(matches!(
            contract.update(0, Fr::from(9u64), &bad),
            Err(TreeError::RootMismatch { .. })
        ));
        assert_eq!(contract.get_root(), root);

        contract.update(0, Fr::from(9u64), &good).unwrap();
        assert_eq!(contract.get_leaf_at(0).unwrap(), Fr::from(9u64));
        assert_eq!(
            contract.get_root(),
            root_from_leaves(&Mimc7, 2, Fr::zero(), &[Fr::from(9u64), Fr::from(2u64)]).unwrap()
        );
        assert!(contract.get_leaf_at(2).is_err());
    }
}
