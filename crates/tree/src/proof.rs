//! Merkle witnesses: update paths for inserted leaves and insertion paths
//! for the next free slot.

use accumulator_crypto::{FieldHasher, Fr};

/// Fold `leaf` up to a root using the left/right bits of `leaf_index`.
///
/// `siblings[level]` is the sibling of the node on the path at `level`.
pub fn compute_root<H: FieldHasher>(
    hasher: &H,
    leaf_index: u64,
    leaf: Fr,
    siblings: &[Fr],
) -> Fr {
    let mut current_index = leaf_index;
    let mut current_hash = leaf;
    for sibling in siblings {
        current_hash = if current_index % 2 == 0 {
            hasher.hash_left_right(current_hash, *sibling)
        } else {
            hasher.hash_left_right(*sibling, current_hash)
        };
        current_index /= 2;
    }
    current_hash
}

/// Sibling hashes plus direction bits (`true` = the path node is a right
/// child) for one leaf.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MerkleProof {
    path: Vec<Fr>,
    indices: Vec<bool>,
}

impl MerkleProof {
    pub fn new(path: Vec<Fr>, indices: Vec<bool>) -> Self {
        debug_assert_eq!(path.len(), indices.len());
        Self { path, indices }
    }

    pub fn path(&self) -> &[Fr] {
        &self.path
    }

    pub fn indices(&self) -> &[bool] {
        &self.indices
    }

    /// Direction bits as `0` (left) / `1` (right), the form circuits take.
    pub fn path_index(&self) -> Vec<u8> {
        self.indices.iter().map(|&right| right as u8).collect()
    }

    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Leaf index encoded by the direction bits.
    pub fn leaf_index(&self) -> u64 {
        self.indices
            .iter()
            .enumerate()
            .fold(0u64, |acc, (level, &right)| acc | ((right as u64) << level))
    }

    pub fn compute_root<H: FieldHasher>(&self, hasher: &H, leaf: Fr) -> Fr {
        compute_root(hasher, self.leaf_index(), leaf, &self.path)
    }
}

/// What the next insertion will combine with: the padding table, the
/// filled subtrees, and the direction bits of the next free slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InsertPath {
    zeros: Vec<Fr>,
    filled_subtrees: Vec<Fr>,
    path_index: Vec<bool>,
}

impl InsertPath {
    pub fn new(zeros: Vec<Fr>, filled_subtrees: Vec<Fr>, path_index: Vec<bool>) -> Self {
        Self {
            zeros,
            filled_subtrees,
            path_index,
        }
    }

    pub fn zeros(&self) -> &[Fr] {
        &self.zeros
    }

    pub fn filled_subtrees(&self) -> &[Fr] {
        &self.filled_subtrees
    }

    pub fn path_index(&self) -> &[bool] {
        &self.path_index
    }

    /// Siblings of the next slot: a filled left subtree where the slot is a
    /// right child, padding otherwise.
    pub fn siblings(&self) -> Vec<Fr> {
        self.path_index
            .iter()
            .enumerate()
            .map(|(level, &right)| {
                if right {
                    self.filled_subtrees[level]
                } else {
                    self.zeros[level]
                }
            })
            .collect()
    }

    pub fn as_proof(&self) -> MerkleProof {
        MerkleProof::new(self.siblings(), self.path_index.clone())
    }

    /// Root after placing `leaf` in the next slot.
    pub fn compute_root<H: FieldHasher>(&self, hasher: &H, leaf: Fr) -> Fr {
        self.as_proof().compute_root(hasher, leaf)
    }
}
