//! Incremental Merkle tree kept bit-exact with the verifier contract.
//!
//! Leaves are appended slot by slot. Besides the `filled_subtrees` the
//! contract keeps, the replica caches every node it has written per level in
//! `filled_paths`, so the path of any inserted leaf can be rebuilt in
//! O(depth) without rescanning the leaves.

use std::collections::BTreeMap;

use accumulator_crypto::{
    decrypt, ecdh, encrypt, Ciphertext, FieldHasher, Fr, Keypair, Mimc7, PrivateKey, PublicKey,
};
use ark_ff::{BigInteger, PrimeField};
use tracing::{debug, warn};

use crate::error::TreeError;
use crate::proof::{compute_root, InsertPath, MerkleProof};

/// Largest supported depth; leaf indices are `u64`.
pub const MAX_DEPTH: usize = 32;

/// Opaque application data stored next to a leaf.
pub type RawPayload = Vec<u8>;

/// Occupancy of the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreeState {
    Empty,
    Partial,
    Full,
}

/// `zeros[0] = zero_value`, `zeros[i] = H(zeros[i - 1], zeros[i - 1])`.
pub(crate) fn zero_table<H: FieldHasher>(hasher: &H, depth: usize, zero_value: Fr) -> Vec<Fr> {
    let mut zeros = Vec::with_capacity(depth);
    zeros.push(zero_value);
    for level in 1..depth {
        let below = zeros[level - 1];
        zeros.push(hasher.hash_left_right(below, below));
    }
    zeros
}

/// Largest depth `root_from_leaves` folds; the fold holds `2^depth` nodes.
pub const MAX_FOLD_DEPTH: usize = 20;

/// Root of `leaves` padded with `zero_value` to `2^depth` entries, folded
/// level by level. O(2^depth) time and memory, so depths above
/// `MAX_FOLD_DEPTH` are refused; `leaves` beyond the capacity are ignored.
pub fn root_from_leaves<H: FieldHasher>(
    hasher: &H,
    depth: usize,
    zero_value: Fr,
    leaves: &[Fr],
) -> Result<Fr, TreeError> {
    if depth == 0 || depth > MAX_FOLD_DEPTH {
        return Err(TreeError::InvalidDepth(depth));
    }
    let mut level: Vec<Fr> = leaves.to_vec();
    level.resize(1usize << depth, zero_value);
    for _ in 0..depth {
        level = level
            .chunks(2)
            .map(|pair| hasher.hash_left_right(pair[0], pair[1]))
            .collect();
    }
    Ok(level[0])
}

/// Byte encoding of a field sequence: 32 little-endian bytes per element.
pub(crate) fn fields_to_bytes(fields: &[Fr]) -> Vec<u8> {
    fields
        .iter()
        .flat_map(|f| f.into_bigint().to_bytes_le())
        .collect()
}

#[derive(Clone, Debug)]
pub struct MerkleTree<H: FieldHasher = Mimc7> {
    pub(crate) hasher: H,
    pub(crate) depth: usize,
    pub(crate) leaf_number: u64,
    pub(crate) zero_value: Fr,
    pub(crate) zeros: Vec<Fr>,
    pub(crate) filled_subtrees: Vec<Fr>,
    pub(crate) filled_paths: Vec<BTreeMap<u64, Fr>>,
    pub(crate) leaves: Vec<Fr>,
    pub(crate) leaves_raw: Vec<Option<RawPayload>>,
    pub(crate) encrypted_values: Vec<Option<Ciphertext>>,
    pub(crate) ecdh_public_keys: Vec<Option<PublicKey>>,
    pub(crate) root: Fr,
    pub(crate) next_index: u64,
}

impl MerkleTree<Mimc7> {
    /// Create a tree hashed with MiMC-7, the contract's hasher.
    pub fn new(depth: usize, zero_value: Fr) -> Result<Self, TreeError> {
        Self::with_hasher(depth, zero_value, Mimc7)
    }
}

impl<H: FieldHasher> MerkleTree<H> {
    pub fn with_hasher(depth: usize, zero_value: Fr, hasher: H) -> Result<Self, TreeError> {
        if depth == 0 || depth > MAX_DEPTH {
            return Err(TreeError::InvalidDepth(depth));
        }

        let zeros = zero_table(&hasher, depth, zero_value);
        let top = zeros[depth - 1];
        let root = hasher.hash_left_right(top, top);

        Ok(Self {
            hasher,
            depth,
            leaf_number: 1u64 << depth,
            zero_value,
            filled_subtrees: zeros.clone(),
            filled_paths: vec![BTreeMap::new(); depth],
            zeros,
            leaves: Vec::new(),
            leaves_raw: Vec::new(),
            encrypted_values: Vec::new(),
            ecdh_public_keys: Vec::new(),
            root,
            next_index: 0,
        })
    }

    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Capacity, `2^depth`.
    pub fn leaf_number(&self) -> u64 {
        self.leaf_number
    }

    pub fn zero_value(&self) -> Fr {
        self.zero_value
    }

    pub fn zeros(&self) -> &[Fr] {
        &self.zeros
    }

    pub fn filled_subtrees(&self) -> &[Fr] {
        &self.filled_subtrees
    }

    pub fn filled_paths(&self) -> &[BTreeMap<u64, Fr>] {
        &self.filled_paths
    }

    pub fn leaves(&self) -> &[Fr] {
        &self.leaves
    }

    pub fn leaves_raw(&self) -> &[Option<RawPayload>] {
        &self.leaves_raw
    }

    pub fn encrypted_values(&self) -> &[Option<Ciphertext>] {
        &self.encrypted_values
    }

    pub fn ecdh_public_keys(&self) -> &[Option<PublicKey>] {
        &self.ecdh_public_keys
    }

    pub fn root(&self) -> Fr {
        self.root
    }

    pub fn next_index(&self) -> u64 {
        self.next_index
    }

    pub fn leaf(&self, leaf_index: u64) -> Result<Fr, TreeError> {
        self.check_index(leaf_index)?;
        Ok(self.leaves[leaf_index as usize])
    }

    pub fn state(&self) -> TreeState {
        match self.next_index {
            0 => TreeState::Empty,
            n if n == self.leaf_number => TreeState::Full,
            _ => TreeState::Partial,
        }
    }

    fn check_index(&self, leaf_index: u64) -> Result<(), TreeError> {
        if leaf_index >= self.next_index {
            return Err(TreeError::InvalidIndex {
                index: leaf_index,
                next_index: self.next_index,
            });
        }
        Ok(())
    }

    /// Append `leaf` at the next free slot and return its index.
    pub fn insert(&mut self, leaf: Fr, raw: Option<RawPayload>) -> Result<u64, TreeError> {
        self.insert_entry(leaf, raw, None, None)
    }

    fn insert_entry(
        &mut self,
        leaf: Fr,
        raw: Option<RawPayload>,
        encrypted: Option<Ciphertext>,
        ecdh_public_key: Option<PublicKey>,
    ) -> Result<u64, TreeError> {
        if self.next_index >= self.leaf_number {
            return Err(TreeError::CapacityExceeded {
                capacity: self.leaf_number,
            });
        }

        let leaf_index = self.next_index;
        let mut current_index = leaf_index;
        let mut current_hash = leaf;

        for level in 0..self.depth {
            let (left, right) = if current_index % 2 == 0 {
                self.filled_subtrees[level] = current_hash;
                (current_hash, self.zeros[level])
            } else {
                (self.filled_subtrees[level], current_hash)
            };

            let left_index = current_index & !1;
            self.filled_paths[level].insert(left_index, left);
            self.filled_paths[level].insert(left_index + 1, right);

            current_hash = self.hasher.hash_left_right(left, right);
            current_index /= 2;
        }

        self.root = current_hash;
        self.leaves.push(leaf);
        self.leaves_raw.push(raw);
        self.encrypted_values.push(encrypted);
        self.ecdh_public_keys.push(ecdh_public_key);
        self.next_index += 1;

        debug!(leaf_index, root = %self.root, "inserted leaf");
        Ok(leaf_index)
    }

    /// Sibling path of an inserted leaf under the current root.
    pub fn get_path_update(&self, leaf_index: u64) -> Result<MerkleProof, TreeError> {
        self.check_index(leaf_index)?;

        let mut path = Vec::with_capacity(self.depth);
        let mut indices = Vec::with_capacity(self.depth);
        let mut current_index = leaf_index;

        for level in 0..self.depth {
            let sibling = self.filled_paths[level]
                .get(&(current_index ^ 1))
                .copied()
                .unwrap_or(self.zeros[level]);
            path.push(sibling);
            indices.push(current_index % 2 == 1);
            current_index /= 2;
        }

        Ok(MerkleProof::new(path, indices))
    }

    /// Witness for the next insertion, before it happens.
    pub fn get_path_insert(&self) -> Result<InsertPath, TreeError> {
        if self.next_index >= self.leaf_number {
            return Err(TreeError::CapacityExceeded {
                capacity: self.leaf_number,
            });
        }

        let path_index = (0..self.depth)
            .map(|level| (self.next_index >> level) & 1 == 1)
            .collect();

        Ok(InsertPath::new(
            self.zeros.clone(),
            self.filled_subtrees.clone(),
            path_index,
        ))
    }

    /// Replace the leaf at `leaf_index`, using the tree's own current path.
    pub fn update(
        &mut self,
        leaf_index: u64,
        new_leaf: Fr,
        raw: Option<RawPayload>,
    ) -> Result<(), TreeError> {
        let proof = self.get_path_update(leaf_index)?;
        self.update_entry(leaf_index, new_leaf, raw, proof.path(), None, None)
    }

    /// Replace the leaf at `leaf_index` with a caller-supplied path.
    ///
    /// The path must rebuild the current root from the stored leaf, otherwise
    /// `RootMismatch` is returned and nothing changes.
    pub fn update_with_path(
        &mut self,
        leaf_index: u64,
        new_leaf: Fr,
        raw: Option<RawPayload>,
        path: &[Fr],
    ) -> Result<(), TreeError> {
        self.update_entry(leaf_index, new_leaf, raw, path, None, None)
    }

    fn update_entry(
        &mut self,
        leaf_index: u64,
        new_leaf: Fr,
        raw: Option<RawPayload>,
        path: &[Fr],
        encrypted: Option<Ciphertext>,
        ecdh_public_key: Option<PublicKey>,
    ) -> Result<(), TreeError> {
        self.check_index(leaf_index)?;
        if path.len() != self.depth {
            return Err(TreeError::InvalidPathLength {
                expected: self.depth,
                actual: path.len(),
            });
        }

        let slot = leaf_index as usize;
        let computed = compute_root(&self.hasher, leaf_index, self.leaves[slot], path);
        if computed != self.root {
            warn!(leaf_index, root = %self.root, %computed, "rejected update with stale path");
            return Err(TreeError::RootMismatch {
                expected: self.root,
                computed,
            });
        }

        // Node held in `filled_subtrees[level]` is `(last >> level) & !1`.
        let last = self.next_index - 1;
        let mut current_index = leaf_index;
        let mut current_hash = new_leaf;

        for (level, sibling) in path.iter().enumerate() {
            let (left, right) = if current_index % 2 == 0 {
                if current_index == (last >> level) & !1 {
                    self.filled_subtrees[level] = current_hash;
                }
                (current_hash, *sibling)
            } else {
                (*sibling, current_hash)
            };

            let left_index = current_index & !1;
            self.filled_paths[level].insert(left_index, left);
            self.filled_paths[level].insert(left_index + 1, right);

            current_hash = self.hasher.hash_left_right(left, right);
            current_index /= 2;
        }

        self.root = current_hash;
        self.leaves[slot] = new_leaf;
        self.leaves_raw[slot] = raw;
        self.encrypted_values[slot] = encrypted;
        self.ecdh_public_keys[slot] = ecdh_public_key;

        debug!(leaf_index, root = %self.root, "updated leaf");
        Ok(())
    }

    fn seal(
        &self,
        message: &[Fr],
        sender: &Keypair,
        recipient: &PublicKey,
    ) -> (Fr, RawPayload, Ciphertext) {
        let ciphertext = encrypt(message, &sender.private_key, recipient);
        let fields = ciphertext.to_fields();
        (self.hasher.hash_many(&fields), fields_to_bytes(&fields), ciphertext)
    }

    /// Encrypt `message` to `recipient` and append it. The leaf is the hash
    /// of the flattened ciphertext; the sender's public key is recorded so
    /// the recipient can derive the shared key.
    pub fn insert_message(
        &mut self,
        message: &[Fr],
        sender: &Keypair,
        recipient: &PublicKey,
    ) -> Result<u64, TreeError> {
        if self.next_index >= self.leaf_number {
            return Err(TreeError::CapacityExceeded {
                capacity: self.leaf_number,
            });
        }
        let (leaf, raw, ciphertext) = self.seal(message, sender, recipient);
        self.insert_entry(leaf, Some(raw), Some(ciphertext), Some(sender.public_key))
    }

    /// Replace an existing slot with a freshly encrypted message.
    pub fn update_message(
        &mut self,
        leaf_index: u64,
        message: &[Fr],
        sender: &Keypair,
        recipient: &PublicKey,
    ) -> Result<(), TreeError> {
        let proof = self.get_path_update(leaf_index)?;
        let (leaf, raw, ciphertext) = self.seal(message, sender, recipient);
        self.update_entry(
            leaf_index,
            leaf,
            Some(raw),
            proof.path(),
            Some(ciphertext),
            Some(sender.public_key),
        )
    }

    /// Decrypt the message stored at `leaf_index` as its recipient.
    pub fn decrypt_leaf(
        &self,
        leaf_index: u64,
        recipient: &PrivateKey,
    ) -> Result<Vec<Fr>, TreeError> {
        self.check_index(leaf_index)?;
        let slot = leaf_index as usize;
        match (&self.encrypted_values[slot], &self.ecdh_public_keys[slot]) {
            (Some(ciphertext), Some(sender)) => {
                Ok(decrypt(ciphertext, ecdh(recipient, sender))?)
            }
            _ => Err(TreeError::InvalidIndex {
                index: leaf_index,
                next_index: self.next_index,
            }),
        }
    }

    /// Structural equality; the hasher itself is not compared.
    pub fn equals(&self, other: &Self) -> bool {
        self == other
    }
}

impl<H: FieldHasher> PartialEq for MerkleTree<H> {
    fn eq(&self, other: &Self) -> bool {
        self.next_index == other.next_index
            && self.depth == other.depth
            && self.leaf_number == other.leaf_number
            && self.root == other.root
            && self.filled_paths == other.filled_paths
            && self.filled_subtrees == other.filled_subtrees
            && self.leaves == other.leaves
            && self.leaves_raw == other.leaves_raw
            && self.ecdh_public_keys == other.ecdh_public_keys
            && self.encrypted_values == other.encrypted_values
    }
}
