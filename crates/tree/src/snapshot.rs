//! Serializable tree state, as exchanged with persistence.
//!
//! Field elements are canonical decimal strings, raw payloads are hex. Import
//! parses and checks everything before a tree is built, so a malformed
//! snapshot never yields a half-initialised replica.

use std::collections::BTreeMap;

use accumulator_crypto::field::{from_decimal, to_decimal};
use accumulator_crypto::{Ciphertext, FieldHasher, Fr, PublicKey};
use serde::{Deserialize, Serialize};

use crate::error::TreeError;
use crate::tree::{zero_table, MerkleTree, MAX_DEPTH};

/// One persisted slot, keyed by `(tree name, index)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeafRow {
    pub index: u64,
    pub raw_payload: Option<String>,
    pub leaf_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_value: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ecdh_public_key: Option<[String; 2]>,
}

/// Every field needed to rebuild a tree, keyed by `name`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeSnapshot {
    pub name: String,
    pub depth: usize,
    pub next_index: u64,
    pub root: String,
    pub zero_value: String,
    pub zeros: Vec<String>,
    pub filled_subtrees: Vec<String>,
    pub filled_paths: Vec<BTreeMap<u64, String>>,
    pub leaves: Vec<LeafRow>,
}

impl TreeSnapshot {
    pub fn to_json(&self) -> Result<String, TreeError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(input: &str) -> Result<Self, TreeError> {
        Ok(serde_json::from_str(input)?)
    }
}

fn parse(input: &str) -> Result<Fr, TreeError> {
    Ok(from_decimal(input)?)
}

fn parse_all(inputs: &[String]) -> Result<Vec<Fr>, TreeError> {
    inputs.iter().map(|s| parse(s)).collect()
}

fn decimals(values: &[Fr]) -> Vec<String> {
    values.iter().map(to_decimal).collect()
}

fn check_len(what: &str, actual: usize, expected: usize) -> Result<(), TreeError> {
    if actual != expected {
        return Err(TreeError::Snapshot(format!(
            "{what} has {actual} entries, expected {expected}"
        )));
    }
    Ok(())
}

impl<H: FieldHasher> MerkleTree<H> {
    /// Export the full state under `name`.
    pub fn to_snapshot(&self, name: &str) -> TreeSnapshot {
        let leaves = (0..self.leaves.len())
            .map(|slot| LeafRow {
                index: slot as u64,
                raw_payload: self.leaves_raw[slot].as_ref().map(hex::encode),
                leaf_hash: to_decimal(&self.leaves[slot]),
                encrypted_value: self.encrypted_values[slot]
                    .as_ref()
                    .map(|ct| decimals(&ct.to_fields())),
                ecdh_public_key: self.ecdh_public_keys[slot]
                    .map(|pk| [to_decimal(&pk.x()), to_decimal(&pk.y())]),
            })
            .collect();

        TreeSnapshot {
            name: name.to_string(),
            depth: self.depth,
            next_index: self.next_index,
            root: to_decimal(&self.root),
            zero_value: to_decimal(&self.zero_value),
            zeros: decimals(&self.zeros),
            filled_subtrees: decimals(&self.filled_subtrees),
            filled_paths: self
                .filled_paths
                .iter()
                .map(|level| {
                    level
                        .iter()
                        .map(|(index, hash)| (*index, to_decimal(hash)))
                        .collect()
                })
                .collect(),
            leaves,
        }
    }

    /// Rebuild a tree from `snapshot`, hashing with `hasher`.
    ///
    /// Rejects snapshots whose tables have the wrong shape, whose padding
    /// table was produced by a different hasher or zero value, whose rows are
    /// not exactly `0..next_index`, or whose node caches disagree with the
    /// leaves and the root.
    pub fn from_snapshot(snapshot: &TreeSnapshot, hasher: H) -> Result<Self, TreeError> {
        let depth = snapshot.depth;
        if depth == 0 || depth > MAX_DEPTH {
            return Err(TreeError::InvalidDepth(depth));
        }
        let leaf_number = 1u64 << depth;
        if snapshot.next_index > leaf_number {
            return Err(TreeError::Snapshot(format!(
                "next index {} exceeds capacity {leaf_number}",
                snapshot.next_index
            )));
        }

        check_len("zeros", snapshot.zeros.len(), depth)?;
        check_len("filledSubtrees", snapshot.filled_subtrees.len(), depth)?;
        check_len("filledPaths", snapshot.filled_paths.len(), depth)?;
        check_len("leaves", snapshot.leaves.len(), snapshot.next_index as usize)?;

        let zero_value = parse(&snapshot.zero_value)?;
        let zeros = parse_all(&snapshot.zeros)?;
        if zeros != zero_table(&hasher, depth, zero_value) {
            return Err(TreeError::Snapshot(
                "zeros do not match the hasher and zero value".to_string(),
            ));
        }
        let filled_subtrees = parse_all(&snapshot.filled_subtrees)?;
        let root = parse(&snapshot.root)?;

        let mut filled_paths = Vec::with_capacity(depth);
        for (level, nodes) in snapshot.filled_paths.iter().enumerate() {
            let width = leaf_number >> level;
            let mut parsed = BTreeMap::new();
            for (index, hash) in nodes {
                if *index >= width {
                    return Err(TreeError::Snapshot(format!(
                        "node {index} out of range at level {level}"
                    )));
                }
                parsed.insert(*index, parse(hash)?);
            }
            filled_paths.push(parsed);
        }

        let mut leaves = Vec::with_capacity(snapshot.leaves.len());
        let mut leaves_raw = Vec::with_capacity(snapshot.leaves.len());
        let mut encrypted_values = Vec::with_capacity(snapshot.leaves.len());
        let mut ecdh_public_keys = Vec::with_capacity(snapshot.leaves.len());
        for (slot, row) in snapshot.leaves.iter().enumerate() {
            if row.index != slot as u64 {
                return Err(TreeError::Snapshot(format!(
                    "row {slot} carries index {}",
                    row.index
                )));
            }
            leaves.push(parse(&row.leaf_hash)?);
            leaves_raw.push(
                row.raw_payload
                    .as_deref()
                    .map(hex::decode)
                    .transpose()
                    .map_err(|e| TreeError::Snapshot(format!("raw payload {slot}: {e}")))?,
            );
            encrypted_values.push(
                row.encrypted_value
                    .as_deref()
                    .map(|fields| -> Result<Ciphertext, TreeError> {
                        Ok(Ciphertext::from_fields(&parse_all(fields)?)?)
                    })
                    .transpose()?,
            );
            ecdh_public_keys.push(
                row.ecdh_public_key
                    .as_ref()
                    .map(|[x, y]| -> Result<PublicKey, TreeError> {
                        Ok(PublicKey::from_coordinates(parse(x)?, parse(y)?)?)
                    })
                    .transpose()?,
            );
        }

        let tree = Self {
            hasher,
            depth,
            leaf_number,
            zero_value,
            zeros,
            filled_subtrees,
            filled_paths,
            leaves,
            leaves_raw,
            encrypted_values,
            ecdh_public_keys,
            root,
            next_index: snapshot.next_index,
        };

        tree.check_caches()?;
        Ok(tree)
    }
}

impl<H: FieldHasher> MerkleTree<H> {
    /// Cross-check `filled_paths`, `filled_subtrees` and `root` against the
    /// leaves, so an imported replica keeps the root invariant on later
    /// insertions and updates.
    fn check_caches(&self) -> Result<(), TreeError> {
        let corrupt = |what: String| Err(TreeError::Snapshot(what));

        if self.next_index == 0 {
            if self.filled_paths.iter().any(|level| !level.is_empty()) {
                return corrupt("filledPaths of an empty tree are not empty".to_string());
            }
            if self.filled_subtrees != self.zeros {
                return corrupt("filledSubtrees of an empty tree are not the zeros".to_string());
            }
            let top = self.zeros[self.depth - 1];
            if self.hasher.hash_left_right(top, top) != self.root {
                return corrupt("root is not the empty root".to_string());
            }
            return Ok(());
        }

        let last = self.next_index - 1;
        for level in 0..self.depth {
            // Insertion writes both children of every node on a path.
            let highest = (last >> level) | 1;
            let nodes = &self.filled_paths[level];
            if nodes.len() as u64 != highest + 1 || nodes.keys().next_back() != Some(&highest) {
                return corrupt(format!("filledPaths level {level} is not 0..={highest}"));
            }

            let subtree = (last >> level) & !1;
            if nodes.get(&subtree) != Some(&self.filled_subtrees[level]) {
                return corrupt(format!("filledSubtrees[{level}] differs from node {subtree}"));
            }
        }

        for (slot, leaf) in self.leaves.iter().enumerate() {
            if self.filled_paths[0].get(&(slot as u64)) != Some(leaf) {
                return corrupt(format!("leaf {slot} differs from its cached node"));
            }
            let root = self.get_path_update(slot as u64)?.compute_root(&self.hasher, *leaf);
            if root != self.root {
                return corrupt(format!("path of leaf {slot} does not reproduce the root"));
            }
        }

        Ok(())
    }
}
