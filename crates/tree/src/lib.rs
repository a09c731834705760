//! Off-chain replica of the incremental Merkle accumulator.
//!
//! This crate provides:
//! - `MerkleTree`: append-by-slot tree with verified in-place updates and
//!   O(depth) path extraction
//! - `ContractMirror`: independent model of the verifier contract
//! - `TreeSnapshot` and `TreeStore`: persistence of tree state
//! - `TreeRegistry`: named trees with all-or-nothing mutations

pub mod config;
pub mod error;
pub mod mirror;
pub mod proof;
pub mod registry;
pub mod snapshot;
pub mod store;
pub mod tree;

pub use config::{load_config_toml, TreeConfig};
pub use error::TreeError;
pub use mirror::{ContractMirror, VerifierContract};
pub use proof::{compute_root, InsertPath, MerkleProof};
pub use registry::TreeRegistry;
pub use snapshot::{LeafRow, TreeSnapshot};
pub use store::{FileTreeStore, MemoryTreeStore, TreeStore};
pub use tree::{root_from_leaves, MerkleTree, RawPayload, TreeState, MAX_DEPTH, MAX_FOLD_DEPTH};

pub use accumulator_crypto::{FieldHasher, Fr, Mimc7, Poseidon};
