//! Errors raised by the tree, its snapshots and its stores.

use accumulator_crypto::{CryptoError, Fr};
use thiserror::Error;

use crate::tree::MAX_DEPTH;

/// Every variant leaves the tree it was raised from unmodified.
#[derive(Error, Debug)]
pub enum TreeError {
    #[error("Invalid depth {0}: must be between 1 and {max}", max = MAX_DEPTH)]
    InvalidDepth(usize),
    #[error("Invalid leaf index {index}: {next_index} leaves inserted")]
    InvalidIndex { index: u64, next_index: u64 },
    #[error("Tree is full: capacity {capacity}")]
    CapacityExceeded { capacity: u64 },
    #[error("Root mismatch: tree root {expected}, path reconstructs {computed}")]
    RootMismatch { expected: Fr, computed: Fr },
    #[error("Invalid path length: expected {expected}, got {actual}")]
    InvalidPathLength { expected: usize, actual: usize },
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    #[error("Invalid snapshot: {0}")]
    Snapshot(String),
    #[error("Unknown tree: {0}")]
    UnknownTree(String),
    #[error("Store error: {0}")]
    Store(String),
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
