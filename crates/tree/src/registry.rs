//! Named trees backed by a snapshot store.
//!
//! Mutations run against a clone of the tree. The clone is persisted first
//! and swapped in afterwards, so an operation error or a failed store write
//! leaves both the in-memory tree and the store as they were.
//!
//! The price is O(n) work per mutation: the clone copies every cached node
//! and the store receives a full snapshot. Batch many insertions into one
//! `mutate` call rather than one call per leaf.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use accumulator_crypto::{FieldHasher, Mimc7};
use tracing::{info, warn};

use crate::config::TreeConfig;
use crate::error::TreeError;
use crate::store::TreeStore;
use crate::tree::MerkleTree;

type Handle<H> = Arc<Mutex<MerkleTree<H>>>;

pub struct TreeRegistry<S: TreeStore, H: FieldHasher = Mimc7> {
    store: S,
    hasher: H,
    trees: RwLock<HashMap<String, Handle<H>>>,
}

fn lock_error<T>(_: T) -> TreeError {
    TreeError::Store("registry lock poisoned".to_string())
}

impl<S: TreeStore, H: FieldHasher> TreeRegistry<S, H> {
    pub fn new(store: S, hasher: H) -> Self {
        Self {
            store,
            hasher,
            trees: RwLock::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn names(&self) -> Result<Vec<String>, TreeError> {
        let trees = self.trees.read().map_err(lock_error)?;
        let mut names: Vec<String> = trees.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    /// Create and persist an empty tree. Fails if `config.name` is already
    /// known to the registry or the store.
    pub fn create(&self, config: &TreeConfig) -> Result<(), TreeError> {
        let mut trees = self.trees.write().map_err(lock_error)?;
        if trees.contains_key(&config.name) || self.store.load(&config.name)?.is_some() {
            return Err(TreeError::Store(format!(
                "tree {} already exists",
                config.name
            )));
        }

        let tree = config.build(self.hasher.clone())?;
        self.store.save(&tree.to_snapshot(&config.name))?;
        info!(name = %config.name, depth = config.depth, "created tree");
        trees.insert(config.name.clone(), Arc::new(Mutex::new(tree)));
        Ok(())
    }

    /// Make a persisted tree available, loading it from the store if needed.
    pub fn open(&self, name: &str) -> Result<(), TreeError> {
        self.handle(name).map(|_| ())
    }

    fn handle(&self, name: &str) -> Result<Handle<H>, TreeError> {
        if let Some(handle) = self.trees.read().map_err(lock_error)?.get(name) {
            return Ok(handle.clone());
        }

        let mut trees = self.trees.write().map_err(lock_error)?;
        if let Some(handle) = trees.get(name) {
            return Ok(handle.clone());
        }
        let snapshot = self
            .store
            .load(name)?
            .ok_or_else(|| TreeError::UnknownTree(name.to_string()))?;
        let tree = MerkleTree::from_snapshot(&snapshot, self.hasher.clone())?;
        info!(name, next_index = tree.next_index(), "loaded tree from store");

        let handle = Arc::new(Mutex::new(tree));
        trees.insert(name.to_string(), handle.clone());
        Ok(handle)
    }

    /// Apply `f` to tree `name` and persist the result.
    ///
    /// Costs a clone and a full snapshot of the tree on top of `f`, however
    /// little `f` changes.
    pub fn mutate<T, F>(&self, name: &str, f: F) -> Result<T, TreeError>
    where
        F: FnOnce(&mut MerkleTree<H>) -> Result<T, TreeError>,
    {
        let handle = self.handle(name)?;
        let mut current = handle.lock().map_err(lock_error)?;

        let mut next = current.clone();
        let output = f(&mut next).map_err(|e| {
            warn!(name, error = %e, "tree operation rejected");
            e
        })?;
        self.store.save(&next.to_snapshot(name))?;

        info!(name, next_index = next.next_index(), root = %next.root(), "committed tree");
        *current = next;
        Ok(output)
    }

    /// Run a read-only closure against tree `name`.
    pub fn read<T, F>(&self, name: &str, f: F) -> Result<T, TreeError>
    where
        F: FnOnce(&MerkleTree<H>) -> T,
    {
        let handle = self.handle(name)?;
        let tree = handle.lock().map_err(lock_error)?;
        Ok(f(&tree))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::TreeSnapshot;
    use crate::store::MemoryTreeStore;
    use accumulator_crypto::Fr;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryTreeStore,
        failing: AtomicBool,
        saves: AtomicUsize,
    }

    impl TreeStore for FlakyStore {
        fn save(&self, snapshot: &TreeSnapshot) -> Result<(), TreeError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(TreeError::Store("disk full".to_string()));
            }
            self.saves.fetch_add(1, Ordering::SeqCst);
            self.inner.save(snapshot)
        }

        fn load(&self, name: &str) -> Result<Option<TreeSnapshot>, TreeError> {
            self.inner.load(name)
        }
    }

    fn registry() -> TreeRegistry<MemoryTreeStore> {
        let registry = TreeRegistry::new(MemoryTreeStore::new(), Mimc7);
        registry.create(&TreeConfig::default()).unwrap();
        registry
    }

    #[test]
    fn test_create_and_mutate() {
        let registry = registry();
        let index = registry
            .mutate("cmd", |tree| tree.insert(Fr::from(5u64), None))
            .unwrap();
        assert_eq!(index, 0);

        let root = registry.read("cmd", |tree| tree.root()).unwrap();
        let stored = registry.store().load("cmd").unwrap().unwrap();
        assert_eq!(stored.next_index, 1);
        assert_eq!(stored.root, accumulator_crypto::field::to_decimal(&root));
        assert_eq!(registry.names().unwrap(), vec!["cmd".to_string()]);
    }

    #[test]
    fn test_duplicate_and_unknown_names() {
        let registry = registry();
        assert!(matches!(
            registry.create(&TreeConfig::default()),
            Err(TreeError::Store(_))
        ));
        assert!(matches!(
            registry.open("missing"),
            Err(TreeError::UnknownTree(_))
        ));
        assert!(registry.read("missing", |_| ()).is_err());
    }

    #[test]
    fn test_failed_operation_rolls_back() {
        let registry = registry();
        registry
            .mutate("cmd", |tree| tree.insert(Fr::from(1u64), None))
            .unwrap();
        let before = registry.read("cmd", |tree| tree.clone()).unwrap();

        let result = registry.mutate("cmd", |tree| {
            tree.insert(Fr::from(2u64), None)?;
            tree.update(7, Fr::from(3u64), None)
        });
        assert!(matches!(result, Err(TreeError::InvalidIndex { .. })));
        assert!(registry.read("cmd", |tree| tree.equals(&before)).unwrap());
        assert_eq!(registry.store().load("cmd").unwrap().unwrap().next_index, 1);
    }

    #[test]
    fn test_failed_store_write_rolls_back() {
        let registry = TreeRegistry::new(FlakyStore::default(), Mimc7);
        registry.create(&TreeConfig::default()).unwrap();
        registry.store().failing.store(true, Ordering::SeqCst);

        let result = registry.mutate("cmd", |tree| tree.insert(Fr::from(9u64), None));
        assert!(matches!(result, Err(TreeError::Store(_))));
        assert_eq!(registry.read("cmd", |tree| tree.next_index()).unwrap(), 0);
    }

    #[test]
    fn test_batched_insertions_persist_once() {
        let registry = TreeRegistry::new(FlakyStore::default(), Mimc7);
        registry.create(&TreeConfig::default()).unwrap();
        assert_eq!(registry.store().saves.load(Ordering::SeqCst), 1);

        let indices = registry
            .mutate("cmd", |tree| {
                (1..=10u64)
                    .map(|v| tree.insert(Fr::from(v), None))
                    .collect::<Result<Vec<_>, _>>()
            })
            .unwrap();
        assert_eq!(indices, (0..10).collect::<Vec<u64>>());
        assert_eq!(registry.store().saves.load(Ordering::SeqCst), 2);
        assert_eq!(registry.store().load("cmd").unwrap().unwrap().leaves.len(), 10);
    }

    #[test]
    fn test_reopen_from_store() {
        let first = registry();
        first
            .mutate("cmd", |tree| tree.insert(Fr::from(11u64), Some(b"a".to_vec())))
            .unwrap();
        let snapshot = first.store().load("cmd").unwrap().unwrap();

        let store = MemoryTreeStore::new();
        store.save(&snapshot).unwrap();
        let second = TreeRegistry::new(store, Mimc7);
        second.open("cmd").unwrap();

        let before = first.read("cmd", |tree| tree.clone()).unwrap();
        assert!(second.read("cmd", |tree| tree.equals(&before)).unwrap());
    }
}
