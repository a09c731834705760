//! Persistence back-ends for tree snapshots.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::{debug, info};

use crate::error::TreeError;
use crate::snapshot::TreeSnapshot;

/// Keyed snapshot storage with upsert semantics: the scalar fields are keyed
/// by tree name, leaf rows by `(name, index)`.
pub trait TreeStore: Send + Sync {
    fn save(&self, snapshot: &TreeSnapshot) -> Result<(), TreeError>;

    fn load(&self, name: &str) -> Result<Option<TreeSnapshot>, TreeError>;
}

#[derive(Debug, Default)]
pub struct MemoryTreeStore {
    trees: RwLock<HashMap<String, TreeSnapshot>>,
}

impl MemoryTreeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> TreeError {
    TreeError::Store("memory store lock poisoned".to_string())
}

impl TreeStore for MemoryTreeStore {
    fn save(&self, snapshot: &TreeSnapshot) -> Result<(), TreeError> {
        let mut trees = self.trees.write().map_err(poisoned)?;
        let merged = match trees.remove(&snapshot.name) {
            Some(existing) => {
                let mut rows: BTreeMap<u64, _> = existing
                    .leaves
                    .into_iter()
                    .map(|row| (row.index, row))
                    .collect();
                for row in &snapshot.leaves {
                    rows.insert(row.index, row.clone());
                }
                TreeSnapshot {
                    leaves: rows.into_values().collect(),
                    ..snapshot.clone()
                }
            }
            None => snapshot.clone(),
        };
        debug!(name = %snapshot.name, rows = merged.leaves.len(), "stored snapshot");
        trees.insert(snapshot.name.clone(), merged);
        Ok(())
    }

    fn load(&self, name: &str) -> Result<Option<TreeSnapshot>, TreeError> {
        let trees = self.trees.read().map_err(poisoned)?;
        Ok(trees.get(name).cloned())
    }
}

/// One pretty-printed JSON document per tree under a directory.
#[derive(Debug, Clone)]
pub struct FileTreeStore {
    dir: PathBuf,
}

impl FileTreeStore {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, TreeError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        info!(dir = %dir.display(), "opened file tree store");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, TreeError> {
        if name.is_empty() || name.starts_with('.') || name.contains(['/', '\\']) {
            return Err(TreeError::Store(format!("invalid tree name {name:?}")));
        }
        Ok(self.dir.join(format!("{name}.json")))
    }
}

impl TreeStore for FileTreeStore {
    /// Write to a temporary sibling, then rename over the previous document
    /// so readers never observe a partial write.
    fn save(&self, snapshot: &TreeSnapshot) -> Result<(), TreeError> {
        let path = self.path_for(&snapshot.name)?;
        let tmp = self.dir.join(format!(".{}.json.tmp", snapshot.name));
        fs::write(&tmp, snapshot.to_json()?)?;
        fs::rename(&tmp, &path)?;
        debug!(path = %path.display(), "stored snapshot");
        Ok(())
    }

    fn load(&self, name: &str) -> Result<Option<TreeSnapshot>, TreeError> {
        let path = self.path_for(name)?;
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path)?;
        Ok(Some(TreeSnapshot::from_json(&text)?))
    }
}
