//! In-memory snapshot store for tests and simulations

use crate::identity::SEGMENTS;
use crate::{Error, Result, SnapshotStore};
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

#[derive(Default)]
struct State {
    snapshots: BTreeSet<PathBuf>,
    dirs: BTreeSet<PathBuf>,
    failing: HashSet<PathBuf>,
}

impl State {
    fn add_ancestors(&mut self, path: &Path) {
        for dir in path.ancestors().skip(1) {
            if dir.as_os_str().is_empty() {
                break;
            }
            self.dirs.insert(dir.to_path_buf());
        }
    }

    fn check(&self, op: &'static str, path: &Path) -> Result<()> {
        if self.failing.contains(path) {
            return Err(Error::collaborator(op, path, "injected failure"));
        }
        Ok(())
    }
}

/// Snapshot store backed by a set of paths
///
/// Directories are tracked implicitly from snapshot ancestors so directory
/// pruning behaves like a real tree.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a snapshot (and its ancestor directories) directly
    pub fn insert(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut state = self.state.lock();
        state.add_ancestors(path);
        state.snapshots.insert(path.to_path_buf());
    }

    /// Make every mutation touching `path` fail
    pub fn fail_on(&self, path: impl AsRef<Path>) {
        self.state.lock().failing.insert(path.as_ref().to_path_buf());
    }

    /// All snapshots currently held, in path order
    pub fn snapshots(&self) -> Vec<PathBuf> {
        self.state.lock().snapshots.iter().cloned().collect()
    }

    pub fn has_dir(&self, dir: &Path) -> bool {
        self.state.lock().dirs.contains(dir)
    }
}

impl SnapshotStore for MemoryStore {
    fn create(&self, root: &Path) -> Result<PathBuf> {
        let mut state = self.state.lock();
        state.check("create", root)?;
        state.add_ancestors(root);
        state.dirs.insert(root.to_path_buf());
        Ok(root.to_path_buf())
    }

    fn list(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let state = self.state.lock();
        Ok(state
            .snapshots
            .iter()
            .rev()
            .filter(|path| {
                path.strip_prefix(root)
                    .map(|rel| rel.components().count() == SEGMENTS)
                    .unwrap_or(false)
            })
            .cloned()
            .collect())
    }

    fn init_snapshot(&self, dest: &Path) -> Result<()> {
        let mut state = self.state.lock();
        state.check("create snapshot", dest)?;
        if state.snapshots.contains(dest) {
            return Err(Error::collaborator("create snapshot", dest, "already exists"));
        }
        state.add_ancestors(dest);
        state.snapshots.insert(dest.to_path_buf());
        Ok(())
    }

    fn snapshot(&self, source: &Path, dest: &Path) -> Result<()> {
        let mut state = self.state.lock();
        state.check("snapshot", source)?;
        state.check("snapshot", dest)?;
        if !state.snapshots.contains(source) {
            return Err(Error::collaborator("snapshot", source, "no such snapshot"));
        }
        if state.snapshots.contains(dest) {
            return Err(Error::collaborator("snapshot", dest, "already exists"));
        }
        state.add_ancestors(dest);
        state.snapshots.insert(dest.to_path_buf());
        Ok(())
    }

    fn delete(&self, path: &Path) -> Result<()> {
        let mut state = self.state.lock();
        state.check("delete", path)?;
        if !state.snapshots.remove(path) {
            return Err(Error::collaborator("delete", path, "no such snapshot"));
        }
        Ok(())
    }

    fn entries(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let state = self.state.lock();
        if !state.dirs.contains(dir) {
            return Err(Error::collaborator("read directory", dir, "no such directory"));
        }
        Ok(state
            .snapshots
            .iter()
            .chain(state.dirs.iter())
            .filter(|entry| entry.parent() == Some(dir))
            .cloned()
            .collect())
    }

    fn prune_dir(&self, dir: &Path) -> Result<bool> {
        let mut state = self.state.lock();
        state.check("prune", dir)?;
        if !state.dirs.contains(dir) {
            return Err(Error::collaborator("prune", dir, "no such directory"));
        }
        let occupied = state
            .snapshots
            .iter()
            .chain(state.dirs.iter())
            .any(|entry| entry.parent() == Some(dir));
        if occupied {
            return Ok(false);
        }
        state.dirs.remove(dir);
        Ok(true)
    }

    fn relocate(&self, source: &Path, dest: &Path) -> Result<()> {
        let mut state = self.state.lock();
        state.check("relocate", source)?;
        state.check("relocate", dest)?;
        if !state.snapshots.remove(source) {
            return Err(Error::collaborator("relocate", source, "no such snapshot"));
        }
        state.add_ancestors(dest);
        state.snapshots.insert(dest.to_path_buf());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        let state = self.state.lock();
        state.snapshots.contains(path) || state.dirs.contains(path)
    }
}
