//! Snapshot store port
//!
//! The store owns copy-on-write snapshot creation and deletion. Everything
//! that mutates storage goes through this trait so a run can be previewed by
//! wrapping the real store in [`DryRunStore`].

use crate::Result;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::info;

/// Storage backend for snapshots
pub trait SnapshotStore {
    /// Create the top-level storage root (idempotent) and return it
    fn create(&self, root: &Path) -> Result<PathBuf>;

    /// List the snapshot leaves under `root`, newest first
    fn list(&self, root: &Path) -> Result<Vec<PathBuf>>;

    /// Create an empty snapshot at `dest`
    fn init_snapshot(&self, dest: &Path) -> Result<()>;

    /// Copy-on-write duplicate `source` into `dest`
    fn snapshot(&self, source: &Path, dest: &Path) -> Result<()>;

    /// Irreversibly remove one snapshot
    fn delete(&self, path: &Path) -> Result<()>;

    /// Direct children of `dir`, snapshots and directories alike
    fn entries(&self, dir: &Path) -> Result<Vec<PathBuf>>;

    /// Remove `dir` if it is empty; `false` when it still has entries
    fn prune_dir(&self, dir: &Path) -> Result<bool>;

    /// Move a snapshot to a new location
    fn relocate(&self, source: &Path, dest: &Path) -> Result<()>;

    fn exists(&self, path: &Path) -> bool;
}

impl<S: SnapshotStore + ?Sized> SnapshotStore for &S {
    fn create(&self, root: &Path) -> Result<PathBuf> {
        (**self).create(root)
    }

    fn list(&self, root: &Path) -> Result<Vec<PathBuf>> {
        (**self).list(root)
    }

    fn init_snapshot(&self, dest: &Path) -> Result<()> {
        (**self).init_snapshot(dest)
    }

    fn snapshot(&self, source: &Path, dest: &Path) -> Result<()> {
        (**self).snapshot(source, dest)
    }

    fn delete(&self, path: &Path) -> Result<()> {
        (**self).delete(path)
    }

    fn entries(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        (**self).entries(dir)
    }

    fn prune_dir(&self, dir: &Path) -> Result<bool> {
        (**self).prune_dir(dir)
    }

    fn relocate(&self, source: &Path, dest: &Path) -> Result<()> {
        (**self).relocate(source, dest)
    }

    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }
}

/// Preview wrapper: reads pass through, mutations are logged and skipped
///
/// Every mutation reports success, so callers follow exactly the control
/// flow of a live run. Paths the preview has deleted, moved away or pruned
/// are remembered, so `prune_dir` answers as the live store would.
pub struct DryRunStore<S> {
    inner: S,
    removed: Mutex<HashSet<PathBuf>>,
}

impl<S: SnapshotStore> DryRunStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            removed: Mutex::new(HashSet::new()),
        }
    }

    fn forget(&self, path: &Path) {
        self.removed.lock().insert(path.to_path_buf());
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: SnapshotStore> SnapshotStore for DryRunStore<S> {
    fn create(&self, root: &Path) -> Result<PathBuf> {
        if !self.inner.exists(root) {
            info!("[dry-run] would create storage root {}", root.display());
        }
        Ok(root.to_path_buf())
    }

    fn list(&self, root: &Path) -> Result<Vec<PathBuf>> {
        if !self.inner.exists(root) {
            return Ok(Vec::new());
        }
        self.inner.list(root)
    }

    fn init_snapshot(&self, dest: &Path) -> Result<()> {
        info!("[dry-run] would create snapshot {}", dest.display());
        Ok(())
    }

    fn snapshot(&self, source: &Path, dest: &Path) -> Result<()> {
        info!(
            "[dry-run] would snapshot {} to {}",
            source.display(),
            dest.display()
        );
        Ok(())
    }

    fn delete(&self, path: &Path) -> Result<()> {
        info!("[dry-run] would delete {}", path.display());
        self.forget(path);
        Ok(())
    }

    fn entries(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let removed = self.removed.lock();
        Ok(self
            .inner
            .entries(dir)?
            .into_iter()
            .filter(|entry| !removed.contains(entry))
            .collect())
    }

    fn prune_dir(&self, dir: &Path) -> Result<bool> {
        if !self.entries(dir)?.is_empty() {
            return Ok(false);
        }
        info!("[dry-run] would remove empty directory {}", dir.display());
        self.forget(dir);
        Ok(true)
    }

    fn relocate(&self, source: &Path, dest: &Path) -> Result<()> {
        self.forget(source);
        info!(
            "[dry-run] would move {} to {}",
            source.display(),
            dest.display()
        );
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }
}
