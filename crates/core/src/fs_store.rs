//! On-disk snapshot store
//!
//! Manages the destination tree:
//! ```text
//! <destination>/
//!   2024/
//!     01/
//!       03/
//!         120000/    (one snapshot: btrfs subvolume or plain directory)
//!         180000/
//! ```

use crate::identity::{SnapshotIdentity, SEGMENTS};
use crate::{Backend, Error, Result, SnapshotStore};
use filetime::{set_file_mtime, FileTime};
use std::cmp::Reverse;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Snapshot store on a local filesystem
pub struct FsStore {
    backend: Backend,
}

impl FsStore {
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }
}

impl SnapshotStore for FsStore {
    fn create(&self, root: &Path) -> Result<PathBuf> {
        fs::create_dir_all(root).map_err(|e| Error::collaborator("create root", root, e))?;
        Ok(root.to_path_buf())
    }

    fn list(&self, root: &Path) -> Result<Vec<PathBuf>> {
        if !root.exists() {
            return Ok(Vec::new());
        }

        let mut leaves = Vec::new();
        for entry in WalkDir::new(root)
            .min_depth(SEGMENTS)
            .max_depth(SEGMENTS)
            .follow_links(false)
        {
            let entry = entry.map_err(|e| Error::collaborator("list", root, e))?;
            if entry.file_type().is_dir() {
                leaves.push(entry.into_path());
            }
        }

        // Chronological, not lexicographic: `2024/9/...` is older than `2024/10/...`.
        // Leaves that do not parse go last for the tokenizer to reject.
        leaves.sort_by_cached_key(|path| {
            let identity = path
                .strip_prefix(root)
                .ok()
                .and_then(|rel| SnapshotIdentity::parse(rel).ok());
            Reverse((identity, path.clone()))
        });
        Ok(leaves)
    }

    fn init_snapshot(&self, dest: &Path) -> Result<()> {
        ensure_parent(dest)?;
        match self.backend {
            Backend::Btrfs => btrfs(
                "create snapshot",
                dest,
                &[OsStr::new("subvolume"), OsStr::new("create"), dest.as_os_str()],
            ),
            Backend::Plain => {
                fs::create_dir(dest).map_err(|e| Error::collaborator("create snapshot", dest, e))
            }
        }
    }

    fn snapshot(&self, source: &Path, dest: &Path) -> Result<()> {
        if dest.exists() {
            return Err(Error::collaborator("snapshot", dest, "already exists"));
        }
        ensure_parent(dest)?;
        match self.backend {
            Backend::Btrfs => btrfs(
                "snapshot",
                dest,
                &[
                    OsStr::new("subvolume"),
                    OsStr::new("snapshot"),
                    source.as_os_str(),
                    dest.as_os_str(),
                ],
            ),
            Backend::Plain => copy_tree(source, dest),
        }
    }

    fn delete(&self, path: &Path) -> Result<()> {
        match self.backend {
            Backend::Btrfs => btrfs(
                "delete",
                path,
                &[OsStr::new("subvolume"), OsStr::new("delete"), path.as_os_str()],
            ),
            Backend::Plain => {
                fs::remove_dir_all(path).map_err(|e| Error::collaborator("delete", path, e))
            }
        }
    }

    fn entries(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut children = Vec::new();
        for entry in fs::read_dir(dir).map_err(|e| Error::collaborator("read directory", dir, e))? {
            let entry = entry.map_err(|e| Error::collaborator("read directory", dir, e))?;
            children.push(entry.path());
        }
        Ok(children)
    }

    fn prune_dir(&self, dir: &Path) -> Result<bool> {
        let mut entries = fs::read_dir(dir).map_err(|e| Error::collaborator("prune", dir, e))?;
        if entries.next().is_some() {
            return Ok(false);
        }
        fs::remove_dir(dir).map_err(|e| Error::collaborator("prune", dir, e))?;
        debug!("Removed empty directory {}", dir.display());
        Ok(true)
    }

    fn relocate(&self, source: &Path, dest: &Path) -> Result<()> {
        if dest.exists() {
            return Err(Error::collaborator("relocate", dest, "already exists"));
        }
        ensure_parent(dest)?;
        fs::rename(source, dest).map_err(|e| Error::collaborator("relocate", source, e))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::collaborator("create directory", parent, e))?;
    }
    Ok(())
}

/// Run one `btrfs` invocation, mapping a non-zero exit to a collaborator failure
fn btrfs(op: &'static str, path: &Path, args: &[&OsStr]) -> Result<()> {
    debug!("btrfs {:?}", args);
    let output = Command::new("btrfs")
        .args(args)
        .output()
        .map_err(|e| Error::collaborator(op, path, format!("failed to run btrfs: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::collaborator(op, path, stderr.trim()));
    }
    Ok(())
}

/// Recursively copy `source` into a new directory `dest`
fn copy_tree(source: &Path, dest: &Path) -> Result<()> {
    for entry in WalkDir::new(source).follow_links(false) {
        let entry = entry.map_err(|e| Error::collaborator("snapshot", source, e))?;
        let rel = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| Error::collaborator("snapshot", entry.path(), e))?;
        let target = dest.join(rel);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target).map_err(|e| Error::collaborator("snapshot", &target, e))?;
        } else if file_type.is_file() || file_type.is_symlink() {
            copy_entry(entry.path(), &target)?;
        } else {
            warn!("Skipping special file {}", entry.path().display());
        }
    }
    Ok(())
}

/// Copy one file or symlink, keeping the source modification time
///
/// Symlinks are recreated (unix only); regular files are copied byte for byte.
/// Anything else (fifos, sockets, devices) is refused without being opened.
pub fn copy_entry(source: &Path, dest: &Path) -> Result<()> {
    let meta = fs::symlink_metadata(source).map_err(|e| Error::collaborator("copy", source, e))?;

    if meta.file_type().is_symlink() {
        #[cfg(unix)]
        {
            let link = fs::read_link(source).map_err(|e| Error::collaborator("copy", source, e))?;
            if fs::symlink_metadata(dest).is_ok() {
                fs::remove_file(dest).map_err(|e| Error::collaborator("copy", dest, e))?;
            }
            std::os::unix::fs::symlink(&link, dest)
                .map_err(|e| Error::collaborator("copy", dest, e))?;
        }
        return Ok(());
    }

    if !meta.is_file() {
        return Err(Error::collaborator("copy", source, "not a regular file"));
    }

    fs::copy(source, dest).map_err(|e| Error::collaborator("copy", source, e))?;
    set_file_mtime(dest, FileTime::from_last_modification_time(&meta))
        .map_err(|e| Error::collaborator("copy", dest, e))
}
