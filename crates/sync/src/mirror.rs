//! Mirroring a source tree into a snapshot
//!
//! Files are compared by type, size and modification time; anything that
//! differs is copied again. Destination entries with no counterpart in the
//! filtered source are deleted, so the destination ends up an exact mirror.

use crate::filters::FilterRules;
use crate::{SyncStats, Synchronizer};
use sk_core::fs_store::copy_entry;
use sk_core::{Error, FilterRule, Result};
use std::collections::HashSet;
use std::fs::{self, FileType, Metadata};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Local filesystem synchronizer
#[derive(Debug, Default, Clone, Copy)]
pub struct MirrorSynchronizer {
    dry_run: bool,
}

impl MirrorSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log every change instead of touching the destination
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    fn copy(&self, source: &Path, dest: &Path, stats: &mut SyncStats) -> Result<()> {
        if !needs_copy(source, dest) {
            stats.unchanged += 1;
            return Ok(());
        }

        if self.dry_run {
            info!("[dry-run] would copy {} -> {}", source.display(), dest.display());
        } else {
            if let Ok(existing) = fs::symlink_metadata(dest) {
                // Never write through a stale link or over a directory
                if existing.is_dir() {
                    fs::remove_dir_all(dest).map_err(|e| Error::collaborator("sync", dest, e))?;
                } else if existing.file_type().is_symlink() {
                    fs::remove_file(dest).map_err(|e| Error::collaborator("sync", dest, e))?;
                }
            }
            copy_entry(source, dest)?;
            debug!("Copied {}", dest.display());
        }
        stats.copied += 1;
        Ok(())
    }

    fn make_dir(&self, dest: &Path) -> Result<()> {
        match fs::symlink_metadata(dest) {
            Ok(meta) if meta.is_dir() => return Ok(()),
            Ok(_) if !self.dry_run => {
                fs::remove_file(dest).map_err(|e| Error::collaborator("sync", dest, e))?;
            }
            _ => {}
        }
        if self.dry_run {
            debug!("[dry-run] would create {}", dest.display());
            return Ok(());
        }
        fs::create_dir_all(dest).map_err(|e| Error::collaborator("sync", dest, e))
    }

    /// Delete everything under `dest` whose relative path is not in `keep`
    fn delete_extraneous(
        &self,
        dest: &Path,
        keep: &HashSet<PathBuf>,
        stats: &mut SyncStats,
    ) -> Result<()> {
        if !dest.is_dir() {
            return Ok(());
        }

        // Children come before their parent, so directories are empty when removed
        for entry in WalkDir::new(dest).min_depth(1).contents_first(true) {
            let entry = entry.map_err(|e| Error::collaborator("sync", dest, e))?;
            let rel = entry
                .path()
                .strip_prefix(dest)
                .map_err(|e| Error::collaborator("sync", entry.path(), e))?;
            if keep.contains(rel) {
                continue;
            }

            stats.deleted += 1;
            if self.dry_run {
                info!("[dry-run] would delete {}", entry.path().display());
                continue;
            }
            let result = if entry.file_type().is_dir() {
                fs::remove_dir(entry.path())
            } else {
                fs::remove_file(entry.path())
            };
            result.map_err(|e| Error::collaborator("sync", entry.path(), e))?;
            debug!("Deleted {}", entry.path().display());
        }
        Ok(())
    }
}

impl Synchronizer for MirrorSynchronizer {
    fn sync(&self, source: &Path, dest: &Path, filters: &[FilterRule]) -> Result<SyncStats> {
        let meta = fs::symlink_metadata(source).map_err(|e| Error::collaborator("sync", source, e))?;
        let mut stats = SyncStats::default();

        if !meta.is_dir() {
            if !is_copyable(meta.file_type()) {
                skip_special(source, &mut stats);
                return Ok(stats);
            }
            if let Some(parent) = dest.parent() {
                self.make_dir(parent)?;
            }
            self.copy(source, dest, &mut stats)?;
            return Ok(stats);
        }

        let rules = FilterRules::new(source, filters)?;
        self.make_dir(dest)?;

        let mut seen = HashSet::new();
        let walker = WalkDir::new(source)
            .min_depth(1)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| {
                let rel = entry.path().strip_prefix(source).unwrap_or(entry.path());
                !rules.is_excluded(rel, entry.file_type().is_dir())
            });

        for entry in walker {
            let entry = entry.map_err(|e| Error::collaborator("sync", source, e))?;
            let rel = entry
                .path()
                .strip_prefix(source)
                .map_err(|e| Error::collaborator("sync", entry.path(), e))?
                .to_path_buf();
            let target = dest.join(&rel);

            let file_type = entry.file_type();
            if file_type.is_dir() {
                self.make_dir(&target)?;
            } else if is_copyable(file_type) {
                self.copy(entry.path(), &target, &mut stats)?;
            } else {
                // Left out of `seen`, so a stale copy in the destination goes away
                skip_special(entry.path(), &mut stats);
                continue;
            }
            seen.insert(rel);
        }

        self.delete_extraneous(dest, &seen, &mut stats)?;
        info!(
            "Synced {} -> {}: {} copied, {} unchanged, {} deleted, {} skipped",
            source.display(),
            dest.display(),
            stats.copied,
            stats.unchanged,
            stats.deleted,
            stats.skipped
        );
        Ok(stats)
    }
}

/// Regular files and symlinks; fifos, sockets and devices are not mirrored
fn is_copyable(file_type: FileType) -> bool {
    file_type.is_file() || file_type.is_symlink()
}

fn skip_special(path: &Path, stats: &mut SyncStats) {
    warn!("Skipping special file {}", path.display());
    stats.skipped += 1;
}

/// Whether `dest` differs from `source` in type, size, mtime or link target
fn needs_copy(source: &Path, dest: &Path) -> bool {
    let (Ok(src), Ok(dst)) = (fs::symlink_metadata(source), fs::symlink_metadata(dest)) else {
        return true;
    };

    if src.file_type().is_symlink() || dst.file_type().is_symlink() {
        return !(src.file_type().is_symlink()
            && dst.file_type().is_symlink()
            && fs::read_link(source).ok() == fs::read_link(dest).ok());
    }
    if src.is_file() != dst.is_file() {
        return true;
    }
    src.len() != dst.len() || !same_mtime(&src, &dst)
}

fn same_mtime(a: &Metadata, b: &Metadata) -> bool {
    match (a.modified(), b.modified()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
