//! Source synchronization for Snapkeep
//!
//! This crate fills a freshly created snapshot with the configured sources:
//! - Source glob expansion
//! - Ordered include/exclude filters
//! - Mirroring with change detection and deletion of stale entries

pub mod filters;
pub mod mirror;
pub mod sources;

pub use filters::FilterRules;
pub use mirror::MirrorSynchronizer;
pub use sources::expand_sources;

use sk_core::{Error, FilterRule, Result, SourceSpec};
use std::path::{Component, Path, PathBuf};
use tracing::warn;

/// Counters for one synchronization run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncStats {
    pub copied: usize,
    pub unchanged: usize,
    pub deleted: usize,
    /// Special files (fifos, sockets, devices) left out of the mirror
    pub skipped: usize,
}

impl SyncStats {
    pub fn merge(&mut self, other: SyncStats) {
        self.copied += other.copied;
        self.unchanged += other.unchanged;
        self.deleted += other.deleted;
        self.skipped += other.skipped;
    }
}

/// Makes a destination mirror a source
pub trait Synchronizer {
    fn sync(&self, source: &Path, dest: &Path, filters: &[FilterRule]) -> Result<SyncStats>;
}

/// Where `source` lands inside `snapshot`
///
/// The source keeps its full path below the snapshot, so `/home/alice`
/// becomes `<snapshot>/home/alice`.
pub fn destination_for(snapshot: &Path, source: &Path) -> PathBuf {
    let mut dest = snapshot.to_path_buf();
    for component in source.components() {
        if let Component::Normal(part) = component {
            dest.push(part);
        }
    }
    dest
}

/// Outcome of synchronizing every configured source
#[derive(Debug, Default)]
pub struct SyncReport {
    pub stats: SyncStats,
    pub synced: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, Error)>,
}

impl SyncReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Synchronize every source into `snapshot`
///
/// A failing source is recorded and the remaining sources still run. A
/// pattern that cannot be expanded is recorded under its literal text.
/// `on_source` is called before each expanded path is synchronized.
pub fn sync_sources(
    synchronizer: &dyn Synchronizer,
    sources: &[SourceSpec],
    snapshot: &Path,
    mut on_source: impl FnMut(&Path),
) -> Result<SyncReport> {
    let mut report = SyncReport::default();

    for spec in sources {
        let paths = match expand_sources(&spec.path) {
            Ok(paths) => paths,
            Err(e) => {
                warn!("Failed to expand source {}: {}", spec.path, e);
                report.failed.push((PathBuf::from(&spec.path), e));
                continue;
            }
        };
        if paths.is_empty() {
            warn!("Source {} matched nothing", spec.path);
        }

        for path in paths {
            on_source(&path);
            let dest = destination_for(snapshot, &path);
            match synchronizer.sync(&path, &dest, &spec.filters) {
                Ok(stats) => {
                    report.stats.merge(stats);
                    report.synced.push(path);
                }
                Err(e) => {
                    warn!("Failed to sync {}: {}", path.display(), e);
                    report.failed.push((path, e));
                }
            }
        }
    }

    Ok(report)
}
