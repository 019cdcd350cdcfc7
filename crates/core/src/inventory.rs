//! Inventory tokenization: store listings into ordered snapshot identities

use crate::{Error, Result, SnapshotIdentity, SnapshotStore};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Parse absolute snapshot paths under `root` into identities
///
/// Order is preserved. Every path must be `root/YYYY/MM/DD/serial`.
pub fn tokenize<P: AsRef<Path>>(root: &Path, paths: &[P]) -> Result<Vec<SnapshotIdentity>> {
    paths
        .iter()
        .map(|path| {
            let path = path.as_ref();
            let relative = path
                .strip_prefix(root)
                .map_err(|_| Error::malformed(path, format!("not under {}", root.display())))?;
            SnapshotIdentity::parse(relative).map_err(|err| match err {
                // Report the full listed path, not the relative tail
                Error::MalformedSnapshotPath { reason, .. } => Error::malformed(path, reason),
                other => other,
            })
        })
        .collect()
}

/// Sort identities newest-first, the order the retention engine requires
pub fn newest_first(mut records: Vec<SnapshotIdentity>) -> Vec<SnapshotIdentity> {
    records.sort_by(|a, b| b.cmp(a));
    records
}

/// List, tokenize and order the inventory under `root`
pub fn load_inventory<S: SnapshotStore + ?Sized>(
    store: &S,
    root: &Path,
) -> Result<Vec<SnapshotIdentity>> {
    let paths: Vec<PathBuf> = store.list(root)?;
    debug!("Listed {} snapshots under {}", paths.len(), root.display());
    Ok(newest_first(tokenize(root, &paths)?))
}
