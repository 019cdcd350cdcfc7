//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use regex::Regex;
use sk_core::{
    load_inventory, DryRunStore, Error, FsStore, Settings, SnapshotIdentity, SnapshotStore,
};
use std::path::Path;

/// Load settings and apply command-line overrides
pub fn load_settings(explicit: Option<&Path>, dry_run: bool) -> Result<Settings> {
    let mut settings = sk_core::config::load(explicit).context("Failed to load settings")?;
    if dry_run {
        settings.dry_run = true;
    }
    Ok(settings)
}

/// Open the configured store, wrapped for preview in dry-run mode
pub fn open_store(settings: &Settings) -> Box<dyn SnapshotStore> {
    let store = FsStore::new(settings.backend);
    if settings.dry_run {
        Box::new(DryRunStore::new(store))
    } else {
        Box::new(store)
    }
}

/// Compile a user-supplied snapshot pattern
pub fn compile_pattern(pattern: &str) -> Result<Regex, Error> {
    Regex::new(pattern)
        .map_err(|e| Error::InvalidArgument(format!("invalid pattern '{}': {}", pattern, e)))
}

/// Snapshots (newest first) whose relative path matches `pattern`
pub fn matching_snapshots(
    store: &dyn SnapshotStore,
    root: &Path,
    pattern: &Regex,
) -> Result<Vec<SnapshotIdentity>> {
    let inventory = load_inventory(store, root).context("Failed to load snapshot inventory")?;
    Ok(inventory
        .into_iter()
        .filter(|identity| pattern.is_match(&identity.relative_path().to_string_lossy()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sk_core::MemoryStore;

    #[test]
    fn test_compile_pattern_rejects_invalid_regex() {
        let err = compile_pattern("2024/(01").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(compile_pattern("^2024/01/").is_ok());
    }

    #[test]
    fn test_matching_snapshots_newest_first() {
        let store = MemoryStore::new();
        store.insert("/s/2023/12/31/235959");
        store.insert("/s/2024/01/01/080000");
        store.insert("/s/2024/01/02/080000");
        store.insert("/s/2024/02/01/080000");

        let pattern = compile_pattern("^2024/01/").unwrap();
        let found = matching_snapshots(&store, Path::new("/s"), &pattern).unwrap();
        let paths: Vec<String> = found.iter().map(|i| i.to_string()).collect();
        assert_eq!(paths, vec!["2024/01/02/080000", "2024/01/01/080000"]);
    }
}
