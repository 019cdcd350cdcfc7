//! Expansion of configured source globs into concrete paths

use ignore::overrides::OverrideBuilder;
use sk_core::{Error, Result};
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

const GLOB_META: &[char] = &['*', '?', '[', '{'];

/// Expand a source pattern such as `/home/*/docs` into existing paths
///
/// A pattern without glob characters expands to itself when it exists.
/// Matches are returned in sorted order; a pattern matching nothing
/// yields an empty list.
pub fn expand_sources(pattern: &str) -> Result<Vec<PathBuf>> {
    let (base, tail) = split_pattern(Path::new(pattern));

    if tail.is_empty() {
        return Ok(if base.exists() || base.is_symlink() {
            vec![base]
        } else {
            Vec::new()
        });
    }
    if !base.is_dir() {
        return Ok(Vec::new());
    }

    let glob = format!("/{}", tail.join("/"));
    let mut builder = OverrideBuilder::new(&base);
    builder
        .add(&glob)
        .map_err(|e| Error::InvalidConfiguration(format!("invalid source '{}': {}", pattern, e)))?;
    let overrides = builder
        .build()
        .map_err(|e| Error::InvalidConfiguration(format!("invalid source '{}': {}", pattern, e)))?;

    let mut walker = WalkDir::new(&base).min_depth(1).follow_links(false);
    if !tail.iter().any(|segment| segment.contains("**")) {
        walker = walker.min_depth(tail.len()).max_depth(tail.len());
    }

    let mut matches = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Skipping unreadable entry while expanding {}: {}", pattern, e);
                continue;
            }
        };
        if overrides
            .matched(entry.path(), entry.file_type().is_dir())
            .is_whitelist()
        {
            matches.push(entry.into_path());
        }
    }

    matches.sort();
    debug!("Source {} expanded to {} paths", pattern, matches.len());
    Ok(matches)
}

/// Split a pattern into its literal leading directory and the glob segments after it
fn split_pattern(pattern: &Path) -> (PathBuf, Vec<String>) {
    let mut base = PathBuf::new();
    let mut tail = Vec::new();

    for component in pattern.components() {
        let text = component.as_os_str().to_string_lossy();
        let literal = matches!(component, Component::RootDir | Component::Prefix(_))
            || !text.contains(GLOB_META);
        if tail.is_empty() && literal {
            base.push(component);
        } else {
            tail.push(text.into_owned());
        }
    }

    if base.as_os_str().is_empty() {
        base.push(".");
    }
    (base, tail)
}
