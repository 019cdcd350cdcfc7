//! Throwaway snapshot inventories for integration tests

use sk_core::{Backend, FsStore, SnapshotStore};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temp directory holding `snapkeep.toml`, a destination and source data
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Workspace with the given retention table and action
    pub fn new(retention: &str, action: &str) -> Self {
        let workspace = Self {
            dir: TempDir::new().expect("create temp dir"),
        };
        fs::create_dir_all(workspace.destination()).expect("create destination");
        workspace.write_config(&format!(
            "destination = \"{}\"\nbackend = \"plain\"\naction = \"{}\"\n\n[retention]\n{}\n",
            workspace.destination().display(),
            action,
            retention
        ));
        workspace
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn destination(&self) -> PathBuf {
        self.dir.path().join("snapshots")
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("snapkeep.toml")
    }

    pub fn write_config(&self, body: &str) {
        fs::write(self.config_path(), body).expect("write config");
    }

    pub fn append_config(&self, body: &str) {
        let mut current = fs::read_to_string(self.config_path()).expect("read config");
        current.push_str(body);
        self.write_config(&current);
    }

    /// Create snapshot directories (relative `YYYY/MM/DD/serial` paths)
    pub fn add_snapshots(&self, relative: &[&str]) {
        for rel in relative {
            let path = self.destination().join(rel);
            fs::create_dir_all(&path).expect("create snapshot");
            fs::write(path.join("marker"), rel.as_bytes()).expect("write marker");
        }
    }

    /// Relative paths of the snapshots on disk, newest first
    pub fn snapshots(&self) -> Vec<String> {
        let root = self.destination();
        FsStore::new(Backend::Plain)
            .list(&root)
            .expect("list snapshots")
            .into_iter()
            .map(|path| {
                path.strip_prefix(&root)
                    .expect("under root")
                    .to_string_lossy()
                    .into_owned()
            })
            .collect()
    }
}
