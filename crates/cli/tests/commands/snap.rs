//! `snap` on the plain backend

use crate::common::Workspace;
use crate::sk;
use anyhow::Result;
use snapkeep_sync::destination_for;
use std::fs;
use std::path::PathBuf;

fn with_source(ws: &Workspace) -> PathBuf {
    let data = ws.path().join("data");
    fs::create_dir_all(data.join("docs")).unwrap();
    fs::write(data.join("docs/notes.txt"), b"hello").unwrap();
    fs::write(data.join("scratch.tmp"), b"junk").unwrap();
    ws.append_config(&format!(
        "\n[[sources]]\npath = \"{}\"\nfilters = [\"- *.tmp\"]\n",
        data.display()
    ));
    data
}

#[test]
fn test_snap_creates_first_snapshot() -> Result<()> {
    let ws = Workspace::new("leafs = 10", "report");
    let data = with_source(&ws);

    let result = sk!(ws.path(), "snap").assert_success()?;
    assert!(result.contains_stdout("1 copied"));

    let snapshots = ws.snapshots();
    assert_eq!(snapshots.len(), 1);
    let snapshot = ws.destination().join(&snapshots[0]);
    let mirrored = destination_for(&snapshot, &data);
    assert_eq!(fs::read(mirrored.join("docs/notes.txt"))?, b"hello");
    assert!(!mirrored.join("scratch.tmp").exists());
    Ok(())
}

#[test]
fn test_snap_builds_on_newest_snapshot() -> Result<()> {
    let ws = Workspace::new("leafs = 10", "report");
    ws.add_snapshots(&["2001/01/01/000000"]);
    let data = with_source(&ws);

    sk!(ws.path(), "snap").assert_success()?;

    let snapshots = ws.snapshots();
    assert_eq!(snapshots.len(), 2);
    assert_eq!(snapshots[1], "2001/01/01/000000");

    // Content of the base snapshot carries over outside the synced source
    let newest = ws.destination().join(&snapshots[0]);
    assert_eq!(fs::read(newest.join("marker"))?, b"2001/01/01/000000");
    assert!(destination_for(&newest, &data).join("docs/notes.txt").exists());
    Ok(())
}

#[test]
fn test_snap_dry_run_creates_nothing() -> Result<()> {
    let ws = Workspace::new("leafs = 10", "report");
    with_source(&ws);

    sk!(ws.path(), "--dry-run", "snap").assert_success()?;
    assert!(ws.snapshots().is_empty());
    Ok(())
}
