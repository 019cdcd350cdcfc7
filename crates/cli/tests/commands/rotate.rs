//! `rotate` and `test` against real inventories

use crate::common::Workspace;
use crate::sk;
use anyhow::Result;

const ONE_PER_DAY: &str = "leafs = 1\ndays = 1\nweeks = 0\nmonths = 0\nyears = 0";

fn three_snapshots(action: &str) -> Workspace {
    let ws = Workspace::new(ONE_PER_DAY, action);
    ws.add_snapshots(&["2024/01/03/120000", "2024/01/03/090000", "2024/01/02/120000"]);
    ws
}

#[test]
fn test_rotate_report_lists_every_decision() -> Result<()> {
    let ws = three_snapshots("report");

    let result = sk!(ws.path(), "rotate").assert_success()?;
    assert_eq!(result.count_stdout("keep"), 1);
    assert_eq!(result.count_stdout("rotate"), 2);
    assert!(result.contains_stdout("2 of 3 snapshots marked for rotation"));

    // Report never touches storage
    assert_eq!(ws.snapshots().len(), 3);
    Ok(())
}

#[test]
fn test_rotate_remove_deletes_and_prunes() -> Result<()> {
    let ws = three_snapshots("remove");

    sk!(ws.path(), "rotate").assert_success()?;
    assert_eq!(ws.snapshots(), vec!["2024/01/03/120000".to_string()]);
    assert!(!ws.destination().join("2024/01/02").exists());
    assert!(ws.destination().join("2024/01").exists());
    Ok(())
}

#[test]
fn test_rotate_action_flag_overrides_settings() -> Result<()> {
    let ws = three_snapshots("report");

    sk!(ws.path(), "rotate", "--action", "remove").assert_success()?;
    assert_eq!(ws.snapshots().len(), 1);
    Ok(())
}

#[test]
fn test_rotate_dry_run_keeps_everything() -> Result<()> {
    let ws = three_snapshots("remove");

    let result = sk!(ws.path(), "--dry-run", "rotate").assert_success()?;
    assert!(result.contains_stdout("would remove"));
    assert!(result.contains_stdout("Would remove 2 snapshots"));
    assert_eq!(ws.snapshots().len(), 3);
    Ok(())
}

#[test]
fn test_rotate_relocate_moves_to_archive() -> Result<()> {
    let ws = three_snapshots("relocate");
    let archive = ws.path().join("archive");
    ws.write_config(&format!(
        "destination = \"{}\"\nbackend = \"plain\"\naction = \"relocate\"\narchive_root = \"{}\"\n\n[retention]\n{}\n",
        ws.destination().display(),
        archive.display(),
        ONE_PER_DAY
    ));

    sk!(ws.path(), "rotate").assert_success()?;
    assert_eq!(ws.snapshots().len(), 1);
    assert!(archive.join("2024/01/03/090000/marker").exists());
    assert!(archive.join("2024/01/02/120000/marker").exists());
    Ok(())
}

#[test]
fn test_rotate_empty_inventory() -> Result<()> {
    let ws = Workspace::new(ONE_PER_DAY, "report");

    let result = sk!(ws.path(), "rotate").assert_success()?;
    assert!(result.contains_stdout("0 of 0 snapshots marked for rotation"));
    Ok(())
}

#[test]
fn test_simulation_is_reproducible() -> Result<()> {
    let ws = Workspace::new("leafs = 5\ndays = 7\nweeks = 4\nmonths = 12\nyears = 5", "remove");

    let first = sk!(ws.path(), "test", "50", "--seed", "42").assert_success()?;
    let second = sk!(ws.path(), "test", "50", "--seed", "42").assert_success()?;
    assert!(first.contains_stdout("of 50 snapshots marked for rotation"));
    assert_eq!(first.stdout, second.stdout);
    assert_eq!(first.count_stdout("keep") + first.count_stdout("rotate"), 50);

    // Simulation never touches storage, even with a destructive action configured
    assert!(ws.snapshots().is_empty());
    Ok(())
}
