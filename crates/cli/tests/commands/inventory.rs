//! `find` and `remove`

use crate::common::Workspace;
use crate::sk;
use anyhow::Result;

fn inventory() -> Workspace {
    let ws = Workspace::new("leafs = 10", "report");
    ws.add_snapshots(&[
        "2023/12/31/235900",
        "2024/01/01/080000",
        "2024/01/01/200000",
        "2024/02/15/120000",
    ]);
    ws
}

#[test]
fn test_find_prints_matches_newest_first() -> Result<()> {
    let ws = inventory();

    let result = sk!(ws.path(), "find", "^2024/01/").assert_success()?;
    let late = result.stdout.find("2024/01/01/200000").expect("late match");
    let early = result.stdout.find("2024/01/01/080000").expect("early match");
    assert!(late < early);
    assert!(!result.contains_stdout("2023/12/31"));
    assert!(result.contains_stdout("2 snapshots found"));
    Ok(())
}

#[test]
fn test_find_no_matches() -> Result<()> {
    let ws = inventory();

    let result = sk!(ws.path(), "find", "^1999").assert_success()?;
    assert!(result.contains_stdout("0 snapshots found"));
    Ok(())
}

#[test]
fn test_find_rejects_invalid_pattern() -> Result<()> {
    let ws = inventory();

    let result = sk!(ws.path(), "find", "2024/(01").assert_failure()?;
    assert!(result.contains_stderr("invalid pattern"));
    Ok(())
}

#[test]
fn test_remove_bypasses_retention() -> Result<()> {
    let ws = inventory();

    // Retention would keep all ten leaves; forced removal ignores it
    let result = sk!(ws.path(), "remove", "^2024/01/01").assert_success()?;
    assert!(result.contains_stdout("Removed 2 snapshots"));
    assert_eq!(
        ws.snapshots(),
        vec!["2024/02/15/120000".to_string(), "2023/12/31/235900".to_string()]
    );
    assert!(!ws.destination().join("2024/01").exists());
    Ok(())
}

#[test]
fn test_remove_dry_run() -> Result<()> {
    let ws = inventory();

    let result = sk!(ws.path(), "-n", "remove", "^2023").assert_success()?;
    assert!(result.contains_stdout("would remove"));
    assert_eq!(ws.snapshots().len(), 4);
    Ok(())
}
