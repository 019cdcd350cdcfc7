//! Fatal errors exit non-zero with a message on stderr

use crate::common::Workspace;
use crate::sk;
use anyhow::Result;
use tempfile::TempDir;

#[test]
fn test_missing_config_fails() -> Result<()> {
    let empty = TempDir::new()?;

    let result = sk!(empty.path(), "rotate").assert_failure()?;
    assert!(result.contains_stderr("no configuration found"));
    Ok(())
}

#[test]
fn test_explicit_missing_config_fails() -> Result<()> {
    let ws = Workspace::new("leafs = 1", "report");

    let result = sk!(ws.path(), "--config", "does-not-exist.toml", "rotate").assert_failure()?;
    assert!(result.contains_stderr("does-not-exist.toml"));
    Ok(())
}

#[test]
fn test_invalid_weekstart_fails() -> Result<()> {
    let ws = Workspace::new("weekstart = 9", "report");

    let result = sk!(ws.path(), "rotate").assert_failure()?;
    assert!(result.contains_stderr("weekstart"));
    Ok(())
}

#[test]
fn test_unknown_action_fails() -> Result<()> {
    let ws = Workspace::new("leafs = 1", "report");

    let result = sk!(ws.path(), "rotate", "--action", "shred").assert_failure()?;
    assert!(result.contains_stderr("unknown action 'shred'"));
    Ok(())
}

#[test]
fn test_non_numeric_test_count_fails() -> Result<()> {
    let ws = Workspace::new("leafs = 1", "report");

    let result = sk!(ws.path(), "test", "abc").assert_failure()?;
    assert!(result.contains_stderr("non-negative integer"));
    Ok(())
}

#[test]
fn test_unknown_flag_fails() -> Result<()> {
    let ws = Workspace::new("leafs = 1", "report");

    sk!(ws.path(), "rotate", "--frobnicate").assert_failure()?;
    Ok(())
}

#[test]
fn test_config_prints_effective_settings() -> Result<()> {
    let ws = Workspace::new("leafs = 4", "report");

    let result = sk!(ws.path(), "config").assert_success()?;
    assert!(result.contains_stdout("leafs = 4"));
    assert!(result.contains_stdout("backend = \"plain\""));

    // Environment overrides layer over the file
    let result = sk!(ws.path(), "config")
        .env("SNAPKEEP_RETENTION__LEAFS", "6")
        .assert_success()?;
    assert!(result.contains_stdout("leafs = 6"));
    Ok(())
}

#[test]
fn test_config_env_takes_priority_over_working_dir() -> Result<()> {
    let ws = Workspace::new("leafs = 4", "report");
    let other = Workspace::new("leafs = 9", "report");
    let other_config = other.config_path();

    let result = sk!(ws.path(), "config")
        .env("SNAPKEEP_CONFIG", &other_config.display().to_string())
        .assert_success()?;
    assert!(result.contains_stdout("leafs = 9"));
    assert!(!result.contains_stdout("leafs = 4"));
    Ok(())
}

#[test]
fn test_config_env_missing_file_is_listed() -> Result<()> {
    let empty = TempDir::new()?;
    let missing = empty.path().join("nowhere.toml");

    let result = sk!(empty.path(), "rotate")
        .env("SNAPKEEP_CONFIG", &missing.display().to_string())
        .assert_failure()?;
    assert!(result.contains_stderr("no configuration found"));
    assert!(result.contains_stderr(&missing.display().to_string()));
    assert!(result.contains_stderr("snapkeep.toml"));
    Ok(())
}
