//! Delete snapshots by pattern, ignoring retention

use crate::util;
use anyhow::Result;
use owo_colors::OwoColorize;
use sk_core::{ActionKind, Settings};
use snapkeep_policy::{build_action, dispatch, Decision};
use std::io;

pub fn run(settings: &Settings, pattern: &str) -> Result<()> {
    let regex = util::compile_pattern(pattern)?;
    let store = util::open_store(settings);
    let matches = util::matching_snapshots(store.as_ref(), &settings.destination, &regex)?;

    if matches.is_empty() {
        println!("{}", format!("No snapshots match '{}'", pattern).dimmed());
        return Ok(());
    }

    // Forced removal deletes every decision, marked or not
    let decisions = matches.into_iter().map(|identity| Decision {
        identity,
        rotate: true,
        kept_by: None,
    });
    let mut remove = build_action(ActionKind::Remove, store.as_ref(), settings, true)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    dispatch(remove.as_mut(), decisions, &mut out)?;
    Ok(())
}
