//! List snapshots matching a pattern

use crate::util;
use anyhow::Result;
use owo_colors::OwoColorize;
use sk_core::Settings;

pub fn run(settings: &Settings, pattern: &str) -> Result<()> {
    let regex = util::compile_pattern(pattern)?;
    let store = util::open_store(settings);
    let matches = util::matching_snapshots(store.as_ref(), &settings.destination, &regex)?;

    for identity in &matches {
        println!("{}", identity.path_in(&settings.destination).display());
    }

    let noun = if matches.len() == 1 { "snapshot" } else { "snapshots" };
    println!("{}", format!("{} {} found", matches.len(), noun).bold());
    Ok(())
}
