//! Apply the retention policy to the whole inventory

use crate::util;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use sk_core::{load_inventory, ActionKind, Settings};
use snapkeep_policy::{build_action, dispatch, evaluate, RetentionPolicy};
use std::io;
use tracing::info;

pub fn run(settings: &Settings, action: Option<&str>) -> Result<()> {
    // 1. Resolve the action, command line over settings
    let kind = match action {
        Some(name) => name.parse::<ActionKind>()?,
        None => settings.action,
    };
    let policy = RetentionPolicy::from_settings(&settings.retention)?;

    // 2. Load the inventory newest first
    let store = util::open_store(settings);
    let records = load_inventory(store.as_ref(), &settings.destination)
        .context("Failed to load snapshot inventory")?;
    info!(
        "Evaluating {} snapshots under {} with action {}",
        records.len(),
        settings.destination.display(),
        kind
    );

    // 3. Evaluate and dispatch; report shows every decision
    let emit_all = kind == ActionKind::Report;
    let mut rotation = build_action(kind, store.as_ref(), settings, false)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let summary = dispatch(rotation.as_mut(), evaluate(records, &policy, emit_all), &mut out)?;

    if summary.failed > 0 {
        eprintln!(
            "{} {} snapshots could not be processed",
            "warning:".yellow(),
            summary.failed
        );
    }
    Ok(())
}
