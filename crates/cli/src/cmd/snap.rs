//! Create a new snapshot and sync the configured sources into it

use crate::util;
use anyhow::{Context, Result};
use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use sk_core::{load_inventory, Settings, SnapshotIdentity};
use snapkeep_sync::{sync_sources, MirrorSynchronizer};
use std::time::Duration;
use tracing::info;

pub fn run(settings: &Settings) -> Result<()> {
    // 1. Make sure the inventory root exists
    let store = util::open_store(settings);
    let root = store
        .create(&settings.destination)
        .context("Failed to create snapshot root")?;

    // 2. New identity from local time
    let identity = SnapshotIdentity::from_datetime(Local::now().naive_local());
    let target = identity.path_in(&root);
    if store.exists(&target) {
        anyhow::bail!("Snapshot {} already exists", target.display());
    }

    // 3. Start from the newest snapshot when there is one
    let inventory = load_inventory(store.as_ref(), &root)
        .context("Failed to load snapshot inventory")?;
    match inventory.first() {
        Some(newest) => {
            store
                .snapshot(&newest.path_in(&root), &target)
                .with_context(|| format!("Failed to snapshot {}", newest))?;
            info!("Snapshot {} based on {}", identity, newest);
        }
        None => {
            store
                .init_snapshot(&target)
                .with_context(|| format!("Failed to create snapshot {}", identity))?;
            info!("Snapshot {} created empty", identity);
        }
    }

    // 4. Sync every source
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));

    let synchronizer = MirrorSynchronizer::new().dry_run(settings.dry_run);
    let report = sync_sources(&synchronizer, &settings.sources, &target, |path| {
        spinner.set_message(format!("Syncing {}", path.display()));
    })?;
    spinner.finish_and_clear();

    println!("{} {}", "Snapshot".green().bold(), target.display());
    println!(
        "  {} copied, {} unchanged, {} deleted, {} skipped across {} sources",
        report.stats.copied,
        report.stats.unchanged,
        report.stats.deleted,
        report.stats.skipped,
        report.synced.len()
    );

    if !report.is_success() {
        for (path, err) in &report.failed {
            eprintln!("{} {}: {}", "failed:".red(), path.display(), err);
        }
        anyhow::bail!(
            "{} of {} sources failed to sync",
            report.failed.len(),
            report.failed.len() + report.synced.len()
        );
    }
    Ok(())
}
