//! `test <n>`: run the policy over random snapshot dates
//!
//! Nothing here touches storage; the synthetic inventory only exists in
//! memory and always goes through the report action.

use anyhow::{Context, Result};
use chrono::{Days, NaiveDate, NaiveTime};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sk_core::{newest_first, Error, Settings, SnapshotIdentity};
use snapkeep_policy::{dispatch, evaluate, Report, RetentionPolicy};
use std::io;
use tracing::info;

const FIRST_YEAR: i32 = 2000;
const LAST_YEAR: i32 = 2030;

pub fn run(settings: &Settings, count: &str, seed: Option<u64>) -> Result<()> {
    let count: usize = count.trim().parse().map_err(|_| {
        Error::InvalidArgument(format!(
            "snapshot count must be a non-negative integer, got '{}'",
            count
        ))
    })?;
    let policy = RetentionPolicy::from_settings(&settings.retention)?;

    let mut rng = match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };
    let records = newest_first(synthetic_inventory(&mut rng, count)?);
    info!("Generated {} synthetic snapshots", records.len());

    let stdout = io::stdout();
    let mut out = stdout.lock();
    dispatch(&mut Report::new(), evaluate(records, &policy, true), &mut out)?;
    Ok(())
}

/// `count` random identities between 2000-01-01 and 2030-12-31
fn synthetic_inventory<R: Rng>(rng: &mut R, count: usize) -> Result<Vec<SnapshotIdentity>> {
    let first = NaiveDate::from_ymd_opt(FIRST_YEAR, 1, 1).context("invalid first date")?;
    let last = NaiveDate::from_ymd_opt(LAST_YEAR, 12, 31).context("invalid last date")?;
    let span = last.signed_duration_since(first).num_days() as u64;

    (0..count)
        .map(|_| -> Result<SnapshotIdentity> {
            let date = first
                .checked_add_days(Days::new(rng.gen_range(0..=span)))
                .context("date out of range")?;
            let time = NaiveTime::from_hms_opt(
                rng.gen_range(0..24),
                rng.gen_range(0..60),
                rng.gen_range(0..60),
            )
            .context("invalid time")?;
            Ok(SnapshotIdentity::from_datetime(date.and_time(time)))
        })
        .collect()
}
