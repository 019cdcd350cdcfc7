//! Retention policies and the tiered keep/rotate engine
//!
//! The engine walks snapshots newest-first exactly once. Every record is
//! charged against the leaf quota; the first record seen for a new day,
//! week, month or year is additionally charged against that tier. A record
//! rotates only when every tier it was charged against is exhausted.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use sk_core::{Error, Result, RetentionSettings, SnapshotIdentity};
use std::fmt;
use tracing::debug;

/// Retention granularity, finest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Leafs,
    Days,
    Weeks,
    Months,
    Years,
}

impl Tier {
    pub const ALL: [Tier; 5] = [Tier::Leafs, Tier::Days, Tier::Weeks, Tier::Months, Tier::Years];

    pub fn name(self) -> &'static str {
        match self {
            Tier::Leafs => "leafs",
            Tier::Days => "days",
            Tier::Weeks => "weeks",
            Tier::Months => "months",
            Tier::Years => "years",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Retention policy configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Most recent snapshots kept unconditionally
    pub leafs: u32,
    /// Newest snapshot of each of this many days
    pub days: u32,
    /// Newest snapshot of each of this many weeks
    pub weeks: u32,
    /// Newest snapshot of each of this many months
    pub months: u32,
    /// Newest snapshot of each of this many years
    pub years: u32,
    /// Weekday that closes a week
    pub week_closes_on: Weekday,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        let settings = RetentionSettings::default();
        Self {
            leafs: settings.leafs,
            days: settings.days,
            weeks: settings.weeks,
            months: settings.months,
            years: settings.years,
            week_closes_on: Weekday::Sun,
        }
    }
}

impl RetentionPolicy {
    /// Policy with the given quotas; weeks close on Sunday
    pub fn new(leafs: u32, days: u32, weeks: u32, months: u32, years: u32) -> Self {
        Self {
            leafs,
            days,
            weeks,
            months,
            years,
            week_closes_on: Weekday::Sun,
        }
    }

    pub fn with_week_closing(mut self, weekday: Weekday) -> Self {
        self.week_closes_on = weekday;
        self
    }

    /// Build from the `[retention]` settings table
    pub fn from_settings(settings: &RetentionSettings) -> Result<Self> {
        let week_closes_on = weekday_from_number(settings.weekstart)?;
        Ok(Self {
            leafs: settings.leafs,
            days: settings.days,
            weeks: settings.weeks,
            months: settings.months,
            years: settings.years,
            week_closes_on,
        })
    }

    pub fn quota(&self, tier: Tier) -> u32 {
        match tier {
            Tier::Leafs => self.leafs,
            Tier::Days => self.days,
            Tier::Weeks => self.weeks,
            Tier::Months => self.months,
            Tier::Years => self.years,
        }
    }
}

/// ISO weekday number (1 = Monday ... 7 = Sunday)
fn weekday_from_number(n: u8) -> Result<Weekday> {
    match n {
        1 => Ok(Weekday::Mon),
        2 => Ok(Weekday::Tue),
        3 => Ok(Weekday::Wed),
        4 => Ok(Weekday::Thu),
        5 => Ok(Weekday::Fri),
        6 => Ok(Weekday::Sat),
        7 => Ok(Weekday::Sun),
        _ => Err(Error::InvalidConfiguration(format!(
            "weekstart must be 1-7, got {}",
            n
        ))),
    }
}

/// Last date of the week containing `date`
fn week_end(date: NaiveDate, closes_on: Weekday) -> NaiveDate {
    let ahead = (7 + closes_on.num_days_from_monday() - date.weekday().num_days_from_monday()) % 7;
    date.checked_add_days(Days::new(u64::from(ahead)))
        .unwrap_or(date)
}

/// Keep/rotate verdict for one snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub identity: SnapshotIdentity,
    pub rotate: bool,
    /// Finest tier that still had quota when this record was charged
    pub kept_by: Option<Tier>,
}

/// Running state of one evaluation pass
struct RetentionCounters {
    remaining: [i64; 5],
    week_end: Option<NaiveDate>,
    last_day: Option<(i32, u32, u32)>,
    last_month: Option<(i32, u32)>,
    last_year: Option<i32>,
}

impl RetentionCounters {
    fn new(policy: &RetentionPolicy) -> Self {
        let mut remaining = [0i64; 5];
        for tier in Tier::ALL {
            remaining[tier.index()] = i64::from(policy.quota(tier));
        }
        Self {
            remaining,
            week_end: None,
            last_day: None,
            last_month: None,
            last_year: None,
        }
    }

    /// Charge one record against `tier`; true when the tier is exhausted
    fn charge(&mut self, tier: Tier) -> bool {
        let counter = &mut self.remaining[tier.index()];
        *counter -= 1;
        *counter < 0
    }
}

/// Verdict accumulated across the tier checks of one record
struct Verdict {
    rotate: bool,
    kept_by: Option<Tier>,
}

impl Verdict {
    fn apply(&mut self, tier: Tier, exhausted: bool, first: bool) {
        self.rotate = if first { exhausted } else { self.rotate && exhausted };
        if !exhausted && self.kept_by.is_none() {
            self.kept_by = Some(tier);
        }
    }
}

/// Lazy stream of decisions over a newest-first record sequence
pub struct Evaluation<I> {
    records: I,
    policy: RetentionPolicy,
    counters: RetentionCounters,
    emit_all: bool,
}

impl<I> Evaluation<I>
where
    I: Iterator<Item = SnapshotIdentity>,
{
    fn decide(&mut self, identity: SnapshotIdentity) -> Decision {
        let counters = &mut self.counters;
        let mut verdict = Verdict {
            rotate: false,
            kept_by: None,
        };

        let exhausted = counters.charge(Tier::Leafs);
        verdict.apply(Tier::Leafs, exhausted, true);

        let day = (identity.year(), identity.month(), identity.day());
        if counters.last_day != Some(day) {
            counters.last_day = Some(day);
            let exhausted = counters.charge(Tier::Days);
            verdict.apply(Tier::Days, exhausted, false);
        }

        let date = identity.date();
        let new_week = match counters.week_end {
            None => true,
            Some(end) => end.signed_duration_since(date).num_days() > 6,
        };
        if new_week {
            let exhausted = counters.charge(Tier::Weeks);
            verdict.apply(Tier::Weeks, exhausted, false);
        }
        counters.week_end = Some(week_end(date, self.policy.week_closes_on));

        let month = (identity.year(), identity.month());
        if counters.last_month != Some(month) {
            counters.last_month = Some(month);
            let exhausted = counters.charge(Tier::Months);
            verdict.apply(Tier::Months, exhausted, false);
        }

        if counters.last_year != Some(identity.year()) {
            counters.last_year = Some(identity.year());
            let exhausted = counters.charge(Tier::Years);
            verdict.apply(Tier::Years, exhausted, false);
        }

        debug!(
            "{} rotate={} kept_by={:?}",
            identity, verdict.rotate, verdict.kept_by
        );

        Decision {
            identity,
            rotate: verdict.rotate,
            kept_by: verdict.kept_by,
        }
    }
}

impl<I> Iterator for Evaluation<I>
where
    I: Iterator<Item = SnapshotIdentity>,
{
    type Item = Decision;

    fn next(&mut self) -> Option<Decision> {
        loop {
            let identity = self.records.next()?;
            let decision = self.decide(identity);
            if decision.rotate || self.emit_all {
                return Some(decision);
            }
        }
    }
}

/// Evaluate `policy` over records ordered newest-first
///
/// With `emit_all` every record yields a decision; otherwise only records
/// marked for rotation are yielded. The order is not checked: callers must
/// pass newest-first input (see `sk_core::newest_first`).
pub fn evaluate<I>(records: I, policy: &RetentionPolicy, emit_all: bool) -> Evaluation<I::IntoIter>
where
    I: IntoIterator<Item = SnapshotIdentity>,
{
    Evaluation {
        records: records.into_iter(),
        policy: *policy,
        counters: RetentionCounters::new(policy),
        emit_all,
    }
}
