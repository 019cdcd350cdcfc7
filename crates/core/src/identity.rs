//! Snapshot identity: a four-level `YYYY/MM/DD/serial` timestamp path

use crate::{Error, Result};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use std::cmp::Ordering;
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Number of path segments below the inventory root
pub const SEGMENTS: usize = 4;

/// A single snapshot, identified by its position in the timestamp hierarchy
///
/// Ordering is chronological on (year, month, day, serial). The retention
/// engine consumes identities newest-first, i.e. in reverse of this order.
#[derive(Debug, Clone)]
pub struct SnapshotIdentity {
    year: i32,
    month: u32,
    day: u32,
    /// Time-of-day label, opaque (usually `HHMMSS`)
    serial: String,
    /// Path relative to the inventory root, exactly as listed
    relative: PathBuf,
}

impl SnapshotIdentity {
    /// Parse the relative part of a snapshot path (`YYYY/MM/DD/serial`)
    pub fn parse(relative: &Path) -> Result<Self> {
        let mut segments = Vec::with_capacity(SEGMENTS);
        for component in relative.components() {
            match component {
                Component::Normal(seg) => {
                    let seg = seg
                        .to_str()
                        .ok_or_else(|| Error::malformed(relative, "segment is not valid UTF-8"))?;
                    segments.push(seg);
                }
                _ => return Err(Error::malformed(relative, "unexpected path component")),
            }
        }

        if segments.len() != SEGMENTS {
            return Err(Error::malformed(
                relative,
                format!("expected {} segments, found {}", SEGMENTS, segments.len()),
            ));
        }

        let year: i32 = parse_decimal(relative, "year", segments[0])?;
        let month: u32 = parse_decimal(relative, "month", segments[1])?;
        let day: u32 = parse_decimal(relative, "day", segments[2])?;
        let serial = segments[3];

        if NaiveDate::from_ymd_opt(year, month, day).is_none() {
            return Err(Error::malformed(
                relative,
                format!("{}-{}-{} is not a calendar date", year, month, day),
            ));
        }

        Ok(Self {
            year,
            month,
            day,
            serial: serial.to_string(),
            relative: relative.to_path_buf(),
        })
    }

    /// Identity for a snapshot taken at `at`
    pub fn from_datetime(at: NaiveDateTime) -> Self {
        let year = at.year();
        let month = at.month();
        let day = at.day();
        let serial = at.format("%H%M%S").to_string();
        let relative = PathBuf::from(format!("{:04}", year))
            .join(format!("{:02}", month))
            .join(format!("{:02}", day))
            .join(&serial);

        Self {
            year,
            month,
            day,
            serial,
            relative,
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn serial(&self) -> &str {
        &self.serial
    }

    /// Calendar date of the snapshot
    pub fn date(&self) -> NaiveDate {
        // Validated in `parse`/`from_datetime`
        NaiveDate::from_ymd_opt(self.year, self.month, self.day).unwrap_or_default()
    }

    /// Path relative to the inventory root
    pub fn relative_path(&self) -> &Path {
        &self.relative
    }

    /// Absolute snapshot path under `root`
    pub fn path_in(&self, root: &Path) -> PathBuf {
        root.join(&self.relative)
    }

    /// Day, month and year directories of this snapshot under `root`,
    /// innermost first
    pub fn ancestors_in(&self, root: &Path) -> Vec<PathBuf> {
        let mut dirs = Vec::with_capacity(SEGMENTS - 1);
        let mut current = self.relative.parent();
        while let Some(dir) = current {
            if dir.as_os_str().is_empty() {
                break;
            }
            dirs.push(root.join(dir));
            current = dir.parent();
        }
        dirs
    }

    fn key(&self) -> (i32, u32, u32, &str) {
        (self.year, self.month, self.day, &self.serial)
    }
}

/// Parse a base-10 segment, accepting leading zeros and nothing but digits
fn parse_decimal<T: std::str::FromStr>(path: &Path, field: &str, seg: &str) -> Result<T> {
    if seg.is_empty() || !seg.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::malformed(
            path,
            format!("{} segment '{}' is not a decimal number", field, seg),
        ));
    }
    seg.parse()
        .map_err(|_| Error::malformed(path, format!("{} segment '{}' is out of range", field, seg)))
}

impl PartialEq for SnapshotIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for SnapshotIdentity {}

impl PartialOrd for SnapshotIdentity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SnapshotIdentity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl fmt::Display for SnapshotIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.relative.display())
    }
}
