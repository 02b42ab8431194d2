use crate::errors::{Error, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::Sub;
use std::str::FromStr;

/// Textual form of a cycle timestamp (`YYYYMMDDHH`)
pub const DTG_FORMAT: &str = "%Y%m%d%H";

/// Default cycle interval in hours when `GENERAL#FCINT` is not configured
pub const DEFAULT_FCINT_HOURS: f64 = 3.0;

/// Longest accepted cycle interval in hours (one leap year)
pub const MAX_FCINT_HOURS: f64 = 8784.0;

/// A forecast cycle identified by its valid time at hour resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CycleTimestamp(NaiveDateTime);

impl CycleTimestamp {
    /// Parses a `YYYYMMDDHH` string
    ///
    /// # Errors
    ///
    /// Returns `Error::MalformedProgress` unless the value is exactly ten
    /// digits forming a valid calendar date and hour.
    pub fn parse(value: &str) -> Result<Self> {
        let malformed = |reason: &str| Error::MalformedProgress {
            value: value.to_string(),
            reason: reason.to_string(),
        };

        if value.len() != 10 || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed("expected ten digits YYYYMMDDHH"));
        }

        // All ten bytes are ASCII digits, so these slices and parses cannot fail.
        let field = |range: std::ops::Range<usize>| value[range].parse::<u32>().unwrap_or(0);
        let year = field(0..4) as i32;
        let (month, day, hour) = (field(4..6), field(6..8), field(8..10));

        let date = NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| malformed("invalid calendar date"))?;
        let datetime = date
            .and_hms_opt(hour, 0, 0)
            .ok_or_else(|| malformed("hour out of range"))?;
        Ok(Self(datetime))
    }

    /// Formats the timestamp as `YYYYMMDDHH`
    pub fn format(&self) -> String {
        self.strftime(DTG_FORMAT)
    }

    pub fn strftime(&self, fmt: &str) -> String {
        self.0.format(fmt).to_string()
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    /// `None` when the result falls outside the representable calendar
    pub fn checked_add(&self, rhs: Duration) -> Option<Self> {
        self.0.checked_add_signed(rhs).map(Self)
    }

    pub fn checked_sub(&self, rhs: Duration) -> Option<Self> {
        self.0.checked_sub_signed(rhs).map(Self)
    }
}

impl fmt::Display for CycleTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

impl FromStr for CycleTimestamp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Sub<CycleTimestamp> for CycleTimestamp {
    type Output = Duration;

    fn sub(self, rhs: CycleTimestamp) -> Self::Output {
        self.0 - rhs.0
    }
}

impl Serialize for CycleTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.format())
    }
}

impl<'de> Deserialize<'de> for CycleTimestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        CycleTimestamp::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Converts a cycle interval given in (possibly fractional) hours
pub fn interval_from_hours(hours: f64) -> Duration {
    Duration::milliseconds((hours * 3_600_000.0).round() as i64)
}

/// The timestamps a task needs about its own cycle and its neighbours
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleTimes {
    /// The cycle being processed (DTG)
    pub current: CycleTimestamp,
    /// First cycle of the experiment (DTGBEG)
    pub begin: CycleTimestamp,
    /// Base time of the first guess, one interval back
    pub previous: CycleTimestamp,
    /// Next cycle to process
    pub next: CycleTimestamp,
    /// Next cycle for post-processing
    pub next_pp: CycleTimestamp,
    pub interval: Duration,
}

impl CycleTimes {
    /// # Errors
    ///
    /// `Error::ConfigValue` for `GENERAL#FCINT` when a neighbouring cycle
    /// falls outside the representable calendar.
    pub fn new(current: CycleTimestamp, begin: CycleTimestamp, interval: Duration) -> Result<Self> {
        let out_of_range = || Error::ConfigValue {
            path: "GENERAL#FCINT".to_string(),
            reason: format!("cycle interval {interval} out of range around {current}"),
        };
        let next = current.checked_add(interval).ok_or_else(out_of_range)?;
        let previous = current.checked_sub(interval).ok_or_else(out_of_range)?;
        Ok(Self {
            current,
            begin,
            previous,
            next,
            next_pp: next,
            interval,
        })
    }
}
