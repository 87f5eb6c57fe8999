//! Calendar-day keys and inclusive date ranges.
//!
//! A [`DateKey`] has two wire forms that must never be mixed up:
//! - short form `YYYY-MM-DD`, used in cache keys and request parameters
//! - long form `YYYY-MM-DD 00:00:00`, used by the backing store

use chrono::{DateTime, NaiveDate};
use std::fmt;
use std::iter;

use super::data_point::Category;
use crate::domain::errors::{DomainError, DomainResult};

/// chrono layout of the short (cache) form.
pub const SHORT_LAYOUT: &str = "%Y-%m-%d";

/// chrono layout of the long (backing store) form.
pub const BACKING_LAYOUT: &str = "%Y-%m-%d 00:00:00";

/// A calendar date with no time-of-day component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateKey(NaiveDate);

impl DateKey {
    pub const fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub const fn date(self) -> NaiveDate {
        self.0
    }

    /// Short form, e.g. `2024-03-01`.
    pub fn to_cache_form(self) -> String {
        self.0.format(SHORT_LAYOUT).to_string()
    }

    /// Long form, e.g. `2024-03-01 00:00:00`.
    pub fn to_backing_param(self) -> String {
        self.0.format(BACKING_LAYOUT).to_string()
    }

    /// Parse the short form. Anything that does not format back to the
    /// exact input (e.g. `2024-3-1`, `+2024-03-01`) is rejected.
    pub fn parse_short(s: &str) -> DomainResult<Self> {
        Self::parse_strict(s, SHORT_LAYOUT, Self::to_cache_form)
    }

    /// Parse the long form returned by the backing store.
    pub fn parse_backing(s: &str) -> DomainResult<Self> {
        Self::parse_strict(s, BACKING_LAYOUT, Self::to_backing_param)
    }

    /// Normalize a client-supplied timestamp to its calendar day.
    ///
    /// Accepts RFC3339 (`2024-03-11T12:00:00Z`, the date is taken in the
    /// timestamp's own offset), the long form, and the short form.
    pub fn parse_timestamp(s: &str) -> DomainResult<Self> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self(dt.naive_local().date()));
        }
        Self::parse_backing(s).or_else(|_| Self::parse_short(s))
    }

    /// The following calendar day, or `None` past the representable range.
    pub fn next_day(self) -> Option<Self> {
        self.0.succ_opt().map(Self)
    }

    fn parse_strict(s: &str, layout: &str, render: fn(Self) -> String) -> DomainResult<Self> {
        let key = NaiveDate::parse_from_str(s, layout)
            .map(Self)
            .map_err(|e| DomainError::MalformedDate(format!("{s:?}: {e}")))?;

        if render(key) != s {
            return Err(DomainError::MalformedDate(format!(
                "{s:?}: not in canonical form"
            )));
        }
        Ok(key)
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(SHORT_LAYOUT))
    }
}

/// Cache key for one category on one day: category name followed by the
/// short form, e.g. `line2024-03-01`. Category names contain no digits, so
/// distinct pairs never collide.
pub fn cache_key(category: Category, date: DateKey) -> String {
    format!("{}{}", category.as_str(), date.to_cache_form())
}

/// An inclusive span of calendar days with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: DateKey,
    end: DateKey,
}

impl DateRange {
    /// Build a validated range covering at most `max_days` days.
    pub fn new(start: DateKey, end: DateKey, max_days: u32) -> DomainResult<Self> {
        if start > end {
            return Err(DomainError::InvalidDateRange(format!(
                "start {start} is after end {end}"
            )));
        }

        let range = Self { start, end };
        if range.len_days() > u64::from(max_days) {
            return Err(DomainError::InvalidDateRange(format!(
                "{start}..{end} spans {} days, limit is {max_days}",
                range.len_days()
            )));
        }
        Ok(range)
    }

    /// Parse both bounds from their short form.
    pub fn parse(start: &str, end: &str, max_days: u32) -> DomainResult<Self> {
        Self::new(DateKey::parse_short(start)?, DateKey::parse_short(end)?, max_days)
    }

    pub const fn start(&self) -> DateKey {
        self.start
    }

    pub const fn end(&self) -> DateKey {
        self.end
    }

    /// Number of days in the range, bounds included.
    pub fn len_days(&self) -> u64 {
        // start <= end is guaranteed by construction
        (self.end.0 - self.start.0).num_days().unsigned_abs() + 1
    }

    /// Every day from start to end inclusive, one calendar day at a time.
    pub fn days(&self) -> impl Iterator<Item = DateKey> {
        let end = self.end;
        iter::successors(Some(self.start), move |day| {
            if *day < end {
                day.next_day()
            } else {
                None
            }
        })
    }
}
