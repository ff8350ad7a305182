//! Core data types for the volume profile system.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Display format for bucket boundaries.
pub const DISPLAY_TIME_FORMAT: &str = "%H:%M";

/// Seconds elapsed from `from` to `to` (negative if `to` is earlier).
#[inline]
pub fn seconds_between(from: NaiveTime, to: NaiveTime) -> i64 {
    (to - from).num_seconds()
}

/// Trading session a bucket belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BucketCategory {
    /// Pre-open auction.
    PreOpen,
    /// Continuous trading.
    Continuous,
    /// Lunch break (no trading).
    LunchBreak,
    /// Closing auction.
    CloseAuction,
}

impl BucketCategory {
    /// All categories in session order.
    pub const ALL: [BucketCategory; 4] = [
        BucketCategory::PreOpen,
        BucketCategory::Continuous,
        BucketCategory::LunchBreak,
        BucketCategory::CloseAuction,
    ];

    /// Short code used in profile files.
    pub fn code(self) -> &'static str {
        match self {
            BucketCategory::PreOpen => "POS",
            BucketCategory::Continuous => "CTS",
            BucketCategory::LunchBreak => "L",
            BucketCategory::CloseAuction => "CAS",
        }
    }

    /// Human-readable session name.
    pub fn label(self) -> &'static str {
        match self {
            BucketCategory::PreOpen => "pre open session",
            BucketCategory::Continuous => "continuous trading session",
            BucketCategory::LunchBreak => "lunch break",
            BucketCategory::CloseAuction => "close auction session",
        }
    }

    /// Look up a category by its file code (case-sensitive).
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }
}

impl FromStr for BucketCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_code(s).ok_or_else(|| Error::format(format!("Invalid bucket type: {s}")))
    }
}

impl fmt::Display for BucketCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A time interval carrying a share of the day's expected volume.
///
/// Fields are private so that `end > start` and a finite, non-negative share
/// hold for every bucket in existence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bucket {
    start: NaiveTime,
    end: NaiveTime,
    share: f64,
    category: BucketCategory,
}

impl Bucket {
    /// Create a bucket, rejecting empty or inverted intervals and bad shares.
    pub fn new(
        start: NaiveTime,
        end: NaiveTime,
        share: f64,
        category: BucketCategory,
    ) -> Result<Self> {
        if end <= start {
            return Err(Error::format(format!(
                "End time must be after start time: {} - {}",
                start.format(DISPLAY_TIME_FORMAT),
                end.format(DISPLAY_TIME_FORMAT)
            )));
        }
        if !share.is_finite() || share < 0.0 {
            return Err(Error::format(format!(
                "Share must be a non-negative number: {share}"
            )));
        }
        Ok(Self {
            start,
            end,
            share,
            category,
        })
    }

    /// Interval start (inclusive).
    #[inline]
    pub fn start(&self) -> NaiveTime {
        self.start
    }

    /// Interval end (exclusive).
    #[inline]
    pub fn end(&self) -> NaiveTime {
        self.end
    }

    /// Fraction of daily volume.
    #[inline]
    pub fn share(&self) -> f64 {
        self.share
    }

    #[inline]
    pub fn category(&self) -> BucketCategory {
        self.category
    }

    #[inline]
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    #[inline]
    pub fn duration_secs(&self) -> i64 {
        seconds_between(self.start, self.end)
    }

    /// Whole minutes covered by the bucket.
    #[inline]
    pub fn duration_minutes(&self) -> i64 {
        self.duration().num_minutes()
    }

    /// `HH:MM-HH:MM` form of the interval.
    pub fn time_range(&self) -> String {
        format!(
            "{}-{}",
            self.start.format(DISPLAY_TIME_FORMAT),
            self.end.format(DISPLAY_TIME_FORMAT)
        )
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {:.2}% ({})",
            self.time_range(),
            self.share * 100.0,
            self.category
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_category_codes() {
        assert_eq!("POS".parse::<BucketCategory>().unwrap(), BucketCategory::PreOpen);
        assert_eq!("CTS".parse::<BucketCategory>().unwrap(), BucketCategory::Continuous);
        assert_eq!("L".parse::<BucketCategory>().unwrap(), BucketCategory::LunchBreak);
        assert_eq!("CAS".parse::<BucketCategory>().unwrap(), BucketCategory::CloseAuction);
    }

    #[test]
    fn test_category_parse_is_case_sensitive() {
        assert!("cts".parse::<BucketCategory>().is_err());
        assert!("".parse::<BucketCategory>().is_err());
        assert!(BucketCategory::from_code("Cts").is_none());
    }

    #[test]
    fn test_bucket_rejects_inverted_interval() {
        let err = Bucket::new(t(8, 0), t(7, 0), 0.5, BucketCategory::Continuous).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
        assert!(Bucket::new(t(8, 0), t(8, 0), 0.5, BucketCategory::Continuous).is_err());
    }

    #[test]
    fn test_bucket_rejects_negative_share() {
        assert!(Bucket::new(t(8, 0), t(9, 0), -0.1, BucketCategory::Continuous).is_err());
        assert!(Bucket::new(t(8, 0), t(9, 0), f64::NAN, BucketCategory::Continuous).is_err());
    }

    #[test]
    fn test_bucket_durations() {
        let bucket = Bucket::new(t(9, 0), t(9, 30), 0.05, BucketCategory::PreOpen).unwrap();
        assert_eq!(bucket.duration_secs(), 1800);
        assert_eq!(bucket.duration_minutes(), 30);
    }

    #[test]
    fn test_bucket_display() {
        let bucket = Bucket::new(t(9, 30), t(9, 31), 0.0123, BucketCategory::Continuous).unwrap();
        assert_eq!(bucket.to_string(), "[09:30-09:31] 1.23% (continuous trading session)");
    }
}
