//! The volume profile and its queries.

use std::collections::BTreeMap;

use chrono::NaiveTime;
use volprofile_core::{seconds_between, Bucket, Error, Result};

/// How a bucket relates to a query range `[from, to]`.
///
/// The variants are mutually exclusive; each maps to one attribution rule in
/// [`VolumeProfile::cumulative_percentage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Overlap {
    /// No time in common.
    Disjoint,
    /// Bucket lies entirely inside the range.
    Contained,
    /// Bucket starts before `from` and ends inside the range.
    StraddlesFrom,
    /// Bucket starts inside the range and ends after `to`.
    StraddlesTo,
    /// Range lies strictly inside the bucket (starts after it, ends before it).
    Encloses,
}

impl Overlap {
    fn classify(bucket: &Bucket, from: NaiveTime, to: NaiveTime) -> Self {
        let (start, end) = (bucket.start(), bucket.end());
        if end <= from || start >= to {
            Overlap::Disjoint
        } else if start >= from && end <= to {
            Overlap::Contained
        } else if start < from && end > to {
            Overlap::Encloses
        } else if start < from {
            Overlap::StraddlesFrom
        } else {
            Overlap::StraddlesTo
        }
    }
}

/// An intraday volume profile: contiguous buckets whose shares sum to one.
///
/// Read-only once built. Construct through
/// [`ProfileBuilder`](crate::builder::ProfileBuilder) or
/// [`flat_profile`](crate::synthetic::flat_profile).
#[derive(Debug, Clone)]
pub struct VolumeProfile {
    buckets: Vec<Bucket>,
    /// Start time -> index into `buckets`.
    by_start: BTreeMap<NaiveTime, usize>,
    total_share: f64,
}

impl PartialEq for VolumeProfile {
    fn eq(&self, other: &Self) -> bool {
        self.buckets == other.buckets
    }
}

impl VolumeProfile {
    pub(crate) fn from_parts(
        buckets: Vec<Bucket>,
        by_start: BTreeMap<NaiveTime, usize>,
        total_share: f64,
    ) -> Self {
        Self {
            buckets,
            by_start,
            total_share,
        }
    }

    /// Buckets in time order.
    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    /// Sum of all bucket shares.
    pub fn total_share(&self) -> f64 {
        self.total_share
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Start of the first bucket.
    pub fn first_start(&self) -> Option<NaiveTime> {
        self.buckets.first().map(Bucket::start)
    }

    /// End of the last bucket.
    pub fn last_end(&self) -> Option<NaiveTime> {
        self.buckets.last().map(Bucket::end)
    }

    /// Bucket whose start is exactly `time`.
    pub fn entry_at(&self, time: NaiveTime) -> Option<&Bucket> {
        self.by_start.get(&time).and_then(|&i| self.buckets.get(i))
    }

    /// Share of daily volume expected between `from` and `to`.
    ///
    /// Volume is assumed uniform within each bucket, so partially covered
    /// buckets contribute in proportion to the seconds covered.
    pub fn cumulative_percentage(&self, from: NaiveTime, to: NaiveTime) -> Result<f64> {
        if to <= from {
            return Err(Error::invalid_range(format!(
                "End time must be after start time: {from} - {to}"
            )));
        }

        let mut cumulative = 0.0;
        for bucket in &self.buckets {
            let covered_secs = match Overlap::classify(bucket, from, to) {
                Overlap::Disjoint => continue,
                Overlap::Contained => {
                    cumulative += bucket.share();
                    continue;
                }
                Overlap::StraddlesFrom => seconds_between(from, bucket.end()),
                Overlap::StraddlesTo => seconds_between(bucket.start(), to),
                Overlap::Encloses => seconds_between(from, to),
            };
            let total_secs = bucket.duration_secs();
            if total_secs > 0 {
                cumulative += bucket.share() * covered_secs as f64 / total_secs as f64;
            }
        }

        Ok(cumulative)
    }

    /// Fraction of the `[from, to]` volume that should have traded by `time`.
    ///
    /// Returns 0 when the period carries no expected volume.
    pub fn normalized_target(
        &self,
        time: NaiveTime,
        from: NaiveTime,
        to: NaiveTime,
    ) -> Result<f64> {
        if to <= from {
            return Err(Error::invalid_range(format!(
                "End time must be after start time: {from} - {to}"
            )));
        }
        if time < from || time > to {
            return Err(Error::invalid_range(format!(
                "Time {time} must be between {from} and {to}"
            )));
        }

        let period = self.cumulative_percentage(from, to)?;
        if period == 0.0 || time == from {
            return Ok(0.0);
        }
        let elapsed = self.cumulative_percentage(from, time)?;
        Ok(elapsed / period)
    }
}
