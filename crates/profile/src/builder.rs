//! Builds a validated [`VolumeProfile`] from raw rows.

use std::collections::BTreeMap;

use chrono::NaiveTime;
use volprofile_core::{Bucket, BucketCategory, Config, Error, Result};
use volprofile_ingestion::RawRow;

use crate::profile::VolumeProfile;
use crate::validator::BucketValidator;

/// Number of columns in a profile row.
const FIELD_COUNT: usize = 4;

/// Accumulates typed buckets row by row, then validates them as a whole.
///
/// A builder that fails is simply dropped; nothing partially built escapes.
pub struct ProfileBuilder {
    validator: BucketValidator,
    time_format: String,
    buckets: Vec<Bucket>,
    by_start: BTreeMap<NaiveTime, usize>,
    total_share: f64,
}

impl ProfileBuilder {
    /// Create a builder using the time format, thresholds and layout of `config`.
    pub fn new(config: &Config) -> Self {
        Self {
            validator: BucketValidator::new(config.validation.clone(), &config.session),
            time_format: config.source.time_format.clone(),
            buckets: Vec::new(),
            by_start: BTreeMap::new(),
            total_share: 0.0,
        }
    }

    /// Parse one row and append the resulting bucket.
    pub fn push_row(&mut self, row: &RawRow) -> Result<()> {
        let line = row.line;
        if row.fields.len() != FIELD_COUNT {
            return Err(Error::format(format!(
                "Invalid format at line {line}: expected {FIELD_COUNT} fields but found {}",
                row.fields.len()
            )));
        }

        let start = self.parse_time(&row.fields[0], "start", line)?;
        let end = self.parse_time(&row.fields[1], "end", line)?;
        if end <= start {
            return Err(Error::format(format!(
                "End time must be after start time at line {line}: {} - {}",
                row.fields[0], row.fields[1]
            )));
        }

        let share = parse_share(&row.fields[2], line)?;
        let category = parse_category(&row.fields[3], line)?;

        let bucket = Bucket::new(start, end, share, category)?;
        self.push_bucket(bucket);
        Ok(())
    }

    /// Parse and append every row in order, stopping at the first bad one.
    pub fn push_rows<'a>(&mut self, rows: impl IntoIterator<Item = &'a RawRow>) -> Result<()> {
        for row in rows {
            self.push_row(row)?;
        }
        Ok(())
    }

    /// Append an already-typed bucket.
    pub fn push_bucket(&mut self, bucket: Bucket) {
        self.by_start.insert(bucket.start(), self.buckets.len());
        self.total_share += bucket.share();
        self.buckets.push(bucket);
    }

    /// Sum of shares pushed so far.
    pub fn total_share(&self) -> f64 {
        self.total_share
    }

    /// Validate the accumulated buckets and produce the profile.
    pub fn build(self) -> Result<VolumeProfile> {
        self.validator.validate(&self.buckets, self.total_share)?;
        Ok(VolumeProfile::from_parts(
            self.buckets,
            self.by_start,
            self.total_share,
        ))
    }

    /// Parse a time field, accepting only the canonical rendering of the
    /// configured format (`9:30` and ` 09:30` are rejected under `%H:%M`).
    fn parse_time(&self, raw: &str, field: &str, line: usize) -> Result<NaiveTime> {
        let invalid = || {
            Error::format(format!(
                "Invalid {field} time: {raw} at line {line}. Expected format: {}",
                self.time_format
            ))
        };
        let time = NaiveTime::parse_from_str(raw, &self.time_format).map_err(|_| invalid())?;
        if time.format(&self.time_format).to_string() != raw {
            return Err(invalid());
        }
        Ok(time)
    }
}

fn parse_share(raw: &str, line: usize) -> Result<f64> {
    let share: f64 = raw.parse().map_err(|_| {
        Error::format(format!("Invalid percentage format: {raw} at line {line}."))
    })?;
    if !share.is_finite() {
        return Err(Error::format(format!(
            "Percentage must be a finite number: {raw} at line {line}."
        )));
    }
    if share < 0.0 {
        return Err(Error::format(format!(
            "Percentage must be non-negative: {raw} at line {line}."
        )));
    }
    Ok(share)
}

fn parse_category(raw: &str, line: usize) -> Result<BucketCategory> {
    let code = raw.trim();
    if code.is_empty() {
        return Err(Error::format(format!("Type cannot be empty at line {line}.")));
    }
    BucketCategory::from_code(code)
        .ok_or_else(|| Error::format(format!("Invalid bucket type: {code} at line {line}.")))
}
