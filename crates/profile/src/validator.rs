//! Structural and domain checks on a candidate bucket sequence.

use std::collections::BTreeMap;

use tracing::info;
use volprofile_core::{
    Bucket, BucketCategory, Error, Result, SessionLayout, ValidationConfig, DISPLAY_TIME_FORMAT,
};

/// Validates a complete bucket sequence before it becomes a profile.
#[derive(Debug, Clone)]
pub struct BucketValidator {
    config: ValidationConfig,
    /// Required minutes per category, taken from the session layout.
    expected_minutes: BTreeMap<BucketCategory, i64>,
}

impl BucketValidator {
    /// Create a validator for the given thresholds and trading calendar.
    pub fn new(config: ValidationConfig, layout: &SessionLayout) -> Self {
        let expected_minutes = BucketCategory::ALL
            .into_iter()
            .map(|c| (c, layout.expected_minutes(c)))
            .collect();
        Self {
            config,
            expected_minutes,
        }
    }

    /// Check `buckets` (in order) together with their accumulated share.
    ///
    /// Shares above the warning threshold are logged, never rejected.
    pub fn validate(&self, buckets: &[Bucket], total_share: f64) -> Result<()> {
        if buckets.is_empty() {
            return Err(Error::validation("No data entries found"));
        }

        self.check_total_share(total_share)?;
        check_continuity(buckets)?;
        if self.config.enforce_session_durations {
            self.check_session_durations(buckets)?;
        }
        self.report_large_shares(buckets);

        Ok(())
    }

    fn check_total_share(&self, total_share: f64) -> Result<()> {
        let deviation = (total_share - 1.0).abs();
        if deviation > self.config.share_tolerance || deviation.is_nan() {
            return Err(Error::validation(format!(
                "Total percentage doesn't sum to 1.0: {total_share} (deviation {deviation:.6})"
            )));
        }
        Ok(())
    }

    fn check_session_durations(&self, buckets: &[Bucket]) -> Result<()> {
        let mut actual: BTreeMap<BucketCategory, i64> = BTreeMap::new();
        for bucket in buckets {
            *actual.entry(bucket.category()).or_insert(0) += bucket.duration_minutes();
        }

        // Only categories present in the profile are checked.
        for (category, minutes) in actual {
            let expected = self.expected_minutes.get(&category).copied().unwrap_or(0);
            if minutes != expected {
                return Err(Error::validation(format!(
                    "Invalid {} duration: {minutes}. Expected {expected} minutes.",
                    category.code()
                )));
            }
        }
        Ok(())
    }

    fn report_large_shares(&self, buckets: &[Bucket]) {
        for bucket in buckets
            .iter()
            .filter(|b| b.share() > self.config.share_warn_threshold)
        {
            info!(
                range = %bucket.time_range(),
                share = bucket.share(),
                threshold = self.config.share_warn_threshold,
                "bucket share above warning threshold"
            );
        }
    }
}

/// Each bucket must end exactly where the next one starts.
fn check_continuity(buckets: &[Bucket]) -> Result<()> {
    for pair in buckets.windows(2) {
        if pair[0].end() != pair[1].start() {
            return Err(Error::validation(format!(
                "Gap detected between entries: {}",
                pair[0].end().format(DISPLAY_TIME_FORMAT)
            )));
        }
    }
    Ok(())
}
