//! Flat (time-weighted) profile used when no profile source is usable.

use std::collections::BTreeMap;

use chrono::Duration;
use volprofile_core::{Bucket, BucketCategory, Result, SessionLayout, SessionWindow};

use crate::profile::VolumeProfile;

/// Generate a profile with uniform volume per minute of continuous trading.
///
/// Layout: one pre-open bucket, one bucket per minute of each continuous
/// session, one zero-share lunch bucket and one closing-auction bucket. Every
/// bucket except lunch carries `1 / N`, where `N` counts those buckets, so the
/// shares sum to 1.0 and the result passes validation for the same layout.
///
/// Fails only for a layout rejected by [`SessionLayout::validate`]; any valid
/// layout yields a contiguous profile.
pub fn flat_profile(layout: &SessionLayout) -> Result<VolumeProfile> {
    layout.validate()?;

    let mut slots: Vec<(SessionWindow, BucketCategory)> = Vec::new();
    for (category, window) in layout.windows() {
        match category {
            BucketCategory::Continuous => {
                slots.extend(minute_windows(window).map(|w| (w, category)));
            }
            _ => slots.push((window, category)),
        }
    }

    let traded = slots
        .iter()
        .filter(|(_, c)| *c != BucketCategory::LunchBreak)
        .count();
    let share = if traded == 0 { 0.0 } else { 1.0 / traded as f64 };

    let mut buckets = Vec::with_capacity(slots.len());
    let mut by_start = BTreeMap::new();
    let mut total_share = 0.0;
    for (window, category) in slots {
        let bucket_share = if category == BucketCategory::LunchBreak {
            0.0
        } else {
            share
        };
        let bucket = Bucket::new(window.start, window.end, bucket_share, category)?;
        by_start.insert(bucket.start(), buckets.len());
        total_share += bucket.share();
        buckets.push(bucket);
    }

    Ok(VolumeProfile::from_parts(buckets, by_start, total_share))
}

/// Split a window into consecutive one-minute windows.
fn minute_windows(window: SessionWindow) -> impl Iterator<Item = SessionWindow> {
    let minutes = window.minutes();
    (0..minutes).map(move |i| {
        let start = window.start + Duration::minutes(i);
        SessionWindow::new(start, start + Duration::minutes(1))
    })
}
