//! Configuration structures for the volume profile system.

use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{seconds_between, BucketCategory};

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Profile source configuration.
    pub source: SourceConfig,
    /// Validation thresholds.
    pub validation: ValidationConfig,
    /// Trading calendar shape.
    pub session: SessionLayout,
}

impl Config {
    /// Parse a JSON configuration and validate it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON configuration file and validate it.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<()> {
        if self.source.header.trim().is_empty() {
            return Err(Error::config("source.header must not be empty"));
        }
        if self.source.time_format.is_empty() {
            return Err(Error::config("source.time_format must not be empty"));
        }
        let tolerance = self.validation.share_tolerance;
        if tolerance.is_nan() || tolerance <= 0.0 {
            return Err(Error::config(format!(
                "validation.share_tolerance must be positive, got {}",
                self.validation.share_tolerance
            )));
        }
        self.session.validate()
    }
}

/// Where profiles are read from and how their text is laid out.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Instrument-specific profile.
    pub primary_path: PathBuf,
    /// Market-wide profile used when the primary one fails.
    pub default_path: PathBuf,
    /// Exact header line expected at the top of a profile file.
    pub header: String,
    /// `chrono` format of the start/end columns.
    pub time_format: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            primary_path: PathBuf::from("data/0700_HK.csv"),
            default_path: PathBuf::from("data/HK.csv"),
            header: "start,end,percentage,type".to_string(),
            time_format: "%H:%M".to_string(),
        }
    }
}

/// Validation thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Allowed deviation of the total share from 1.0.
    pub share_tolerance: f64,
    /// Buckets above this share are reported (not rejected).
    pub share_warn_threshold: f64,
    /// Check summed minutes per category against the session layout.
    pub enforce_session_durations: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            share_tolerance: 1e-4,
            share_warn_threshold: 0.3,
            enforce_session_durations: true,
        }
    }
}

/// Half-open time window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl SessionWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Whole minutes in the window.
    pub fn minutes(&self) -> i64 {
        seconds_between(self.start, self.end) / 60
    }
}

/// Shape of the trading day: pre-open, two continuous sessions around a lunch
/// break, then the closing auction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionLayout {
    pub pre_open: SessionWindow,
    pub morning: SessionWindow,
    pub lunch: SessionWindow,
    pub afternoon: SessionWindow,
    pub close_auction: SessionWindow,
}

impl Default for SessionLayout {
    fn default() -> Self {
        let hm = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap_or_default();
        Self {
            pre_open: SessionWindow::new(hm(9, 0), hm(9, 30)),
            morning: SessionWindow::new(hm(9, 30), hm(12, 0)),
            lunch: SessionWindow::new(hm(12, 0), hm(13, 0)),
            afternoon: SessionWindow::new(hm(13, 0), hm(16, 0)),
            close_auction: SessionWindow::new(hm(16, 0), hm(16, 10)),
        }
    }
}

impl SessionLayout {
    /// Windows in chronological order, tagged with their category.
    pub fn windows(&self) -> [(BucketCategory, SessionWindow); 5] {
        [
            (BucketCategory::PreOpen, self.pre_open),
            (BucketCategory::Continuous, self.morning),
            (BucketCategory::LunchBreak, self.lunch),
            (BucketCategory::Continuous, self.afternoon),
            (BucketCategory::CloseAuction, self.close_auction),
        ]
    }

    /// Total minutes a valid profile must assign to `category`.
    pub fn expected_minutes(&self, category: BucketCategory) -> i64 {
        self.windows()
            .iter()
            .filter(|(c, _)| *c == category)
            .map(|(_, w)| w.minutes())
            .sum()
    }

    /// Every window must be non-empty, whole-minute and start where the previous one ended.
    pub fn validate(&self) -> Result<()> {
        let windows = self.windows();
        for (category, window) in &windows {
            if window.end <= window.start {
                return Err(Error::config(format!(
                    "{} window must end after it starts",
                    category.code()
                )));
            }
            if seconds_between(window.start, window.end) % 60 != 0 {
                return Err(Error::config(format!(
                    "{} window must span whole minutes",
                    category.code()
                )));
            }
        }
        for pair in windows.windows(2) {
            let (prev, next) = (pair[0].1, pair[1].1);
            if prev.end != next.start {
                return Err(Error::config(format!(
                    "session windows are not contiguous at {}",
                    prev.end.format("%H:%M")
                )));
            }
        }
        Ok(())
    }
}
