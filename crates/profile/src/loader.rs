//! Profile loading with the primary -> default -> synthetic fallback chain.

use std::fmt;
use std::path::Path;

use tracing::{info, warn};
use volprofile_core::{Config, Error, Result};
use volprofile_ingestion::{read_rows_from_path, read_rows_from_str};

use crate::builder::ProfileBuilder;
use crate::profile::VolumeProfile;
use crate::synthetic::flat_profile;

/// Which step of the fallback chain produced a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileOrigin {
    /// Instrument-specific source.
    Primary,
    /// Market-wide default source.
    Default,
    /// Generated flat profile.
    Synthetic,
}

impl fmt::Display for ProfileOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProfileOrigin::Primary => "primary",
            ProfileOrigin::Default => "default",
            ProfileOrigin::Synthetic => "synthetic",
        })
    }
}

/// A profile together with where it came from.
#[derive(Debug, Clone)]
pub struct LoadedProfile {
    pub profile: VolumeProfile,
    pub origin: ProfileOrigin,
}

/// Loads profiles according to a [`Config`].
pub struct ProfileLoader {
    config: Config,
    /// Last step of the chain, built up front so `load` cannot fail.
    fallback: VolumeProfile,
}

impl ProfileLoader {
    /// Validate `config` and prepare the flat fallback for its session layout.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let fallback = flat_profile(&config.session)?;
        Ok(Self { config, fallback })
    }

    /// Load a profile, falling back through the default source to a flat one.
    ///
    /// Never fails: any load failure moves on to the next step, and the last
    /// step cannot fail.
    pub fn load(&self) -> LoadedProfile {
        let source = &self.config.source;

        match self.load_path(&source.primary_path) {
            Ok(profile) => return loaded(profile, ProfileOrigin::Primary),
            Err(e) => warn!(error = %e, "primary volume profile rejected"),
        }

        info!(path = %source.default_path.display(), "Loading default volume profile");
        match self.load_path(&source.default_path) {
            Ok(profile) => return loaded(profile, ProfileOrigin::Default),
            Err(e) => warn!(error = %e, "default volume profile rejected"),
        }

        info!("Generating flat volume profile");
        loaded(self.fallback.clone(), ProfileOrigin::Synthetic)
    }

    /// Load a single source with no fallback.
    ///
    /// Failures are wrapped in [`Error::Load`] naming the path.
    pub fn load_path(&self, path: &Path) -> Result<VolumeProfile> {
        let attempt = || -> Result<VolumeProfile> {
            let rows = read_rows_from_path(path, &self.config.source)?;
            let mut builder = ProfileBuilder::new(&self.config);
            builder.push_rows(&rows)?;
            builder.build()
        };
        attempt().map_err(|e| Error::load(path.display().to_string(), e))
    }

    /// Build a profile from in-memory profile text, header included.
    pub fn load_str(&self, text: &str) -> Result<VolumeProfile> {
        let rows = read_rows_from_str(text, &self.config.source)?;
        let mut builder = ProfileBuilder::new(&self.config);
        builder.push_rows(&rows)?;
        builder.build()
    }
}

fn loaded(profile: VolumeProfile, origin: ProfileOrigin) -> LoadedProfile {
    info!(
        %origin,
        buckets = profile.len(),
        total_share = profile.total_share(),
        "volume profile ready"
    );
    LoadedProfile { profile, origin }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::{Duration, NaiveTime};
    use std::fmt::Write as _;
    use std::path::PathBuf;
    use volprofile_core::{BucketCategory, SessionWindow};

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    /// Minute-resolution profile text for the default session layout.
    ///
    /// Continuous minutes get weight 2 near the open and close and 1 elsewhere;
    /// `scale` multiplies every share so totals can be pushed off 1.0.
    fn profile_csv(scale: f64) -> String {
        let mut rows: Vec<(NaiveTime, NaiveTime, f64, &str)> = Vec::new();
        rows.push((t(9, 0), t(9, 30), 6.0, "POS"));
        for (open, close) in [(t(9, 30), t(12, 0)), (t(13, 0), t(16, 0))] {
            let mut start = open;
            while start < close {
                let end = start + Duration::minutes(1);
                let edge = start < t(9, 45) || start >= t(15, 45);
                rows.push((start, end, if edge { 2.0 } else { 1.0 }, "CTS"));
                if end == t(12, 0) {
                    rows.push((t(12, 0), t(13, 0), 0.0, "L"));
                }
                start = end;
            }
        }
        rows.push((t(16, 0), t(16, 10), 10.0, "CAS"));

        let weight: f64 = rows.iter().map(|r| r.2).sum();
        let mut text = String::from("start,end,percentage,type\n");
        for (start, end, w, code) in rows {
            writeln!(
                text,
                "{},{},{},{}",
                start.format("%H:%M"),
                end.format("%H:%M"),
                scale * w / weight,
                code
            )
            .unwrap();
        }
        text
    }

    fn config_with(dir: &Path, primary: &str, default: &str) -> Config {
        let mut config = Config::default();
        config.source.primary_path = dir.join(primary);
        config.source.default_path = dir.join(default);
        config
    }

    fn load_from(dir: &Path, primary: &str, default: &str) -> LoadedProfile {
        ProfileLoader::new(config_with(dir, primary, default)).unwrap().load()
    }

    fn default_loader() -> ProfileLoader {
        ProfileLoader::new(Config::default()).unwrap()
    }

    #[test]
    fn test_primary_source_used() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("0700_HK.csv"), profile_csv(1.0)).unwrap();

        let loaded = load_from(dir.path(), "0700_HK.csv", "HK.csv");
        assert_eq!(loaded.origin, ProfileOrigin::Primary);
        assert_eq!(loaded.profile.len(), 333);
        let close = loaded.profile.entry_at(t(16, 0)).unwrap();
        assert_eq!(close.category(), BucketCategory::CloseAuction);
    }

    #[test]
    fn test_invalid_primary_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("0700_HK.csv"), profile_csv(0.95)).unwrap();
        std::fs::write(dir.path().join("HK.csv"), profile_csv(1.0)).unwrap();

        let loaded = load_from(dir.path(), "0700_HK.csv", "HK.csv");
        assert_eq!(loaded.origin, ProfileOrigin::Default);
    }

    #[test]
    fn test_malformed_primary_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let malformed = "start,end,percentage,type\n09:00,09:30,0.5\n";
        std::fs::write(dir.path().join("0700_HK.csv"), malformed).unwrap();
        std::fs::write(dir.path().join("HK.csv"), profile_csv(1.0)).unwrap();

        let loaded = load_from(dir.path(), "0700_HK.csv", "HK.csv");
        assert_eq!(loaded.origin, ProfileOrigin::Default);
    }

    #[test]
    fn test_both_sources_absent_gives_synthetic() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_from(dir.path(), "missing.csv", "also_missing.csv");

        assert_eq!(loaded.origin, ProfileOrigin::Synthetic);
        let buckets = loaded.profile.buckets();
        assert!(buckets.windows(2).all(|p| p[0].end() == p[1].start()));
        let total: f64 = buckets.iter().map(|b| b.share()).sum();
        assert_abs_diff_eq!(total, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_invalid_session_layout_rejected() {
        let mut config = Config::default();
        config.session.lunch = SessionWindow::new(t(12, 0), t(12, 0));

        let err = ProfileLoader::new(config).err().unwrap();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_synthetic_fallback_follows_layout() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_with(dir.path(), "missing.csv", "also_missing.csv");
        config.session.afternoon = SessionWindow::new(t(13, 0), t(15, 0));
        config.session.close_auction = SessionWindow::new(t(15, 0), t(15, 10));

        let loaded = ProfileLoader::new(config).unwrap().load();
        assert_eq!(loaded.origin, ProfileOrigin::Synthetic);
        assert_eq!(loaded.profile.len(), 1 + 150 + 1 + 120 + 1);
        assert_eq!(loaded.profile.last_end(), Some(t(15, 10)));
    }

    #[test]
    fn test_load_path_wraps_cause() {
        let loader = default_loader();
        let path = PathBuf::from("/nonexistent/volprofile/HK.csv");
        let err = loader.load_path(&path).unwrap_err();

        assert!(matches!(err, Error::Load { .. }));
        assert!(matches!(err.root_cause(), Error::SourceNotFound(_)));
        assert!(err.to_string().contains("/nonexistent/volprofile/HK.csv"));
    }

    #[test]
    fn test_load_path_reports_validation_deviation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("HK.csv");
        std::fs::write(&path, profile_csv(0.95)).unwrap();

        let err = default_loader().load_path(&path).unwrap_err();
        assert!(matches!(err.root_cause(), Error::Validation(_)));
        assert!(err.to_string().contains("deviation 0.050000"));
    }

    #[test]
    fn test_loading_twice_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("HK.csv");
        std::fs::write(&path, profile_csv(1.0)).unwrap();

        let loader = default_loader();
        let first = loader.load_path(&path).unwrap();
        let second = loader.load_path(&path).unwrap();
        assert_eq!(first, second);

        let a = first.cumulative_percentage(t(9, 40), t(9, 50)).unwrap();
        let b = second.cumulative_percentage(t(9, 40), t(9, 50)).unwrap();
        assert_eq!(a, b);
        let a = first.normalized_target(t(10, 15), t(9, 30), t(11, 30)).unwrap();
        let b = second.normalized_target(t(10, 15), t(9, 30), t(11, 30)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_loaded_profile_invariants() {
        let profile = default_loader().load_str(&profile_csv(1.0)).unwrap();
        assert_abs_diff_eq!(profile.total_share(), 1.0, epsilon = 1e-4);
        let day = profile.cumulative_percentage(t(9, 0), t(16, 10)).unwrap();
        assert_abs_diff_eq!(day, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_load_str_invalid_header() {
        let err = default_loader()
            .load_str("start,end,share,category\n")
            .unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn test_shipped_profiles_load() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../..");
        let config = Config::from_json_file(root.join("config/volprofile.json")).unwrap();
        let loader = ProfileLoader::new(config).unwrap();

        for name in ["data/HK.csv", "data/0700_HK.csv"] {
            let profile = loader.load_path(&root.join(name)).unwrap();
            assert_eq!(profile.len(), 333, "{name}");
            let target = profile.normalized_target(t(10, 15), t(9, 30), t(11, 30)).unwrap();
            assert!(target > 0.0 && target < 1.0, "{name}: {target}");
        }
    }
}
