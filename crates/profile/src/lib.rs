//! Volume profile construction and queries.
//!
//! This crate handles:
//! - Bucket validation (continuity, share totals, session durations)
//! - Building profiles from raw rows
//! - Flat (time-weighted) profile generation
//! - Cumulative volume and normalized target queries
//! - Loading with the primary / default / synthetic fallback chain

pub mod validator;
pub mod builder;
pub mod synthetic;
pub mod profile;
pub mod loader;

pub use validator::BucketValidator;
pub use builder::ProfileBuilder;
pub use synthetic::flat_profile;
pub use profile::VolumeProfile;
pub use loader::{LoadedProfile, ProfileLoader, ProfileOrigin};
