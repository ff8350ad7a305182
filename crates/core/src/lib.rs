//! Core types and configuration for the intraday volume profile.
//!
//! This crate provides shared types used across all other crates:
//! - Profile buckets and session categories
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, SessionLayout, SessionWindow, SourceConfig, ValidationConfig};
pub use error::{Error, Result};
pub use types::*;
