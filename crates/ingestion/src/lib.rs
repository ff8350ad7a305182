//! Profile file ingestion for the volume profile system.
//!
//! This crate handles:
//! - Locating a profile source and signalling when it is absent
//! - Header verification
//! - Splitting data lines into raw, untyped rows

pub mod row_source;

pub use row_source::{read_rows_from_path, read_rows_from_str, RawRow};
