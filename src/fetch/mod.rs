// src/fetch/mod.rs

/// Downloading a single archive into memory
pub mod zips;

pub use zips::{fetch_archive, ArchiveBlob};
