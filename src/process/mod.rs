// src/process/mod.rs

pub mod extract;
pub mod rate_table;

pub use extract::{extract_member, ExtractedMember};
pub use rate_table::{LookupResult, RateTable};
