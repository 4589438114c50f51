// src/lib.rs
pub mod api;
pub mod config;
pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod process;

pub use error::{Error, Result};
