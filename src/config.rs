// src/config.rs
use anyhow::{Context, Result};
use std::{env, net::SocketAddr, path::PathBuf};

const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:5000";
const DEFAULT_DATE_COLUMN: &str = "Date";

/// Process settings, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Where the rates archive is downloaded from (`ZIP_URL`).
    pub zip_url: String,
    /// Archive member holding the rate table (`FILE_TO_EXTRACT`).
    pub file_to_extract: String,
    /// Log file, appended to; stdout when unset (`LOG_FILE`).
    pub log_file: Option<PathBuf>,
    pub listen_addr: SocketAddr,
    /// Header of the row-key column (`DATE_COLUMN`).
    pub date_column: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key → value source; empty values count as unset.
    pub fn from_lookup<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| get(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| get(key).with_context(|| format!("{} must be set", key));

        let listen_addr = get("LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = listen_addr
            .parse::<SocketAddr>()
            .with_context(|| format!("invalid LISTEN_ADDR {:?}", listen_addr))?;

        Ok(Self {
            zip_url: required("ZIP_URL")?,
            file_to_extract: required("FILE_TO_EXTRACT")?,
            log_file: get("LOG_FILE").map(PathBuf::from),
            listen_addr,
            date_column: get("DATE_COLUMN").unwrap_or_else(|| DEFAULT_DATE_COLUMN.to_string()),
        })
    }
}
