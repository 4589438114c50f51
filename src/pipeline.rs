// src/pipeline.rs
use reqwest::Client;
use tracing::{info, instrument};

use crate::config::Config;
use crate::error::Result;
use crate::fetch::fetch_archive;
use crate::process::{extract_member, RateTable};

/// Download → unzip → parse. Runs once before the server starts; each step
/// has already logged its own failure by the time an error comes back here.
#[instrument(level = "info", skip_all, fields(url = %config.zip_url, member = %config.file_to_extract))]
pub async fn load_rate_table(client: &Client, config: &Config) -> Result<RateTable> {
    let archive = fetch_archive(client, &config.zip_url).await?;
    let member = extract_member(&archive, &config.file_to_extract)?;
    drop(archive);

    let table = RateTable::build(&member, &config.date_column)?;
    info!(
        rows = table.len(),
        currencies = table.currencies().len(),
        "rate table ready"
    );
    Ok(table)
}
