// src/fetch/zips.rs
use reqwest::{Client, StatusCode};
use tracing::{error, info, instrument};

use crate::error::{Error, Result};

/// Raw bytes of a downloaded archive, handed straight to extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveBlob(Vec<u8>);

impl ArchiveBlob {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for ArchiveBlob {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// Download `url` into memory.
///
/// Anything but a plain `200 OK` is an error; there are no retries and no
/// timeout beyond what `client` was built with.
#[instrument(level = "info", skip(client))]
pub async fn fetch_archive(client: &Client, url: &str) -> Result<ArchiveBlob> {
    match download(client, url).await {
        Ok(blob) => {
            info!(%url, bytes = blob.len(), "File successfully downloaded");
            Ok(blob)
        }
        Err(e) => {
            error!(%url, error = %e, "archive download failed");
            Err(e)
        }
    }
}

async fn download(client: &Client, url: &str) -> Result<ArchiveBlob> {
    let transport = |source: reqwest::Error| Error::Transport {
        url: url.to_string(),
        source,
    };

    let resp = client.get(url).send().await.map_err(transport)?;
    if resp.status() != StatusCode::OK {
        return Err(Error::HttpStatus {
            code: resp.status().as_u16(),
        });
    }
    let bytes = resp.bytes().await.map_err(transport)?;
    Ok(ArchiveBlob(bytes.to_vec()))
}
