// src/error.rs
use thiserror::Error;

/// Everything the fetch → extract → table pipeline can fail with.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Error making request to {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP error {code}")]
    HttpStatus { code: u16 },

    #[error("Invalid archive: {0}")]
    ArchiveFormat(#[from] zip::result::ZipError),

    #[error("Specified file not found: {0}")]
    MemberNotFound(String),

    #[error("Malformed table: {0}")]
    MalformedTable(String),

    #[error("Currency not available: {0}")]
    CurrencyNotAvailable(String),

    #[error("Date not available: {0}")]
    DateNotAvailable(String),

    #[error("Currency data not available: {currency}, {date}")]
    DataNotAvailable { currency: String, date: String },
}

impl Error {
    /// True for the kinds raised per request by `RateTable::lookup`.
    pub fn is_lookup(&self) -> bool {
        matches!(
            self,
            Error::CurrencyNotAvailable(_)
                | Error::DateNotAvailable(_)
                | Error::DataNotAvailable { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
