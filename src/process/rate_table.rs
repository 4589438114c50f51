// src/process/rate_table.rs
use csv::{ReaderBuilder, StringRecord};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, error, info, instrument};

use crate::error::{Error, Result};
use crate::process::extract::ExtractedMember;

/// Cell contents read as "no value". Mirrors what common dataframe readers
/// treat as missing, so published CSVs with `N/A` gaps load the same way.
const NULL_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// One successful lookup, serialised as the HTTP response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupResult {
    pub currency: String,
    pub date: String,
    pub value: String,
}

#[derive(Debug)]
struct Row {
    date: String,
    /// Aligned with `RateTable::currencies`.
    values: Vec<Option<String>>,
}

/// Rates keyed by date (rows) and currency code (columns).
///
/// Values are kept as the source text so `"1.0900"` comes back as
/// `"1.0900"`, never as a re-rendered float.
#[derive(Debug)]
pub struct RateTable {
    date_column: String,
    currencies: Vec<String>,
    columns: HashMap<String, usize>,
    rows: Vec<Row>,
    /// First row index for each date; later duplicates are unreachable.
    by_date: HashMap<String, usize>,
}

impl RateTable {
    /// Parse a delimited table whose header names `date_column` as the row key,
    /// then drop every currency column that has no value at all.
    #[instrument(level = "info", skip(raw), fields(bytes = raw.as_bytes().len()))]
    pub fn build(raw: &ExtractedMember, date_column: &str) -> Result<Self> {
        match Self::parse(raw.as_bytes(), date_column) {
            Ok(mut table) => {
                table.prune_empty_columns();
                info!(
                    rows = table.len(),
                    currencies = table.currencies.len(),
                    "rate table loaded"
                );
                Ok(table)
            }
            Err(e) => {
                error!(error = %e, "failed to build rate table");
                Err(e)
            }
        }
    }

    fn parse(bytes: &[u8], date_column: &str) -> Result<Self> {
        let malformed = |e: csv::Error| Error::MalformedTable(e.to_string());

        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes);
        let headers: StringRecord = rdr.headers().map_err(malformed)?.clone();
        if headers.is_empty() {
            return Err(Error::MalformedTable("no header row".into()));
        }

        // blank header cells (trailing delimiters) get a placeholder so
        // several of them can coexist until pruning drops them
        let names: Vec<String> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                if h.is_empty() {
                    format!("Unnamed: {}", i)
                } else {
                    h.to_string()
                }
            })
            .collect();

        let mut seen = HashSet::with_capacity(names.len());
        if let Some(dup) = names.iter().find(|h| !seen.insert(h.as_str())) {
            return Err(Error::MalformedTable(format!("duplicate column {:?}", dup)));
        }

        let date_idx = names
            .iter()
            .position(|h| h == date_column)
            .ok_or_else(|| Error::MalformedTable(format!("missing date column {:?}", date_column)))?;

        let currencies: Vec<String> = names
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != date_idx)
            .map(|(_, h)| h.clone())
            .collect();

        let mut rows = Vec::new();
        let mut by_date = HashMap::new();
        for result in rdr.records() {
            let record = result.map_err(malformed)?;
            // short rows are padded with nulls, long ones have nowhere to go
            if record.len() > names.len() {
                let line = record.position().map_or(0, |p| p.line());
                return Err(Error::MalformedTable(format!(
                    "line {} has {} fields, header has {}",
                    line,
                    record.len(),
                    names.len()
                )));
            }
            let date = record.get(date_idx).unwrap_or_default().to_string();
            let values: Vec<Option<String>> = (0..names.len())
                .filter(|i| *i != date_idx)
                .map(|i| record.get(i).and_then(cell))
                .collect();
            by_date.entry(date.clone()).or_insert(rows.len());
            rows.push(Row { date, values });
        }

        let columns = index_columns(&currencies);
        Ok(Self {
            date_column: date_column.to_string(),
            currencies,
            columns,
            rows,
            by_date,
        })
    }

    /// Remove currency columns that are null in every row. Columns with at
    /// least one value stay, however sparse.
    fn prune_empty_columns(&mut self) {
        let keep: Vec<bool> = (0..self.currencies.len())
            .map(|c| self.rows.iter().any(|row| row.values[c].is_some()))
            .collect();
        if keep.iter().all(|k| *k) {
            return;
        }

        let dropped: Vec<&str> = self
            .currencies
            .iter()
            .zip(&keep)
            .filter(|(_, k)| !**k)
            .map(|(c, _)| c.as_str())
            .collect();
        debug!(?dropped, "dropping empty columns");

        retain_by_mask(&mut self.currencies, &keep);
        for row in &mut self.rows {
            retain_by_mask(&mut row.values, &keep);
        }
        self.columns = index_columns(&self.currencies);
    }

    /// Rate of `currency` on `date`.
    ///
    /// Checks run currency first, then date, then the cell itself, so an
    /// unknown currency on an unknown date reports the currency.
    pub fn lookup(&self, date: &str, currency: &str) -> Result<LookupResult> {
        let found = self.find(date, currency);
        if let Err(e) = &found {
            error!(date, currency, error = %e, "lookup failed");
        }
        found
    }

    fn find(&self, date: &str, currency: &str) -> Result<LookupResult> {
        let col = match self.columns.get(currency) {
            Some(&col) if currency != self.date_column => col,
            _ => return Err(Error::CurrencyNotAvailable(currency.to_string())),
        };
        let row = self
            .by_date
            .get(date)
            .map(|&i| &self.rows[i])
            .ok_or_else(|| Error::DateNotAvailable(date.to_string()))?;
        let value = row.values[col]
            .as_ref()
            .ok_or_else(|| Error::DataNotAvailable {
                currency: currency.to_string(),
                date: row.date.clone(),
            })?;

        Ok(LookupResult {
            currency: currency.to_string(),
            date: row.date.clone(),
            value: value.clone(),
        })
    }

    /// Queryable currency codes in source column order.
    pub fn currencies(&self) -> &[String] {
        &self.currencies
    }

    pub fn date_column(&self) -> &str {
        &self.date_column
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn cell(field: &str) -> Option<String> {
    if NULL_MARKERS.contains(&field) {
        None
    } else {
        Some(field.to_string())
    }
}

fn index_columns(currencies: &[String]) -> HashMap<String, usize> {
    currencies
        .iter()
        .enumerate()
        .map(|(i, c)| (c.clone(), i))
        .collect()
}

fn retain_by_mask<T>(items: &mut Vec<T>, keep: &[bool]) {
    let mut i = 0;
    items.retain(|_| {
        let k = keep[i];
        i += 1;
        k
    });
}
