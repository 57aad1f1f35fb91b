//! Custom price source reading a local CSV file.
//!
//! Each record is `unix_seconds,price` with no header row. The quote
//! currency is supplied by configuration rather than read from the file, so
//! the source is not pinned to one fiat currency.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::fiat::models::validate_range;
use crate::fiat::{retry_query, FiatRecord, PriceError, PricePoint, PriceSource, RetryConfig};

/// Price source over a local two-column CSV file.
#[derive(Debug)]
pub struct CustomCsvSource {
    path: PathBuf,
    currency: String,
    clock: Arc<dyn Clock>,
    retry: RetryConfig,
}

impl CustomCsvSource {
    pub fn new(path: impl Into<PathBuf>, currency: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            currency: currency.into(),
            clock: Arc::new(SystemClock),
            retry: RetryConfig::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

/// Decodes CSV price records, preserving file order.
///
/// Every record must be exactly a unix-seconds timestamp followed by a
/// decimal price. A record of any other shape fails the whole read; no
/// partial results are produced.
fn parse_price_records(raw: &[u8], currency: &str) -> Result<Vec<FiatRecord>, PriceError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(raw);

    let mut records = Vec::new();

    for (index, row) in reader.records().enumerate() {
        let row = row?;
        let line = index as u64 + 1;

        if row.len() != 2 {
            return Err(PriceError::MalformedRecord {
                line,
                fields: row.len(),
            });
        }

        let seconds = i64::from_str(row[0].trim()).map_err(|err| {
            PriceError::Parse(format!("bad unix timestamp {:?} on line {line}: {err}", &row[0]))
        })?;
        let timestamp = Utc.timestamp_opt(seconds, 0).single().ok_or_else(|| {
            PriceError::Parse(format!("unrepresentable unix timestamp {seconds} on line {line}"))
        })?;

        let price = Decimal::from_str(row[1].trim()).map_err(|err| {
            PriceError::Parse(format!("bad price {:?} on line {line}: {err}", &row[1]))
        })?;

        records.push(FiatRecord {
            timestamp,
            price,
            currency: currency.to_string(),
        });
    }

    Ok(records)
}

#[async_trait]
impl PriceSource for CustomCsvSource {
    async fn price_history(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>, PriceError> {
        validate_range(start, end, self.clock.now())?;

        debug!(path = %self.path.display(), "reading custom price file");

        let fetch = || async { tokio::fs::read(&self.path).await.map_err(PriceError::from) };
        let parse = |raw: &[u8]| -> Result<Vec<PricePoint>, PriceError> {
            let records = parse_price_records(raw, &self.currency)?;

            Ok(records.into_iter().map(PricePoint::from).collect())
        };

        retry_query(fetch, parse, &self.retry).await
    }

    fn currency(&self) -> &str {
        &self.currency
    }

    fn name(&self) -> &str {
        "custom"
    }
}
