//! CoinDesk historical price source.
//!
//! Uses CoinDesk's closing-price API, which aggregates at day granularity
//! and keys prices by calendar date.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::fiat::models::validate_range;
use crate::fiat::{retry_query, PriceError, PricePoint, PriceSource, RetryConfig};

const COINDESK_API_BASE: &str = "https://api.coindesk.com";

/// The date format CoinDesk keys prices by.
const COINDESK_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Deserialize)]
struct CloseHistoryResponse {
    bpi: HashMap<String, f64>,
}

/// Day-granularity historical price source backed by CoinDesk's API.
#[derive(Debug)]
pub struct CoinDeskSource {
    client: reqwest::Client,
    base_url: String,
    clock: Arc<dyn Clock>,
    retry: RetryConfig,
}

impl CoinDeskSource {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: COINDESK_API_BASE.to_string(),
            clock: Arc::new(SystemClock),
            retry: RetryConfig::default(),
        }
    }

    /// Points the source at a different endpoint (used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    async fn fetch_close_history(&self, url: &str) -> Result<Vec<u8>, PriceError> {
        let response = self.client.get(url).send().await?.error_for_status()?;

        Ok(response.bytes().await?.to_vec())
    }
}

impl Default for CoinDeskSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses the flat date-to-price mapping returned by the close endpoint.
fn parse_close_history(raw: &[u8]) -> Result<Vec<PricePoint>, PriceError> {
    let response: CloseHistoryResponse =
        serde_json::from_slice(raw).map_err(|err| PriceError::Parse(err.to_string()))?;

    let mut points = Vec::with_capacity(response.bpi.len());

    for (date, price) in response.bpi {
        let day = NaiveDate::parse_from_str(&date, COINDESK_DATE_FORMAT)
            .map_err(|err| PriceError::Parse(format!("bad price date {date:?}: {err}")))?;
        let timestamp = Utc.from_utc_datetime(&day.and_hms_opt(0, 0, 0).unwrap());

        let price = Decimal::from_f64(price)
            .ok_or_else(|| PriceError::Parse(format!("unrepresentable price {price}")))?;

        points.push(PricePoint { timestamp, price });
    }

    Ok(points)
}

#[async_trait]
impl PriceSource for CoinDeskSource {
    async fn price_history(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>, PriceError> {
        validate_range(start, end, self.clock.now())?;

        // CoinDesk aggregates by day and omits the in-progress day, so back
        // the start date up by one period to guarantee at least one data
        // point even for single-day queries.
        let start = start - Duration::days(1);

        let url = format!(
            "{}/v1/bpi/historical/close.json?start={}&end={}",
            self.base_url,
            start.format(COINDESK_DATE_FORMAT),
            end.format(COINDESK_DATE_FORMAT),
        );
        debug!(url = %url, "requesting coindesk close history");

        retry_query(
            || self.fetch_close_history(&url),
            parse_close_history,
            &self.retry,
        )
        .await
    }

    fn currency(&self) -> &str {
        "USD"
    }

    fn name(&self) -> &str {
        "coindesk"
    }
}
