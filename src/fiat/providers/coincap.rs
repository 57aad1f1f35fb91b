//! CoinCap historical price source.
//!
//! Uses CoinCap's asset-history API, which buckets prices at a configurable
//! interval and bounds queries with unix-millisecond timestamps.
//! Docs: https://docs.coincap.io/

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::fiat::models::validate_range;
use crate::fiat::{retry_query, Granularity, PriceError, PricePoint, PriceSource, RetryConfig};

const COINCAP_API_BASE: &str = "https://api.coincap.io";

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    data: Vec<HistoryPoint>,
}

#[derive(Debug, Deserialize)]
struct HistoryPoint {
    /// CoinCap encodes prices as JSON strings, but numbers have been
    /// observed too, so both are accepted.
    #[serde(rename = "priceUsd")]
    price_usd: serde_json::Value,
    time: i64,
}

/// Variable-granularity historical price source backed by CoinCap's API.
///
/// The aggregation interval is fixed at construction; selecting this backend
/// without one is rejected by the backend factory.
#[derive(Debug)]
pub struct CoinCapSource {
    client: reqwest::Client,
    base_url: String,
    granularity: Granularity,
    clock: Arc<dyn Clock>,
    retry: RetryConfig,
}

impl CoinCapSource {
    pub fn new(granularity: Granularity) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: COINCAP_API_BASE.to_string(),
            granularity,
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

    async fn fetch_history(&self, url: &str) -> Result<Vec<u8>, PriceError> {
        let response = self.client.get(url).send().await?.error_for_status()?;

        Ok(response.bytes().await?.to_vec())
    }
}

fn parse_history(raw: &[u8]) -> Result<Vec<PricePoint>, PriceError> {
    let response: HistoryResponse =
        serde_json::from_slice(raw).map_err(|err| PriceError::Parse(err.to_string()))?;

    response
        .data
        .into_iter()
        .map(|point| {
            let price = match &point.price_usd {
                serde_json::Value::String(price) => Decimal::from_str(price)
                    .map_err(|err| PriceError::Parse(format!("bad price {price:?}: {err}")))?,
                serde_json::Value::Number(price) => Decimal::from_str(&price.to_string())
                    .map_err(|err| PriceError::Parse(format!("bad price {price}: {err}")))?,
                other => {
                    return Err(PriceError::Parse(format!(
                        "unexpected priceUsd value: {other}"
                    )))
                }
            };

            let timestamp = Utc
                .timestamp_millis_opt(point.time)
                .single()
                .ok_or_else(|| {
                    PriceError::Parse(format!("invalid unix milliseconds {}", point.time))
                })?;

            Ok(PricePoint { timestamp, price })
        })
        .collect()
}

#[async_trait]
impl PriceSource for CoinCapSource {
    async fn price_history(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>, PriceError> {
        validate_range(start, end, self.clock.now())?;

        let url = format!(
            "{}/v2/assets/bitcoin/history?interval={}&start={}&end={}",
            self.base_url,
            self.granularity.interval(),
            start.timestamp_millis(),
            end.timestamp_millis(),
        );
        debug!(url = %url, "requesting coincap asset history");

        retry_query(|| self.fetch_history(&url), parse_history, &self.retry).await
    }

    fn currency(&self) -> &str {
        "USD"
    }

    fn name(&self) -> &str {
        "coincap"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_HISTORY_RESPONSE: &str = r#"{
        "data": [
            {
                "priceUsd": "42685.1234",
                "time": 1704067200000
            },
            {
                "priceUsd": 43000.5,
                "time": 1704070800000
            }
        ],
        "timestamp": 1704153600000
    }"#;

    #[test]
    fn parses_string_and_numeric_prices() {
        let points = parse_history(SAMPLE_HISTORY_RESPONSE.as_bytes()).unwrap();

        let expected = vec![
            PricePoint {
                timestamp: Utc.timestamp_millis_opt(1_704_067_200_000).unwrap(),
                price: Decimal::from_str("42685.1234").unwrap(),
            },
            PricePoint {
                timestamp: Utc.timestamp_millis_opt(1_704_070_800_000).unwrap(),
                price: Decimal::from_str("43000.5").unwrap(),
            },
        ];
        assert_eq!(points, expected);
    }

    #[test]
    fn rejects_non_numeric_prices() {
        let raw = br#"{"data": [{"priceUsd": null, "time": 1704067200000}]}"#;

        let err = parse_history(raw).unwrap_err();
        assert!(matches!(err, PriceError::Parse(_)));
    }

    #[test]
    fn empty_history_parses_to_an_empty_series() {
        let points = parse_history(br#"{"data": []}"#).unwrap();
        assert!(points.is_empty());
    }
}
