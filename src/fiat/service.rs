use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::clock::{Clock, SystemClock};

use super::{
    msat_to_fiat, new_price_source, spot_price, FiatValue, PriceError, PricePoint, PriceRequest,
    PriceSourceConfig, RetryConfig,
};

/// Resolves historical prices for batches of timestamps against a configured
/// price source.
///
/// Each resolution call constructs its own backend instance and series, so a
/// service can be shared across tasks without locking.
pub struct PriceService {
    config: PriceSourceConfig,
    clock: Arc<dyn Clock>,
    retry: RetryConfig,
}

impl PriceService {
    pub fn new(config: PriceSourceConfig) -> Self {
        Self {
            config,
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

    /// Resolves a price point for every timestamp in the batch.
    ///
    /// The covering range is fetched from the source exactly once and each
    /// timestamp is resolved against it with last-value-before-or-equal
    /// semantics. Any lookup failure aborts the whole call; a partial
    /// mapping is never returned. An empty batch resolves to an empty
    /// mapping without touching the source.
    pub async fn price_index(
        &self,
        timestamps: &[DateTime<Utc>],
    ) -> Result<HashMap<DateTime<Utc>, PricePoint>, PriceError> {
        if timestamps.is_empty() {
            return Ok(HashMap::new());
        }

        debug!(
            requests = timestamps.len(),
            backend = %self.config.backend,
            "resolving historical prices"
        );

        // Sort the query timestamps ascending to get the covering range.
        // Start and end may be the same timestamp if the batch has a single
        // entry, which is fine.
        let mut sorted = timestamps.to_vec();
        sorted.sort();

        let start = sorted[0];
        let end = sorted[sorted.len() - 1];

        let source = new_price_source(&self.config, Arc::clone(&self.clock), self.retry.clone())?;

        let mut series = source.price_history(start, end).await?;

        // Sources are not trusted to order their series. The sort is stable,
        // so duplicate timestamps keep the source's order and the latest
        // entry wins lookups.
        series.sort_by_key(|point| point.timestamp);

        let mut prices = HashMap::with_capacity(sorted.len());

        for timestamp in sorted {
            let point = spot_price(&series, timestamp)?;
            prices.insert(timestamp, point.clone());
        }

        Ok(prices)
    }

    /// Prices a batch of requests, converting each msat amount to its fiat
    /// value at the request's timestamp. Results are in request order.
    pub async fn fiat_values(
        &self,
        requests: &[PriceRequest],
    ) -> Result<Vec<FiatValue>, PriceError> {
        let timestamps: Vec<DateTime<Utc>> =
            requests.iter().map(|request| request.timestamp).collect();
        let prices = self.price_index(&timestamps).await?;

        let currency = self.config.quote_currency();

        let values = requests
            .iter()
            .map(|request| {
                let point = prices
                    .get(&request.timestamp)
                    .expect("the index covers every request timestamp");

                FiatValue {
                    identifier: request.identifier.clone(),
                    amount: request.amount,
                    price: point.clone(),
                    value: msat_to_fiat(point.price, request.amount),
                    currency: currency.to_string(),
                }
            })
            .collect();

        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use crate::fiat::PriceBackend;

    use super::*;

    #[tokio::test]
    async fn empty_batch_resolves_to_an_empty_index() {
        let service = PriceService::new(PriceSourceConfig::new(PriceBackend::CoinDesk));

        let prices = service.price_index(&[]).await.unwrap();
        assert!(prices.is_empty());
    }

    #[tokio::test]
    async fn empty_batch_skips_backend_construction() {
        // CoinCap without a granularity only fails once there is something
        // to resolve.
        let service = PriceService::new(PriceSourceConfig::new(PriceBackend::CoinCap));

        let prices = service.price_index(&[]).await.unwrap();
        assert!(prices.is_empty());
    }
}
