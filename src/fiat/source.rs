use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::clock::Clock;

use super::providers::{CoinCapSource, CoinDeskSource, CustomCsvSource};
use super::{PriceBackend, PriceError, PricePoint, PriceSourceConfig, RetryConfig};

/// A historical price source. Given a time range, returns a gap-tolerant
/// series of price points covering it.
#[async_trait]
pub trait PriceSource: Send + Sync + std::fmt::Debug {
    /// Fetches price points for the given range. Implementations validate
    /// that the range is not reversed and does not extend into the future.
    /// Ordering of the returned series is not guaranteed; callers sort.
    async fn price_history(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>, PriceError>;

    /// The quote currency of returned prices.
    fn currency(&self) -> &str;

    fn name(&self) -> &str;
}

/// Instantiates the price source selected by `config`.
///
/// Configuration errors surface here, before any query is made: the CoinCap
/// backend requires a granularity and the custom backend requires a file
/// path.
pub fn new_price_source(
    config: &PriceSourceConfig,
    clock: Arc<dyn Clock>,
    retry: RetryConfig,
) -> Result<Box<dyn PriceSource>, PriceError> {
    match config.backend {
        PriceBackend::CoinDesk => Ok(Box::new(
            CoinDeskSource::new().with_clock(clock).with_retry(retry),
        )),
        PriceBackend::CoinCap => {
            let granularity = config
                .granularity
                .ok_or(PriceError::GranularityRequired)?;

            Ok(Box::new(
                CoinCapSource::new(granularity)
                    .with_clock(clock)
                    .with_retry(retry),
            ))
        }
        PriceBackend::CustomCsv => {
            let path = config
                .prices_path
                .clone()
                .ok_or(PriceError::PricePathRequired)?;

            Ok(Box::new(
                CustomCsvSource::new(path, config.currency.clone())
                    .with_clock(clock)
                    .with_retry(retry),
            ))
        }
    }
}
