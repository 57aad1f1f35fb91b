//! Historical BTC-to-fiat price resolution.
//!
//! A batch of query timestamps is resolved against one of several
//! interchangeable price sources: the covering time range is fetched once,
//! re-sorted defensively, and each timestamp is mapped to the last price at
//! or before it. Monetary arithmetic is fixed-point decimal throughout.

mod convert;
mod error;
mod lookup;
mod models;
pub mod providers;
mod retry;
mod service;
mod source;

pub use convert::{msat_to_fiat, MSAT_PER_BTC};
pub use error::PriceError;
pub use lookup::spot_price;
pub use models::{
    FiatRecord, FiatValue, Granularity, MilliSatoshi, PriceBackend, PricePoint, PriceRequest,
    PriceSourceConfig,
};
pub use retry::{retry_query, RetryConfig};
pub use service::PriceService;
pub use source::{new_price_source, PriceSource};
