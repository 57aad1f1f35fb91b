use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::PriceError;

/// A millisatoshi amount. 1 BTC = 10^8 satoshi = 10^11 millisatoshi.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MilliSatoshi(u64);

impl MilliSatoshi {
    pub const fn new(msat: u64) -> Self {
        Self(msat)
    }

    pub const fn to_u64(self) -> u64 {
        self.0
    }
}

impl From<u64> for MilliSatoshi {
    fn from(msat: u64) -> Self {
        Self(msat)
    }
}

impl fmt::Display for MilliSatoshi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} msat", self.0)
    }
}

/// One entry in a historical price series: the price of a whole bitcoin in
/// the source's quote currency at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: Decimal,
}

/// A price record with an explicit currency code. Produced by the custom
/// file source, which is not pinned to one fiat currency; the currency is
/// supplied by configuration, not read from the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiatRecord {
    pub timestamp: DateTime<Utc>,
    pub price: Decimal,
    pub currency: String,
}

impl From<FiatRecord> for PricePoint {
    fn from(record: FiatRecord) -> Self {
        Self {
            timestamp: record.timestamp,
            price: record.price,
        }
    }
}

/// Describes one amount to be priced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRequest {
    /// Uniquely identifies the request.
    pub identifier: String,

    /// The amount of BTC in msat.
    pub amount: MilliSatoshi,

    /// The time at which the price should be obtained.
    pub timestamp: DateTime<Utc>,
}

/// A priced request: the resolved price point and the converted fiat value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiatValue {
    pub identifier: String,
    pub amount: MilliSatoshi,
    pub price: PricePoint,
    pub value: Decimal,
    pub currency: String,
}

/// The aggregation bucket size used by price sources that support variable
/// resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Minute,
    FiveMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    Hour,
    SixHours,
    TwelveHours,
    Day,
}

impl Granularity {
    /// The interval label used in provider queries.
    pub fn interval(&self) -> &'static str {
        match self {
            Granularity::Minute => "m1",
            Granularity::FiveMinutes => "m5",
            Granularity::FifteenMinutes => "m15",
            Granularity::ThirtyMinutes => "m30",
            Granularity::Hour => "h1",
            Granularity::SixHours => "h6",
            Granularity::TwelveHours => "h12",
            Granularity::Day => "d1",
        }
    }

    /// The duration of one aggregation bucket.
    pub fn period(&self) -> Duration {
        match self {
            Granularity::Minute => Duration::minutes(1),
            Granularity::FiveMinutes => Duration::minutes(5),
            Granularity::FifteenMinutes => Duration::minutes(15),
            Granularity::ThirtyMinutes => Duration::minutes(30),
            Granularity::Hour => Duration::hours(1),
            Granularity::SixHours => Duration::hours(6),
            Granularity::TwelveHours => Duration::hours(12),
            Granularity::Day => Duration::days(1),
        }
    }
}

impl FromStr for Granularity {
    type Err = PriceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "m1" => Ok(Granularity::Minute),
            "m5" => Ok(Granularity::FiveMinutes),
            "m15" => Ok(Granularity::FifteenMinutes),
            "m30" => Ok(Granularity::ThirtyMinutes),
            "h1" => Ok(Granularity::Hour),
            "h6" => Ok(Granularity::SixHours),
            "h12" => Ok(Granularity::TwelveHours),
            "d1" => Ok(Granularity::Day),
            other => Err(PriceError::UnknownGranularity(other.to_string())),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.interval())
    }
}

/// Selects which historical price source to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceBackend {
    /// CoinDesk's closing-price API. Day granularity only.
    CoinDesk,
    /// CoinCap's asset-history API. Requires a configured granularity.
    CoinCap,
    /// A local two-column CSV file of (unix seconds, price) records.
    CustomCsv,
}

impl FromStr for PriceBackend {
    type Err = PriceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "coindesk" => Ok(PriceBackend::CoinDesk),
            "coincap" => Ok(PriceBackend::CoinCap),
            "custom" => Ok(PriceBackend::CustomCsv),
            other => Err(PriceError::UnknownBackend(other.to_string())),
        }
    }
}

impl fmt::Display for PriceBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PriceBackend::CoinDesk => "coindesk",
            PriceBackend::CoinCap => "coincap",
            PriceBackend::CustomCsv => "custom",
        };
        f.write_str(name)
    }
}

/// A validated price source selection, handed in by the configuration layer.
#[derive(Debug, Clone)]
pub struct PriceSourceConfig {
    pub backend: PriceBackend,

    /// Required when the backend supports variable resolution.
    pub granularity: Option<Granularity>,

    /// Path to the price file for the custom backend.
    pub prices_path: Option<PathBuf>,

    /// Currency code for custom price files. The HTTP backends quote USD
    /// regardless of this value.
    pub currency: String,
}

impl PriceSourceConfig {
    pub fn new(backend: PriceBackend) -> Self {
        Self {
            backend,
            granularity: None,
            prices_path: None,
            currency: "USD".to_string(),
        }
    }

    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = Some(granularity);
        self
    }

    pub fn with_prices_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.prices_path = Some(path.into());
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    /// The quote currency of prices returned by the selected backend.
    pub fn quote_currency(&self) -> &str {
        match self.backend {
            PriceBackend::CustomCsv => &self.currency,
            _ => "USD",
        }
    }
}

/// Checks that `start` does not come after `end` and that the range does not
/// extend past `now`.
pub(crate) fn validate_range(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<(), PriceError> {
    if start > end || end > now {
        return Err(PriceError::InvalidRange { start, end });
    }

    Ok(())
}
