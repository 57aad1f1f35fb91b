use chrono::{DateTime, Utc};

/// Errors produced while resolving historical fiat prices.
#[derive(Debug, thiserror::Error)]
pub enum PriceError {
    /// The requested range is reversed or extends past the current time.
    #[error("invalid price range: {start} to {end} is reversed or ends in the future")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// A granularity-dependent backend was selected without a granularity.
    #[error("granularity required when fiat prices are enabled")]
    GranularityRequired,

    #[error("unknown price backend: {0:?}")]
    UnknownBackend(String),

    #[error("unknown price granularity: {0:?}")]
    UnknownGranularity(String),

    /// The custom backend was selected without a price file path.
    #[error("price file path required for the custom backend")]
    PricePathRequired,

    /// A custom price file record did not have exactly two fields. This
    /// aborts the entire read; there are no partial results.
    #[error("malformed price record on line {line}: expected 2 fields, got {fields}")]
    MalformedRecord { line: u64, fields: usize },

    #[error("no price data provided")]
    NoPriceData,

    #[error("timestamp before beginning of price dataset")]
    TimestampOutOfRange,

    #[error("price query failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("could not read price file: {0}")]
    Csv(#[from] csv::Error),

    #[error("could not parse price data: {0}")]
    Parse(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
