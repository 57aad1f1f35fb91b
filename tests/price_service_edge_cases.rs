use std::io::Write;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use chrono::{TimeZone, Utc};
use pricebook::clock::FixedClock;
use pricebook::fiat::{
    MilliSatoshi, PriceBackend, PriceError, PriceRequest, PriceService, PriceSourceConfig,
};
use rust_decimal::Decimal;
use tempfile::NamedTempFile;

#[tokio::test]
async fn granularity_error_surfaces_before_any_query() -> Result<()> {
    let service = PriceService::new(PriceSourceConfig::new(PriceBackend::CoinCap));

    let timestamps = vec![Utc.timestamp_opt(5_000, 0).unwrap()];

    let err = service.price_index(&timestamps).await.unwrap_err();
    assert!(matches!(err, PriceError::GranularityRequired));

    Ok(())
}

#[tokio::test]
async fn fiat_values_convert_batch_requests() -> Result<()> {
    let mut file = NamedTempFile::new()?;
    file.write_all(b"2000,20000\n10000,40000\n")?;

    let config = PriceSourceConfig::new(PriceBackend::CustomCsv)
        .with_prices_path(file.path())
        .with_currency("EUR");
    let service = PriceService::new(config).with_clock(Arc::new(FixedClock::new(
        Utc.timestamp_opt(20_000, 0).unwrap(),
    )));

    let requests = vec![
        PriceRequest {
            identifier: "channel-open".to_string(),
            amount: MilliSatoshi::new(100_000),
            timestamp: Utc.timestamp_opt(2_500, 0).unwrap(),
        },
        PriceRequest {
            identifier: "payment".to_string(),
            amount: MilliSatoshi::new(50_000),
            timestamp: Utc.timestamp_opt(10_000, 0).unwrap(),
        },
    ];

    let values = service.fiat_values(&requests).await?;

    assert_eq!(values.len(), 2);

    // 20000 / 10^11 * 100000 msat.
    assert_eq!(values[0].identifier, "channel-open");
    assert_eq!(values[0].value, Decimal::from_str("0.02")?);
    assert_eq!(values[0].price.price, Decimal::from(20_000));
    assert_eq!(values[0].currency, "EUR");

    // 40000 / 10^11 * 50000 msat.
    assert_eq!(values[1].identifier, "payment");
    assert_eq!(values[1].value, Decimal::from_str("0.02")?);
    assert_eq!(values[1].price.price, Decimal::from(40_000));

    Ok(())
}

#[tokio::test]
async fn fiat_values_of_an_empty_batch_are_empty() -> Result<()> {
    let service = PriceService::new(PriceSourceConfig::new(PriceBackend::CoinDesk));

    let values = service.fiat_values(&[]).await?;
    assert!(values.is_empty());

    Ok(())
}

#[tokio::test]
async fn single_timestamp_batches_use_a_degenerate_range() -> Result<()> {
    let mut file = NamedTempFile::new()?;
    file.write_all(b"2000,110000\n")?;

    let config = PriceSourceConfig::new(PriceBackend::CustomCsv)
        .with_prices_path(file.path())
        .with_currency("USD");
    let service = PriceService::new(config).with_clock(Arc::new(FixedClock::new(
        Utc.timestamp_opt(20_000, 0).unwrap(),
    )));

    // Start and end of the covering range collapse to the same instant.
    let timestamp = Utc.timestamp_opt(3_000, 0).unwrap();
    let prices = service.price_index(&[timestamp]).await?;

    assert_eq!(prices.len(), 1);
    assert_eq!(prices[&timestamp].price, Decimal::from(110_000));

    Ok(())
}

#[test]
fn backend_selection_rejects_unknown_names() {
    let err = "bitfinex".parse::<PriceBackend>().unwrap_err();
    assert!(matches!(err, PriceError::UnknownBackend(name) if name == "bitfinex"));
}
