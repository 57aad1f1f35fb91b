use rust_decimal::Decimal;

use super::MilliSatoshi;

/// Millisatoshis in one bitcoin: 10^8 satoshi, 1000 msat each.
pub const MSAT_PER_BTC: u64 = 100_000_000_000;

/// Converts a msat amount to its fiat value, given the price of a whole
/// bitcoin. The quoted price is scaled down to a price per msat before
/// multiplying, all in fixed-point decimal arithmetic. No rounding is
/// applied; presentation rounding is the caller's concern.
pub fn msat_to_fiat(price: Decimal, amount: MilliSatoshi) -> Decimal {
    let price_per_msat = price / Decimal::from(MSAT_PER_BTC);

    price_per_msat * Decimal::from(amount.to_u64())
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn converts_at_msat_resolution() {
        let price = Decimal::from(20_000);
        let value = msat_to_fiat(price, MilliSatoshi::new(100_000));

        // 20000 / 10^11 * 10^5, exactly.
        assert_eq!(value, Decimal::from_str("0.02").unwrap());
    }

    #[test]
    fn one_bitcoin_is_worth_the_quoted_price() {
        let price = Decimal::from_str("43012.55").unwrap();
        let value = msat_to_fiat(price, MilliSatoshi::new(MSAT_PER_BTC));

        assert_eq!(value, price);
    }

    #[test]
    fn zero_amount_is_worth_nothing() {
        let price = Decimal::from(60_000);

        assert_eq!(msat_to_fiat(price, MilliSatoshi::new(0)), Decimal::ZERO);
    }

    #[test]
    fn conversion_is_deterministic_across_runs() {
        let price = Decimal::from_str("10.1").unwrap();
        let amount = MilliSatoshi::new(123_456_789);

        let first = msat_to_fiat(price, amount);
        for _ in 0..100 {
            assert_eq!(msat_to_fiat(price, amount), first);
        }
    }
}
