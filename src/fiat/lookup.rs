use chrono::{DateTime, Utc};

use super::{PriceError, PricePoint};

/// Resolves the price applicable at `timestamp` from a series sorted
/// ascending by timestamp.
///
/// Returns the last point whose timestamp is not after `timestamp`, so a
/// query falling between two points resolves to the earlier one and a query
/// exactly matching a point returns that point. The series is expected to
/// begin at or before any queried timestamp; if it does not, the lookup
/// fails rather than guessing. Its last point may well be earlier than the
/// query, which is fine.
///
/// When the series carries duplicate timestamps, the scan keeps advancing
/// through them, so the one sorted last wins.
pub fn spot_price(
    series: &[PricePoint],
    timestamp: DateTime<Utc>,
) -> Result<&PricePoint, PriceError> {
    if series.is_empty() {
        return Err(PriceError::NoPriceData);
    }

    let mut last_price = None;

    // Run through the series until we find a point that lies strictly after
    // the query timestamp. Since we always return the previous point, this
    // also handles exact matches (at the cost of one extra iteration).
    for point in series {
        if timestamp < point.timestamp {
            break;
        }

        last_price = Some(point);
    }

    // Breaking out of the loop without a candidate means the query predates
    // the first entry in the series.
    last_price.ok_or(PriceError::TimestampOutOfRange)
}
