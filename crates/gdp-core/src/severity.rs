use crate::model::SeverityRating;
use rust_decimal::Decimal;

/// Lower bound (inclusive, minutes) of each band above NIL.
const LOW_FROM: Decimal = Decimal::from_parts(11, 0, 0, false, 0);
const MODERATE_FROM: Decimal = Decimal::from_parts(15, 0, 0, false, 0);
const HIGH_FROM: Decimal = Decimal::from_parts(45, 0, 0, false, 0);

/// Map a mean program delay (minutes) to an impact rating.
pub fn classify_mean_delay(mean: Decimal) -> SeverityRating {
    if mean < LOW_FROM {
        SeverityRating::Nil
    } else if mean < MODERATE_FROM {
        SeverityRating::Low
    } else if mean < HIGH_FROM {
        SeverityRating::Moderate
    } else {
        SeverityRating::High
    }
}

/// Exact mean of `total` over `count` rows; zero when nothing matched.
pub fn mean_delay(total: u64, count: usize) -> Decimal {
    if count == 0 {
        return Decimal::ZERO;
    }
    Decimal::from(total) / Decimal::from(count as u64)
}
