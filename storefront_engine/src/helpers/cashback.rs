use crate::db_types::Tenge;

/// Percentage of the order total that is returned to the customer once the payment is approved.
pub const CASHBACK_PERCENT: i64 = 3;

/// The cashback earned on an order of `total`, rounded to the nearest whole tenge (halves round up).
pub fn cashback_for(total: Tenge) -> Tenge {
    total.percent_rounded(CASHBACK_PERCENT)
}
