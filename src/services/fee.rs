//! Tiered transfer fee schedule
//!
//! Marginal rate decreases as the notional grows; tier boundaries are
//! inclusive on the lower bound. The fee is rounded half-up to two places
//! and is a sender-only cost: the recipient receives the bare amount.

use rust_decimal::{dec, Decimal, RoundingStrategy};

use crate::models::FeeQuote;

/// amount → fee.
pub fn calculate_fee(amount: Decimal) -> Decimal {
    let rate = if amount >= dec!(1000000) {
        dec!(0.0020) // 0.20%
    } else if amount >= dec!(500000) {
        dec!(0.0015) // 0.15%
    } else if amount >= dec!(100000) {
        dec!(0.0010) // 0.10%
    } else if amount >= dec!(50000) {
        dec!(0.008) // 0.8%
    } else if amount >= dec!(10000) {
        dec!(0.006) // 0.6%
    } else {
        dec!(0.005) // 0.5%
    };

    (amount * rate).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Full quote: fee, total deduction from the sender, and the platform's
/// revenue share (the whole fee).
pub fn quote(amount: Decimal) -> FeeQuote {
    let fee = calculate_fee(amount);
    FeeQuote {
        fee,
        total_deduction: amount + fee,
        revenue_share: fee,
    }
}
