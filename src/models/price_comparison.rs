use rust_decimal::{Decimal, RoundingStrategy};

/// Relative gap between the two shops above which an alert is sent (5%).
pub const PRICE_DIVERGENCE_THRESHOLD: Decimal = Decimal::from_parts(5, 0, 0, false, 2);

/// `|A - B| / A`, or `None` when Shop A's price is zero.
pub fn divergence_ratio(price_a: Decimal, price_b: Decimal) -> Option<Decimal> {
    if price_a.is_zero() {
        return None;
    }
    Some((price_a - price_b).abs() / price_a)
}

/// Strictly greater than the threshold; a gap of exactly 5% does not count.
pub fn is_divergent(price_a: Decimal, price_b: Decimal) -> bool {
    divergence_ratio(price_a, price_b).is_some_and(|ratio| ratio > PRICE_DIVERGENCE_THRESHOLD)
}

/// Signed percentage of A relative to B, rounded up to two decimals.
pub fn percent_difference(price_a: Decimal, price_b: Decimal) -> Option<Decimal> {
    if price_b.is_zero() {
        return None;
    }
    let percent = (price_a - price_b) / price_b * Decimal::ONE_HUNDRED;
    Some(percent.round_dp_with_strategy(2, RoundingStrategy::ToPositiveInfinity))
}
