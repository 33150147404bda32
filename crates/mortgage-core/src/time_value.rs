use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;

use crate::error::MortgageError;
use crate::types::{Money, Rate};
use crate::MortgageResult;

/// Discount factor `(1 + rate)^-nper`.
///
/// When `(1 + rate)^nper` leaves decimal range the discount is below decimal
/// precision and is returned as zero.
pub fn discount_factor(rate: Rate, nper: u32) -> Decimal {
    (Decimal::ONE + rate)
        .checked_powi(i64::from(nper))
        .and_then(|factor| Decimal::ONE.checked_div(factor))
        .unwrap_or(Decimal::ZERO)
}

/// Payment (PMT), spreadsheet sign convention: a positive present value
/// yields a negative payment.
///
/// Uses `(pv + fv * v) * r / (1 - v)` with `v = (1 + r)^-n`, so long terms at
/// high rates tend to the interest-only payment instead of overflowing.
pub fn pmt(rate: Rate, nper: u32, present_value: Money, future_value: Money) -> MortgageResult<Money> {
    if nper == 0 {
        return Err(MortgageError::invalid(
            "nper",
            "Number of periods must be > 0",
        ));
    }

    if rate.is_zero() {
        return Ok(-(present_value + future_value) / Decimal::from(nper));
    }

    let discount = discount_factor(rate, nper);
    let annuity_factor = Decimal::ONE - discount;

    if annuity_factor.is_zero() {
        return Err(MortgageError::invalid(
            "annual_rate_pct",
            "Rate too small for annuity factor",
        ));
    }

    let out_of_range =
        || MortgageError::invalid("principal", "Payment exceeds decimal range");
    let value = future_value
        .checked_mul(discount)
        .and_then(|fv| present_value.checked_add(fv))
        .ok_or_else(out_of_range)?;
    let payment = value
        .checked_mul(rate)
        .and_then(|v| v.checked_div(annuity_factor))
        .ok_or_else(out_of_range)?;
    Ok(-payment)
}
