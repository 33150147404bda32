//! Payment-formula derivation and fee normalisation.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::loan::{FeeFrequency, LoanParameters};
use crate::error::MortgageError;
use crate::time_value;
use crate::types::{Money, Rate};
use crate::MortgageResult;

/// Per-period rate as a decimal: annual percent / 100 / periods per year.
pub fn periodic_rate(loan: &LoanParameters) -> Rate {
    loan.annual_rate_pct / dec!(100) / Decimal::from(loan.repayment_frequency.periods_per_year())
}

/// Number of repayment periods in the full term, rounded up for terms that
/// do not divide evenly into periods.
pub fn scheduled_periods(loan: &LoanParameters) -> MortgageResult<u32> {
    let ppy = Decimal::from(loan.repayment_frequency.periods_per_year());
    (loan.term_years * ppy)
        .ceil()
        .to_u32()
        .filter(|n| *n > 0)
        .ok_or_else(|| MortgageError::invalid("term_years", "Term yields no repayment periods"))
}

/// Whole years covered by the chart axis.
pub fn chart_years(loan: &LoanParameters) -> MortgageResult<u32> {
    loan.term_years
        .ceil()
        .to_u32()
        .ok_or_else(|| MortgageError::invalid("term_years", "Term out of range"))
}

/// Level payment that retires `principal` over `periods` at `rate`.
///
/// Annuity formula `P * r / (1 - (1 + r)^-n)`; with a zero rate this is
/// `P / n`.
pub fn level_payment(principal: Money, rate: Rate, periods: u32) -> MortgageResult<Money> {
    Ok(-time_value::pmt(rate, periods, principal, Decimal::ZERO)?)
}

/// Baseline periodic payment for the loan, before any repayment changes.
pub fn baseline_payment(loan: &LoanParameters) -> MortgageResult<Money> {
    level_payment(loan.principal, periodic_rate(loan), scheduled_periods(loan)?)
}

/// Fee charged each repayment period.
pub fn fee_per_period(loan: &LoanParameters) -> Money {
    match loan.fee_frequency {
        FeeFrequency::Annual => {
            loan.fee_amount / Decimal::from(loan.repayment_frequency.periods_per_year())
        }
        FeeFrequency::PerPeriod => loan.fee_amount,
    }
}

/// Payment that exactly covers one period's interest on `balance`,
/// saturating at the decimal maximum.
pub fn interest_only_payment(balance: Money, rate: Rate) -> Money {
    balance.saturating_mul(rate)
}
