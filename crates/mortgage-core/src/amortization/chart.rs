//! Chart-ready series and the payoff narrative.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::types::{Money, Years};

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// A repayment change as it took effect in the simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentEvent {
    /// Period (1-indexed) from which the new payment applies.
    pub period: u32,
    /// Position on the chart's year axis (period / periods per year).
    pub loan_year: Years,
    /// Calendar year and month of that period.
    pub year: i32,
    pub month: u32,
    /// New periodic payment.
    pub amount: Money,
}

/// A lump sum as applied against principal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LumpSumEvent {
    pub period: u32,
    pub loan_year: Years,
    pub year: i32,
    pub month: u32,
    /// Amount applied, which may be less than requested if the loan cleared.
    pub amount: Money,
}

/// Series for the balance-over-time chart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartData {
    /// Actual (change-adjusted) balance at each year boundary.
    pub balances: Vec<Money>,
    /// Balance under the unmodified schedule at the same boundaries.
    pub standard_balances: Vec<Money>,
    /// "Start", "Year 1", ... aligned with both balance series.
    pub time_labels: Vec<String>,
    pub payment_events: Vec<PaymentEvent>,
    pub lump_sum_events: Vec<LumpSumEvent>,
}

/// Axis labels for `years` whole years plus the start point.
pub fn time_labels(years: u32) -> Vec<String> {
    std::iter::once("Start".to_string())
        .chain((1..=years).map(|y| format!("Year {y}")))
        .collect()
}

/// Sample a per-period closing-balance series at each year boundary.
///
/// `closing[k]` is the balance after period `k + 1`. Boundaries past the end
/// of the series read as zero (the loan has been repaid).
pub fn sample_yearly(
    opening: Money,
    closing: &[Money],
    periods_per_year: u32,
    years: u32,
) -> Vec<Money> {
    let mut out = Vec::with_capacity(years as usize + 1);
    out.push(opening);
    for year in 1..=years {
        let idx = (year * periods_per_year) as usize;
        let balance = closing.get(idx - 1).copied().unwrap_or(Decimal::ZERO);
        out.push(balance.max(Decimal::ZERO));
    }
    out
}

/// Convert a period count to whole months, rounding half away from zero.
pub fn periods_to_months(periods: u32, periods_per_year: u32) -> u32 {
    (Decimal::from(periods) * Decimal::from(12) / Decimal::from(periods_per_year))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
        .unwrap_or(u32::MAX)
}

/// Describe when the loan clears relative to its schedule.
pub fn time_saved_text(actual_periods: u32, scheduled_periods: u32, periods_per_year: u32) -> String {
    use std::cmp::Ordering;

    let diff = actual_periods.abs_diff(scheduled_periods);
    let months = periods_to_months(diff, periods_per_year);
    match actual_periods.cmp(&scheduled_periods) {
        Ordering::Equal => "Loan paid off on schedule".to_string(),
        Ordering::Less if months == 0 => "Loan paid off less than a month earlier".to_string(),
        Ordering::Less => format!("Loan paid off {} earlier", describe_months(months)),
        Ordering::Greater if months == 0 => "Loan paid off less than a month later".to_string(),
        Ordering::Greater => format!("Loan paid off {} later", describe_months(months)),
    }
}

fn describe_months(total: u32) -> String {
    let (years, months) = (total / 12, total % 12);
    let unit = |n: u32, word: &str| {
        if n == 1 {
            format!("1 {word}")
        } else {
            format!("{n} {word}s")
        }
    };
    match (years, months) {
        (0, m) => unit(m, "month"),
        (y, 0) => unit(y, "year"),
        (y, m) => format!("{} and {}", unit(y, "year"), unit(m, "month")),
    }
}
