//! Amortization engine: period stepping, the standard and actual trajectory
//! drivers, and the public calculation entry points.
//!
//! Both trajectories advance through the same [`step`] function; they differ
//! only in which payment they feed it. All math in `rust_decimal::Decimal`.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use super::chart::{self, ChartData, LumpSumEvent, PaymentEvent};
use super::loan::{validate_input, AdditionalPayment, Anchor, MortgageInput, RepaymentChange};
use super::payment;
use crate::error::MortgageError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::MortgageResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Residual balance settled with the final payment.
const BALANCE_EPSILON: Decimal = dec!(0.01);

/// The actual trajectory may run to this multiple of the scheduled periods.
const SAFETY_CAP_MULTIPLE: u32 = 2;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// One row of the per-period ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRow {
    /// Period number (1-indexed).
    pub period: u32,
    pub date: NaiveDate,
    /// Regular payment made this period.
    pub payment: Money,
    /// Interest accrued this period.
    pub interest: Money,
    /// Principal reduction from the regular payment (negative under
    /// negative amortization).
    pub principal: Money,
    /// Lump sum applied after the regular payment.
    pub additional_payment: Money,
    pub fee: Money,
    /// Balance after this period.
    pub balance: Money,
}

/// Summary figures for the loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MortgageResults {
    /// Baseline periodic payment from the annuity formula.
    pub monthly_payment: Money,
    pub total_interest: Money,
    pub total_fees: Money,
    /// Interest + principal + fees.
    pub total_repayment: Money,
    pub scheduled_periods: u32,
    pub actual_periods_to_repay: u32,
    pub actual_months_to_repay: u32,
    /// Interest payable under the unmodified schedule.
    pub standard_total_interest: Money,
    pub interest_saved: Money,
    pub time_saved_text: String,
}

/// Everything produced by one calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MortgageOutput {
    pub results: MortgageResults,
    pub chart_data: ChartData,
    pub schedule: Vec<ScheduleRow>,
}

// ---------------------------------------------------------------------------
// Period stepping
// ---------------------------------------------------------------------------

/// Outcome of a single repayment period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodStep {
    pub balance: Money,
    pub interest: Money,
    pub principal: Money,
    /// Amount actually paid, capped at what is owed.
    pub paid: Money,
}

/// Advance one period: accrue interest, then apply `payment` to interest
/// first and principal second.
///
/// Returns `None` if the balance leaves decimal range.
pub fn step(balance: Money, rate: Rate, payment: Money) -> Option<PeriodStep> {
    let interest = balance.checked_mul(rate)?;
    let owed = balance.checked_add(interest)?;
    if payment >= owed - BALANCE_EPSILON {
        return Some(PeriodStep {
            balance: Decimal::ZERO,
            interest,
            principal: balance,
            paid: owed,
        });
    }
    let principal = payment - interest;
    Some(PeriodStep {
        balance: balance.checked_sub(principal)?,
        interest,
        principal,
        paid: payment,
    })
}

// ---------------------------------------------------------------------------
// Standard trajectory
// ---------------------------------------------------------------------------

/// The unmodified schedule: baseline payment every period.
#[derive(Debug, Clone)]
pub struct StandardTrajectory {
    /// Closing balance for each period until payoff.
    pub closing_balances: Vec<Money>,
    pub total_interest: Money,
}

pub fn run_standard(
    principal: Money,
    rate: Rate,
    payment: Money,
    scheduled_periods: u32,
) -> MortgageResult<StandardTrajectory> {
    let mut balance = principal;
    let mut closing_balances = Vec::with_capacity(scheduled_periods as usize);
    let mut total_interest = Decimal::ZERO;

    for period in 1..=scheduled_periods {
        if balance <= Decimal::ZERO {
            break;
        }
        let overflow = || MortgageError::NonConverging {
            periods: period,
            balance,
            negative_amortization: false,
        };
        // The final scheduled period clears whatever remains.
        let due = if period == scheduled_periods {
            Decimal::MAX
        } else {
            payment
        };
        let s = step(balance, rate, due).ok_or_else(overflow)?;
        total_interest = total_interest.checked_add(s.interest).ok_or_else(overflow)?;
        balance = s.balance;
        closing_balances.push(balance);
    }

    Ok(StandardTrajectory {
        closing_balances,
        total_interest,
    })
}

// ---------------------------------------------------------------------------
// Actual trajectory
// ---------------------------------------------------------------------------

/// Per-period working state of the actual trajectory.
#[derive(Debug, Clone)]
struct PeriodState {
    period: u32,
    balance: Money,
    effective_payment: Money,
    /// Set once any period's payment failed to cover its interest.
    negative_amortization: bool,
}

#[derive(Debug, Clone)]
struct ActualTrajectory {
    schedule: Vec<ScheduleRow>,
    payment_events: Vec<PaymentEvent>,
    lump_sum_events: Vec<LumpSumEvent>,
    total_interest: Money,
}

fn run_actual(
    input: &MortgageInput,
    rate: Rate,
    baseline: Money,
    fee: Money,
    scheduled_periods: u32,
    warnings: &mut Vec<String>,
) -> MortgageResult<ActualTrajectory> {
    let loan = &input.loan;
    let frequency = loan.repayment_frequency;
    let ppy = Decimal::from(frequency.periods_per_year());
    let cap = scheduled_periods.saturating_mul(SAFETY_CAP_MULTIPLE);

    let changes = sorted_by_anchor(&input.repayment_changes, RepaymentChange::anchor);
    let extras = sorted_by_anchor(&input.additional_payments, AdditionalPayment::anchor);
    let mut next_change = 0;
    let mut next_extra = 0;

    let mut state = PeriodState {
        period: 0,
        balance: loan.principal,
        effective_payment: baseline,
        negative_amortization: false,
    };
    let mut schedule = Vec::with_capacity(scheduled_periods as usize);
    let mut payment_events = Vec::new();
    let mut lump_sum_events = Vec::new();
    let mut total_interest = Decimal::ZERO;

    while state.balance > Decimal::ZERO {
        if state.period >= cap {
            return Err(MortgageError::NonConverging {
                periods: state.period,
                balance: state.balance,
                negative_amortization: state.negative_amortization,
            });
        }
        state.period += 1;

        let date = frequency
            .period_date(loan.start_date, state.period - 1)
            .ok_or_else(|| MortgageError::invalid("start_date", "Schedule runs past supported dates"))?;
        let anchor = Anchor::of(date);

        // Every change anchored at or before this period is consumed; the last
        // one consumed is the one in force.
        let mut adopted: Option<&RepaymentChange> = None;
        while next_change < changes.len() && changes[next_change].anchor() <= anchor {
            if let Some(superseded) = adopted {
                warnings.push(format!(
                    "Repayment change of {} anchored {} was superseded before taking effect",
                    superseded.amount,
                    superseded.anchor()
                ));
            }
            adopted = Some(changes[next_change]);
            next_change += 1;
        }
        if let Some(change) = adopted {
            state.effective_payment = change.amount;
            payment_events.push(PaymentEvent {
                period: state.period,
                loan_year: Decimal::from(state.period) / ppy,
                year: anchor.year,
                month: anchor.month,
                amount: change.amount,
            });
            let interest_only = payment::interest_only_payment(state.balance, rate);
            if change.amount < interest_only {
                let msg = format!(
                    "Repayment of {} from period {} is below the interest-only payment of {}; the balance will grow",
                    change.amount,
                    state.period,
                    interest_only.round_dp(2)
                );
                warn!("{msg}");
                warnings.push(msg);
            }
        }

        let overflow = || MortgageError::NonConverging {
            periods: state.period,
            balance: state.balance,
            negative_amortization: true,
        };
        // Still on the baseline schedule: the final scheduled period settles.
        let due = if payment_events.is_empty() && state.period == scheduled_periods {
            Decimal::MAX
        } else {
            state.effective_payment
        };
        let s = step(state.balance, rate, due).ok_or_else(overflow)?;
        total_interest = total_interest.checked_add(s.interest).ok_or_else(overflow)?;
        if s.principal < Decimal::ZERO {
            state.negative_amortization = true;
        }
        state.balance = s.balance;

        let mut requested = Decimal::ZERO;
        let first_extra = next_extra;
        while next_extra < extras.len() && extras[next_extra].anchor() <= anchor {
            requested = requested.saturating_add(extras[next_extra].amount);
            next_extra += 1;
        }
        let additional_payment = requested.min(state.balance);
        if additional_payment.is_zero() {
            // The regular payment already cleared the loan.
            warnings.extend(extras[first_extra..next_extra].iter().map(|e| unapplied_extra(e)));
        } else {
            state.balance -= additional_payment;
            if state.balance <= BALANCE_EPSILON {
                state.balance = Decimal::ZERO;
            }
            lump_sum_events.push(LumpSumEvent {
                period: state.period,
                loan_year: Decimal::from(state.period) / ppy,
                year: anchor.year,
                month: anchor.month,
                amount: additional_payment,
            });
        }

        schedule.push(ScheduleRow {
            period: state.period,
            date,
            payment: s.paid,
            interest: s.interest,
            principal: s.principal,
            additional_payment,
            fee,
            balance: state.balance,
        });
    }

    for change in &changes[next_change..] {
        warnings.push(format!(
            "Repayment change of {} anchored {} falls after payoff and was not applied",
            change.amount,
            change.anchor()
        ));
    }
    warnings.extend(extras[next_extra..].iter().map(|e| unapplied_extra(e)));

    Ok(ActualTrajectory {
        schedule,
        payment_events,
        lump_sum_events,
        total_interest,
    })
}

fn unapplied_extra(extra: &AdditionalPayment) -> String {
    format!(
        "Additional payment of {} anchored {} falls after payoff and was not applied",
        extra.amount,
        extra.anchor()
    )
}

/// Stable sort by calendar anchor, so entries sharing an anchor keep list
/// order and the last one listed wins.
fn sorted_by_anchor<T>(items: &[T], anchor: impl Fn(&T) -> Anchor) -> Vec<&T> {
    let mut sorted: Vec<&T> = items.iter().collect();
    sorted.sort_by_key(|item| anchor(*item));
    sorted
}

fn duplicate_anchor_warnings(changes: &[RepaymentChange]) -> Vec<String> {
    let sorted = sorted_by_anchor(changes, RepaymentChange::anchor);
    sorted
        .windows(2)
        .filter(|w| w[0].anchor() == w[1].anchor())
        .map(|w| {
            format!(
                "Multiple repayment changes anchored {}; the last listed ({}) applies",
                w[1].anchor(),
                w[1].amount
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run the full amortization for one set of inputs.
///
/// Pure: the same input always yields the same output and warnings.
pub fn amortize(input: &MortgageInput) -> MortgageResult<(MortgageOutput, Vec<String>)> {
    validate_input(input)?;

    let loan = &input.loan;
    let ppy = loan.repayment_frequency.periods_per_year();
    let rate = payment::periodic_rate(loan);
    let scheduled_periods = payment::scheduled_periods(loan)?;
    let years = payment::chart_years(loan)?;
    let baseline = payment::baseline_payment(loan)?;
    let fee = payment::fee_per_period(loan);
    debug!(
        %baseline, %rate, scheduled_periods, frequency = %loan.repayment_frequency,
        "derived baseline payment"
    );

    let mut warnings = duplicate_anchor_warnings(&input.repayment_changes);
    if !rate.is_zero() && baseline <= payment::interest_only_payment(loan.principal, rate) {
        warnings.push(format!(
            "Baseline payment of {} only covers interest at decimal precision; the principal is settled in period {scheduled_periods}",
            baseline.round_dp(2)
        ));
    }
    for w in &warnings {
        warn!("{w}");
    }

    let standard = run_standard(loan.principal, rate, baseline, scheduled_periods)?;
    let actual = run_actual(input, rate, baseline, fee, scheduled_periods, &mut warnings)?;

    let actual_periods = actual.schedule.len() as u32;
    let total_interest = actual.total_interest;
    let total_fees = fee
        .checked_mul(Decimal::from(actual_periods))
        .ok_or_else(|| MortgageError::invalid("fee_amount", "Total fees exceed decimal range"))?;
    let total_repayment = total_interest
        .checked_add(loan.principal)
        .and_then(|t| t.checked_add(total_fees))
        .ok_or_else(|| MortgageError::invalid("principal", "Total repayment exceeds decimal range"))?;
    debug!(
        actual_periods, %total_interest, %total_fees,
        "simulated actual trajectory"
    );

    let actual_closing: Vec<Money> = actual.schedule.iter().map(|row| row.balance).collect();
    let chart_data = ChartData {
        balances: chart::sample_yearly(loan.principal, &actual_closing, ppy, years),
        standard_balances: chart::sample_yearly(
            loan.principal,
            &standard.closing_balances,
            ppy,
            years,
        ),
        time_labels: chart::time_labels(years),
        payment_events: actual.payment_events,
        lump_sum_events: actual.lump_sum_events,
    };

    let results = MortgageResults {
        monthly_payment: baseline,
        total_interest,
        total_fees,
        total_repayment,
        scheduled_periods,
        actual_periods_to_repay: actual_periods,
        actual_months_to_repay: chart::periods_to_months(actual_periods, ppy),
        standard_total_interest: standard.total_interest,
        interest_saved: standard.total_interest - total_interest,
        time_saved_text: chart::time_saved_text(actual_periods, scheduled_periods, ppy),
    };

    Ok((
        MortgageOutput {
            results,
            chart_data,
            schedule: actual.schedule,
        },
        warnings,
    ))
}

/// Calculate a mortgage and wrap the result in the standard envelope.
pub fn calculate_mortgage(
    input: &MortgageInput,
) -> MortgageResult<ComputationOutput<MortgageOutput>> {
    let start = Instant::now();
    let (output, warnings) = amortize(input)?;
    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Fixed-rate annuity amortization with repayment changes",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Baseline periodic payment only, without simulating the schedule.
pub fn calculate_payment(input: &MortgageInput) -> MortgageResult<ComputationOutput<Money>> {
    let start = Instant::now();
    validate_input(input)?;
    let payment = payment::baseline_payment(&input.loan)?;
    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Fixed-rate annuity payment",
        &input.loan,
        Vec::new(),
        elapsed,
        payment,
    ))
}
