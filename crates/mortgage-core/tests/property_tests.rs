//! Property tests for amortization invariants.
//!
//! Uses proptest to verify, across random loans:
//! 1. Totals identity: repayment = interest + principal + fees, exactly
//! 2. Standard curve shape: starts at principal, strictly falls to zero
//! 3. Labels align with both balance series
//! 4. A payment above baseline always clears the loan early

use chrono::NaiveDate;
use mortgage_core::amortization::{
    amortize, FeeFrequency, LoanParameters, MortgageInput, RepaymentChange, RepaymentFrequency,
};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_frequency() -> impl Strategy<Value = RepaymentFrequency> {
    prop_oneof![
        Just(RepaymentFrequency::Weekly),
        Just(RepaymentFrequency::Fortnightly),
        Just(RepaymentFrequency::Monthly),
    ]
}

fn arb_fee_frequency() -> impl Strategy<Value = FeeFrequency> {
    prop_oneof![Just(FeeFrequency::Annual), Just(FeeFrequency::PerPeriod)]
}

prop_compose! {
    fn arb_loan()(
        principal in 10_000u64..2_000_000,
        rate_bps in 0u32..1500,
        term_months in 12u32..=480,
        frequency in arb_frequency(),
        fee in 0u32..500,
        fee_frequency in arb_fee_frequency(),
    ) -> MortgageInput {
        MortgageInput {
            loan: LoanParameters {
                principal: Decimal::from(principal),
                annual_rate_pct: Decimal::from(rate_bps) / dec!(100),
                term_years: Decimal::from(term_months) / dec!(12),
                repayment_frequency: frequency,
                fee_amount: Decimal::from(fee),
                fee_frequency,
                start_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            },
            repayment_changes: vec![],
            additional_payments: vec![],
        }
    }
}

// ── 1-3. Baseline invariants ─────────────────────────────────────────

proptest! {
    #[test]
    fn totals_identity_holds(input in arb_loan()) {
        let (out, _) = amortize(&input).unwrap();
        let r = &out.results;
        prop_assert_eq!(
            r.total_repayment,
            r.total_interest + input.loan.principal + r.total_fees
        );
        prop_assert_eq!(r.actual_periods_to_repay, r.scheduled_periods);
    }

    #[test]
    fn standard_curve_falls_to_zero(input in arb_loan()) {
        let (out, _) = amortize(&input).unwrap();
        let standard = &out.chart_data.standard_balances;
        let years = input.loan.term_years.ceil();

        prop_assert_eq!(Decimal::from(standard.len()), years + Decimal::ONE);
        prop_assert_eq!(standard[0], input.loan.principal);
        prop_assert!(*standard.last().unwrap() < dec!(0.01));
        for pair in standard.windows(2) {
            prop_assert!(pair[1] < pair[0] || (pair[0].is_zero() && pair[1].is_zero()));
        }
    }

    #[test]
    fn labels_align_with_series(input in arb_loan()) {
        let (out, _) = amortize(&input).unwrap();
        let chart = &out.chart_data;
        prop_assert_eq!(chart.time_labels.len(), chart.standard_balances.len());
        prop_assert_eq!(chart.time_labels.len(), chart.balances.len());
        prop_assert_eq!(chart.time_labels[0].as_str(), "Start");
        for (i, label) in chart.time_labels.iter().enumerate().skip(1) {
            prop_assert_eq!(label, &format!("Year {i}"));
        }
    }
}

// ── 4. Overpayment shortens the loan ─────────────────────────────────

proptest! {
    #[test]
    fn overpayment_repays_early(input in arb_loan(), uplift_pct in 10u32..200) {
        let (baseline, _) = amortize(&input).unwrap();
        // Loans of a handful of periods may still need every period.
        prop_assume!(baseline.results.scheduled_periods >= 12);

        let payment = baseline.results.monthly_payment;
        let mut changed = input.clone();
        changed.repayment_changes.push(RepaymentChange {
            amount: payment + payment * Decimal::from(uplift_pct) / dec!(100),
            month: 3,
            year: 2025,
        });

        let (out, _) = amortize(&changed).unwrap();
        prop_assert!(out.results.actual_periods_to_repay < out.results.scheduled_periods);
        prop_assert!(out.results.time_saved_text.contains("earlier"));
        prop_assert_eq!(out.chart_data.payment_events.len(), 1);
        for pair in out.chart_data.balances.windows(2) {
            prop_assert!(pair[1] <= pair[0]);
        }
    }
}
