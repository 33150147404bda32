use chrono::{Local, NaiveDate};
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{info, warn};

use mortgage_core::amortization::{
    self, AdditionalPayment, FeeFrequency, LoanParameters, MortgageInput, RepaymentChange,
    RepaymentFrequency,
};

use crate::input;

/// An amount anchored to a calendar month, written `AMOUNT@YYYY-MM`.
#[derive(Debug, Clone)]
pub struct AnchoredAmount {
    pub amount: Decimal,
    pub year: i32,
    pub month: u32,
}

fn parse_anchored(s: &str) -> Result<AnchoredAmount, String> {
    let (amount, when) = s
        .split_once('@')
        .ok_or_else(|| format!("expected AMOUNT@YYYY-MM, got '{s}'"))?;
    let (year, month) = when
        .split_once('-')
        .ok_or_else(|| format!("expected YYYY-MM after '@', got '{when}'"))?;
    Ok(AnchoredAmount {
        amount: amount
            .trim()
            .parse()
            .map_err(|e| format!("invalid amount '{amount}': {e}"))?,
        year: year
            .trim()
            .parse()
            .map_err(|e| format!("invalid year '{year}': {e}"))?,
        month: month
            .trim()
            .parse()
            .map_err(|e| format!("invalid month '{month}': {e}"))?,
    })
}

/// Loan parameters shared by every mortgage subcommand
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct LoanArgs {
    /// Amount borrowed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate in percent (e.g. 5.94 for 5.94%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Loan term in years (fractional terms allowed)
    #[arg(long, alias = "term-years")]
    pub term: Option<Decimal>,

    /// Repayment frequency: weekly, fortnightly or monthly
    #[arg(long, default_value = "monthly")]
    pub frequency: RepaymentFrequency,

    /// Fee amount
    #[arg(long, default_value = "0")]
    pub fee: Decimal,

    /// How the fee recurs: annual or per_period
    #[arg(long, default_value = "annual")]
    pub fee_frequency: FeeFrequency,

    /// Date of the first repayment (defaults to today)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// New periodic payment from a month onwards, AMOUNT@YYYY-MM (repeatable)
    #[arg(long = "change", value_parser = parse_anchored)]
    pub changes: Vec<AnchoredAmount>,

    /// One-off lump sum against principal, AMOUNT@YYYY-MM (repeatable)
    #[arg(long = "extra", value_parser = parse_anchored)]
    pub extras: Vec<AnchoredAmount>,

    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

fn build_input(args: LoanArgs) -> Result<MortgageInput, Box<dyn std::error::Error>> {
    if let Some(ref path) = args.input {
        return input::file::read_input(path);
    }
    if args.principal.is_none() {
        if let Some(data) = input::stdin::read_stdin()? {
            return Ok(data);
        }
    }

    let loan = LoanParameters {
        principal: args
            .principal
            .ok_or("--principal is required (or provide --input)")?,
        annual_rate_pct: args.rate.ok_or("--rate is required (or provide --input)")?,
        term_years: args.term.ok_or("--term is required (or provide --input)")?,
        repayment_frequency: args.frequency,
        fee_amount: args.fee,
        fee_frequency: args.fee_frequency,
        start_date: args
            .start_date
            .unwrap_or_else(|| Local::now().date_naive()),
    };

    Ok(MortgageInput {
        loan,
        repayment_changes: args
            .changes
            .into_iter()
            .map(|c| RepaymentChange {
                amount: c.amount,
                month: c.month,
                year: c.year,
            })
            .collect(),
        additional_payments: args
            .extras
            .into_iter()
            .map(|e| AdditionalPayment {
                amount: e.amount,
                month: e.month,
                year: e.year,
            })
            .collect(),
    })
}

pub fn run_calculate(args: LoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mortgage_input = build_input(args)?;
    let result = amortization::calculate_mortgage(&mortgage_input)?;
    info!(
        periods = result.result.results.actual_periods_to_repay,
        elapsed_us = result.metadata.computation_time_us,
        "calculated mortgage"
    );
    Ok(serde_json::to_value(result)?)
}

pub fn run_payment(args: LoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mortgage_input = build_input(args)?;
    let result = amortization::calculate_payment(&mortgage_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Per-period ledger only, ready for spreadsheet export.
pub fn run_schedule(args: LoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mortgage_input = build_input(args)?;
    let (output, warnings) = amortization::amortize(&mortgage_input)?;
    for w in &warnings {
        warn!("{w}");
    }
    Ok(serde_json::to_value(output.schedule)?)
}

/// Chart series only.
pub fn run_chart(args: LoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mortgage_input = build_input(args)?;
    let (output, warnings) = amortization::amortize(&mortgage_input)?;
    for w in &warnings {
        warn!("{w}");
    }
    Ok(serde_json::to_value(output.chart_data)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_anchored() {
        let a = parse_anchored("4000@2025-01").unwrap();
        assert_eq!(a.amount, Decimal::from(4000));
        assert_eq!((a.year, a.month), (2025, 1));
    }

    #[test]
    fn test_parse_anchored_rejects_garbage() {
        assert!(parse_anchored("4000").is_err());
        assert!(parse_anchored("4000@2025").is_err());
        assert!(parse_anchored("abc@2025-01").is_err());
    }
}
