//! Loan inputs: parameters, repayment frequencies, and the calendar-anchored
//! repayment changes and lump sums supplied by the form.

use chrono::{Datelike, Days, Months, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::MortgageError;
use crate::types::{Money, Years};
use crate::MortgageResult;

/// Longest term accepted, in years.
const MAX_TERM_YEARS: Decimal = dec!(100);

// ---------------------------------------------------------------------------
// Frequencies
// ---------------------------------------------------------------------------

/// How often the borrower makes a repayment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum RepaymentFrequency {
    Weekly,
    Fortnightly,
    #[default]
    Monthly,
}

impl RepaymentFrequency {
    pub fn periods_per_year(self) -> u32 {
        match self {
            RepaymentFrequency::Weekly => 52,
            RepaymentFrequency::Fortnightly => 26,
            RepaymentFrequency::Monthly => 12,
        }
    }

    /// Calendar date of the period at `offset` (0-based) from `start`.
    pub fn period_date(self, start: NaiveDate, offset: u32) -> Option<NaiveDate> {
        match self {
            RepaymentFrequency::Weekly => start.checked_add_days(Days::new(7 * u64::from(offset))),
            RepaymentFrequency::Fortnightly => {
                start.checked_add_days(Days::new(14 * u64::from(offset)))
            }
            RepaymentFrequency::Monthly => start.checked_add_months(Months::new(offset)),
        }
    }
}

impl fmt::Display for RepaymentFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RepaymentFrequency::Weekly => "weekly",
            RepaymentFrequency::Fortnightly => "fortnightly",
            RepaymentFrequency::Monthly => "monthly",
        };
        f.write_str(s)
    }
}

impl FromStr for RepaymentFrequency {
    type Err = MortgageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weekly" => Ok(RepaymentFrequency::Weekly),
            "fortnightly" => Ok(RepaymentFrequency::Fortnightly),
            "monthly" => Ok(RepaymentFrequency::Monthly),
            other => Err(MortgageError::invalid(
                "repayment_frequency",
                format!("unrecognised frequency '{other}' (expected weekly, fortnightly or monthly)"),
            )),
        }
    }
}

impl TryFrom<String> for RepaymentFrequency {
    type Error = MortgageError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// How the quoted fee amount recurs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum FeeFrequency {
    #[default]
    Annual,
    PerPeriod,
}

impl FromStr for FeeFrequency {
    type Err = MortgageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "annual" => Ok(FeeFrequency::Annual),
            "per_period" | "per-period" => Ok(FeeFrequency::PerPeriod),
            other => Err(MortgageError::invalid(
                "fee_frequency",
                format!("unrecognised fee frequency '{other}' (expected annual or per_period)"),
            )),
        }
    }
}

impl TryFrom<String> for FeeFrequency {
    type Error = MortgageError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// Core loan terms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanParameters {
    /// Amount borrowed.
    pub principal: Money,
    /// Annual interest rate in percent (5.94 = 5.94% p.a.).
    pub annual_rate_pct: Decimal,
    /// Loan term in years; fractional terms are allowed.
    pub term_years: Years,
    pub repayment_frequency: RepaymentFrequency,
    /// Fee amount, interpreted according to `fee_frequency`.
    #[serde(default)]
    pub fee_amount: Money,
    #[serde(default)]
    pub fee_frequency: FeeFrequency,
    /// Date of the first repayment period.
    pub start_date: NaiveDate,
}

/// Calendar anchor shared by repayment changes and lump sums.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Anchor {
    pub year: i32,
    pub month: u32,
}

impl Anchor {
    pub fn of(date: NaiveDate) -> Self {
        Anchor {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Replaces the periodic payment from the given month onwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepaymentChange {
    /// New periodic payment.
    pub amount: Money,
    /// Calendar month, 1-12.
    pub month: u32,
    pub year: i32,
}

impl RepaymentChange {
    pub fn anchor(&self) -> Anchor {
        Anchor {
            year: self.year,
            month: self.month,
        }
    }
}

/// One-off lump sum paid against principal in the given month.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdditionalPayment {
    pub amount: Money,
    /// Calendar month, 1-12.
    pub month: u32,
    pub year: i32,
}

impl AdditionalPayment {
    pub fn anchor(&self) -> Anchor {
        Anchor {
            year: self.year,
            month: self.month,
        }
    }
}

/// Everything the engine needs for one calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MortgageInput {
    #[serde(flatten)]
    pub loan: LoanParameters,
    #[serde(default)]
    pub repayment_changes: Vec<RepaymentChange>,
    #[serde(default)]
    pub additional_payments: Vec<AdditionalPayment>,
}

/// Parses a JSON document. Frequency fields are checked first so an
/// unrecognised value is reported as `InvalidInput` on that field rather than
/// as a serialization error.
impl FromStr for MortgageInput {
    type Err = MortgageError;

    fn from_str(json: &str) -> Result<Self, Self::Err> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if let Some(s) = value.get("repayment_frequency").and_then(|v| v.as_str()) {
            s.parse::<RepaymentFrequency>()?;
        }
        if let Some(s) = value.get("fee_frequency").and_then(|v| v.as_str()) {
            s.parse::<FeeFrequency>()?;
        }
        Ok(serde_json::from_value(value)?)
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

pub fn validate_loan(loan: &LoanParameters) -> MortgageResult<()> {
    if loan.principal <= Decimal::ZERO {
        return Err(MortgageError::invalid(
            "principal",
            "Principal must be positive",
        ));
    }
    if loan.annual_rate_pct < Decimal::ZERO {
        return Err(MortgageError::invalid(
            "annual_rate_pct",
            "Interest rate cannot be negative",
        ));
    }
    if loan.term_years <= Decimal::ZERO {
        return Err(MortgageError::invalid(
            "term_years",
            "Term must be positive",
        ));
    }
    if loan.term_years > MAX_TERM_YEARS {
        return Err(MortgageError::invalid(
            "term_years",
            format!("Term cannot exceed {MAX_TERM_YEARS} years"),
        ));
    }
    if loan.fee_amount < Decimal::ZERO {
        return Err(MortgageError::invalid(
            "fee_amount",
            "Fee amount cannot be negative",
        ));
    }
    Ok(())
}

pub fn validate_input(input: &MortgageInput) -> MortgageResult<()> {
    validate_loan(&input.loan)?;

    for (i, change) in input.repayment_changes.iter().enumerate() {
        if change.amount < Decimal::ZERO {
            return Err(MortgageError::invalid(
                &format!("repayment_changes[{i}].amount"),
                "Repayment amount cannot be negative",
            ));
        }
        validate_month(&format!("repayment_changes[{i}].month"), change.month)?;
    }

    for (i, extra) in input.additional_payments.iter().enumerate() {
        if extra.amount <= Decimal::ZERO {
            return Err(MortgageError::invalid(
                &format!("additional_payments[{i}].amount"),
                "Additional payment must be positive",
            ));
        }
        validate_month(&format!("additional_payments[{i}].month"), extra.month)?;
    }

    Ok(())
}

fn validate_month(field: &str, month: u32) -> MortgageResult<()> {
    if !(1..=12).contains(&month) {
        return Err(MortgageError::invalid(
            field,
            format!("Month must be between 1 and 12, got {month}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loan() -> LoanParameters {
        LoanParameters {
            principal: dec!(500_000),
            annual_rate_pct: dec!(5.94),
            term_years: dec!(30),
            repayment_frequency: RepaymentFrequency::Monthly,
            fee_amount: Decimal::ZERO,
            fee_frequency: FeeFrequency::Annual,
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        }
    }

    fn field_of(err: MortgageError) -> String {
        match err {
            MortgageError::InvalidInput { field, .. } => field,
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_frequency_parsing() {
        assert_eq!("Weekly".parse::<RepaymentFrequency>().unwrap(), RepaymentFrequency::Weekly);
        assert_eq!(" fortnightly ".parse::<RepaymentFrequency>().unwrap(), RepaymentFrequency::Fortnightly);
        let err = "quarterly".parse::<RepaymentFrequency>().unwrap_err();
        assert_eq!(field_of(err), "repayment_frequency");
    }

    #[test]
    fn test_fee_frequency_parsing() {
        assert_eq!("per-period".parse::<FeeFrequency>().unwrap(), FeeFrequency::PerPeriod);
        assert!("monthly".parse::<FeeFrequency>().is_err());
    }

    #[test]
    fn test_period_dates() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
        assert_eq!(
            RepaymentFrequency::Monthly.period_date(start, 1),
            NaiveDate::from_ymd_opt(2025, 2, 28)
        );
        assert_eq!(
            RepaymentFrequency::Fortnightly.period_date(start, 2),
            NaiveDate::from_ymd_opt(2025, 2, 28)
        );
        assert_eq!(
            RepaymentFrequency::Weekly.period_date(start, 0),
            Some(start)
        );
    }

    #[test]
    fn test_rejects_non_positive_principal() {
        let mut l = loan();
        l.principal = Decimal::ZERO;
        assert_eq!(field_of(validate_loan(&l).unwrap_err()), "principal");
    }

    #[test]
    fn test_rejects_negative_rate_and_fee() {
        let mut l = loan();
        l.annual_rate_pct = dec!(-0.5);
        assert_eq!(field_of(validate_loan(&l).unwrap_err()), "annual_rate_pct");

        let mut l = loan();
        l.fee_amount = dec!(-1);
        assert_eq!(field_of(validate_loan(&l).unwrap_err()), "fee_amount");
    }

    #[test]
    fn test_rejects_bad_term() {
        let mut l = loan();
        l.term_years = Decimal::ZERO;
        assert_eq!(field_of(validate_loan(&l).unwrap_err()), "term_years");
        l.term_years = dec!(150);
        assert_eq!(field_of(validate_loan(&l).unwrap_err()), "term_years");
    }

    #[test]
    fn test_rejects_bad_change_month() {
        let input = MortgageInput {
            loan: loan(),
            repayment_changes: vec![RepaymentChange {
                amount: dec!(3000),
                month: 13,
                year: 2025,
            }],
            additional_payments: vec![],
        };
        assert_eq!(
            field_of(validate_input(&input).unwrap_err()),
            "repayment_changes[0].month"
        );
    }

    #[test]
    fn test_anchor_ordering() {
        let a = Anchor { year: 2025, month: 12 };
        let b = Anchor { year: 2026, month: 1 };
        assert!(a < b);
        assert_eq!(b.to_string(), "2026-01");
    }

    #[test]
    fn test_input_from_json() {
        let json = r#"{
            "principal": "500000",
            "annual_rate_pct": "5.94",
            "term_years": "30",
            "repayment_frequency": "monthly",
            "start_date": "2025-01-01",
            "repayment_changes": [{"amount": "4000", "month": 1, "year": 2025}]
        }"#;
        let input: MortgageInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.loan.fee_frequency, FeeFrequency::Annual);
        assert_eq!(input.loan.fee_amount, Decimal::ZERO);
        assert_eq!(input.repayment_changes.len(), 1);
        assert!(input.additional_payments.is_empty());
    }

    #[test]
    fn test_unknown_frequency_in_json_names_field() {
        let json = r#"{
            "principal": "500000",
            "annual_rate_pct": "5.94",
            "term_years": "30",
            "repayment_frequency": "quarterly",
            "start_date": "2025-01-01"
        }"#;
        assert_eq!(
            field_of(json.parse::<MortgageInput>().unwrap_err()),
            "repayment_frequency"
        );

        let fee = json.replace("quarterly", "Monthly").replace(
            r#""start_date""#,
            r#""fee_frequency": "biannual", "start_date""#,
        );
        assert_eq!(field_of(fee.parse::<MortgageInput>().unwrap_err()), "fee_frequency");

        // Plain serde carries the same message
        let err = serde_json::from_str::<MortgageInput>(json).unwrap_err();
        assert!(err.to_string().contains("repayment_frequency"));
    }

    #[test]
    fn test_accepts_high_rate() {
        let mut l = loan();
        l.annual_rate_pct = dec!(250);
        assert!(validate_loan(&l).is_ok());
    }
}
