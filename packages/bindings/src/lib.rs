use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Serialize;

use mortgage_core::amortization::{self, MortgageInput};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse_input(input_json: &str) -> NapiResult<MortgageInput> {
    input_json.parse().map_err(to_napi_error)
}

fn to_json(value: &impl Serialize) -> NapiResult<String> {
    serde_json::to_string(value).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Amortization
// ---------------------------------------------------------------------------

/// Full calculation: results, chart series, schedule, warnings.
#[napi]
pub fn calculate_mortgage(input_json: String) -> NapiResult<String> {
    let input = parse_input(&input_json)?;
    let output = amortization::calculate_mortgage(&input).map_err(to_napi_error)?;
    to_json(&output)
}

/// Per-period ledger for the spreadsheet export.
#[napi]
pub fn amortization_schedule(input_json: String) -> NapiResult<String> {
    let input = parse_input(&input_json)?;
    let (output, _warnings) = amortization::amortize(&input).map_err(to_napi_error)?;
    to_json(&output.schedule)
}

/// Baseline periodic payment, as a decimal string.
#[napi]
pub fn baseline_payment(input_json: String) -> NapiResult<String> {
    let input = parse_input(&input_json)?;
    let output = amortization::calculate_payment(&input).map_err(to_napi_error)?;
    let payment: Decimal = output.result;
    Ok(payment.round_dp(2).to_string())
}
