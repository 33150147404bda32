use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MortgageError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error(
        "Loan does not converge: balance {balance} still outstanding after {periods} periods{note}",
        note = amortization_note(.negative_amortization)
    )]
    NonConverging {
        periods: u32,
        balance: Decimal,
        negative_amortization: bool,
    },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

fn amortization_note(negative_amortization: &bool) -> &'static str {
    if *negative_amortization {
        " (payment below interest, negative amortization)"
    } else {
        ""
    }
}

impl MortgageError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        MortgageError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for MortgageError {
    fn from(e: serde_json::Error) -> Self {
        MortgageError::SerializationError(e.to_string())
    }
}
