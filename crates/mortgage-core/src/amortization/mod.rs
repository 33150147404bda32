pub mod chart;
pub mod engine;
pub mod loan;
pub mod payment;

pub use chart::{ChartData, LumpSumEvent, PaymentEvent};
pub use engine::{
    amortize, calculate_mortgage, calculate_payment, MortgageOutput, MortgageResults, ScheduleRow,
};
pub use loan::{
    AdditionalPayment, FeeFrequency, LoanParameters, MortgageInput, RepaymentChange,
    RepaymentFrequency,
};
