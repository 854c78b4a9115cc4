pub mod calculator;
pub mod schedule;

pub use calculator::{compute_quote, LoanQuote, LoanQuoteRequest};
pub use schedule::{AmortizationSchedule, ScheduledPayment};
