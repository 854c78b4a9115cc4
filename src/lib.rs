pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod flows;
pub mod payments;
pub mod quote;
pub mod services;
pub mod state;
pub mod types;
pub mod wizard;

// re-export key types
pub use config::{LendingConfig, LoanProduct};
pub use decimal::{Money, Rate};
pub use errors::{LendingError, Result};
pub use events::{Event, EventStore};
pub use flows::{LoanApplicationFlow, QuoteHook, RegistrationFlow};
pub use payments::{payment_options, CheckoutConfig, CheckoutQuote, PaymentOption};
pub use quote::{compute_quote, AmortizationSchedule, LoanQuote, LoanQuoteRequest, ScheduledPayment};
pub use services::{
    LocalQuoteProvider, QuoteProvider, QuoteRequest, QuoteResponse, RatesProvider, RatesTable, ServiceError,
    SubmissionReceipt, Submitter,
};
pub use state::{StateSnapshot, WizardState};
pub use types::{EmploymentStatus, LoanType, WizardId, WizardStatus};
pub use wizard::{
    FieldRule, FieldSpec, FieldValue, Record, SharedWizard, StepDefinition, StepHook, StepSchema, Validation, Wizard,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
