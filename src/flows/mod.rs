//! The two concrete wizards: customer registration and loan application.

pub mod loan_application;
pub mod registration;

use crate::wizard::{StepDefinition, StepSchema};

pub use loan_application::{LoanApplicationFlow, QuoteHook};
pub use registration::RegistrationFlow;

/// step whose validator is derived from a declarative schema
pub(crate) fn schema_step(schema: StepSchema) -> StepDefinition {
    StepDefinition::new(schema.name).with_validator(move |record| schema.validate(record))
}
