use std::sync::Arc;

use hourglass_rs::SafeTimeProvider;

use crate::errors::Result;
use crate::flows::schema_step;
use crate::services::Submitter;
use crate::wizard::{FieldRule, FieldSpec, StepSchema, Wizard};

pub const FLOW: &str = "registration";

const EMPLOYMENT_STATUSES: &[&str] = &["employed", "self-employed", "unemployed", "student", "retired"];

/// customer sign-up: personal information, contact details, banking and employment
pub struct RegistrationFlow;

impl RegistrationFlow {
    pub fn personal_information() -> StepSchema {
        StepSchema::new(
            "personal_information",
            vec![
                FieldSpec::new("firstName", "First name", FieldRule::Required),
                FieldSpec::new("lastName", "Last name", FieldRule::Required),
                FieldSpec::new("email", "Email", FieldRule::Required),
                FieldSpec::new("phone", "Phone number", FieldRule::Required),
                FieldSpec::new("password", "Password", FieldRule::MinLength(6)),
                FieldSpec::new("confirmPassword", "Confirm password", FieldRule::MatchesField("password")),
            ],
        )
    }

    pub fn contact_details() -> StepSchema {
        StepSchema::new(
            "contact_details",
            vec![
                FieldSpec::new("dateOfBirth", "Date of birth", FieldRule::Required),
                FieldSpec::new("address", "Address", FieldRule::Required),
                FieldSpec::new("city", "City", FieldRule::Required),
                FieldSpec::new("state", "State", FieldRule::Required),
                FieldSpec::new("bvn", "BVN", FieldRule::ExactLengthIfPresent(11)),
            ],
        )
    }

    pub fn banking_employment() -> StepSchema {
        StepSchema::new(
            "banking_employment",
            vec![
                FieldSpec::new("bankAccountNumber", "Account number", FieldRule::Optional),
                FieldSpec::new("bankName", "Bank name", FieldRule::Optional),
                FieldSpec::new("accountName", "Account name", FieldRule::Optional),
                FieldSpec::new("employmentStatus", "Employment status", FieldRule::OneOf(EMPLOYMENT_STATUSES)),
            ],
        )
        .with_variant(
            "employmentStatus",
            "employed",
            vec![
                FieldSpec::new("employerName", "Employer name", FieldRule::Optional),
                FieldSpec::new("jobTitle", "Job title", FieldRule::Optional),
                FieldSpec::new("monthlyIncome", "Monthly income", FieldRule::NumberIfPresent),
                FieldSpec::new("employmentDuration", "Employment duration", FieldRule::NumberIfPresent),
            ],
        )
    }

    pub fn schemas() -> Vec<StepSchema> {
        vec![
            Self::personal_information(),
            Self::contact_details(),
            Self::banking_employment(),
        ]
    }

    pub fn build(submitter: Arc<dyn Submitter>, time_provider: &SafeTimeProvider) -> Result<Wizard> {
        Wizard::builder(FLOW)
            .steps(Self::schemas().into_iter().map(schema_step))
            .submitter(submitter)
            .build(time_provider)
    }
}
