use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::LendingError;

/// unique identifier for one in-progress wizard session
pub type WizardId = Uuid;

/// loan products offered
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanType {
    SmallBusiness,
    Payday,
    Collateral,
}

impl LoanType {
    pub const ALL: [LoanType; 3] = [LoanType::SmallBusiness, LoanType::Payday, LoanType::Collateral];

    /// wire name, as used in records and api payloads
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanType::SmallBusiness => "small_business",
            LoanType::Payday => "payday",
            LoanType::Collateral => "collateral",
        }
    }

    /// human label ("small business")
    pub fn label(&self) -> String {
        self.as_str().replace('_', " ")
    }
}

impl fmt::Display for LoanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoanType {
    type Err = LendingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LoanType::ALL
            .into_iter()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| LendingError::invalid_input("loanType", format!("unknown loan type '{s}'")))
    }
}

/// employment status options on the registration form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmploymentStatus {
    Employed,
    SelfEmployed,
    Unemployed,
    Student,
    Retired,
}

impl EmploymentStatus {
    pub const ALL: [EmploymentStatus; 5] = [
        EmploymentStatus::Employed,
        EmploymentStatus::SelfEmployed,
        EmploymentStatus::Unemployed,
        EmploymentStatus::Student,
        EmploymentStatus::Retired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmploymentStatus::Employed => "employed",
            EmploymentStatus::SelfEmployed => "self-employed",
            EmploymentStatus::Unemployed => "unemployed",
            EmploymentStatus::Student => "student",
            EmploymentStatus::Retired => "retired",
        }
    }
}

/// wizard lifecycle status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WizardStatus {
    /// collecting data, step index is meaningful
    InProgress,
    /// accepted by the submission collaborator
    Submitted { resource_id: String },
}
