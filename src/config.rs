use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{LendingError, Result};
use crate::payments::CheckoutConfig;
use crate::services::RatesTable;
use crate::types::LoanType;

/// lending configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LendingConfig {
    pub products: BTreeMap<LoanType, LoanProduct>,
    pub checkout: CheckoutConfig,
    pub quick_checkout: CheckoutConfig,
}

/// one loan product's terms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanProduct {
    /// annual percent, e.g. 15.5
    pub interest_rate: Decimal,
    pub max_amount: Money,
    /// allowed terms in months
    pub durations: Vec<u32>,
}

impl LoanProduct {
    pub fn allows_duration(&self, months: u32) -> bool {
        self.durations.contains(&months)
    }
}

const STANDARD_DURATIONS: [u32; 6] = [6, 12, 24, 36, 48, 60];
const PAYDAY_DURATIONS: [u32; 3] = [1, 2, 3];

impl Default for LendingConfig {
    fn default() -> Self {
        let mut products = BTreeMap::new();
        products.insert(
            LoanType::SmallBusiness,
            LoanProduct {
                interest_rate: dec!(15.5),
                max_amount: Money::from_major(5_000_000),
                durations: STANDARD_DURATIONS.to_vec(),
            },
        );
        products.insert(
            LoanType::Payday,
            LoanProduct {
                interest_rate: dec!(20),
                max_amount: Money::from_major(500_000),
                durations: PAYDAY_DURATIONS.to_vec(),
            },
        );
        products.insert(
            LoanType::Collateral,
            LoanProduct {
                interest_rate: dec!(12),
                max_amount: Money::from_major(50_000_000),
                durations: STANDARD_DURATIONS.to_vec(),
            },
        );

        Self {
            products,
            checkout: CheckoutConfig {
                fee_rate: dec!(0.025),
                minimum_amount: Money::from_major(100),
                maximum_amount: Some(Money::from_major(1_000_000)),
            },
            quick_checkout: CheckoutConfig {
                fee_rate: Decimal::ZERO,
                minimum_amount: Money::from_major(100),
                maximum_amount: None,
            },
        }
    }
}

impl LendingConfig {
    /// parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self> {
        let config: LendingConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.products.is_empty() {
            return Err(invalid("no loan products configured"));
        }
        for (loan_type, product) in &self.products {
            if product.interest_rate.is_sign_negative() {
                return Err(invalid(format!("{loan_type}: negative interest rate")));
            }
            if !product.max_amount.is_positive() {
                return Err(invalid(format!("{loan_type}: max amount must be positive")));
            }
            if product.durations.is_empty() || product.durations.contains(&0) {
                return Err(invalid(format!("{loan_type}: durations must be non-empty and positive")));
            }
        }
        self.checkout.validate("checkout")?;
        self.quick_checkout.validate("quick_checkout")?;
        Ok(())
    }

    pub fn product(&self, loan_type: LoanType) -> Result<&LoanProduct> {
        self.products
            .get(&loan_type)
            .ok_or_else(|| LendingError::invalid_input("loanType", format!("{loan_type} is not offered")))
    }

    /// rates and limits in the shape served by the rates endpoint
    pub fn rates_table(&self) -> RatesTable {
        RatesTable {
            interest_rates: self.products.iter().map(|(t, p)| (*t, p.interest_rate)).collect(),
            max_amounts: self.products.iter().map(|(t, p)| (*t, p.max_amount.as_decimal())).collect(),
        }
    }

    /// apply a fetched rates table over the configured products
    ///
    /// Loan types missing from the table keep their configured terms.
    pub fn with_rates(mut self, rates: &RatesTable) -> Self {
        for (loan_type, product) in self.products.iter_mut() {
            if let Some(rate) = rates.rate_percent(*loan_type) {
                product.interest_rate = rate;
            }
            if let Some(max) = rates.max_amount(*loan_type) {
                product.max_amount = max;
            }
        }
        self
    }
}

fn invalid(message: impl Into<String>) -> LendingError {
    LendingError::InvalidConfiguration {
        message: message.into(),
    }
}
