use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::decimal::Money;
use crate::errors::{LendingError, Result};

/// fee and bounds for a repayment checkout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutConfig {
    /// fraction of the amount, e.g. 0.025
    pub fee_rate: Decimal,
    pub minimum_amount: Money,
    pub maximum_amount: Option<Money>,
}

/// what the customer pays at checkout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutQuote {
    pub amount: Money,
    pub processing_fee: Money,
    pub total: Money,
}

/// preset amount offered next to the free-form input
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentOption {
    pub label: &'static str,
    pub amount: Money,
}

const PRESETS: [(&str, Decimal); 5] = [
    ("Minimum Payment", dec!(0.5)),
    ("Half Payment", dec!(0.5)),
    ("Full Payment", dec!(1)),
    ("Extra Payment", dec!(1.5)),
    ("Double Payment", dec!(2)),
];

impl CheckoutConfig {
    pub fn quote(&self, amount: Money) -> Result<CheckoutQuote> {
        if amount < self.minimum_amount {
            return Err(LendingError::invalid_input(
                "amount",
                format!("must be at least {}", self.minimum_amount),
            ));
        }
        if let Some(maximum) = self.maximum_amount {
            if amount > maximum {
                return Err(LendingError::invalid_input("amount", format!("must not exceed {maximum}")));
            }
        }

        let processing_fee = amount
            .as_decimal()
            .checked_mul(self.fee_rate)
            .map(|fee| Money::from_decimal(fee).round_whole())
            .ok_or_else(|| LendingError::invalid_input("amount", "out of range"))?;
        let total = amount
            .checked_add(processing_fee)
            .ok_or_else(|| LendingError::invalid_input("amount", "out of range"))?;

        debug!(amount = %amount, fee = %processing_fee, "checkout quoted");
        Ok(CheckoutQuote {
            amount,
            processing_fee,
            total,
        })
    }

    pub(crate) fn validate(&self, name: &str) -> Result<()> {
        let invalid = |message: String| LendingError::InvalidConfiguration { message };
        if self.fee_rate.is_sign_negative() {
            return Err(invalid(format!("{name}: negative fee rate")));
        }
        if self.minimum_amount.is_negative() {
            return Err(invalid(format!("{name}: negative minimum amount")));
        }
        if let Some(maximum) = self.maximum_amount {
            if maximum < self.minimum_amount {
                return Err(invalid(format!("{name}: maximum below minimum")));
            }
        }
        Ok(())
    }
}

/// preset repayment amounts around a monthly instalment
pub fn payment_options(monthly_payment: Money) -> Result<Vec<PaymentOption>> {
    PRESETS
        .iter()
        .map(|&(label, multiple)| {
            let amount = monthly_payment
                .as_decimal()
                .checked_mul(multiple)
                .map(|amount| Money::from_decimal(amount).round_whole())
                .ok_or_else(|| LendingError::invalid_input("amount", "out of range"))?;
            Ok(PaymentOption { label, amount })
        })
        .collect()
}
