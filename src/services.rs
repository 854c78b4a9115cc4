//! Boundary contracts for the backend collaborators: rate/limit lookup,
//! quoting and submission. Transport lives with the implementor.

use std::collections::BTreeMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decimal::{Money, Rate};
use crate::errors::{LendingError, Result};
use crate::quote::{compute_quote, LoanQuote};
use crate::types::LoanType;
use crate::wizard::Record;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// the backend refused the request; message is shown to the user as-is
    #[error("{message}")]
    Rejected {
        message: String,
    },

    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// rates and limits per loan type, as served by the rates endpoint
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatesTable {
    /// annual percent, e.g. 15.5
    pub interest_rates: BTreeMap<LoanType, Decimal>,
    pub max_amounts: BTreeMap<LoanType, Decimal>,
}

impl RatesTable {
    pub fn rate_percent(&self, loan_type: LoanType) -> Option<Decimal> {
        self.interest_rates.get(&loan_type).copied()
    }

    pub fn max_amount(&self, loan_type: LoanType) -> Option<Money> {
        self.max_amounts.get(&loan_type).copied().map(Money::from_decimal)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub duration: u32,
    pub loan_type: LoanType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    #[serde(with = "rust_decimal::serde::float")]
    pub monthly_payment: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_interest: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_payment: Decimal,
    /// annual percent
    #[serde(with = "rust_decimal::serde::float")]
    pub interest_rate: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub loan_amount: Decimal,
    pub loan_duration: u32,
}

impl From<&LoanQuote> for QuoteResponse {
    fn from(quote: &LoanQuote) -> Self {
        Self {
            monthly_payment: quote.monthly_payment.as_decimal(),
            total_interest: quote.total_interest.as_decimal(),
            total_payment: quote.total_payment.as_decimal(),
            interest_rate: quote.annual_rate.as_percentage(),
            loan_amount: quote.principal.as_decimal(),
            loan_duration: quote.term_months,
        }
    }
}

impl TryFrom<QuoteResponse> for LoanQuote {
    type Error = LendingError;

    fn try_from(response: QuoteResponse) -> Result<Self> {
        let principal = Money::from_decimal(response.loan_amount);
        let monthly_payment = Money::from_decimal(response.monthly_payment);
        let total_payment = Money::from_decimal(response.total_payment);
        let total_interest = Money::from_decimal(response.total_interest);

        if response.loan_duration == 0 || principal + total_interest != total_payment {
            return Err(LendingError::external(
                "quote",
                ServiceError::MalformedResponse(format!(
                    "inconsistent quote: amount {} + interest {} != total {}",
                    principal, total_interest, total_payment
                )),
            ));
        }

        let leading = monthly_payment
            .checked_times(response.loan_duration - 1)
            .ok_or_else(|| {
                LendingError::external("quote", ServiceError::MalformedResponse("payment out of range".to_string()))
            })?;

        Ok(LoanQuote {
            principal,
            annual_rate: Rate::from_percent(response.interest_rate),
            term_months: response.loan_duration,
            monthly_payment,
            total_interest,
            total_payment,
            final_payment: total_payment - leading,
        })
    }
}

/// receipt for an accepted submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub resource_id: String,
}

#[async_trait]
pub trait RatesProvider: Send + Sync {
    async fn fetch_rates(&self) -> std::result::Result<RatesTable, ServiceError>;
}

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn quote(&self, request: QuoteRequest) -> std::result::Result<QuoteResponse, ServiceError>;
}

#[async_trait]
pub trait Submitter: Send + Sync {
    /// hand over the completed record of `flow`
    async fn submit(&self, flow: &str, record: &Record) -> std::result::Result<SubmissionReceipt, ServiceError>;
}

/// quotes computed in-process from a rates table; same contract as the remote calculator
#[derive(Debug, Clone)]
pub struct LocalQuoteProvider {
    rates: RatesTable,
}

impl LocalQuoteProvider {
    pub fn new(rates: RatesTable) -> Self {
        Self { rates }
    }

    pub fn quote_now(&self, request: &QuoteRequest) -> Result<QuoteResponse> {
        let rate = self.rates.rate_percent(request.loan_type).ok_or_else(|| {
            LendingError::invalid_input("loanType", format!("no rate configured for {}", request.loan_type))
        })?;
        let quote = compute_quote(Money::from_decimal(request.amount), rate, request.duration)?;
        Ok(QuoteResponse::from(&quote))
    }
}

#[async_trait]
impl QuoteProvider for LocalQuoteProvider {
    async fn quote(&self, request: QuoteRequest) -> std::result::Result<QuoteResponse, ServiceError> {
        self.quote_now(&request).map_err(|e| ServiceError::Rejected {
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LendingConfig;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn test_rates_table_wire_format() {
        let json = r#"{
            "interestRates": { "small_business": 15.5, "payday": 20, "collateral": 12 },
            "maxAmounts": { "small_business": 5000000, "payday": 500000, "collateral": 50000000 }
        }"#;
        let table: RatesTable = serde_json::from_str(json).unwrap();

        assert_eq!(table.rate_percent(LoanType::SmallBusiness), Some(dec!(15.5)));
        assert_eq!(table.max_amount(LoanType::Payday), Some(Money::from_major(500_000)));
        assert_eq!(table, LendingConfig::default().rates_table());
    }

    #[tokio::test]
    async fn test_local_provider_matches_calculator() {
        let provider = LocalQuoteProvider::new(LendingConfig::default().rates_table());
        let response = provider
            .quote(QuoteRequest {
                amount: dec!(100000),
                duration: 12,
                loan_type: LoanType::SmallBusiness,
            })
            .await
            .unwrap();

        let expected = compute_quote(Money::from_major(100_000), dec!(15.5), 12).unwrap();
        assert_eq!(response, QuoteResponse::from(&expected));
        assert_eq!(response.interest_rate, dec!(15.5));

        let round_trip = LoanQuote::try_from(response).unwrap();
        assert_eq!(round_trip, expected);
    }

    #[test]
    fn test_quote_response_json_uses_numbers() {
        let quote = compute_quote(Money::from_major(100_000), dec!(15.5), 12).unwrap();
        let value = serde_json::to_value(QuoteResponse::from(&quote)).unwrap();

        assert_eq!(value["monthlyPayment"], serde_json::json!(9049.0));
        assert_eq!(value["loanDuration"], serde_json::json!(12));
    }

    #[test]
    fn test_inconsistent_remote_quote_rejected() {
        let response = QuoteResponse {
            monthly_payment: dec!(9049),
            total_interest: dec!(8000),
            total_payment: dec!(108588),
            interest_rate: dec!(15.5),
            loan_amount: dec!(100000),
            loan_duration: 12,
        };
        let err = LoanQuote::try_from(response).unwrap_err();
        assert!(matches!(err, LendingError::ExternalCallFailed { service: "quote", .. }));
    }

    #[test]
    fn test_unknown_rate_is_invalid_input() {
        let provider = LocalQuoteProvider::new(RatesTable::default());
        let err = provider
            .quote_now(&QuoteRequest {
                amount: dec!(1000),
                duration: 3,
                loan_type: LoanType::Payday,
            })
            .unwrap_err();
        assert!(matches!(err, LendingError::InvalidInput { field: "loanType", .. }));
    }
}
