use std::sync::Arc;

use async_trait::async_trait;
use hourglass_rs::SafeTimeProvider;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::config::LendingConfig;
use crate::errors::{LendingError, Result};
use crate::flows::schema_step;
use crate::quote::LoanQuote;
use crate::services::{LocalQuoteProvider, QuoteProvider, QuoteRequest, RatesProvider, Submitter};
use crate::types::LoanType;
use crate::wizard::{
    FieldRule, FieldSpec, FieldValue, Record, StepDefinition, StepHook, StepSchema, Validation, Wizard,
};

pub const FLOW: &str = "loan_application";

/// record key the computed quote is stored under
pub const QUOTE_FIELD: &str = "quote";

/// loan type the stored quote was computed for
pub const QUOTED_LOAN_TYPE_FIELD: &str = "quote.loanType";

const LOAN_TYPES: &[&str] = &["small_business", "payday", "collateral"];
const COLLATERAL_TYPES: &[&str] = &["property", "vehicle", "equipment", "other"];
const BUSINESS_TYPES: &[&str] = &["retail", "manufacturing", "services", "agriculture", "technology", "other"];

/// fetches a repayment quote once loan details validate
pub struct QuoteHook {
    provider: Arc<dyn QuoteProvider>,
}

impl QuoteHook {
    pub fn new(provider: Arc<dyn QuoteProvider>) -> Self {
        Self { provider }
    }

    fn request(record: &Record) -> Result<QuoteRequest> {
        let loan_type: LoanType = record
            .text("loanType")
            .ok_or_else(|| LendingError::invalid_input("loanType", "is required"))?
            .parse()?;
        let amount = record
            .number("amountRequested")
            .ok_or_else(|| LendingError::invalid_input("amountRequested", "must be a number"))?;
        let duration = record
            .whole_number("loanDuration")
            .ok_or_else(|| LendingError::invalid_input("loanDuration", "must be a whole number of months"))?;

        Ok(QuoteRequest {
            amount,
            duration,
            loan_type,
        })
    }
}

#[async_trait]
impl StepHook for QuoteHook {
    async fn on_step_complete(&self, record: &Record) -> Result<Vec<(String, FieldValue)>> {
        let request = Self::request(record)?;
        let loan_type = request.loan_type;
        let response = self
            .provider
            .quote(request)
            .await
            .map_err(|e| LendingError::external("quote", e))?;
        let quote = LoanQuote::try_from(response)?;

        debug!(
            monthly = %quote.monthly_payment,
            total = %quote.total_payment,
            term = quote.term_months,
            "loan quote received"
        );
        Ok(vec![
            (QUOTE_FIELD.to_string(), FieldValue::Quote(quote)),
            (QUOTED_LOAN_TYPE_FIELD.to_string(), FieldValue::from(loan_type.as_str())),
        ])
    }
}

/// loan application: details with a quote, product-specific details, review
#[derive(Debug, Clone)]
pub struct LoanApplicationFlow {
    config: LendingConfig,
}

impl LoanApplicationFlow {
    pub fn new(config: LendingConfig) -> Self {
        Self { config }
    }

    /// fetch the live rates table once and apply it over `config`
    pub async fn load(config: LendingConfig, rates: &dyn RatesProvider) -> Result<Self> {
        let table = rates
            .fetch_rates()
            .await
            .map_err(|e| LendingError::external("rates", e))?;
        let config = config.with_rates(&table);
        config.validate()?;
        info!(products = config.products.len(), "loan rates loaded");
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &LendingConfig {
        &self.config
    }

    /// provider that quotes in-process from the loaded rates
    pub fn local_quote_provider(&self) -> Arc<LocalQuoteProvider> {
        Arc::new(LocalQuoteProvider::new(self.config.rates_table()))
    }

    pub fn loan_details() -> StepSchema {
        StepSchema::new(
            "loan_details",
            vec![
                FieldSpec::new("loanType", "Loan type", FieldRule::OneOf(LOAN_TYPES)),
                FieldSpec::new("amountRequested", "Loan amount", FieldRule::PositiveNumber),
                FieldSpec::new("loanDuration", "Loan duration", FieldRule::Required),
                FieldSpec::new("purpose", "Loan purpose", FieldRule::Required),
            ],
        )
    }

    pub fn additional_details() -> StepSchema {
        StepSchema::new("additional_details", Vec::new())
            .with_variant(
                "loanType",
                "collateral",
                vec![
                    FieldSpec::new(
                        "collateralDetails.type",
                        "Collateral type",
                        FieldRule::OneOfIfPresent(COLLATERAL_TYPES),
                    ),
                    FieldSpec::new("collateralDetails.value", "Collateral value", FieldRule::NumberIfPresent),
                    FieldSpec::new("collateralDetails.description", "Collateral description", FieldRule::Optional),
                ],
            )
            .with_variant(
                "loanType",
                "small_business",
                vec![
                    FieldSpec::new("businessDetails.name", "Business name", FieldRule::Optional),
                    FieldSpec::new("businessDetails.type", "Business type", FieldRule::OneOfIfPresent(BUSINESS_TYPES)),
                    FieldSpec::new("businessDetails.revenue", "Monthly revenue", FieldRule::NumberIfPresent),
                    FieldSpec::new("businessDetails.years", "Years in business", FieldRule::NumberIfPresent),
                    FieldSpec::new("businessDetails.description", "Business description", FieldRule::Optional),
                ],
            )
    }

    pub fn review() -> StepSchema {
        StepSchema::new(
            "review",
            vec![FieldSpec::new("termsAccepted", "Terms and conditions", FieldRule::Accepted)],
        )
    }

    pub fn schemas() -> Vec<StepSchema> {
        vec![Self::loan_details(), Self::additional_details(), Self::review()]
    }

    /// amount and duration limits of the chosen product
    pub fn check_product_limits(&self, record: &Record) -> Validation {
        let Some(loan_type) = record.text("loanType").and_then(|s| s.parse::<LoanType>().ok()) else {
            return Validation::Valid;
        };
        let Ok(product) = self.config.product(loan_type) else {
            return Validation::Invalid(vec![format!("{} loans are not offered", loan_type.label())]);
        };

        let mut reasons = Vec::new();
        if let Some(amount) = record.number("amountRequested") {
            if amount > product.max_amount.as_decimal() {
                reasons.push(format!(
                    "Maximum amount for {} loan is {}",
                    loan_type.label(),
                    product.max_amount
                ));
            }
        }
        if record.is_present("loanDuration") {
            let allowed = record
                .whole_number("loanDuration")
                .is_some_and(|months| product.allows_duration(months));
            if !allowed {
                let menu: Vec<String> = product.durations.iter().map(u32::to_string).collect();
                reasons.push(format!("Loan duration must be one of: {} months", menu.join(", ")));
            }
        }
        Validation::from_reasons(reasons)
    }

    /// the stored quote still describes the requested amount, term and loan type
    pub fn check_quote_current(&self, record: &Record) -> Validation {
        let Some(quote) = record.quote(QUOTE_FIELD) else {
            return Validation::Invalid(vec![
                "Loan quote is missing; go back to loan details to get a quote".to_string(),
            ]);
        };

        let same_amount = record
            .number("amountRequested")
            .is_some_and(|amount| amount == quote.principal.as_decimal());
        let same_term = record.whole_number("loanDuration") == Some(quote.term_months);
        let same_type = record
            .text("loanType")
            .is_some_and(|loan_type| record.text(QUOTED_LOAN_TYPE_FIELD) == Some(loan_type));

        if same_amount && same_term && same_type {
            Validation::Valid
        } else {
            Validation::Invalid(vec![
                "Loan details changed after the quote; go back to loan details to re-quote".to_string(),
            ])
        }
    }

    pub fn build(
        &self,
        quote_provider: Arc<dyn QuoteProvider>,
        submitter: Arc<dyn Submitter>,
        time_provider: &SafeTimeProvider,
    ) -> Result<Wizard> {
        let limits = self.clone();
        let details = Self::loan_details();
        let first = StepDefinition::new(details.name)
            .with_validator(move |record| details.validate(record).and(limits.check_product_limits(record)))
            .with_hook(Arc::new(QuoteHook::new(quote_provider)));

        // loan details stay editable after the quote, so review re-checks them
        let flow = self.clone();
        let review = Self::review();
        let last = StepDefinition::new(review.name).with_validator(move |record| {
            review
                .validate(record)
                .and(flow.check_product_limits(record))
                .and(flow.check_quote_current(record))
        });

        let mut wizard = Wizard::builder(FLOW)
            .step(first)
            .step(schema_step(Self::additional_details()))
            .step(last)
            .submitter(submitter)
            .build(time_provider)?;
        wizard.update_field("loanType", LoanType::SmallBusiness.as_str())?;
        Ok(wizard)
    }
}

/// monthly payment from a stored quote, if one was fetched
pub fn quoted_monthly_payment(record: &Record) -> Option<Decimal> {
    record.quote(QUOTE_FIELD).map(|q| q.monthly_payment.as_decimal())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Money;
    use crate::quote::compute_quote;
    use crate::services::{QuoteResponse, RatesTable, ServiceError};
    use crate::wizard::controller::tests::{test_time, RecordingSubmitter};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    struct DownQuotes;

    #[async_trait]
    impl QuoteProvider for DownQuotes {
        async fn quote(&self, _request: QuoteRequest) -> std::result::Result<QuoteResponse, ServiceError> {
            Err(ServiceError::Unavailable("calculator offline".to_string()))
        }
    }

    struct FixedRates(Option<RatesTable>);

    #[async_trait]
    impl RatesProvider for FixedRates {
        async fn fetch_rates(&self) -> std::result::Result<RatesTable, ServiceError> {
            self.0
                .clone()
                .ok_or_else(|| ServiceError::Unavailable("rates offline".to_string()))
        }
    }

    fn flow() -> LoanApplicationFlow {
        LoanApplicationFlow::new(LendingConfig::default())
    }

    fn wizard() -> Wizard {
        let flow = flow();
        flow.build(flow.local_quote_provider(), RecordingSubmitter::accepting(), &test_time())
            .unwrap()
    }

    fn fill_details(wizard: &mut Wizard, loan_type: &str, amount: &str, duration: &str) {
        wizard.update_field("loanType", loan_type).unwrap();
        wizard.update_field("amountRequested", amount).unwrap();
        wizard.update_field("loanDuration", duration).unwrap();
        wizard.update_field("purpose", "Restock inventory").unwrap();
    }

    #[tokio::test]
    async fn test_advance_stores_quote_from_calculator() {
        let mut wizard = wizard();
        assert_eq!(wizard.record().text("loanType"), Some("small_business"));
        fill_details(&mut wizard, "small_business", "100000", "12");

        assert_eq!(wizard.advance().await.unwrap(), 1);

        let expected = compute_quote(Money::from_major(100_000), dec!(15.5), 12).unwrap();
        assert_eq!(wizard.record().quote(QUOTE_FIELD), Some(&expected));
        assert_eq!(quoted_monthly_payment(wizard.record()), Some(dec!(9049)));
    }

    #[tokio::test]
    async fn test_amount_above_product_maximum() {
        let mut wizard = wizard();
        fill_details(&mut wizard, "payday", "600000", "2");

        let err = wizard.advance().await.unwrap_err();
        assert_eq!(
            err.reasons(),
            ["Maximum amount for payday loan is 500000".to_string()]
        );
        assert_eq!(wizard.current_step(), 0);
        assert!(wizard.record().quote(QUOTE_FIELD).is_none());
    }

    #[tokio::test]
    async fn test_duration_must_come_from_product_menu() {
        let mut wizard = wizard();
        fill_details(&mut wizard, "payday", "50000", "12");

        let err = wizard.advance().await.unwrap_err();
        assert_eq!(
            err.reasons(),
            ["Loan duration must be one of: 1, 2, 3 months".to_string()]
        );

        wizard.update_field("loanDuration", "3").unwrap();
        assert_eq!(wizard.advance().await.unwrap(), 1);
        let quote = wizard.record().quote(QUOTE_FIELD).unwrap();
        assert_eq!(quote.annual_rate.as_percentage(), dec!(20));
    }

    #[tokio::test]
    async fn test_quote_failure_keeps_wizard_on_details() {
        let flow = flow();
        let mut wizard = flow
            .build(Arc::new(DownQuotes), RecordingSubmitter::accepting(), &test_time())
            .unwrap();
        fill_details(&mut wizard, "collateral", "2000000", "24");

        let err = wizard.advance().await.unwrap_err();
        assert!(matches!(err, LendingError::ExternalCallFailed { service: "quote", .. }));
        assert_eq!(wizard.current_step(), 0);
        assert!(wizard.record().quote(QUOTE_FIELD).is_none());
    }

    #[tokio::test]
    async fn test_details_variant_follows_loan_type() {
        let mut wizard = wizard();
        fill_details(&mut wizard, "collateral", "2000000", "24");
        wizard.advance().await.unwrap();

        // business fields are not shown for collateral loans
        wizard.update_field("businessDetails.type", "mining").unwrap();
        wizard.update_field("collateralDetails.type", "boat").unwrap();
        let err = wizard.advance().await.unwrap_err();
        assert_eq!(
            err.reasons(),
            ["Collateral type must be one of: property, vehicle, equipment, other".to_string()]
        );

        wizard.update_field("collateralDetails.type", "vehicle").unwrap();
        wizard.update_field("collateralDetails.value", "3500000").unwrap();
        assert_eq!(wizard.advance().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_submit_requires_terms() {
        let submitter = RecordingSubmitter::accepting();
        let time = test_time();
        let flow = flow();
        let mut wizard = flow.build(flow.local_quote_provider(), submitter.clone(), &time).unwrap();
        fill_details(&mut wizard, "small_business", "250000", "6");
        wizard.advance().await.unwrap();
        wizard.advance().await.unwrap();

        let err = wizard.submit(&time).await.unwrap_err();
        assert_eq!(err.reasons(), ["Terms and conditions must be accepted".to_string()]);

        wizard.update_field("termsAccepted", true).unwrap();
        let receipt = wizard.submit(&time).await.unwrap();
        assert_eq!(receipt.resource_id, "loan_application-1");

        let calls = submitter.calls.lock().unwrap().clone();
        assert!(calls[0].1.quote(QUOTE_FIELD).is_some());
    }

    #[tokio::test]
    async fn test_review_rejects_details_edited_after_quote() {
        let submitter = RecordingSubmitter::accepting();
        let time = test_time();
        let flow = flow();
        let mut wizard = flow.build(flow.local_quote_provider(), submitter.clone(), &time).unwrap();
        fill_details(&mut wizard, "small_business", "100000", "12");
        wizard.advance().await.unwrap();
        wizard.advance().await.unwrap();

        wizard.update_field("amountRequested", "60000000").unwrap();
        wizard.update_field("termsAccepted", true).unwrap();
        let err = wizard.submit(&time).await.unwrap_err();
        assert!(matches!(err, LendingError::ValidationFailed { step: 2, .. }));
        assert_eq!(
            err.reasons(),
            [
                "Maximum amount for small business loan is 5000000".to_string(),
                "Loan details changed after the quote; go back to loan details to re-quote".to_string(),
            ]
        );
        assert_eq!(submitter.call_count(), 0);
        assert!(!wizard.is_submitted());

        // re-quoting from loan details clears the error
        wizard.update_field("amountRequested", "150000").unwrap();
        wizard.retreat().unwrap();
        wizard.retreat().unwrap();
        wizard.advance().await.unwrap();
        wizard.advance().await.unwrap();
        wizard.submit(&time).await.unwrap();

        let calls = submitter.calls.lock().unwrap().clone();
        let quote = calls[0].1.quote(QUOTE_FIELD).unwrap();
        assert_eq!(quote.principal, Money::from_major(150_000));
    }

    #[tokio::test]
    async fn test_review_rejects_loan_type_changed_after_quote() {
        let submitter = RecordingSubmitter::accepting();
        let time = test_time();
        let flow = flow();
        let mut wizard = flow.build(flow.local_quote_provider(), submitter.clone(), &time).unwrap();
        fill_details(&mut wizard, "small_business", "100000", "12");
        wizard.advance().await.unwrap();
        wizard.advance().await.unwrap();

        wizard.update_field("loanType", "collateral").unwrap();
        wizard.update_field("termsAccepted", true).unwrap();
        let err = wizard.submit(&time).await.unwrap_err();
        assert_eq!(
            err.reasons(),
            ["Loan details changed after the quote; go back to loan details to re-quote".to_string()]
        );
        assert_eq!(submitter.call_count(), 0);
    }

    #[tokio::test]
    async fn test_load_applies_fetched_rates() {
        let mut table = LendingConfig::default().rates_table();
        table.interest_rates.insert(LoanType::SmallBusiness, dec!(18));
        let flow = LoanApplicationFlow::load(LendingConfig::default(), &FixedRates(Some(table)))
            .await
            .unwrap();
        assert_eq!(
            flow.config().product(LoanType::SmallBusiness).unwrap().interest_rate,
            dec!(18)
        );

        let err = LoanApplicationFlow::load(LendingConfig::default(), &FixedRates(None))
            .await
            .unwrap_err();
        assert!(matches!(err, LendingError::ExternalCallFailed { service: "rates", .. }));
    }
}
