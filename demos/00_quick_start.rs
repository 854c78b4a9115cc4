/// quick start - quote a loan, then walk the application wizard end to end
use std::sync::Arc;

use async_trait::async_trait;
use microloan_rs::{
    compute_quote, AmortizationSchedule, LendingConfig, LoanApplicationFlow, Money, Record, SafeTimeProvider,
    ServiceError, SubmissionReceipt, Submitter, TimeSource,
};
use rust_decimal_macros::dec;
use tracing_subscriber::EnvFilter;

/// prints the record instead of calling a backend
struct PrintSubmitter;

#[async_trait]
impl Submitter for PrintSubmitter {
    async fn submit(&self, flow: &str, record: &Record) -> Result<SubmissionReceipt, ServiceError> {
        println!("submitting {flow}: {}", serde_json::to_string_pretty(record).unwrap_or_default());
        Ok(SubmissionReceipt {
            resource_id: "app_0001".to_string(),
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // ₦100,000 small business loan at 15.5% over 12 months
    let quote = compute_quote(Money::from_major(100_000), dec!(15.5), 12)?;
    println!(
        "monthly {} | total {} | interest {}",
        quote.monthly_payment, quote.total_payment, quote.total_interest
    );

    let schedule = AmortizationSchedule::from_quote(&quote);
    for row in schedule.payments.iter().take(3) {
        println!(
            "#{:>2} pay {} interest {} balance {}",
            row.payment_number, row.payment_amount, row.interest_portion, row.ending_balance
        );
    }

    // the same numbers through the application wizard
    let time = SafeTimeProvider::new(TimeSource::System);
    let flow = LoanApplicationFlow::new(LendingConfig::default());
    let mut wizard = flow.build(flow.local_quote_provider(), Arc::new(PrintSubmitter), &time)?;

    wizard.update_field("amountRequested", "100000")?;
    wizard.update_field("loanDuration", "12")?;
    wizard.update_field("purpose", "Buy a second oven")?;
    wizard.advance().await?;

    wizard.update_field("businessDetails.name", "Mama Put Bakery")?;
    wizard.advance().await?;

    wizard.update_field("termsAccepted", true)?;
    let receipt = wizard.submit(&time).await?;
    println!("submitted as {}", receipt.resource_id);

    let checkout = flow.config().checkout.quote(quote.monthly_payment)?;
    println!("first repayment: {} + fee {} = {}", checkout.amount, checkout.processing_fee, checkout.total);

    Ok(())
}
