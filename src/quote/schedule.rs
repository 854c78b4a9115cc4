use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::quote::LoanQuote;

/// one instalment in a repayment schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledPayment {
    pub payment_number: u32,
    pub beginning_balance: Money,
    pub payment_amount: Money,
    pub principal_portion: Money,
    pub interest_portion: Money,
    pub ending_balance: Money,
    pub cumulative_interest: Money,
}

/// month-by-month breakdown of a quote
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub principal: Money,
    pub interest_rate: Rate,
    pub term_months: u32,
    pub payments: Vec<ScheduledPayment>,
    pub total_interest: Money,
    pub total_payment: Money,
}

impl AmortizationSchedule {
    /// expand a quote into instalments paying its rounded monthly amount
    ///
    /// Interest is charged on the opening balance each month and rounded
    /// half-up to whole units. The final instalment is whatever closes the
    /// balance to exactly zero, so it absorbs the rounding remainder.
    pub fn from_quote(quote: &LoanQuote) -> Self {
        let monthly_rate = quote.annual_rate.monthly_rate().as_decimal();

        let mut payments = Vec::with_capacity(quote.term_months as usize);
        let mut balance = quote.principal;
        let mut cumulative_interest = Money::ZERO;

        for i in 1..=quote.term_months {
            let interest_portion = (balance * monthly_rate).round_whole();
            let principal_portion = if i == quote.term_months {
                balance
            } else {
                (quote.monthly_payment - interest_portion).min(balance).max(Money::ZERO)
            };
            let payment_amount = principal_portion + interest_portion;
            let ending_balance = balance - principal_portion;

            cumulative_interest += interest_portion;

            payments.push(ScheduledPayment {
                payment_number: i,
                beginning_balance: balance,
                payment_amount,
                principal_portion,
                interest_portion,
                ending_balance,
                cumulative_interest,
            });

            balance = ending_balance;
        }

        let total_payment = payments
            .iter()
            .map(|p| p.payment_amount)
            .fold(Money::ZERO, |acc, x| acc + x);

        Self {
            principal: quote.principal,
            interest_rate: quote.annual_rate,
            term_months: quote.term_months,
            payments,
            total_interest: cumulative_interest,
            total_payment,
        }
    }

    /// get payment for specific period (1-based)
    pub fn get_payment(&self, payment_number: u32) -> Option<&ScheduledPayment> {
        payment_number
            .checked_sub(1)
            .and_then(|idx| self.payments.get(idx as usize))
    }

    /// remaining balance after a payment; the principal before the first
    pub fn balance_after_payment(&self, payment_number: u32) -> Money {
        self.get_payment(payment_number)
            .map(|p| p.ending_balance)
            .unwrap_or(self.principal)
    }

    /// schedule total minus the quoted total, caused by per-month interest rounding
    pub fn residual(&self, quote: &LoanQuote) -> Money {
        self.total_payment - quote.total_payment
    }

    /// share of the total repayment that is interest
    pub fn interest_share(&self) -> Decimal {
        if self.total_payment.is_zero() {
            return Decimal::ZERO;
        }
        self.total_interest.as_decimal() / self.total_payment.as_decimal()
    }
}
