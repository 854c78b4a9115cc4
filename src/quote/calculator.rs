use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::decimal::{Money, Rate};
use crate::errors::{LendingError, Result};

/// input to the calculator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoanQuoteRequest {
    pub principal: Money,
    pub annual_rate: Rate,
    pub term_months: u32,
}

impl LoanQuoteRequest {
    /// request from an annual percentage (15.5 for 15.5%)
    pub fn new(principal: Money, annual_rate_percent: Decimal, term_months: u32) -> Self {
        Self {
            principal,
            annual_rate: Rate::from_percent(annual_rate_percent),
            term_months,
        }
    }

    /// check preconditions; never clamps
    pub fn validate(&self) -> Result<()> {
        if !self.principal.is_positive() {
            return Err(LendingError::invalid_input(
                "principal",
                format!("must be greater than zero, got {}", self.principal),
            ));
        }
        if self.annual_rate.is_negative() {
            return Err(LendingError::invalid_input(
                "annualRatePercent",
                format!("must not be negative, got {}", self.annual_rate),
            ));
        }
        if self.term_months == 0 {
            return Err(LendingError::invalid_input("termMonths", "must be at least 1"));
        }
        Ok(())
    }

    pub fn compute(&self) -> Result<LoanQuote> {
        self.validate()?;

        let n = self.term_months;
        let r = self.annual_rate.monthly_rate().as_decimal();

        let quote = if r.is_zero() {
            zero_rate_quote(self)?
        } else {
            let raw = annuity_payment(self.principal.as_decimal(), r, n)
                .map(Money::from_decimal)
                .ok_or_else(|| LendingError::invalid_input("principal", "payment exceeds the supported range"))?;
            let mut monthly = raw.round_whole();
            let mut total = times(monthly, n)?;
            if total < self.principal {
                // rounding down would leave interest negative
                monthly = raw.ceil_whole();
                total = times(monthly, n)?;
            }

            LoanQuote {
                principal: self.principal,
                annual_rate: self.annual_rate,
                term_months: n,
                monthly_payment: monthly,
                total_interest: total - self.principal,
                total_payment: total,
                final_payment: monthly,
            }
        };

        debug!(
            principal = %quote.principal,
            rate = %quote.annual_rate,
            term_months = n,
            monthly_payment = %quote.monthly_payment,
            "computed loan quote"
        );

        Ok(quote)
    }
}

/// computed repayment quote; immutable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanQuote {
    pub principal: Money,
    pub annual_rate: Rate,
    pub term_months: u32,
    pub monthly_payment: Money,
    pub total_interest: Money,
    pub total_payment: Money,
    /// last instalment; differs from monthly_payment only when it absorbs a rounding remainder
    pub final_payment: Money,
}

impl LoanQuote {
    /// monthly payment times term
    pub fn scheduled_total(&self) -> Money {
        self.monthly_payment
            .checked_times(self.term_months)
            .unwrap_or(self.total_payment)
    }
}

/// compute a quote for a fixed-rate, fixed-term loan
///
/// Payments are rounded half-up to whole currency units and the totals are
/// derived from the rounded payment, so `total_payment == principal +
/// total_interest` always holds. At a zero rate `total_payment` equals the
/// principal and the final instalment absorbs the rounding remainder.
pub fn compute_quote(principal: Money, annual_rate_percent: Decimal, term_months: u32) -> Result<LoanQuote> {
    LoanQuoteRequest::new(principal, annual_rate_percent, term_months).compute()
}

fn zero_rate_quote(request: &LoanQuoteRequest) -> Result<LoanQuote> {
    let n = request.term_months;
    let even_share = request.principal / Decimal::from(n);
    let mut monthly = even_share.round_whole();
    let mut leading = times(monthly, n - 1)?;
    if leading > request.principal {
        // rounding up would push the final instalment below zero
        monthly = Money::from_decimal(even_share.as_decimal().floor());
        leading = times(monthly, n - 1)?;
    }

    Ok(LoanQuote {
        principal: request.principal,
        annual_rate: request.annual_rate,
        term_months: n,
        monthly_payment: monthly,
        total_interest: Money::ZERO,
        total_payment: request.principal,
        final_payment: request.principal - leading,
    })
}

fn times(amount: Money, count: u32) -> Result<Money> {
    amount
        .checked_times(count)
        .ok_or_else(|| LendingError::invalid_input("principal", "total repayment exceeds the supported range"))
}

/// P * r * (1 + r)^n / ((1 + r)^n - 1)
fn annuity_payment(principal: Decimal, r: Decimal, n: u32) -> Option<Decimal> {
    match compound_factor(Decimal::ONE + r, n) {
        Some(c) if c > Decimal::ONE => principal.checked_mul(r)?.checked_mul(c / (c - Decimal::ONE)),
        // rate below decimal resolution: the even split is the limit
        Some(_) => Some(principal / Decimal::from(n)),
        // c/(c-1) is 1 to full decimal precision once c leaves the range
        None => principal.checked_mul(r),
    }
}

/// base^n by squaring; None on overflow
fn compound_factor(base: Decimal, mut n: u32) -> Option<Decimal> {
    let mut result = Decimal::ONE;
    let mut square = base;
    while n > 0 {
        if n & 1 == 1 {
            result = result.checked_mul(square)?;
        }
        n >>= 1;
        if n > 0 {
            square = square.checked_mul(square)?;
        }
    }
    Some(result)
}
