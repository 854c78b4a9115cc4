use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Sub, SubAssign};
use std::str::FromStr;

/// money amount in major currency units (naira), kept exact until rounded
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);
    pub const ONE: Money = Money(Decimal::ONE);

    /// create from decimal
    pub fn from_decimal(d: Decimal) -> Self {
        Money(d.normalize())
    }

    /// create from string with exact parsing
    pub fn from_str_exact(s: &str) -> Result<Self, rust_decimal::Error> {
        Ok(Money(Decimal::from_str_exact(s.trim())?.normalize()))
    }

    /// create from whole currency units
    pub fn from_major(amount: i64) -> Self {
        Money(Decimal::from(amount))
    }

    /// get underlying decimal
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// round half-up to whole currency units
    pub fn round_whole(&self) -> Self {
        Money(self.0.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
    }

    /// round up to the next whole currency unit
    pub fn ceil_whole(&self) -> Self {
        Money(self.0.ceil())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// strictly greater than zero
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    pub fn min(self, other: Self) -> Self {
        Money(self.0.min(other.0))
    }

    pub fn max(self, other: Self) -> Self {
        Money(self.0.max(other.0))
    }

    /// multiply by an instalment count, None when the product leaves the decimal range
    pub fn checked_times(&self, count: u32) -> Option<Self> {
        self.0.checked_mul(Decimal::from(count)).map(Money)
    }

    pub fn checked_add(&self, other: Money) -> Option<Self> {
        self.0.checked_add(other.0).map(Money)
    }

    pub fn checked_sub(&self, other: Money) -> Option<Self> {
        self.0.checked_sub(other.0).map(Money)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::from_str_exact(s)
    }
}

impl From<Decimal> for Money {
    fn from(d: Decimal) -> Self {
        Money::from_decimal(d)
    }
}

impl From<i32> for Money {
    fn from(i: i32) -> Self {
        Money::from_major(i as i64)
    }
}

impl From<u32> for Money {
    fn from(i: u32) -> Self {
        Money::from_major(i as i64)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, other: Money) -> Money {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Money) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, other: Money) -> Money {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, other: Money) {
        self.0 -= other.0;
    }
}

impl Mul<Decimal> for Money {
    type Output = Money;

    fn mul(self, other: Decimal) -> Money {
        Money(self.0 * other)
    }
}

impl Div<Decimal> for Money {
    type Output = Money;

    fn div(self, other: Decimal) -> Money {
        Money(self.0 / other)
    }
}

/// rate type for interest rates and fees, stored as a fraction (0.155 for 15.5%)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Rate(Decimal);

impl Rate {
    pub const ZERO: Rate = Rate(Decimal::ZERO);

    /// create from fraction (e.g., 0.05 for 5%)
    pub fn from_decimal(d: Decimal) -> Self {
        Rate(d)
    }

    /// create from whole percentage (e.g., 12 for 12%)
    pub fn from_percentage(p: u32) -> Self {
        Rate(Decimal::from(p) / Decimal::from(100))
    }

    /// create from decimal percentage (e.g., 15.5 for 15.5%)
    pub fn from_percent(p: Decimal) -> Self {
        Rate(p / Decimal::from(100))
    }

    /// create from basis points (e.g., 250 for 2.5%)
    pub fn from_bps(bps: u32) -> Self {
        Rate(Decimal::from(bps) / Decimal::from(10000))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn as_percentage(&self) -> Decimal {
        (self.0 * Decimal::from(100)).normalize()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// monthly periodic rate from annual rate
    pub fn monthly_rate(&self) -> Rate {
        Rate(self.0 / Decimal::from(12))
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.as_percentage())
    }
}

impl From<Decimal> for Rate {
    fn from(d: Decimal) -> Self {
        Rate::from_decimal(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round_whole_is_half_up() {
        assert_eq!(Money::from_decimal(dec!(9049.5)).round_whole(), Money::from_major(9050));
        assert_eq!(Money::from_decimal(dec!(9049.49)).round_whole(), Money::from_major(9049));
        assert_eq!(Money::from_decimal(dec!(0.5)).round_whole(), Money::ONE);
    }

    #[test]
    fn test_parse_is_exact() {
        let m = Money::from_str_exact(" 100000.25 ").unwrap();
        assert_eq!(m.as_decimal(), dec!(100000.25));
        assert!(Money::from_str_exact("12abc").is_err());
    }

    #[test]
    fn test_rate_conversions() {
        let rate = Rate::from_percent(dec!(15.5));
        assert_eq!(rate.as_decimal(), dec!(0.155));
        assert_eq!(rate.to_string(), "15.5%");
        assert_eq!(Rate::from_bps(250), Rate::from_percent(dec!(2.5)));
        assert_eq!(Rate::from_percentage(12).monthly_rate().as_decimal(), dec!(0.01));
    }

    #[test]
    fn test_checked_times_overflow() {
        let huge = Money::from_decimal(Decimal::MAX);
        assert!(huge.checked_times(2).is_none());
        assert_eq!(Money::from_major(9049).checked_times(12), Some(Money::from_major(108588)));
    }
}
