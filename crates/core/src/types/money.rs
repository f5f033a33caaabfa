//! Shilling amounts.
//!
//! All prices are Kenyan shillings stored as `NUMERIC(12,2)`. [`Money`] keeps
//! them as [`Decimal`] and knows how to print them for customers.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Mul};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// An amount in Kenyan shillings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero shillings.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Wrap an amount, rounding to cents.
    #[must_use]
    pub fn new(amount: Decimal) -> Self {
        Self(amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
    }

    /// The raw decimal amount.
    #[must_use]
    pub const fn amount(self) -> Decimal {
        self.0
    }

    /// Whether the amount is below zero.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Customer-facing form, e.g. `KSh 61,500.00`.
    #[must_use]
    pub fn display(self) -> String {
        let rounded = self.0.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let text = format!("{:.2}", rounded.abs());
        let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, ch) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }

        let sign = if self.is_negative() { "-" } else { "" };
        format!("KSh {sign}{grouped}.{cents}")
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self::new(amount)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Mul<i32> for Money {
    type Output = Self;

    fn mul(self, quantity: i32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kes(s: &str) -> Money {
        Money::new(s.parse().unwrap_or_default())
    }

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(kes("61500").display(), "KSh 61,500.00");
        assert_eq!(kes("1234567.5").display(), "KSh 1,234,567.50");
        assert_eq!(kes("400").display(), "KSh 400.00");
        assert_eq!(kes("0").display(), "KSh 0.00");
        assert_eq!(kes("-1500").display(), "KSh -1,500.00");
    }

    #[test]
    fn test_new_rounds_to_cents() {
        assert_eq!(kes("10.005").amount().to_string(), "10.01");
        assert_eq!(kes("10.004").amount().to_string(), "10.00");
    }

    #[test]
    fn test_arithmetic() {
        let line = kes("55") * 3;
        assert_eq!(line, kes("165"));
        let total: Money = [kes("165"), kes("400"), kes("300")].into_iter().sum();
        assert_eq!(total, kes("865"));
        assert_eq!(total.to_string(), "865.00");
    }
}
