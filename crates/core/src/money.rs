//! Fixed-point money.
//!
//! Amounts are `rust_decimal::Decimal`, so `10.00 × 4 × 0.90` is exactly
//! `36.00`. There is no floating point anywhere in pricing. Amounts are never
//! negative and every operation returns a new value.

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// ISO-4217 style three-letter currency code (`USD`, `BRL`, ...).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency([u8; 3]);

impl Currency {
    /// Parse a code; it must be exactly three ASCII letters and is upper-cased.
    pub fn new(code: &str) -> DomainResult<Self> {
        let bytes = code.trim().as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(u8::is_ascii_alphabetic) {
            return Err(DomainError::invalid_argument(format!(
                "currency code must be three letters, got '{code}'"
            )));
        }
        Ok(Self([
            bytes[0].to_ascii_uppercase(),
            bytes[1].to_ascii_uppercase(),
            bytes[2].to_ascii_uppercase(),
        ]))
    }

    pub const fn usd() -> Self {
        Self(*b"USD")
    }

    pub fn code(&self) -> &str {
        // Constructed only from ASCII letters.
        core::str::from_utf8(&self.0).unwrap_or("???")
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Currency {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Currency> for String {
    fn from(value: Currency) -> Self {
        value.code().to_string()
    }
}

impl ValueObject for Currency {}

/// Non-negative amount in a single currency.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawMoney")]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

#[derive(Deserialize)]
struct RawMoney {
    amount: Decimal,
    currency: Currency,
}

impl TryFrom<RawMoney> for Money {
    type Error = DomainError;

    fn try_from(raw: RawMoney) -> Result<Self, Self::Error> {
        Money::new(raw.amount, raw.currency)
    }
}

impl Money {
    pub fn new(amount: Decimal, currency: Currency) -> DomainResult<Self> {
        if amount < Decimal::ZERO {
            return Err(DomainError::invalid_argument(format!(
                "money amount must not be negative, got {amount}"
            )));
        }
        Ok(Self { amount, currency })
    }

    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Fails when the currencies differ.
    pub fn ensure_same_currency(&self, other: &Money) -> DomainResult<()> {
        if self.currency != other.currency {
            return Err(DomainError::invalid_argument(format!(
                "currency mismatch: {} vs {}",
                self.currency, other.currency
            )));
        }
        Ok(())
    }

    pub fn add(&self, other: &Money) -> DomainResult<Money> {
        self.ensure_same_currency(other)?;
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or_else(|| DomainError::invalid_argument("money addition overflowed"))?;
        Ok(Self {
            amount,
            currency: self.currency,
        })
    }

    pub fn multiply(&self, factor: u32) -> DomainResult<Money> {
        let amount = self
            .amount
            .checked_mul(Decimal::from(factor))
            .ok_or_else(|| DomainError::invalid_argument("money multiplication overflowed"))?;
        Ok(Self {
            amount,
            currency: self.currency,
        })
    }

    /// Reduce the amount by `percentage` percent (`0..=100`).
    pub fn apply_discount(&self, percentage: Decimal) -> DomainResult<Money> {
        if percentage < Decimal::ZERO || percentage > Decimal::ONE_HUNDRED {
            return Err(DomainError::invalid_argument(format!(
                "discount percentage must be within 0..=100, got {percentage}"
            )));
        }
        let factor = Decimal::ONE - percentage / Decimal::ONE_HUNDRED;
        let amount = self
            .amount
            .checked_mul(factor)
            .ok_or_else(|| DomainError::invalid_argument("money discount overflowed"))?;
        Ok(Self {
            amount,
            currency: self.currency,
        })
    }

    /// Sum `values` in `currency`; an empty iterator yields zero.
    pub fn sum(currency: Currency, values: impl IntoIterator<Item = Money>) -> DomainResult<Money> {
        values
            .into_iter()
            .try_fold(Money::zero(currency), |acc, m| acc.add(&m))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} {}", self.amount, self.currency)
    }
}

impl ValueObject for Money {}
