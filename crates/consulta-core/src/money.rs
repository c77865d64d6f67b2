//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A 15% discount on R$ 19,90 computed in floats may display as          │
//! │  R$ 16,914999999 and round differently on two screens.                  │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Centavos                                         │
//! │    1990 centavos × 1500 bps / 10000 = 298.5 → 299 centavos off          │
//! │    Every screen computes the same R$ 16,91                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use consulta_core::money::Money;
//!
//! let price = Money::from_cents(1990); // R$ 19,90
//! assert_eq!(price.to_string(), "R$ 19,90");
//!
//! // Form input is parsed once, on ingress
//! let typed = Money::parse("1.234,56").unwrap();
//! assert_eq!(typed.cents(), 123456);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Sub;
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in centavos (the smallest BRL unit).
///
/// ## Design Decisions
/// - **i64 (signed)**: margins (price - cost) may be negative
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Serialized as centavos**: the local store and bindings never see floats
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// The one-centavo floor applied to discounted prices.
    pub const MIN_CHARGE: Money = Money(1);

    /// Creates a Money value from centavos.
    ///
    /// ## Example
    /// ```rust
    /// use consulta_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Parses a user-typed amount.
    ///
    /// Accepts the Brazilian form (`1.234,56`), the plain decimal form
    /// (`1234.56`), an optional `R$` prefix and at most two fraction digits.
    /// When a comma is present it is the decimal separator and dots are
    /// thousands separators.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: reason.to_string(),
        };

        let mut text = input.trim();
        if let Some(rest) = text.strip_prefix("R$") {
            text = rest.trim_start();
        }
        let (negative, text) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        if text.is_empty() {
            return Err(invalid("empty amount"));
        }

        let normalized = if text.contains(',') {
            text.replace('.', "").replacen(',', ".", 1)
        } else {
            text.to_string()
        };

        let (whole, frac) = match normalized.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (normalized.as_str(), ""),
        };

        if whole.is_empty() && frac.is_empty() {
            return Err(invalid("no digits"));
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("only digits and one decimal separator are allowed"));
        }
        if frac.len() > 2 {
            return Err(invalid("at most two decimal places"));
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid("amount too large"))?
        };
        let frac: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| invalid("bad fraction"))? * 10,
            _ => frac.parse().map_err(|_| invalid("bad fraction"))?,
        };

        let cents = whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(frac))
            .ok_or_else(|| invalid("amount too large"))?;

        Ok(Money(if negative { -cents } else { cents }))
    }

    /// Returns the value in centavos.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole reais portion.
    #[inline]
    pub const fn reais(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the centavos portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the portion of this amount covered by a rate in basis points.
    ///
    /// Rounds half away from zero: `(amount * bps + 5000) / 10000`.
    ///
    /// ## Example
    /// ```rust
    /// use consulta_core::money::Money;
    ///
    /// let price = Money::from_cents(1990);
    /// assert_eq!(price.percentage_of(1500).cents(), 299); // 298.5 → 299
    /// ```
    pub fn percentage_of(&self, bps: u32) -> Money {
        let sign: i128 = if self.0 < 0 { -1 } else { 1 };
        let part = (self.0.abs() as i128 * bps as i128 + 5000) / 10000;
        Money::from_cents((sign * part) as i64)
    }

    /// Applies a percentage discount and returns the discounted amount.
    ///
    /// No floor is applied here; see [`crate::discount`] for the
    /// one-centavo rule.
    ///
    /// ## Example
    /// ```rust
    /// use consulta_core::money::Money;
    ///
    /// let subtotal = Money::from_cents(10000);
    /// let discounted = subtotal.apply_percentage_discount(1000); // 10% off
    /// assert_eq!(discounted.cents(), 9000);
    /// ```
    pub fn apply_percentage_discount(&self, discount_bps: u32) -> Money {
        *self - self.percentage_of(discount_bps)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Formats as Brazilian currency: `R$ 1.234,56`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let digits = self.reais().abs().to_string();

        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }

        write!(f, "{}R$ {},{:02}", sign, grouped, self.cents_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

// =============================================================================
// Remote API Amounts
// =============================================================================

/// Deserializers for amounts the remote API sends in reais.
///
/// The REST collaborator writes prices as decimal reais (`19.9`, `"19.90"`,
/// `"R$ 19,90"`). Fields tagged with these functions convert them to
/// centavos on the way in; serializing still writes centavos.
///
/// ```rust
/// use consulta_core::money::{self, Money};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Row {
///     #[serde(deserialize_with = "money::reais::deserialize")]
///     price: Money,
/// }
///
/// let row: Row = serde_json::from_str(r#"{ "price": 19.9 }"#).unwrap();
/// assert_eq!(row.price.cents(), 1990);
/// ```
pub mod reais {
    use super::Money;
    use serde::de::{self, Deserializer, Visitor};
    use serde::Deserialize;
    use std::fmt;

    struct ReaisVisitor;

    impl<'de> Visitor<'de> for ReaisVisitor {
        type Value = Money;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("an amount in reais as a number or a string")
        }

        fn visit_i64<E: de::Error>(self, reais: i64) -> Result<Money, E> {
            reais
                .checked_mul(100)
                .map(Money::from_cents)
                .ok_or_else(|| E::custom("amount too large"))
        }

        fn visit_u64<E: de::Error>(self, reais: u64) -> Result<Money, E> {
            let reais = i64::try_from(reais).map_err(|_| E::custom("amount too large"))?;
            self.visit_i64(reais)
        }

        fn visit_f64<E: de::Error>(self, reais: f64) -> Result<Money, E> {
            let cents = (reais * 100.0).round();
            if !cents.is_finite() || cents.abs() >= i64::MAX as f64 {
                return Err(E::custom("amount out of range"));
            }
            Ok(Money::from_cents(cents as i64))
        }

        fn visit_str<E: de::Error>(self, text: &str) -> Result<Money, E> {
            Money::parse(text).map_err(E::custom)
        }
    }

    struct Reais(Money);

    impl<'de> Deserialize<'de> for Reais {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            deserializer.deserialize_any(ReaisVisitor).map(Reais)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Money, D::Error> {
        deserializer.deserialize_any(ReaisVisitor)
    }

    /// Same as [`deserialize`], with `null` read as `None`.
    pub fn deserialize_option<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Money>, D::Error> {
        Ok(Option::<Reais>::deserialize(deserializer)?.map(|reais| reais.0))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.reais(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "R$ 10,99");
        assert_eq!(Money::from_cents(500).to_string(), "R$ 5,00");
        assert_eq!(Money::from_cents(-550).to_string(), "-R$ 5,50");
        assert_eq!(Money::from_cents(0).to_string(), "R$ 0,00");
        assert_eq!(Money::from_cents(123456).to_string(), "R$ 1.234,56");
        assert_eq!(Money::from_cents(123456789).to_string(), "R$ 1.234.567,89");
        assert_eq!(Money::from_cents(100000).to_string(), "R$ 1.000,00");
    }

    #[test]
    fn test_parse_brazilian_and_plain() {
        assert_eq!(Money::parse("1.234,56").unwrap().cents(), 123456);
        assert_eq!(Money::parse("R$ 19,90").unwrap().cents(), 1990);
        assert_eq!(Money::parse("19.9").unwrap().cents(), 1990);
        assert_eq!(Money::parse("7").unwrap().cents(), 700);
        assert_eq!(Money::parse(",5").unwrap().cents(), 50);
        assert_eq!(Money::parse("-2,00").unwrap().cents(), -200);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Money::parse("").is_err());
        assert!(Money::parse("R$").is_err());
        assert!(Money::parse("abc").is_err());
        assert!(Money::parse("1,234").is_err());
        assert!(Money::parse("1.2.3").is_err());
        assert!(Money::parse("99999999999999999999").is_err());
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a - b).cents(), 500);
    }

    #[test]
    fn test_percentage_rounding() {
        assert_eq!(Money::from_cents(1990).percentage_of(1500).cents(), 299);
        assert_eq!(Money::from_cents(-1990).percentage_of(1500).cents(), -299);
        assert_eq!(Money::from_cents(50).percentage_of(10000).cents(), 50);
    }

    #[test]
    fn test_percentage_discount() {
        let subtotal = Money::from_cents(10000);
        assert_eq!(subtotal.apply_percentage_discount(1000).cents(), 9000);
        assert_eq!(subtotal.apply_percentage_discount(10000).cents(), 0);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_negative());
        assert!(Money::from_cents(-100).is_negative());
    }

    #[derive(Debug, serde::Deserialize)]
    struct RemotePrice {
        #[serde(deserialize_with = "reais::deserialize")]
        price: Money,
        #[serde(default, deserialize_with = "reais::deserialize_option")]
        original_price: Option<Money>,
    }

    fn remote(json: &str) -> Result<RemotePrice, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[test]
    fn test_reais_from_numbers_and_strings() {
        assert_eq!(remote(r#"{ "price": 19.9 }"#).unwrap().price.cents(), 1990);
        assert_eq!(remote(r#"{ "price": 0.1 }"#).unwrap().price.cents(), 10);
        assert_eq!(remote(r#"{ "price": 20 }"#).unwrap().price.cents(), 2000);
        assert_eq!(remote(r#"{ "price": "19.90" }"#).unwrap().price.cents(), 1990);
        assert_eq!(remote(r#"{ "price": "R$ 1.234,56" }"#).unwrap().price.cents(), 123456);

        let with_original = remote(r#"{ "price": 99.9, "original_price": "149.90" }"#).unwrap();
        assert_eq!(with_original.original_price, Some(Money::from_cents(14990)));
        assert_eq!(remote(r#"{ "price": 1, "original_price": null }"#).unwrap().original_price, None);
        assert_eq!(remote(r#"{ "price": 1 }"#).unwrap().original_price, None);
    }

    #[test]
    fn test_reais_rejects_garbage() {
        assert!(remote(r#"{ "price": "grátis" }"#).is_err());
        assert!(remote(r#"{ "price": "1,999" }"#).is_err());
        assert!(remote(r#"{ "price": 1e300 }"#).is_err());
        assert!(remote(r#"{ "price": true }"#).is_err());
    }
}
