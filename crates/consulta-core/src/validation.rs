//! # Validation Module
//!
//! Input validation for plan/panel/module forms and Brazilian documents.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Web form (TypeScript)                                        │
//! │  ├── Required markers, masks                                           │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Field rules (name, slug, price, duration)                         │
//! │  └── CNPJ check digits                                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Store (SQLite NOT NULL / UNIQUE)                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use consulta_core::validation::is_valid_cnpj;
//!
//! assert!(is_valid_cnpj("11.222.333/0001-81"));
//! assert!(!is_valid_cnpj("11111111111111"));
//! ```

use crate::error::ValidationError;
use crate::money::Money;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted display name.
pub const MAX_NAME_LEN: usize = 120;

/// Longest accepted slug.
pub const MAX_SLUG_LEN: usize = 80;

/// Longest accepted plan duration (ten years).
pub const MAX_DURATION_DAYS: u32 = 3650;

// =============================================================================
// CNPJ
// =============================================================================

const CNPJ_LEN: usize = 14;

/// One mod-11 pass: weights cycle 2..=9 starting from the rightmost digit.
fn cnpj_check_digit(digits: &[u32]) -> u32 {
    let sum: u32 = digits
        .iter()
        .rev()
        .zip((2..=9).cycle())
        .map(|(d, w)| d * w)
        .sum();
    match sum % 11 {
        r if r < 2 => 0,
        r => 11 - r,
    }
}

fn cnpj_digits(input: &str) -> Vec<u32> {
    input.chars().filter_map(|c| c.to_digit(10)).collect()
}

/// Checks a CNPJ (Brazilian company tax id).
///
/// ## Rules
/// - Non-digits (dots, slash, dash) are ignored
/// - Exactly 14 digits
/// - Not the same digit repeated
/// - Both check digits match the mod-11 computation
pub fn is_valid_cnpj(input: &str) -> bool {
    let digits = cnpj_digits(input);

    if digits.len() != CNPJ_LEN {
        return false;
    }
    if digits.iter().all(|&d| d == digits[0]) {
        return false;
    }

    let first = cnpj_check_digit(&digits[..12]);
    if first != digits[12] {
        return false;
    }
    let second = cnpj_check_digit(&digits[..13]);
    second == digits[13]
}

/// Typed form of [`is_valid_cnpj`] for save paths.
pub fn validate_cnpj(input: &str) -> ValidationResult<()> {
    if input.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "cnpj".to_string(),
        });
    }
    if !is_valid_cnpj(input) {
        return Err(ValidationError::InvalidDocument {
            document: "CNPJ".to_string(),
        });
    }
    Ok(())
}

/// Formats 14 digits as `00.000.000/0000-00`; `None` if the digit count is wrong.
pub fn format_cnpj(input: &str) -> Option<String> {
    let digits: String = input.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() != CNPJ_LEN {
        return None;
    }
    Some(format!(
        "{}.{}.{}/{}-{}",
        &digits[0..2],
        &digits[2..5],
        &digits[5..8],
        &digits[8..12],
        &digits[12..14]
    ))
}

// =============================================================================
// Field Validators
// =============================================================================

/// Validates a display name (panel name, module title, plan name).
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a slug: lowercase ASCII letters, digits and single dashes.
///
/// ## Example
/// ```rust
/// use consulta_core::validation::validate_slug;
///
/// assert!(validate_slug("cpf-completo").is_ok());
/// assert!(validate_slug("CPF Completo").is_err());
/// ```
pub fn validate_slug(slug: &str) -> ValidationResult<()> {
    if slug.is_empty() {
        return Err(ValidationError::Required {
            field: "slug".to_string(),
        });
    }

    if slug.len() > MAX_SLUG_LEN {
        return Err(ValidationError::TooLong {
            field: "slug".to_string(),
            max: MAX_SLUG_LEN,
        });
    }

    let well_formed = slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--");

    if !well_formed {
        return Err(ValidationError::InvalidFormat {
            field: "slug".to_string(),
            reason: "use lowercase letters, numbers and single dashes".to_string(),
        });
    }

    Ok(())
}

/// Validates a price. Zero is allowed (free plans and modules).
pub fn validate_price(field: &str, price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

/// Validates a plan duration in days.
pub fn validate_duration_days(days: u32) -> ValidationResult<()> {
    if days == 0 {
        return Err(ValidationError::MustBePositive {
            field: "duration_days".to_string(),
        });
    }
    if days > MAX_DURATION_DAYS {
        return Err(ValidationError::OutOfRange {
            field: "duration_days".to_string(),
            min: 1,
            max: MAX_DURATION_DAYS as i64,
        });
    }
    Ok(())
}

/// Validates a discount percentage (0-100).
pub fn validate_discount_percentage(pct: f64) -> ValidationResult<()> {
    if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
        return Err(ValidationError::OutOfRange {
            field: "discount_percentage".to_string(),
            min: 0,
            max: 100,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_cnpj() {
        assert!(is_valid_cnpj("11.222.333/0001-81"));
        assert!(is_valid_cnpj("11222333000181"));
        assert!(is_valid_cnpj(" 11 222 333 0001 81 "));
    }

    #[test]
    fn test_invalid_cnpj() {
        assert!(!is_valid_cnpj("11111111111111"));
        assert!(!is_valid_cnpj("00000000000000"));
        assert!(!is_valid_cnpj("1234"));
        assert!(!is_valid_cnpj(""));
        assert!(!is_valid_cnpj("11.222.333/0001-82"));
        assert!(!is_valid_cnpj("11.222.333/0001-91"));
        assert!(!is_valid_cnpj("112223330001811"));
    }

    #[test]
    fn test_check_digit_remainder_below_two() {
        // first pass remainder 0
        assert!(is_valid_cnpj("10.000.008/0001-01"));
        // second pass remainder 1
        assert!(is_valid_cnpj("10.000.001/0001-90"));
        assert!(!is_valid_cnpj("10.000.001/0001-91"));
    }

    #[test]
    fn test_validate_cnpj_errors() {
        assert!(matches!(
            validate_cnpj("  "),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_cnpj("11111111111111"),
            Err(ValidationError::InvalidDocument { .. })
        ));
        assert!(validate_cnpj("11.222.333/0001-81").is_ok());
    }

    #[test]
    fn test_format_cnpj() {
        assert_eq!(
            format_cnpj("11222333000181").as_deref(),
            Some("11.222.333/0001-81")
        );
        assert_eq!(format_cnpj("123"), None);
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "Plano Rainha").is_ok());
        assert!(validate_name("name", "   ").is_err());
        assert!(validate_name("name", &"a".repeat(MAX_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn test_validate_slug() {
        assert!(validate_slug("plano-rainha-2").is_ok());
        assert!(validate_slug("").is_err());
        assert!(validate_slug("-plano").is_err());
        assert!(validate_slug("plano--rainha").is_err());
        assert!(validate_slug("Plano").is_err());
    }

    #[test]
    fn test_validate_price_and_duration() {
        assert!(validate_price("price", Money::zero()).is_ok());
        assert!(validate_price("price", Money::from_cents(-1)).is_err());
        assert!(validate_duration_days(30).is_ok());
        assert!(validate_duration_days(0).is_err());
        assert!(validate_duration_days(MAX_DURATION_DAYS + 1).is_err());
        assert!(validate_discount_percentage(12.5).is_ok());
        assert!(validate_discount_percentage(101.0).is_err());
    }
}
