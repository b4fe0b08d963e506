//! Promotions

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod registry;

pub use registry::{PromoRegistry, StaticPromoRegistry};

/// Longest accepted promo code input.
pub const MAX_CODE_LENGTH: usize = 20;

/// Code whose presence guarantees the free shipping waiver.
pub const FREE_SHIPPING_CODE: &str = "FREESHIP";

/// Errors raised when a promo code is entered or redeemed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromoCodeError {
    /// The input is not a well-formed code.
    #[error("Invalid promo code {input:?}: {reason}")]
    InvalidFormat {
        /// Raw input
        input: String,
        /// What was wrong with it
        reason: &'static str,
    },

    /// No code with this name exists.
    #[error("Promo code {0} not found")]
    NotFound(String),

    /// The code's validity window has elapsed.
    #[error("Promo code {code} expired at {valid_until}")]
    Expired {
        /// Normalised code
        code: String,
        /// Expiry instant
        valid_until: Timestamp,
    },

    /// The order subtotal is under the code's minimum purchase.
    #[error("Promo code {code} requires a minimum purchase of {min_purchase} (subtotal {subtotal})")]
    BelowMinimum {
        /// Normalised code
        code: String,
        /// Required minimum
        min_purchase: Decimal,
        /// Subtotal that was checked
        subtotal: Decimal,
    },
}

/// How a promo code's `discount_value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    /// Percent points off the running subtotal
    Percentage,

    /// Fixed amount off, capped at the running subtotal
    Fixed,
}

/// A redeemable promo code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromoCode {
    /// Canonical upper-case code
    pub code: String,

    /// Discount kind
    pub discount_type: DiscountType,

    /// Percent points or fixed amount, always positive
    pub discount_value: Decimal,

    /// Minimum pre-discount subtotal required to redeem
    pub min_purchase: Option<Decimal>,

    /// Last instant at which the code is valid
    pub valid_until: Timestamp,

    /// Customer-facing description
    pub description: String,
}

impl PromoCode {
    /// Whether the code has expired at `now`.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.valid_until < now
    }

    /// Whether `subtotal` satisfies the minimum purchase, if any.
    pub fn meets_minimum(&self, subtotal: Decimal) -> bool {
        self.min_purchase.is_none_or(|min| subtotal >= min)
    }

    /// Whether this is the free shipping code.
    pub fn is_free_shipping(&self) -> bool {
        self.code == FREE_SHIPPING_CODE
    }

    /// Check expiry and minimum purchase.
    ///
    /// # Errors
    ///
    /// Returns [`PromoCodeError::Expired`] or [`PromoCodeError::BelowMinimum`].
    pub fn check_eligibility(&self, subtotal: Decimal, now: Timestamp) -> Result<(), PromoCodeError> {
        if self.is_expired(now) {
            return Err(PromoCodeError::Expired {
                code: self.code.clone(),
                valid_until: self.valid_until,
            });
        }

        if let Some(min_purchase) = self.min_purchase
            && subtotal < min_purchase
        {
            return Err(PromoCodeError::BelowMinimum {
                code: self.code.clone(),
                min_purchase,
                subtotal,
            });
        }

        Ok(())
    }
}

/// Normalise user input into a canonical code.
///
/// Input is trimmed and upper-cased. Codes must be 1 to 20 characters of
/// ASCII letters, digits, `_` or `-`.
///
/// # Errors
///
/// Returns [`PromoCodeError::InvalidFormat`] for empty, overlong or malformed input.
pub fn normalize_code(input: &str) -> Result<String, PromoCodeError> {
    let trimmed = input.trim();

    let invalid = |reason| PromoCodeError::InvalidFormat {
        input: input.to_string(),
        reason,
    };

    if trimmed.is_empty() {
        return Err(invalid("promo code is required"));
    }

    if trimmed.chars().count() > MAX_CODE_LENGTH {
        return Err(invalid("promo code is too long"));
    }

    if !trimmed
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
    {
        return Err(invalid("promo code contains invalid characters"));
    }

    Ok(trimmed.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn save25() -> TestResult<PromoCode> {
        Ok(PromoCode {
            code: "SAVE25".to_string(),
            discount_type: DiscountType::Fixed,
            discount_value: Decimal::from(25),
            min_purchase: Some(Decimal::from(100)),
            valid_until: "2080-12-30T23:59:59Z".parse()?,
            description: String::new(),
        })
    }

    #[test]
    fn normalize_uppercases_and_trims() -> TestResult {
        assert_eq!(normalize_code("  welcome10 ")?, "WELCOME10");
        assert_eq!(normalize_code("free-ship_2")?, "FREE-SHIP_2");

        Ok(())
    }

    #[test]
    fn normalize_rejects_bad_input() {
        assert!(matches!(
            normalize_code("   "),
            Err(PromoCodeError::InvalidFormat { .. })
        ));
        assert!(matches!(
            normalize_code("SAVE 25"),
            Err(PromoCodeError::InvalidFormat { .. })
        ));
        assert!(matches!(
            normalize_code(&"A".repeat(21)),
            Err(PromoCodeError::InvalidFormat { reason, .. }) if reason.contains("too long")
        ));
        assert!(normalize_code(&"A".repeat(20)).is_ok());
    }

    #[test]
    fn eligibility_checks_minimum_purchase() -> TestResult {
        let code = save25()?;
        let now: Timestamp = "2026-01-01T00:00:00Z".parse()?;

        assert!(matches!(
            code.check_eligibility(Decimal::from(50), now),
            Err(PromoCodeError::BelowMinimum { .. })
        ));
        assert!(code.check_eligibility(Decimal::from(100), now).is_ok());

        Ok(())
    }

    #[test]
    fn code_is_valid_until_its_expiry_instant() -> TestResult {
        let code = save25()?;

        assert!(code.check_eligibility(Decimal::from(120), code.valid_until).is_ok());

        let later: Timestamp = "2080-12-31T00:00:00Z".parse()?;

        assert!(matches!(
            code.check_eligibility(Decimal::from(120), later),
            Err(PromoCodeError::Expired { .. })
        ));

        Ok(())
    }
}
