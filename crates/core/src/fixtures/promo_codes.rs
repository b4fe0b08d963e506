//! Promo Code Fixtures

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    fixtures::FixtureError,
    promotions::{DiscountType, PromoCode, normalize_code},
};

/// Wrapper for promo codes in YAML
#[derive(Debug, Deserialize)]
pub struct PromoCodesFixture {
    /// Promo codes, in registry order
    pub promo_codes: Vec<PromoCodeFixture>,
}

/// Promo Code Fixture
#[derive(Debug, Deserialize)]
pub struct PromoCodeFixture {
    /// Code as written (normalised on load)
    pub code: String,

    /// `percentage` or `fixed`
    pub discount_type: DiscountType,

    /// Discount value (e.g. `10` for 10% or $10)
    pub discount_value: Decimal,

    /// Minimum purchase
    #[serde(default)]
    pub min_purchase: Option<Decimal>,

    /// Expiry instant (RFC 3339)
    pub valid_until: Timestamp,

    /// Description
    #[serde(default)]
    pub description: String,
}

impl TryFrom<PromoCodeFixture> for PromoCode {
    type Error = FixtureError;

    fn try_from(fixture: PromoCodeFixture) -> Result<Self, Self::Error> {
        let invalid = |reason: &str| FixtureError::InvalidPromoCode {
            code: fixture.code.clone(),
            reason: reason.to_string(),
        };

        let code = normalize_code(&fixture.code).map_err(|err| invalid(&err.to_string()))?;

        if fixture.discount_value <= Decimal::ZERO {
            return Err(invalid("discount value must be positive"));
        }

        if fixture.discount_type == DiscountType::Percentage
            && fixture.discount_value > Decimal::ONE_HUNDRED
        {
            return Err(invalid("percentage discount cannot exceed 100"));
        }

        if fixture.min_purchase.is_some_and(|min| min.is_sign_negative()) {
            return Err(invalid("minimum purchase must be non-negative"));
        }

        Ok(PromoCode {
            code,
            discount_type: fixture.discount_type,
            discount_value: fixture.discount_value,
            min_purchase: fixture.min_purchase,
            valid_until: fixture.valid_until,
            description: fixture.description,
        })
    }
}
