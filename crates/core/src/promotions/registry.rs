//! Promo code registry

use jiff::Timestamp;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;

use crate::{
    fixtures::{Fixture, FixtureError},
    promotions::{PromoCode, PromoCodeError},
};

const STOREFRONT_PROMO_CODES: &str = include_str!("../../fixtures/promo_codes/storefront.yml");

/// Read-only promo code lookup and eligibility checks.
pub trait PromoRegistry: Send + Sync {
    /// Look up a code, ignoring case.
    fn lookup(&self, code: &str) -> Option<&PromoCode>;

    /// Resolve a code that is redeemable against `subtotal` at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`PromoCodeError::NotFound`] for unknown codes, or the
    /// eligibility error from [`PromoCode::check_eligibility`].
    fn validate(
        &self,
        code: &str,
        subtotal: Decimal,
        now: Timestamp,
    ) -> Result<&PromoCode, PromoCodeError> {
        let promo = self
            .lookup(code)
            .ok_or_else(|| PromoCodeError::NotFound(code.trim().to_ascii_uppercase()))?;

        promo.check_eligibility(subtotal, now)?;

        Ok(promo)
    }
}

/// Registry backed by a fixed list of codes.
#[derive(Debug, Clone, Default)]
pub struct StaticPromoRegistry {
    codes: Vec<PromoCode>,
    index: FxHashMap<String, usize>,
}

impl StaticPromoRegistry {
    /// Build a registry from a list of codes.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::DuplicatePromoCode`] when two codes collide.
    pub fn new(codes: Vec<PromoCode>) -> Result<Self, FixtureError> {
        let mut index = FxHashMap::default();

        for (position, promo) in codes.iter().enumerate() {
            if index
                .insert(promo.code.to_ascii_uppercase(), position)
                .is_some()
            {
                return Err(FixtureError::DuplicatePromoCode(promo.code.clone()));
            }
        }

        Ok(Self { codes, index })
    }

    /// The storefront's built-in codes.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded fixture is malformed.
    pub fn storefront() -> Result<Self, FixtureError> {
        Self::new(Fixture::parse_promo_codes(STOREFRONT_PROMO_CODES)?)
    }

    /// All codes, in fixture order.
    pub fn codes(&self) -> impl Iterator<Item = &PromoCode> {
        self.codes.iter()
    }
}

impl PromoRegistry for StaticPromoRegistry {
    fn lookup(&self, code: &str) -> Option<&PromoCode> {
        self.index
            .get(&code.trim().to_ascii_uppercase())
            .and_then(|position| self.codes.get(*position))
    }
}
