//! Pricing

use decimal_percentage::Percentage;
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rusty_money::{
    Money,
    iso::{self, Currency},
};
use thiserror::Error;

use crate::{
    cart::CartItem,
    catalog::Catalog,
    discounts::{bundle_discount, promo_discounts, quantity_discount},
    products::{Product, SelectedVariants, VariantGroup},
    promotions::PromoCode,
    validation::resolve_variant,
};

/// Flat shipping charge.
pub const SHIPPING_COST: Decimal = Decimal::from_parts(10, 0, 0, false, 0);

/// Post-discount subtotal at which shipping is free.
pub const FREE_SHIPPING_THRESHOLD: Decimal = Decimal::from_parts(75, 0, 0, false, 0);

/// Errors converting amounts for display.
#[derive(Debug, Error)]
pub enum PricingError {
    /// The amount has no representation in minor units.
    #[error("Amount {0} is out of range")]
    AmountOutOfRange(Decimal),
}

/// Flat tax rate (8%).
pub fn tax_rate() -> Percentage {
    Percentage::from(Decimal::new(8, 2))
}

/// Sum of the selected variants' price modifiers. Unresolved variants add nothing.
pub fn variant_modifiers(product: &Product, selection: &SelectedVariants) -> Decimal {
    VariantGroup::ALL
        .iter()
        .filter_map(|group| resolve_variant(product, *group, selection.get(*group)))
        .map(|variant| variant.price_modifier)
        .sum()
}

/// Price of one unit of a configuration.
pub fn unit_price(product: &Product, selection: &SelectedVariants) -> Decimal {
    product.base_price + variant_modifiers(product, selection)
}

/// Undiscounted price of a line.
pub fn line_subtotal(product: &Product, selection: &SelectedVariants, quantity: u32) -> Decimal {
    unit_price(product, selection) * Decimal::from(quantity)
}

/// Price of a line after its quantity discount.
pub fn line_price(product: &Product, selection: &SelectedVariants, quantity: u32) -> Decimal {
    let subtotal = line_subtotal(product, selection, quantity);

    subtotal - quantity_discount(subtotal, quantity)
}

/// Tax on a post-discount amount.
pub fn tax(amount: Decimal) -> Decimal {
    tax_rate() * amount
}

/// Shipping for a post-discount amount.
///
/// An active free shipping code guarantees the waiver but does not lower
/// the threshold.
pub fn shipping(amount: Decimal, promos: &[&PromoCode]) -> Decimal {
    let threshold_met = amount >= FREE_SHIPPING_THRESHOLD;
    let waived_by_code = threshold_met && promos.iter().any(|promo| promo.is_free_shipping());

    if threshold_met || waived_by_code {
        Decimal::ZERO
    } else {
        SHIPPING_COST
    }
}

/// Round an amount to cents, half away from zero.
///
/// # Errors
///
/// Returns [`PricingError::AmountOutOfRange`] if the amount does not fit in minor units.
pub fn to_money(amount: Decimal) -> Result<Money<'static, Currency>, PricingError> {
    let minor = (amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        * Decimal::ONE_HUNDRED)
        .to_i64()
        .ok_or(PricingError::AmountOutOfRange(amount))?;

    Ok(Money::from_minor(minor, iso::USD))
}

/// Full order pricing, computed at full precision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceBreakdown {
    /// Base prices times quantities
    pub base_price: Decimal,

    /// Variant modifiers times quantities
    pub variant_modifiers: Decimal,

    /// `base_price + variant_modifiers`, before any discount
    pub subtotal: Decimal,

    /// Per-line quantity discounts
    pub quantity_discount: Decimal,

    /// Bundle discount
    pub bundle_discount: Decimal,

    /// Promo code discounts
    pub promo_discount: Decimal,

    /// Tax on the discounted subtotal
    pub tax: Decimal,

    /// Shipping charge
    pub shipping: Decimal,

    /// Amount payable
    pub total: Decimal,

    /// Units across all priced lines
    pub item_count: u32,
}

impl PriceBreakdown {
    /// Subtotal after every discount.
    pub fn discounted_subtotal(&self) -> Decimal {
        self.subtotal - self.savings()
    }

    /// Total of all discounts.
    pub fn savings(&self) -> Decimal {
        self.quantity_discount + self.bundle_discount + self.promo_discount
    }

    /// Savings as a fraction of the pre-discount subtotal.
    pub fn savings_percent(&self) -> Percentage {
        if self.subtotal.is_zero() {
            return Percentage::from(Decimal::ZERO);
        }

        Percentage::from(self.savings() / self.subtotal)
    }

    /// How much more is needed before shipping becomes free.
    pub fn amount_until_free_shipping(&self) -> Decimal {
        (FREE_SHIPPING_THRESHOLD - self.discounted_subtotal()).max(Decimal::ZERO)
    }

    /// The total, rounded to cents.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::AmountOutOfRange`] if the total does not fit in minor units.
    pub fn total_money(&self) -> Result<Money<'static, Currency>, PricingError> {
        to_money(self.total)
    }
}

/// Price a whole cart.
///
/// Discounts apply in order: per-line quantity discounts, the bundle
/// discount, then promo codes in the order given. Tax and shipping are
/// charged on what remains. Lines whose product does not resolve are
/// left out entirely.
pub fn cart_summary(
    lines: &[CartItem],
    promos: &[&PromoCode],
    catalog: &dyn Catalog,
) -> PriceBreakdown {
    let priced: Vec<CartItem> = lines
        .iter()
        .filter(|line| catalog.product(&line.product_id).is_some())
        .cloned()
        .collect();

    let mut breakdown = PriceBreakdown::default();

    for line in &priced {
        let Some(product) = catalog.product(&line.product_id) else {
            continue;
        };

        let quantity = Decimal::from(line.quantity);
        let subtotal = line_subtotal(product, &line.selected_variants, line.quantity);

        breakdown.base_price += product.base_price * quantity;
        breakdown.variant_modifiers += variant_modifiers(product, &line.selected_variants) * quantity;
        breakdown.quantity_discount += quantity_discount(subtotal, line.quantity);
        breakdown.item_count = breakdown.item_count.saturating_add(line.quantity);
    }

    breakdown.subtotal = breakdown.base_price + breakdown.variant_modifiers;
    breakdown.bundle_discount = bundle_discount(&priced, catalog);

    let after_bundle = breakdown.subtotal - breakdown.quantity_discount - breakdown.bundle_discount;

    breakdown.promo_discount = promo_discounts(after_bundle, promos.iter().copied());

    let discounted = after_bundle - breakdown.promo_discount;

    breakdown.tax = tax(discounted);
    breakdown.shipping = shipping(discounted, promos);
    breakdown.total = discounted + breakdown.tax + breakdown.shipping;

    breakdown
}
