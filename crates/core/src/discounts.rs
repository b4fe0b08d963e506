//! Discounts

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rustc_hash::FxHashSet;

use crate::{
    cart::CartItem,
    catalog::Catalog,
    pricing::line_price,
    promotions::{DiscountType, PromoCode},
};

/// Units on a single line needed for the quantity discount.
pub const QUANTITY_DISCOUNT_MIN_UNITS: u32 = 5;

/// Cart lines needed before the bundle discount is considered.
pub const BUNDLE_MIN_LINES: usize = 3;

/// Bundle-eligible units needed for the bundle discount.
pub const BUNDLE_MIN_UNITS: u32 = 3;

/// Quantity discount rate (10%).
pub fn quantity_discount_rate() -> Percentage {
    Percentage::from(Decimal::new(10, 2))
}

/// Bundle discount rate (15%).
pub fn bundle_discount_rate() -> Percentage {
    Percentage::from(Decimal::new(15, 2))
}

/// Discount on one line for buying in quantity.
///
/// Evaluated per line, never on the cart's total quantity.
pub fn quantity_discount(line_subtotal: Decimal, quantity: u32) -> Decimal {
    if quantity >= QUANTITY_DISCOUNT_MIN_UNITS {
        quantity_discount_rate() * line_subtotal
    } else {
        Decimal::ZERO
    }
}

/// Discount for buying products that are sold together.
///
/// The eligible set is every bundle-eligible product in the cart plus the
/// partners it declares. When the cart has at least [`BUNDLE_MIN_LINES`]
/// lines and at least [`BUNDLE_MIN_UNITS`] eligible units, the eligible
/// lines' prices (after quantity discounts) are discounted by 15%.
/// Lines whose product does not resolve are ignored.
pub fn bundle_discount(lines: &[CartItem], catalog: &dyn Catalog) -> Decimal {
    if lines.len() < BUNDLE_MIN_LINES {
        return Decimal::ZERO;
    }

    let resolved: Vec<_> = lines
        .iter()
        .filter_map(|line| catalog.product(&line.product_id).map(|product| (line, product)))
        .collect();

    let mut eligible = FxHashSet::default();

    for (_, product) in resolved.iter().filter(|(_, p)| p.is_bundle_eligible()) {
        eligible.insert(product.id.as_str());
        eligible.extend(product.bundle_eligible.iter().map(String::as_str));
    }

    let (units, eligible_subtotal) = resolved
        .iter()
        .filter(|(line, _)| eligible.contains(line.product_id.as_str()))
        .fold((0_u32, Decimal::ZERO), |(units, subtotal), (line, product)| {
            (
                units.saturating_add(line.quantity),
                subtotal + line_price(product, &line.selected_variants, line.quantity),
            )
        });

    if units >= BUNDLE_MIN_UNITS {
        bundle_discount_rate() * eligible_subtotal
    } else {
        Decimal::ZERO
    }
}

/// Discount a single promo code gives on `subtotal`.
///
/// Percentage codes take `discount_value` percent; fixed codes take
/// `discount_value` but never more than `subtotal`.
pub fn promo_discount(subtotal: Decimal, promo: Option<&PromoCode>) -> Decimal {
    let Some(promo) = promo else {
        return Decimal::ZERO;
    };

    let discount = match promo.discount_type {
        DiscountType::Percentage => {
            Percentage::from(promo.discount_value / Decimal::ONE_HUNDRED) * subtotal
        }
        DiscountType::Fixed => promo.discount_value.min(subtotal),
    };

    discount.max(Decimal::ZERO)
}

/// Combined discount of several codes, applied in order.
///
/// Each code is evaluated against the subtotal left by the codes before it.
pub fn promo_discounts<'a>(
    subtotal: Decimal,
    promos: impl IntoIterator<Item = &'a PromoCode>,
) -> Decimal {
    let remaining = promos.into_iter().fold(subtotal, |running, promo| {
        running - promo_discount(running, Some(promo))
    });

    subtotal - remaining
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use testresult::TestResult;

    use crate::{
        catalog::{Catalog, StaticCatalog},
        products::SelectedVariants,
        promotions::{PromoRegistry, StaticPromoRegistry},
    };

    use super::*;

    fn line(product_id: &str, selection: (&str, &str, &str), quantity: u32) -> CartItem {
        CartItem::new(
            product_id,
            SelectedVariants::new(selection.0, selection.1, selection.2),
            quantity,
            Timestamp::UNIX_EPOCH,
        )
    }

    fn fixed(value: i64) -> PromoCode {
        PromoCode {
            code: "FIXED".to_string(),
            discount_type: DiscountType::Fixed,
            discount_value: Decimal::from(value),
            min_purchase: None,
            valid_until: Timestamp::MAX,
            description: String::new(),
        }
    }

    #[test]
    fn no_quantity_discount_below_five_units() {
        for quantity in 1..5 {
            let subtotal = Decimal::from(120) * Decimal::from(quantity);

            assert_eq!(quantity_discount(subtotal, quantity), Decimal::ZERO);
        }
    }

    #[test]
    fn quantity_discount_is_ten_percent_from_five_units() {
        for quantity in [5, 6, 12, 99] {
            let subtotal = Decimal::new(2995, 2) * Decimal::from(quantity);

            assert_eq!(
                quantity_discount(subtotal, quantity),
                subtotal * Decimal::new(10, 2)
            );
        }
    }

    #[test]
    fn bundle_needs_three_lines() -> TestResult {
        let catalog = StaticCatalog::storefront()?;

        let lines = [
            line("chair-001", ("red", "matte", "m"), 2),
            line("lamp-002", ("gold", "matte", "m"), 2),
        ];

        assert_eq!(bundle_discount(&lines, &catalog), Decimal::ZERO);

        Ok(())
    }

    #[test]
    fn bundle_discounts_only_eligible_lines() -> TestResult {
        let storefront = StaticCatalog::storefront()?;

        let mut mug = storefront
            .product("vase-003")
            .ok_or("missing vase")?
            .clone();
        mug.id = "mug-006".to_string();
        mug.bundle_eligible.clear();

        let mut products: Vec<_> = storefront.products().cloned().collect();
        products.push(mug);

        let catalog = StaticCatalog::new(products)?;

        // chair 299, lamp 149 + 25 (gold), vase 89; the mug has no partners
        let lines = [
            line("chair-001", ("red", "matte", "m"), 1),
            line("lamp-002", ("gold", "matte", "m"), 1),
            line("vase-003", ("cream", "matte", "m"), 1),
            line("mug-006", ("cream", "matte", "m"), 4),
        ];

        let discount = bundle_discount(&lines, &catalog);

        assert_eq!(discount, Decimal::new(15, 2) * Decimal::from(299 + 174 + 89));

        Ok(())
    }

    #[test]
    fn bundle_needs_three_eligible_units() -> TestResult {
        let catalog = StaticCatalog::storefront()?;

        let lines = [
            line("ring-004", ("black", "matte", "m"), 1),
            line("sculpture-005", ("mono", "matte", "m"), 1),
            line("ghost-999", ("red", "matte", "m"), 5),
        ];

        assert_eq!(bundle_discount(&lines, &catalog), Decimal::ZERO);

        Ok(())
    }

    #[test]
    fn percentage_promo_takes_percent_points() -> TestResult {
        let registry = StaticPromoRegistry::storefront()?;

        assert_eq!(
            promo_discount(Decimal::from(80), registry.lookup("WELCOME10")),
            Decimal::from(8)
        );
        assert_eq!(promo_discount(Decimal::from(80), None), Decimal::ZERO);

        Ok(())
    }

    #[test]
    fn fixed_promo_never_exceeds_subtotal() {
        for subtotal in [Decimal::ZERO, Decimal::new(1999, 2), Decimal::from(25)] {
            assert_eq!(promo_discount(subtotal, Some(&fixed(25))), subtotal);
        }

        assert_eq!(
            promo_discount(Decimal::from(120), Some(&fixed(25))),
            Decimal::from(25)
        );
    }

    #[test]
    fn promos_apply_sequentially_in_order() -> TestResult {
        let registry = StaticPromoRegistry::storefront()?;
        let welcome = registry.lookup("WELCOME10").ok_or("missing WELCOME10")?;
        let save = registry.lookup("SAVE25").ok_or("missing SAVE25")?;

        // 200 - 10% = 180, then - 25 = 155
        assert_eq!(
            promo_discounts(Decimal::from(200), [welcome, save]),
            Decimal::from(45)
        );

        // 200 - 25 = 175, then - 10% = 157.5
        assert_eq!(
            promo_discounts(Decimal::from(200), [save, welcome]),
            Decimal::new(425, 1)
        );

        Ok(())
    }
}
