//! Tizaraa prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{Cart, CartError, CartItem, CartItemId, MAX_LINE_QUANTITY, SavedItem, StockPolicy},
    catalog::{Catalog, StaticCatalog},
    fixtures::{Fixture, FixtureError},
    pricing::{PriceBreakdown, PricingError, cart_summary, to_money},
    products::{Product, SelectedVariants, Variant, VariantField, VariantGroup},
    promotions::{
        DiscountType, PromoCode, PromoCodeError, PromoRegistry, StaticPromoRegistry,
        normalize_code,
    },
    receipt::{Receipt, ReceiptError},
    validation::{StockStatus, VariantError, VariantErrors, stock_status},
};
