//! Tizaraa
//!
//! Cart, stock and pricing engine for the Tizaraa storefront: product catalog
//! lookups, variant stock and compatibility checks, order pricing, promo codes
//! and the cart aggregate with its transitions.

pub mod cart;
pub mod catalog;
pub mod discounts;
pub mod fixtures;
pub mod prelude;
pub mod pricing;
pub mod products;
pub mod promotions;
pub mod receipt;
pub mod validation;
