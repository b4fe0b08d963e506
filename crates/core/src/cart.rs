//! Cart

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    catalog::Catalog,
    products::{Product, SelectedVariants},
    promotions::{PromoCodeError, normalize_code},
    validation::{
        VariantErrors, available_stock, available_stock_for_cart, has_sufficient_stock,
        validate_combination,
    },
};

/// Largest quantity accepted by a single add or update.
pub const MAX_LINE_QUANTITY: u32 = 99;

/// Errors from cart transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// The product id does not resolve in the catalog.
    #[error("Product {0} not found")]
    ProductNotFound(String),

    /// No cart line has this id.
    #[error("Cart item {0} not found")]
    ItemNotFound(CartItemId),

    /// No saved item has this id.
    #[error("Saved item {0} not found")]
    SavedItemNotFound(CartItemId),

    /// The requested quantity exceeds available stock.
    #[error("Insufficient stock for {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        /// Product id
        product_id: String,
        /// Quantity the line would have
        requested: u32,
        /// Quantity that could be satisfied
        available: u32,
    },

    /// A saved item cannot be moved back because stock has run out.
    #[error("{product_id} is out of stock: requested {requested}, available {available}")]
    OutOfStock {
        /// Product id
        product_id: String,
        /// Saved quantity
        requested: u32,
        /// Quantity that could be satisfied
        available: u32,
    },

    /// The variant selection is incomplete or incompatible.
    #[error("Invalid selection for {product_id}: {}", join_errors(.errors))]
    InvalidSelection {
        /// Product id
        product_id: String,
        /// Per-field problems
        errors: VariantErrors,
    },

    /// The quantity is outside `1..=MAX_LINE_QUANTITY`.
    #[error("Invalid quantity {0}: must be between 1 and {max}", max = MAX_LINE_QUANTITY)]
    InvalidQuantity(u32),

    /// Promo code input is malformed.
    #[error(transparent)]
    InvalidPromoCode(#[from] PromoCodeError),
}

fn join_errors(errors: &VariantErrors) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// How stock is checked when lines are added, updated or moved back to the cart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StockPolicy {
    /// Subtract quantities other lines already reserve on each variant.
    #[default]
    ReservationAware,

    /// Compare against each variant's catalog stock only.
    PerVariant,
}

impl fmt::Display for StockPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ReservationAware => "reservation-aware",
            Self::PerVariant => "per-variant",
        })
    }
}

impl FromStr for StockPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reservation-aware" => Ok(Self::ReservationAware),
            "per-variant" => Ok(Self::PerVariant),
            other => Err(format!(
                "unknown stock policy {other:?} (expected reservation-aware or per-variant)"
            )),
        }
    }
}

/// Identifier of a cart line or saved item.
///
/// New ids are UUID v7 strings; any string read back from storage is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartItemId(String);

impl CartItemId {
    /// Generate a fresh, time-ordered id.
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for CartItemId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for CartItemId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for CartItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One line in the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItem {
    /// Line id
    pub id: CartItemId,

    /// Product id
    pub product_id: String,

    /// Chosen variants
    pub selected_variants: SelectedVariants,

    /// Quantity, at least 1
    pub quantity: u32,

    /// When the line was created
    pub added_at: Timestamp,
}

impl CartItem {
    /// Create a new line with a fresh id.
    pub fn new(
        product_id: impl Into<String>,
        selected_variants: SelectedVariants,
        quantity: u32,
        added_at: Timestamp,
    ) -> Self {
        Self {
            id: CartItemId::generate(),
            product_id: product_id.into(),
            selected_variants,
            quantity,
            added_at,
        }
    }

    /// Whether this line has the given merge identity.
    pub fn is_same_configuration(&self, product_id: &str, selection: &SelectedVariants) -> bool {
        self.product_id == product_id && self.selected_variants == *selection
    }
}

/// A line parked in the "save for later" list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedItem {
    /// Id carried over from the cart line
    pub id: CartItemId,

    /// Product id
    pub product_id: String,

    /// Chosen variants
    pub selected_variants: SelectedVariants,

    /// Quantity
    pub quantity: u32,

    /// When the original line was created, if known
    pub added_at: Option<Timestamp>,

    /// When the line was saved
    pub saved_at: Timestamp,
}

/// The persisted cart aggregate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    /// Cart lines
    pub items: Vec<CartItem>,

    /// Saved-for-later lines
    pub saved_items: Vec<SavedItem>,

    /// Active promo codes: upper-case, unique, in the order applied
    pub promo_codes: Vec<String>,

    /// Time of the last change, if the cart was ever changed
    pub last_updated: Option<Timestamp>,
}

impl Cart {
    /// Look up a cart line.
    pub fn item(&self, id: &CartItemId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id == *id)
    }

    /// Look up a saved item.
    pub fn saved_item(&self, id: &CartItemId) -> Option<&SavedItem> {
        self.saved_items.iter().find(|item| item.id == *id)
    }

    /// Total units across all lines.
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Whether there are no cart lines.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Stock a prospective selection could still claim, excluding one line's own reservation.
    pub fn stock_available_for(
        &self,
        product: &Product,
        selection: &SelectedVariants,
        excluding: Option<&CartItemId>,
        policy: StockPolicy,
    ) -> u32 {
        match policy {
            StockPolicy::ReservationAware => available_stock_for_cart(
                product,
                selection,
                self.items
                    .iter()
                    .filter(|item| excluding.is_none_or(|id| item.id != *id)),
            ),
            StockPolicy::PerVariant => available_stock(product, selection),
        }
    }

    fn has_stock_for(
        &self,
        product: &Product,
        selection: &SelectedVariants,
        quantity: u32,
        excluding: Option<&CartItemId>,
        policy: StockPolicy,
    ) -> bool {
        match policy {
            StockPolicy::ReservationAware => {
                quantity <= self.stock_available_for(product, selection, excluding, policy)
            }
            StockPolicy::PerVariant => has_sufficient_stock(product, selection, quantity),
        }
    }

    fn touched(mut self, now: Timestamp) -> Self {
        self.last_updated = Some(now);
        self
    }

    /// Add `quantity` units of a configuration.
    ///
    /// Merges into an existing line with the same product and selection,
    /// re-checking stock for the combined quantity.
    ///
    /// # Errors
    ///
    /// - [`CartError::InvalidQuantity`] if `quantity` is 0 or above [`MAX_LINE_QUANTITY`]
    /// - [`CartError::ProductNotFound`] if the product does not resolve
    /// - [`CartError::InvalidSelection`] if the selection is incomplete or incompatible
    /// - [`CartError::InsufficientStock`] if stock cannot cover the resulting line
    pub fn with_item_added(
        &self,
        catalog: &dyn Catalog,
        product_id: &str,
        selection: SelectedVariants,
        quantity: u32,
        policy: StockPolicy,
        now: Timestamp,
    ) -> Result<Cart, CartError> {
        if quantity == 0 || quantity > MAX_LINE_QUANTITY {
            return Err(CartError::InvalidQuantity(quantity));
        }

        let product = catalog
            .product(product_id)
            .ok_or_else(|| CartError::ProductNotFound(product_id.to_string()))?;

        let errors = validate_combination(product, &selection);

        if !errors.is_empty() {
            return Err(CartError::InvalidSelection {
                product_id: product_id.to_string(),
                errors,
            });
        }

        let existing = self
            .items
            .iter()
            .position(|item| item.is_same_configuration(product_id, &selection));

        let (existing_id, existing_quantity) = existing
            .and_then(|position| self.items.get(position))
            .map_or((None, 0), |item| (Some(&item.id), item.quantity));

        let requested = existing_quantity.saturating_add(quantity);

        if !self.has_stock_for(product, &selection, requested, existing_id, policy) {
            return Err(CartError::InsufficientStock {
                product_id: product_id.to_string(),
                requested,
                available: self.stock_available_for(product, &selection, existing_id, policy),
            });
        }

        let mut next = self.clone();

        match existing.and_then(|position| next.items.get_mut(position)) {
            Some(item) => item.quantity = requested,
            None => next
                .items
                .push(CartItem::new(product_id, selection, quantity, now)),
        }

        Ok(next.touched(now))
    }

    /// Set a line's quantity. A quantity of 0 removes the line.
    ///
    /// # Errors
    ///
    /// - [`CartError::InvalidQuantity`] if `quantity` is above [`MAX_LINE_QUANTITY`]
    /// - [`CartError::ItemNotFound`] if the line does not exist
    /// - [`CartError::ProductNotFound`] if the line's product no longer resolves
    /// - [`CartError::InsufficientStock`] if stock cannot cover `quantity`
    pub fn with_quantity(
        &self,
        catalog: &dyn Catalog,
        id: &CartItemId,
        quantity: u32,
        policy: StockPolicy,
        now: Timestamp,
    ) -> Result<Cart, CartError> {
        if quantity == 0 {
            return Ok(self.without_item(id, now));
        }

        if quantity > MAX_LINE_QUANTITY {
            return Err(CartError::InvalidQuantity(quantity));
        }

        let item = self
            .item(id)
            .ok_or_else(|| CartError::ItemNotFound(id.clone()))?;

        let product = catalog
            .product(&item.product_id)
            .ok_or_else(|| CartError::ProductNotFound(item.product_id.clone()))?;

        if !self.has_stock_for(product, &item.selected_variants, quantity, Some(id), policy) {
            return Err(CartError::InsufficientStock {
                product_id: item.product_id.clone(),
                requested: quantity,
                available: self.stock_available_for(
                    product,
                    &item.selected_variants,
                    Some(id),
                    policy,
                ),
            });
        }

        let mut next = self.clone();

        if let Some(item) = next.items.iter_mut().find(|item| item.id == *id) {
            item.quantity = quantity;
        }

        Ok(next.touched(now))
    }

    /// Remove a line. Removing an absent line leaves the cart unchanged.
    pub fn without_item(&self, id: &CartItemId, now: Timestamp) -> Cart {
        if self.item(id).is_none() {
            return self.clone();
        }

        let mut next = self.clone();
        next.items.retain(|item| item.id != *id);
        next.touched(now)
    }

    /// Move a line into the saved list, keeping its id and original timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ItemNotFound`] if the line does not exist.
    pub fn with_item_saved(&self, id: &CartItemId, now: Timestamp) -> Result<Cart, CartError> {
        let item = self
            .item(id)
            .ok_or_else(|| CartError::ItemNotFound(id.clone()))?;

        let mut next = self.without_item(id, now);

        next.saved_items.push(SavedItem {
            id: item.id.clone(),
            product_id: item.product_id.clone(),
            selected_variants: item.selected_variants.clone(),
            quantity: item.quantity,
            added_at: Some(item.added_at),
            saved_at: now,
        });

        Ok(next)
    }

    /// Move a saved item back as a new cart line.
    ///
    /// The new line gets a fresh id and timestamp and is not merged with an
    /// identical existing line.
    ///
    /// # Errors
    ///
    /// - [`CartError::SavedItemNotFound`] if the saved item does not exist
    /// - [`CartError::ProductNotFound`] if its product no longer resolves
    /// - [`CartError::OutOfStock`] if stock cannot cover the saved quantity
    pub fn with_saved_item_moved(
        &self,
        catalog: &dyn Catalog,
        id: &CartItemId,
        policy: StockPolicy,
        now: Timestamp,
    ) -> Result<Cart, CartError> {
        let saved = self
            .saved_item(id)
            .ok_or_else(|| CartError::SavedItemNotFound(id.clone()))?;

        let product = catalog
            .product(&saved.product_id)
            .ok_or_else(|| CartError::ProductNotFound(saved.product_id.clone()))?;

        if !self.has_stock_for(product, &saved.selected_variants, saved.quantity, None, policy) {
            return Err(CartError::OutOfStock {
                product_id: saved.product_id.clone(),
                requested: saved.quantity,
                available: self.stock_available_for(
                    product,
                    &saved.selected_variants,
                    None,
                    policy,
                ),
            });
        }

        let mut next = self.without_saved_item(id, now);

        next.items.push(CartItem::new(
            saved.product_id.clone(),
            saved.selected_variants.clone(),
            saved.quantity,
            now,
        ));

        Ok(next)
    }

    /// Remove a saved item. Removing an absent item leaves the cart unchanged.
    pub fn without_saved_item(&self, id: &CartItemId, now: Timestamp) -> Cart {
        if self.saved_item(id).is_none() {
            return self.clone();
        }

        let mut next = self.clone();
        next.saved_items.retain(|item| item.id != *id);
        next.touched(now)
    }

    /// Activate a promo code. Already active codes are left as they are.
    ///
    /// Eligibility is not checked here.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidPromoCode`] if the input is malformed.
    pub fn with_promo_code(&self, code: &str, now: Timestamp) -> Result<Cart, CartError> {
        let code = normalize_code(code)?;

        if self.promo_codes.contains(&code) {
            return Ok(self.clone());
        }

        let mut next = self.clone();
        next.promo_codes.push(code);

        Ok(next.touched(now))
    }

    /// Deactivate a promo code, ignoring case. Absent codes are a no-op.
    pub fn without_promo_code(&self, code: &str, now: Timestamp) -> Cart {
        let code = code.trim().to_ascii_uppercase();

        if !self.promo_codes.contains(&code) {
            return self.clone();
        }

        let mut next = self.clone();
        next.promo_codes.retain(|active| *active != code);
        next.touched(now)
    }

    /// An empty cart: no lines, no saved items, no promo codes.
    pub fn cleared(&self, now: Timestamp) -> Cart {
        Cart::default().touched(now)
    }
}
