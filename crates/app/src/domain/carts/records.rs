//! Cart Records
//!
//! The persisted JSON shape of a cart. Field names are camelCase and
//! timestamps are RFC 3339 strings.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use tizaraa::{
    cart::{Cart, CartItem, CartItemId, SavedItem},
    products::SelectedVariants,
};

/// Cart Record
///
/// Reading also accepts the legacy single `promoCode` field, which is folded
/// into `promoCodes`. Writing always emits `promoCodes`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredCartRecord")]
pub struct CartRecord {
    pub items: Vec<CartItemRecord>,
    pub saved_items: Vec<SavedItemRecord>,
    pub promo_codes: Vec<String>,
    pub last_updated: Option<Timestamp>,
}

/// Cart Item Record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemRecord {
    pub id: String,
    pub product_id: String,
    pub selected_variants: SelectedVariants,
    pub quantity: u32,
    pub added_at: Timestamp,
}

/// Saved Item Record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedItemRecord {
    pub id: String,
    pub product_id: String,
    pub selected_variants: SelectedVariants,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_at: Option<Timestamp>,
    pub saved_at: Timestamp,
}

/// Every shape a cart has been stored in.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StoredCartRecord {
    items: Vec<CartItemRecord>,
    saved_items: Vec<SavedItemRecord>,
    promo_codes: Vec<String>,
    promo_code: Option<String>,
    last_updated: Option<Timestamp>,
}

impl From<StoredCartRecord> for CartRecord {
    fn from(stored: StoredCartRecord) -> Self {
        let mut promo_codes: Vec<String> = Vec::with_capacity(stored.promo_codes.len() + 1);

        for code in stored.promo_codes.into_iter().chain(stored.promo_code) {
            let code = code.trim().to_ascii_uppercase();

            if !code.is_empty() && !promo_codes.contains(&code) {
                promo_codes.push(code);
            }
        }

        Self {
            items: stored.items,
            saved_items: stored.saved_items,
            promo_codes,
            last_updated: stored.last_updated,
        }
    }
}

impl From<&Cart> for CartRecord {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.items.iter().map(CartItemRecord::from).collect(),
            saved_items: cart.saved_items.iter().map(SavedItemRecord::from).collect(),
            promo_codes: cart.promo_codes.clone(),
            last_updated: cart.last_updated,
        }
    }
}

impl From<CartRecord> for Cart {
    fn from(record: CartRecord) -> Self {
        Self {
            items: record.items.into_iter().map(CartItem::from).collect(),
            saved_items: record.saved_items.into_iter().map(SavedItem::from).collect(),
            promo_codes: record.promo_codes,
            last_updated: record.last_updated,
        }
    }
}

impl From<&CartItem> for CartItemRecord {
    fn from(item: &CartItem) -> Self {
        Self {
            id: item.id.as_str().to_string(),
            product_id: item.product_id.clone(),
            selected_variants: item.selected_variants.clone(),
            quantity: item.quantity,
            added_at: item.added_at,
        }
    }
}

impl From<CartItemRecord> for CartItem {
    fn from(record: CartItemRecord) -> Self {
        Self {
            id: CartItemId::from(record.id),
            product_id: record.product_id,
            selected_variants: record.selected_variants,
            quantity: record.quantity,
            added_at: record.added_at,
        }
    }
}

impl From<&SavedItem> for SavedItemRecord {
    fn from(item: &SavedItem) -> Self {
        Self {
            id: item.id.as_str().to_string(),
            product_id: item.product_id.clone(),
            selected_variants: item.selected_variants.clone(),
            quantity: item.quantity,
            added_at: item.added_at,
            saved_at: item.saved_at,
        }
    }
}

impl From<SavedItemRecord> for SavedItem {
    fn from(record: SavedItemRecord) -> Self {
        Self {
            id: CartItemId::from(record.id),
            product_id: record.product_id,
            selected_variants: record.selected_variants,
            quantity: record.quantity,
            added_at: record.added_at,
            saved_at: record.saved_at,
        }
    }
}
