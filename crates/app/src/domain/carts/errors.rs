//! Carts service errors.

use thiserror::Error;
use tizaraa::{cart::CartError, promotions::PromoCodeError};

use super::repositories::RepositoryError;

#[derive(Debug, Error)]
pub enum CartsServiceError {
    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    PromoCode(#[from] PromoCodeError),

    #[error("failed to persist cart")]
    Persistence(#[from] RepositoryError),
}

impl CartsServiceError {
    /// Whether the error refers to a product, line or code that does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Cart(
                CartError::ProductNotFound(_)
                    | CartError::ItemNotFound(_)
                    | CartError::SavedItemNotFound(_)
                    | CartError::InvalidPromoCode(PromoCodeError::NotFound(_))
            ) | Self::PromoCode(PromoCodeError::NotFound(_))
        )
    }
}
