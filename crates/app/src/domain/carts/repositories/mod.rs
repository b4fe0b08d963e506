//! Cart Repositories

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;

use crate::domain::carts::records::CartRecord;

mod file;
mod memory;

pub use file::JsonFileCartRepository;
pub use memory::InMemoryCartRepository;

/// Key the current cart is stored under.
pub const CART_KEY: &str = "current";

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("cart storage I/O failed")]
    Io(#[from] std::io::Error),

    #[error("stored cart could not be encoded or decoded")]
    Serialization(#[from] serde_json::Error),

    #[error("cart storage is unavailable")]
    Unavailable,
}

/// Durable home of the one current cart.
#[automock]
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Replace the stored cart.
    async fn put(&self, record: &CartRecord) -> Result<(), RepositoryError>;

    /// Read the stored cart, if one exists.
    async fn get(&self) -> Result<Option<CartRecord>, RepositoryError>;

    /// Remove the stored cart. Removing a missing cart succeeds.
    async fn delete(&self) -> Result<(), RepositoryError>;
}
