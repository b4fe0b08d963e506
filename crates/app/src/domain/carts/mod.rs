//! Carts

pub mod errors;
pub mod records;
pub mod repositories;
pub mod service;
pub mod sync;

pub use errors::CartsServiceError;
pub use repositories::{
    CartRepository, InMemoryCartRepository, JsonFileCartRepository, RepositoryError,
};
pub use service::*;
pub use sync::{CartSyncChannel, CartSyncMessage, Subscription, SyncEndpoint};
