//! Test context for service-level tests.

use std::sync::Arc;

use tizaraa::{
    cart::StockPolicy,
    catalog::StaticCatalog,
    promotions::StaticPromoRegistry,
};

use crate::domain::carts::{
    CartRepository, CartStore, CartStoreConfig, CartSyncChannel, InMemoryCartRepository,
};

/// One simulated browser profile: shared storage and sync channel, and a
/// first store opened on them.
pub(crate) struct TestContext {
    pub catalog: Arc<StaticCatalog>,
    pub promos: Arc<StaticPromoRegistry>,
    pub repository: InMemoryCartRepository,
    pub channel: CartSyncChannel,
    pub config: CartStoreConfig,
    pub carts: Arc<CartStore>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_policy(StockPolicy::default())
    }

    pub fn with_policy(stock_policy: StockPolicy) -> Self {
        let catalog = Arc::new(StaticCatalog::storefront().expect("storefront catalog should load"));
        let promos =
            Arc::new(StaticPromoRegistry::storefront().expect("storefront promo codes should load"));

        let repository = InMemoryCartRepository::new();
        let channel = CartSyncChannel::new("test-cart-sync");
        let config = CartStoreConfig { stock_policy };

        let carts = Arc::new(CartStore::new(
            catalog.clone(),
            promos.clone(),
            Arc::new(repository.clone()),
            channel.connect(),
            config,
        ));

        Self {
            catalog,
            promos,
            repository,
            channel,
            config,
            carts,
        }
    }

    /// Another store on the same storage and channel.
    pub fn open_store(&self) -> Arc<CartStore> {
        self.store_with_repository(self.repository.clone())
    }

    /// A store on this context's channel but backed by `repository`.
    pub fn store_with_repository(&self, repository: impl CartRepository + 'static) -> Arc<CartStore> {
        Arc::new(CartStore::new(
            self.catalog.clone(),
            self.promos.clone(),
            Arc::new(repository),
            self.channel.connect(),
            self.config,
        ))
    }
}
