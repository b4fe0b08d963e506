//! App Context

use std::{fs, path::Path, sync::Arc};

use thiserror::Error;
use tizaraa::{
    catalog::{Catalog, StaticCatalog},
    fixtures::{Fixture, FixtureError},
    promotions::{PromoRegistry, StaticPromoRegistry},
};

use crate::{
    config::AppConfig,
    domain::carts::{
        CartRepository, CartStore, CartStoreConfig, CartSyncChannel, CartsService,
        JsonFileCartRepository,
    },
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to load catalog")]
    Catalog(#[source] FixtureError),

    #[error("failed to load promo codes")]
    PromoCodes(#[source] FixtureError),
}

#[derive(Clone)]
pub struct AppContext {
    pub catalog: Arc<dyn Catalog>,
    pub promos: Arc<dyn PromoRegistry>,
    pub carts: Arc<dyn CartsService>,
    repository: Arc<dyn CartRepository>,
    channel: CartSyncChannel,
    store_config: CartStoreConfig,
}

impl AppContext {
    /// Build application context from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when a configured fixture cannot be read or is invalid.
    pub fn new(config: &AppConfig) -> Result<Self, AppInitError> {
        let catalog = match &config.catalog {
            Some(path) => read_fixture(path)
                .and_then(|contents| Fixture::parse_products(&contents))
                .and_then(StaticCatalog::new),
            None => StaticCatalog::storefront(),
        }
        .map_err(AppInitError::Catalog)?;

        let promos = match &config.promo_codes {
            Some(path) => read_fixture(path)
                .and_then(|contents| Fixture::parse_promo_codes(&contents))
                .and_then(StaticPromoRegistry::new),
            None => StaticPromoRegistry::storefront(),
        }
        .map_err(AppInitError::PromoCodes)?;

        Ok(Self::from_parts(
            Arc::new(catalog),
            Arc::new(promos),
            Arc::new(JsonFileCartRepository::new(&config.data_dir)),
            CartSyncChannel::new(config.sync_channel.as_str()),
            config.store(),
        ))
    }

    /// Assemble a context from already-built collaborators.
    #[must_use]
    pub fn from_parts(
        catalog: Arc<dyn Catalog>,
        promos: Arc<dyn PromoRegistry>,
        repository: Arc<dyn CartRepository>,
        channel: CartSyncChannel,
        store_config: CartStoreConfig,
    ) -> Self {
        let carts = Self::build_store(&catalog, &promos, &repository, &channel, store_config);

        Self {
            catalog,
            promos,
            carts,
            repository,
            channel,
            store_config,
        }
    }

    /// Open another store on the same cart, as a second browser tab would.
    #[must_use]
    pub fn open_store(&self) -> Arc<CartStore> {
        Self::build_store(
            &self.catalog,
            &self.promos,
            &self.repository,
            &self.channel,
            self.store_config,
        )
    }

    fn build_store(
        catalog: &Arc<dyn Catalog>,
        promos: &Arc<dyn PromoRegistry>,
        repository: &Arc<dyn CartRepository>,
        channel: &CartSyncChannel,
        config: CartStoreConfig,
    ) -> Arc<CartStore> {
        Arc::new(CartStore::new(
            Arc::clone(catalog),
            Arc::clone(promos),
            Arc::clone(repository),
            channel.connect(),
            config,
        ))
    }
}

fn read_fixture(path: &Path) -> Result<String, FixtureError> {
    Ok(fs::read_to_string(path)?)
}
