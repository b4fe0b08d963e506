//! Carts service.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use tizaraa::{
    cart::{Cart, CartError, CartItemId, StockPolicy},
    catalog::Catalog,
    pricing::{PriceBreakdown, cart_summary},
    products::SelectedVariants,
    promotions::{PromoCode, PromoRegistry, normalize_code},
};
use tokio::{
    sync::{Mutex, OnceCell},
    task::JoinHandle,
};
use tracing::{Span, debug, info, warn};

use crate::domain::carts::{
    errors::CartsServiceError,
    records::CartRecord,
    repositories::CartRepository,
    sync::{CartSyncMessage, SyncEndpoint},
};

/// Lifecycle of a [`CartStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorePhase {
    /// Nothing has been read from storage yet.
    Uninitialized,

    /// The first read from storage is in flight.
    Loading,

    /// The stored cart has been loaded; mutations are applied directly.
    Ready,
}

/// Cart store settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct CartStoreConfig {
    /// How stock is checked on add, update and move.
    pub stock_policy: StockPolicy,
}

/// The cart of one browsing context.
///
/// Every mutation is computed from the in-memory cart, written to the
/// repository, committed in memory, then announced on the sync channel. A
/// failed write leaves the in-memory cart as it was. Operations on one store
/// are serialised.
pub struct CartStore {
    catalog: Arc<dyn Catalog>,
    promos: Arc<dyn PromoRegistry>,
    repository: Arc<dyn CartRepository>,
    sync: SyncEndpoint,
    config: CartStoreConfig,
    cart: Mutex<Cart>,
    loaded: OnceCell<()>,
    loading: AtomicBool,
}

impl fmt::Debug for CartStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartStore")
            .field("origin", &self.sync.origin())
            .field("config", &self.config)
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}

impl CartStore {
    #[must_use]
    pub fn new(
        catalog: Arc<dyn Catalog>,
        promos: Arc<dyn PromoRegistry>,
        repository: Arc<dyn CartRepository>,
        sync: SyncEndpoint,
        config: CartStoreConfig,
    ) -> Self {
        Self {
            catalog,
            promos,
            repository,
            sync,
            config,
            cart: Mutex::new(Cart::default()),
            loaded: OnceCell::new(),
            loading: AtomicBool::new(false),
        }
    }

    /// Apply a message published by another store sharing this cart.
    ///
    /// A cleared cart is emptied directly; any other change is re-read from
    /// storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored cart cannot be read.
    #[tracing::instrument(
        name = "carts.service.handle_sync_message",
        skip(self),
        fields(origin = %self.sync.origin()),
        err
    )]
    pub async fn handle_sync_message(
        &self,
        message: CartSyncMessage,
    ) -> Result<(), CartsServiceError> {
        match message {
            CartSyncMessage::CartCleared { timestamp } => {
                self.ensure_loaded().await?;

                let at = Timestamp::from_millisecond(timestamp)
                    .unwrap_or_else(|_err| Timestamp::now());
                let mut cart = self.cart.lock().await;

                *cart = cart.cleared(at);

                info!("cart cleared by another context");

                Ok(())
            }
            CartSyncMessage::CartUpdated { .. } => self.sync_from_other_tab().await,
        }
    }

    /// Apply messages from other stores in the background until the
    /// returned listener is dropped.
    #[must_use]
    pub fn listen(self: &Arc<Self>) -> SyncListener {
        let mut subscription = self.sync.subscribe();
        let store = Arc::downgrade(self);

        let handle = tokio::spawn(async move {
            while let Some(message) = subscription.recv().await {
                let Some(store) = store.upgrade() else {
                    break;
                };

                if let Err(error) = store.handle_sync_message(message).await {
                    warn!(%error, ?message, "failed to apply cart sync message");
                }
            }
        });

        SyncListener { handle }
    }

    async fn read_stored(&self) -> Result<Cart, CartsServiceError> {
        Ok(self
            .repository
            .get()
            .await?
            .map(Cart::from)
            .unwrap_or_default())
    }

    async fn ensure_loaded(&self) -> Result<(), CartsServiceError> {
        self.loaded
            .get_or_try_init(|| async {
                self.loading.store(true, Ordering::SeqCst);

                let stored = self.read_stored().await;

                self.loading.store(false, Ordering::SeqCst);

                let stored = stored?;

                debug!(
                    items = stored.items.len(),
                    saved_items = stored.saved_items.len(),
                    "cart loaded"
                );

                *self.cart.lock().await = stored;

                Ok::<_, CartsServiceError>(())
            })
            .await?;

        Ok(())
    }

    /// Run one transition under the store lock, then persist, commit and announce it.
    ///
    /// Transitions that leave the cart unchanged are neither written nor announced.
    async fn commit<F>(&self, transition: F) -> Result<Cart, CartsServiceError>
    where
        F: FnOnce(&Cart, Timestamp) -> Result<Cart, CartError> + Send,
    {
        self.ensure_loaded().await?;

        let mut cart = self.cart.lock().await;
        let next = transition(&cart, Timestamp::now())?;

        Span::current().record("item_count", next.item_count());

        if next == *cart {
            debug!("cart unchanged");

            return Ok(next);
        }

        self.repository.put(&CartRecord::from(&next)).await?;

        *cart = next.clone();
        drop(cart);

        self.sync.publish(CartSyncMessage::updated(Timestamp::now()));

        Ok(next)
    }
}

/// Background task applying sync messages to a store.
///
/// Dropping the listener stops it.
#[derive(Debug)]
pub struct SyncListener {
    handle: JoinHandle<()>,
}

impl Drop for SyncListener {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[async_trait]
impl CartsService for CartStore {
    #[tracing::instrument(name = "carts.service.load_from_storage", skip(self), err)]
    async fn load_from_storage(&self) -> Result<(), CartsServiceError> {
        self.ensure_loaded().await
    }

    #[tracing::instrument(name = "carts.service.sync_from_other_tab", skip(self), err)]
    async fn sync_from_other_tab(&self) -> Result<(), CartsServiceError> {
        if self.loaded.initialized() {
            let mut cart = self.cart.lock().await;

            *cart = self.read_stored().await?;

            info!(items = cart.items.len(), "cart re-read from storage");

            Ok(())
        } else {
            self.ensure_loaded().await
        }
    }

    #[tracing::instrument(
        name = "carts.service.add_item",
        skip(self, product_id, selection),
        fields(
            product_id = %product_id,
            color = %selection.color,
            material = %selection.material,
            size = %selection.size,
            item_count = tracing::field::Empty
        ),
        err
    )]
    async fn add_item(
        &self,
        product_id: &str,
        selection: SelectedVariants,
        quantity: u32,
    ) -> Result<Cart, CartsServiceError> {
        let policy = self.config.stock_policy;

        let cart = self
            .commit(|cart, now| {
                cart.with_item_added(
                    self.catalog.as_ref(),
                    product_id,
                    selection,
                    quantity,
                    policy,
                    now,
                )
            })
            .await?;

        info!("item added");

        Ok(cart)
    }

    #[tracing::instrument(
        name = "carts.service.update_quantity",
        skip(self, id),
        fields(item_id = %id, item_count = tracing::field::Empty),
        err
    )]
    async fn update_quantity(
        &self,
        id: &CartItemId,
        quantity: u32,
    ) -> Result<Cart, CartsServiceError> {
        let policy = self.config.stock_policy;

        let cart = self
            .commit(|cart, now| {
                cart.with_quantity(self.catalog.as_ref(), id, quantity, policy, now)
            })
            .await?;

        info!("quantity updated");

        Ok(cart)
    }

    #[tracing::instrument(
        name = "carts.service.remove_item",
        skip(self, id),
        fields(item_id = %id, item_count = tracing::field::Empty),
        err
    )]
    async fn remove_item(&self, id: &CartItemId) -> Result<Cart, CartsServiceError> {
        self.commit(|cart, now| Ok(cart.without_item(id, now))).await
    }

    #[tracing::instrument(name = "carts.service.clear_cart", skip(self), err)]
    async fn clear_cart(&self) -> Result<Cart, CartsServiceError> {
        self.ensure_loaded().await?;

        let mut cart = self.cart.lock().await;

        self.repository.delete().await?;

        *cart = cart.cleared(Timestamp::now());

        let cleared = cart.clone();
        drop(cart);

        self.sync.publish(CartSyncMessage::cleared(Timestamp::now()));

        info!("cart cleared");

        Ok(cleared)
    }

    #[tracing::instrument(
        name = "carts.service.save_for_later",
        skip(self, id),
        fields(item_id = %id, item_count = tracing::field::Empty),
        err
    )]
    async fn save_for_later(&self, id: &CartItemId) -> Result<Cart, CartsServiceError> {
        let cart = self
            .commit(|cart, now| cart.with_item_saved(id, now))
            .await?;

        info!("item saved for later");

        Ok(cart)
    }

    #[tracing::instrument(
        name = "carts.service.move_to_cart",
        skip(self, id),
        fields(saved_item_id = %id, item_count = tracing::field::Empty),
        err
    )]
    async fn move_to_cart(&self, id: &CartItemId) -> Result<Cart, CartsServiceError> {
        let policy = self.config.stock_policy;

        let cart = self
            .commit(|cart, now| {
                cart.with_saved_item_moved(self.catalog.as_ref(), id, policy, now)
            })
            .await?;

        info!("saved item moved to cart");

        Ok(cart)
    }

    #[tracing::instrument(
        name = "carts.service.remove_saved_item",
        skip(self, id),
        fields(saved_item_id = %id, item_count = tracing::field::Empty),
        err
    )]
    async fn remove_saved_item(&self, id: &CartItemId) -> Result<Cart, CartsServiceError> {
        self.commit(|cart, now| Ok(cart.without_saved_item(id, now)))
            .await
    }

    #[tracing::instrument(
        name = "carts.service.apply_promo_code",
        skip(self, code),
        fields(code = %code, item_count = tracing::field::Empty),
        err
    )]
    async fn apply_promo_code(&self, code: &str) -> Result<Cart, CartsServiceError> {
        self.commit(|cart, now| cart.with_promo_code(code, now))
            .await
    }

    #[tracing::instrument(
        name = "carts.service.remove_promo_code",
        skip(self, code),
        fields(code = %code, item_count = tracing::field::Empty),
        err
    )]
    async fn remove_promo_code(&self, code: &str) -> Result<Cart, CartsServiceError> {
        self.commit(|cart, now| Ok(cart.without_promo_code(code, now)))
            .await
    }

    #[tracing::instrument(
        name = "carts.service.redeem_promo_code",
        skip(self, code),
        fields(code = %code, subtotal = tracing::field::Empty, item_count = tracing::field::Empty),
        err
    )]
    async fn redeem_promo_code(
        &self,
        code: &str,
        now: Timestamp,
    ) -> Result<PromoCode, CartsServiceError> {
        let code = normalize_code(code)?;
        let subtotal = self.summary_with(&[], &self.snapshot().await?).subtotal;

        Span::current().record("subtotal", tracing::field::display(subtotal));

        let promo = self.promos.validate(&code, subtotal, now)?.clone();

        self.commit(|cart, at| cart.with_promo_code(&promo.code, at))
            .await?;

        info!(code = %promo.code, "promo code redeemed");

        Ok(promo)
    }

    async fn summary(&self, now: Timestamp) -> Result<PriceBreakdown, CartsServiceError> {
        let cart = self.snapshot().await?;
        let subtotal = self.summary_with(&[], &cart).subtotal;

        let promos: Vec<&PromoCode> = cart
            .promo_codes
            .iter()
            .filter_map(|code| self.promos.validate(code, subtotal, now).ok())
            .collect();

        Ok(self.summary_with(&promos, &cart))
    }

    async fn available_stock_for(
        &self,
        product_id: &str,
        selection: &SelectedVariants,
    ) -> Result<u32, CartsServiceError> {
        let product = self
            .catalog
            .product(product_id)
            .ok_or_else(|| CartError::ProductNotFound(product_id.to_string()))?;

        let cart = self.snapshot().await?;

        Ok(cart.stock_available_for(product, selection, None, self.config.stock_policy))
    }

    async fn snapshot(&self) -> Result<Cart, CartsServiceError> {
        self.ensure_loaded().await?;

        Ok(self.cart.lock().await.clone())
    }

    fn phase(&self) -> StorePhase {
        if self.loaded.initialized() {
            StorePhase::Ready
        } else if self.loading.load(Ordering::SeqCst) {
            StorePhase::Loading
        } else {
            StorePhase::Uninitialized
        }
    }
}

impl CartStore {
    fn summary_with(&self, promos: &[&PromoCode], cart: &Cart) -> PriceBreakdown {
        cart_summary(&cart.items, promos, self.catalog.as_ref())
    }
}

#[automock]
#[async_trait]
pub trait CartsService: Send + Sync {
    /// Read the stored cart. Only the first call touches storage.
    async fn load_from_storage(&self) -> Result<(), CartsServiceError>;

    /// Replace the in-memory cart with the stored one.
    async fn sync_from_other_tab(&self) -> Result<(), CartsServiceError>;

    /// Add units of a configuration, merging with an identical line.
    async fn add_item(
        &self,
        product_id: &str,
        selection: SelectedVariants,
        quantity: u32,
    ) -> Result<Cart, CartsServiceError>;

    /// Set a line's quantity; 0 removes the line.
    async fn update_quantity(
        &self,
        id: &CartItemId,
        quantity: u32,
    ) -> Result<Cart, CartsServiceError>;

    /// Remove a line if present.
    async fn remove_item(&self, id: &CartItemId) -> Result<Cart, CartsServiceError>;

    /// Empty the cart and delete the stored record.
    async fn clear_cart(&self) -> Result<Cart, CartsServiceError>;

    /// Move a line to the saved list.
    async fn save_for_later(&self, id: &CartItemId) -> Result<Cart, CartsServiceError>;

    /// Move a saved item back into the cart as a new line.
    async fn move_to_cart(&self, id: &CartItemId) -> Result<Cart, CartsServiceError>;

    /// Remove a saved item if present.
    async fn remove_saved_item(&self, id: &CartItemId) -> Result<Cart, CartsServiceError>;

    /// Activate a code without checking eligibility.
    async fn apply_promo_code(&self, code: &str) -> Result<Cart, CartsServiceError>;

    /// Deactivate a code if active.
    async fn remove_promo_code(&self, code: &str) -> Result<Cart, CartsServiceError>;

    /// Validate a code against the current subtotal, then activate it.
    async fn redeem_promo_code(
        &self,
        code: &str,
        now: Timestamp,
    ) -> Result<PromoCode, CartsServiceError>;

    /// Price the cart using the active codes that are still redeemable at `now`.
    async fn summary(&self, now: Timestamp) -> Result<PriceBreakdown, CartsServiceError>;

    /// Stock a prospective selection could still claim.
    async fn available_stock_for(
        &self,
        product_id: &str,
        selection: &SelectedVariants,
    ) -> Result<u32, CartsServiceError>;

    /// Copy of the current cart.
    async fn snapshot(&self) -> Result<Cart, CartsServiceError>;

    fn phase(&self) -> StorePhase;
}
