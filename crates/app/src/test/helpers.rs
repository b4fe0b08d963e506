//! Test Helpers

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tizaraa::{cart::Cart, products::SelectedVariants};
use tokio::{sync::Notify, time::sleep};

use crate::domain::carts::{
    CartRepository, CartsService, InMemoryCartRepository, RepositoryError, records::CartRecord,
};

pub(crate) fn selection(color: &str, material: &str, size: &str) -> SelectedVariants {
    SelectedVariants::new(color, material, size)
}

/// Poll `store` until its cart satisfies `predicate`, for up to a second.
pub(crate) async fn eventually<S, P>(store: &S, predicate: P) -> Cart
where
    S: CartsService + ?Sized,
    P: Fn(&Cart) -> bool,
{
    for _ in 0..100 {
        let cart = store.snapshot().await.expect("snapshot should succeed");

        if predicate(&cart) {
            return cart;
        }

        sleep(Duration::from_millis(10)).await;
    }

    panic!("cart never reached the expected state");
}

/// Repository whose reads block until released.
#[derive(Debug, Clone, Default)]
pub(crate) struct GatedRepository {
    pub inner: InMemoryCartRepository,
    pub gate: Arc<Notify>,
}

#[async_trait]
impl CartRepository for GatedRepository {
    async fn put(&self, record: &CartRecord) -> Result<(), RepositoryError> {
        self.inner.put(record).await
    }

    async fn get(&self) -> Result<Option<CartRecord>, RepositoryError> {
        self.gate.notified().await;

        self.inner.get().await
    }

    async fn delete(&self) -> Result<(), RepositoryError> {
        self.inner.delete().await
    }
}
