//! In-memory cart repository.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::carts::records::CartRecord;

use super::{CartRepository, RepositoryError};

/// Repository holding the record in memory.
///
/// Clones share storage, so several stores built from clones of one
/// repository behave like tabs of the same browser profile.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCartRepository {
    record: Arc<RwLock<Option<CartRecord>>>,
}

impl InMemoryCartRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository pre-populated with `record`.
    #[must_use]
    pub fn with_record(record: CartRecord) -> Self {
        Self {
            record: Arc::new(RwLock::new(Some(record))),
        }
    }
}

#[async_trait]
impl CartRepository for InMemoryCartRepository {
    async fn put(&self, record: &CartRecord) -> Result<(), RepositoryError> {
        *self.record.write().await = Some(record.clone());

        Ok(())
    }

    async fn get(&self) -> Result<Option<CartRecord>, RepositoryError> {
        Ok(self.record.read().await.clone())
    }

    async fn delete(&self) -> Result<(), RepositoryError> {
        *self.record.write().await = None;

        Ok(())
    }
}
