//! JSON file cart repository.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::domain::carts::records::CartRecord;

use super::{CART_KEY, CartRepository, RepositoryError};

/// Repository storing the record at `<data dir>/cart/current.json`.
///
/// Writes go to a temporary sibling file which is then renamed over the
/// record, so readers never see a partial cart.
#[derive(Debug, Clone)]
pub struct JsonFileCartRepository {
    path: PathBuf,
}

impl JsonFileCartRepository {
    #[must_use]
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir
                .as_ref()
                .join("cart")
                .join(format!("{CART_KEY}.json")),
        }
    }

    /// Location of the stored record.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }
}

#[async_trait]
impl CartRepository for JsonFileCartRepository {
    async fn put(&self, record: &CartRecord) -> Result<(), RepositoryError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_vec_pretty(record)?;
        let temp = self.temp_path();

        fs::write(&temp, json).await?;
        fs::rename(&temp, &self.path).await?;

        debug!(path = %self.path.display(), "cart record written");

        Ok(())
    }

    async fn get(&self) -> Result<Option<CartRecord>, RepositoryError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error.into()),
        };

        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    async fn delete(&self) -> Result<(), RepositoryError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }
}
