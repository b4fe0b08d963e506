//! Fixtures

use std::{fs, path::PathBuf};

use thiserror::Error;

use crate::{
    fixtures::{products::ProductsFixture, promo_codes::PromoCodesFixture},
    products::Product,
    promotions::PromoCode,
};

pub mod products;
pub mod promo_codes;

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// A product failed catalog validation
    #[error("Invalid product {id}: {reason}")]
    InvalidProduct {
        /// Offending product id
        id: String,
        /// What was wrong with it
        reason: String,
    },

    /// Two products share an id
    #[error("Duplicate product id: {0}")]
    DuplicateProduct(String),

    /// A promo code failed validation
    #[error("Invalid promo code {code}: {reason}")]
    InvalidPromoCode {
        /// Offending code
        code: String,
        /// What was wrong with it
        reason: String,
    },

    /// Two promo codes normalise to the same code
    #[error("Duplicate promo code: {0}")]
    DuplicatePromoCode(String),
}

/// Loads catalog and promo-code fixture files from a directory.
///
/// Files are looked up as `<base>/products/<name>.yml` and
/// `<base>/promo_codes/<name>.yml`.
#[derive(Debug, Clone)]
pub struct Fixture {
    base_path: PathBuf,
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

impl Fixture {
    /// Create a fixture loader with the default base path
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Create a fixture loader with a custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Load products from a named YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or a product is invalid.
    pub fn load_products(&self, name: &str) -> Result<Vec<Product>, FixtureError> {
        let file_path = self.base_path.join("products").join(format!("{name}.yml"));

        Self::parse_products(&fs::read_to_string(file_path)?)
    }

    /// Load promo codes from a named YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or a code is invalid.
    pub fn load_promo_codes(&self, name: &str) -> Result<Vec<PromoCode>, FixtureError> {
        let file_path = self
            .base_path
            .join("promo_codes")
            .join(format!("{name}.yml"));

        Self::parse_promo_codes(&fs::read_to_string(file_path)?)
    }

    /// Parse products from YAML contents
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed or a product is invalid.
    pub fn parse_products(contents: &str) -> Result<Vec<Product>, FixtureError> {
        let fixture: ProductsFixture = serde_norway::from_str(contents)?;

        fixture
            .products
            .into_iter()
            .map(Product::try_from)
            .collect()
    }

    /// Parse promo codes from YAML contents
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed or a code is invalid.
    pub fn parse_promo_codes(contents: &str) -> Result<Vec<PromoCode>, FixtureError> {
        let fixture: PromoCodesFixture = serde_norway::from_str(contents)?;

        fixture
            .promo_codes
            .into_iter()
            .map(PromoCode::try_from)
            .collect()
    }
}
