//! Catalog

use rustc_hash::FxHashMap;

use crate::{
    fixtures::{Fixture, FixtureError},
    products::Product,
};

const STOREFRONT_PRODUCTS: &str = include_str!("../fixtures/products/storefront.yml");

/// Read-only product lookup.
pub trait Catalog: Send + Sync {
    /// Look up a product by id.
    fn product(&self, id: &str) -> Option<&Product>;

    /// All products, in catalog order.
    fn products(&self) -> Box<dyn Iterator<Item = &Product> + '_>;
}

/// In-memory catalog backed by a fixed product list.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    products: Vec<Product>,
    index: FxHashMap<String, usize>,
}

impl StaticCatalog {
    /// Build a catalog from a list of products.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::DuplicateProduct`] when two products share an id.
    pub fn new(products: Vec<Product>) -> Result<Self, FixtureError> {
        let mut index = FxHashMap::default();

        for (position, product) in products.iter().enumerate() {
            if index.insert(product.id.clone(), position).is_some() {
                return Err(FixtureError::DuplicateProduct(product.id.clone()));
            }
        }

        Ok(Self { products, index })
    }

    /// The built-in storefront catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded fixture is malformed.
    pub fn storefront() -> Result<Self, FixtureError> {
        Self::new(Fixture::parse_products(STOREFRONT_PRODUCTS)?)
    }

    /// Number of products in the catalog.
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the catalog has no products.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl Catalog for StaticCatalog {
    fn product(&self, id: &str) -> Option<&Product> {
        self.index
            .get(id)
            .and_then(|position| self.products.get(*position))
    }

    fn products(&self) -> Box<dyn Iterator<Item = &Product> + '_> {
        Box::new(self.products.iter())
    }
}
