//! Product Fixtures

use rust_decimal::Decimal;
use rustc_hash::FxHashSet;
use serde::Deserialize;

use crate::{
    fixtures::FixtureError,
    products::{Product, ProductVariants, Variant},
};

/// Wrapper for products in YAML
#[derive(Debug, Deserialize)]
pub struct ProductsFixture {
    /// Products, in catalog order
    pub products: Vec<ProductFixture>,
}

/// Product Fixture
#[derive(Debug, Deserialize)]
pub struct ProductFixture {
    /// Product id
    pub id: String,

    /// Product name
    pub name: String,

    /// Product description
    #[serde(default)]
    pub description: String,

    /// Base price (e.g. `"299"`)
    pub base_price: Decimal,

    /// Average rating
    #[serde(default)]
    pub rating: f32,

    /// Number of reviews
    #[serde(default)]
    pub review_count: u32,

    /// Category
    #[serde(default)]
    pub category: Option<String>,

    /// Brand
    #[serde(default)]
    pub brand: Option<String>,

    /// Bundle partner ids
    #[serde(default)]
    pub bundle_eligible: Vec<String>,

    /// Variant groups
    pub variants: VariantsFixture,
}

/// Variant groups in YAML
#[derive(Debug, Deserialize)]
pub struct VariantsFixture {
    /// Colours
    pub colors: Vec<VariantFixture>,

    /// Materials
    pub materials: Vec<VariantFixture>,

    /// Sizes
    pub sizes: Vec<VariantFixture>,
}

/// Variant Fixture
#[derive(Debug, Deserialize)]
pub struct VariantFixture {
    /// Variant id
    pub id: String,

    /// Variant name
    pub name: String,

    /// Price modifier (e.g. `"-10"`)
    #[serde(default)]
    pub price_modifier: Decimal,

    /// Catalog stock
    pub stock: u32,

    /// Swatch colour
    #[serde(default)]
    pub hex: Option<String>,

    /// Incompatible variant ids
    #[serde(default)]
    pub incompatible_with: Vec<String>,
}

impl From<VariantFixture> for Variant {
    fn from(fixture: VariantFixture) -> Self {
        Variant {
            id: fixture.id,
            name: fixture.name,
            price_modifier: fixture.price_modifier,
            stock: fixture.stock,
            hex: fixture.hex,
            incompatible_with: fixture.incompatible_with,
        }
    }
}

impl TryFrom<ProductFixture> for Product {
    type Error = FixtureError;

    fn try_from(fixture: ProductFixture) -> Result<Self, Self::Error> {
        let invalid = |reason: &str| FixtureError::InvalidProduct {
            id: fixture.id.clone(),
            reason: reason.to_string(),
        };

        if fixture.id.trim().is_empty() {
            return Err(invalid("id is required"));
        }

        if fixture.name.trim().is_empty() {
            return Err(invalid("name is required"));
        }

        if fixture.base_price.is_sign_negative() {
            return Err(invalid("base price must be non-negative"));
        }

        if !(0.0..=5.0).contains(&fixture.rating) {
            return Err(invalid("rating must be between 0 and 5"));
        }

        let groups = [
            ("colors", &fixture.variants.colors),
            ("materials", &fixture.variants.materials),
            ("sizes", &fixture.variants.sizes),
        ];

        for (group, variants) in groups {
            let mut seen = FxHashSet::default();

            for variant in variants {
                if variant.id.trim().is_empty() {
                    return Err(invalid(&format!("{group} variant id is required")));
                }

                if !seen.insert(variant.id.as_str()) {
                    return Err(invalid(&format!(
                        "duplicate {group} variant id {}",
                        variant.id
                    )));
                }
            }
        }

        Ok(Product {
            id: fixture.id,
            name: fixture.name,
            description: fixture.description,
            base_price: fixture.base_price,
            rating: fixture.rating,
            review_count: fixture.review_count,
            category: fixture.category,
            brand: fixture.brand,
            bundle_eligible: fixture.bundle_eligible,
            variants: ProductVariants {
                colors: fixture.variants.colors.into_iter().map(Variant::from).collect(),
                materials: fixture
                    .variants
                    .materials
                    .into_iter()
                    .map(Variant::from)
                    .collect(),
                sizes: fixture.variants.sizes.into_iter().map(Variant::from).collect(),
            },
        })
    }
}
