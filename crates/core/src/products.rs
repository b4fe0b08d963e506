//! Products

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One of the three fixed variant axes of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariantGroup {
    /// Colour options
    Colors,

    /// Material / finish options
    Materials,

    /// Size options
    Sizes,
}

impl VariantGroup {
    /// All variant groups, in selection order.
    pub const ALL: [VariantGroup; 3] = [Self::Colors, Self::Materials, Self::Sizes];

    /// The selection field that chooses a variant from this group.
    pub fn field(self) -> VariantField {
        match self {
            Self::Colors => VariantField::Color,
            Self::Materials => VariantField::Material,
            Self::Sizes => VariantField::Size,
        }
    }
}

/// A field of [`SelectedVariants`], used when reporting selection problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantField {
    /// The `color` field
    Color,

    /// The `material` field
    Material,

    /// The `size` field
    Size,
}

impl fmt::Display for VariantField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Color => "color",
            Self::Material => "material",
            Self::Size => "size",
        })
    }
}

/// A selectable option within a variant group.
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    /// Identifier, unique within its group
    pub id: String,

    /// Display name
    pub name: String,

    /// Additive price modifier, may be negative
    pub price_modifier: Decimal,

    /// Catalog stock ceiling for this option
    pub stock: u32,

    /// Swatch colour for colour variants
    pub hex: Option<String>,

    /// Variant ids in other groups this option cannot be combined with
    pub incompatible_with: Vec<String>,
}

impl Variant {
    /// Whether this variant declares an incompatibility with the given variant id.
    pub fn is_incompatible_with(&self, other: &str) -> bool {
        self.incompatible_with.iter().any(|id| id == other)
    }
}

/// The three independent variant groups of a product.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductVariants {
    /// Colour options
    pub colors: Vec<Variant>,

    /// Material options
    pub materials: Vec<Variant>,

    /// Size options
    pub sizes: Vec<Variant>,
}

impl ProductVariants {
    /// Variants of a single group.
    pub fn group(&self, group: VariantGroup) -> &[Variant] {
        match group {
            VariantGroup::Colors => &self.colors,
            VariantGroup::Materials => &self.materials,
            VariantGroup::Sizes => &self.sizes,
        }
    }
}

/// Product
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    /// Product id
    pub id: String,

    /// Product name
    pub name: String,

    /// Marketing description
    pub description: String,

    /// Price before variant modifiers
    pub base_price: Decimal,

    /// Average review rating (0-5)
    pub rating: f32,

    /// Number of reviews
    pub review_count: u32,

    /// Catalog category
    pub category: Option<String>,

    /// Brand name
    pub brand: Option<String>,

    /// Partner products counted together for the bundle discount
    pub bundle_eligible: Vec<String>,

    /// Variant groups
    pub variants: ProductVariants,
}

impl Product {
    /// Look up a variant by id within one of the product's groups.
    pub fn variant(&self, group: VariantGroup, id: &str) -> Option<&Variant> {
        self.variants.group(group).iter().find(|variant| variant.id == id)
    }

    /// Whether this product declares any bundle partners.
    pub fn is_bundle_eligible(&self) -> bool {
        !self.bundle_eligible.is_empty()
    }
}

/// Exactly one chosen variant id per group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectedVariants {
    /// Selected colour id
    pub color: String,

    /// Selected material id
    pub material: String,

    /// Selected size id
    pub size: String,
}

impl SelectedVariants {
    /// Create a selection from the three variant ids.
    pub fn new(
        color: impl Into<String>,
        material: impl Into<String>,
        size: impl Into<String>,
    ) -> Self {
        Self {
            color: color.into(),
            material: material.into(),
            size: size.into(),
        }
    }

    /// The selected id for a group.
    pub fn get(&self, group: VariantGroup) -> &str {
        match group {
            VariantGroup::Colors => &self.color,
            VariantGroup::Materials => &self.material,
            VariantGroup::Sizes => &self.size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(id: &str) -> Variant {
        Variant {
            id: id.to_string(),
            name: id.to_uppercase(),
            price_modifier: Decimal::ZERO,
            stock: 1,
            hex: None,
            incompatible_with: Vec::new(),
        }
    }

    #[test]
    fn variant_lookup_is_scoped_to_group() {
        let product = Product {
            id: "p".to_string(),
            name: "P".to_string(),
            description: String::new(),
            base_price: Decimal::ONE,
            rating: 0.0,
            review_count: 0,
            category: None,
            brand: None,
            bundle_eligible: Vec::new(),
            variants: ProductVariants {
                colors: vec![variant("red")],
                materials: vec![variant("matte")],
                sizes: vec![variant("m")],
            },
        };

        assert!(product.variant(VariantGroup::Colors, "red").is_some());
        assert!(product.variant(VariantGroup::Materials, "red").is_none());
        assert!(product.variant(VariantGroup::Sizes, "xl").is_none());
    }

    #[test]
    fn selection_get_matches_group() {
        let selection = SelectedVariants::new("red", "matte", "m");

        assert_eq!(selection.get(VariantGroup::Colors), "red");
        assert_eq!(selection.get(VariantGroup::Materials), "matte");
        assert_eq!(selection.get(VariantGroup::Sizes), "m");
    }

    #[test]
    fn group_field_mapping() {
        assert_eq!(VariantGroup::Colors.field(), VariantField::Color);
        assert_eq!(VariantGroup::Sizes.field().to_string(), "size");
    }
}
