//! Stock and compatibility checks

use std::fmt;

use smallvec::SmallVec;

use crate::{
    cart::CartItem,
    products::{Product, SelectedVariants, Variant, VariantField, VariantGroup},
};

/// Remaining stock at or below which a selection is shown as running low.
pub const LOW_STOCK_THRESHOLD: u32 = 5;

/// A problem with one field of a variant selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantError {
    /// The offending selection field
    pub field: VariantField,

    /// Customer-facing message
    pub message: String,
}

impl fmt::Display for VariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Selection problems; empty when the selection is valid.
pub type VariantErrors = SmallVec<[VariantError; 3]>;

/// Stock badge state for a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockStatus {
    /// Nothing left
    OutOfStock,

    /// At or under [`LOW_STOCK_THRESHOLD`] units left
    LowStock(u32),

    /// Comfortably in stock
    InStock(u32),
}

/// Resolve a variant id within one group of a product.
pub fn resolve_variant<'a>(
    product: &'a Product,
    group: VariantGroup,
    id: &str,
) -> Option<&'a Variant> {
    product.variant(group, id)
}

/// Check that every selected id exists and that colour and material are compatible.
///
/// Incompatibility may be declared on either side, so both directions are checked.
pub fn validate_combination(product: &Product, selection: &SelectedVariants) -> VariantErrors {
    let mut errors = VariantErrors::new();

    let [color, material, _size] = VariantGroup::ALL.map(|group| {
        let variant = resolve_variant(product, group, selection.get(group));

        if variant.is_none() {
            errors.push(VariantError {
                field: group.field(),
                message: format!("Selected {} is not available", group.field()),
            });
        }

        variant
    });

    if let (Some(color), Some(material)) = (color, material) {
        if color.is_incompatible_with(&material.id) {
            errors.push(VariantError {
                field: VariantField::Material,
                message: format!("{} is not compatible with {}", material.name, color.name),
            });
        }

        if material.is_incompatible_with(&color.id) {
            errors.push(VariantError {
                field: VariantField::Color,
                message: format!("{} is not compatible with {}", color.name, material.name),
            });
        }
    }

    errors
}

/// Resolve all three selected variants, or `None` if any is missing.
fn resolve_selection<'a>(
    product: &'a Product,
    selection: &SelectedVariants,
) -> Option<[&'a Variant; 3]> {
    let color = resolve_variant(product, VariantGroup::Colors, &selection.color)?;
    let material = resolve_variant(product, VariantGroup::Materials, &selection.material)?;
    let size = resolve_variant(product, VariantGroup::Sizes, &selection.size)?;

    Some([color, material, size])
}

/// Catalog stock for a selection: the scarcest of its three variants.
///
/// Returns 0 if any variant does not resolve.
pub fn available_stock(product: &Product, selection: &SelectedVariants) -> u32 {
    resolve_selection(product, selection)
        .and_then(|variants| variants.iter().map(|variant| variant.stock).min())
        .unwrap_or(0)
}

/// Stock for a selection after subtracting what cart lines already reserve.
///
/// Reservations are counted per axis: every line of the same product that
/// shares the colour reduces colour stock, whatever its material or size.
/// Each axis is floored at 0 and the scarcest axis wins.
pub fn available_stock_for_cart<'a>(
    product: &Product,
    selection: &SelectedVariants,
    lines: impl IntoIterator<Item = &'a CartItem>,
) -> u32 {
    let Some(variants) = resolve_selection(product, selection) else {
        return 0;
    };

    let mut reserved = [0_u32; 3];

    for line in lines
        .into_iter()
        .filter(|line| line.product_id == product.id)
    {
        for (used, group) in reserved.iter_mut().zip(VariantGroup::ALL) {
            if line.selected_variants.get(group) == selection.get(group) {
                *used = used.saturating_add(line.quantity);
            }
        }
    }

    variants
        .iter()
        .zip(reserved)
        .map(|(variant, used)| variant.stock.saturating_sub(used))
        .min()
        .unwrap_or(0)
}

/// Whether each selected variant's catalog stock covers `quantity`.
///
/// Ignores cart reservations.
pub fn has_sufficient_stock(product: &Product, selection: &SelectedVariants, quantity: u32) -> bool {
    resolve_selection(product, selection)
        .is_some_and(|variants| variants.iter().all(|variant| variant.stock >= quantity))
}

/// Whether a candidate colour or material clashes with the other current selection.
///
/// Sizes never participate in incompatibility.
pub fn is_incompatible(
    product: &Product,
    group: VariantGroup,
    candidate: &str,
    selection: &SelectedVariants,
) -> bool {
    let Some(variant) = resolve_variant(product, group, candidate) else {
        return false;
    };

    match group {
        VariantGroup::Colors => variant.is_incompatible_with(&selection.material),
        VariantGroup::Materials => variant.is_incompatible_with(&selection.color),
        VariantGroup::Sizes => false,
    }
}

/// Classify an available quantity for display.
pub fn stock_status(available: u32) -> StockStatus {
    match available {
        0 => StockStatus::OutOfStock,
        n if n <= LOW_STOCK_THRESHOLD => StockStatus::LowStock(n),
        n => StockStatus::InStock(n),
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use testresult::TestResult;

    use crate::catalog::{Catalog, StaticCatalog};

    use super::*;

    fn chair() -> TestResult<Product> {
        Ok(StaticCatalog::storefront()?
            .product("chair-001")
            .ok_or("missing chair")?
            .clone())
    }

    fn line(selection: SelectedVariants, quantity: u32) -> CartItem {
        CartItem::new("chair-001", selection, quantity, Timestamp::UNIX_EPOCH)
    }

    #[test]
    fn valid_selection_has_no_errors() -> TestResult {
        let chair = chair()?;

        let errors = validate_combination(&chair, &SelectedVariants::new("red", "matte", "m"));

        assert!(errors.is_empty());

        Ok(())
    }

    #[test]
    fn unknown_variants_report_each_field() -> TestResult {
        let chair = chair()?;

        let errors = validate_combination(&chair, &SelectedVariants::new("mauve", "matte", "xxl"));

        let fields: Vec<VariantField> = errors.iter().map(|e| e.field).collect();

        assert_eq!(fields, [VariantField::Color, VariantField::Size]);

        Ok(())
    }

    #[test]
    fn incompatibility_is_checked_in_both_directions() -> TestResult {
        let chair = chair()?;

        let errors = validate_combination(&chair, &SelectedVariants::new("neon", "wood", "m"));

        let fields: Vec<VariantField> = errors.iter().map(|e| e.field).collect();

        assert_eq!(fields, [VariantField::Material, VariantField::Color]);

        Ok(())
    }

    #[test]
    fn one_sided_incompatibility_is_still_reported() -> TestResult {
        let mut chair = chair()?;

        for material in &mut chair.variants.materials {
            material.incompatible_with.clear();
        }

        let errors = validate_combination(&chair, &SelectedVariants::new("neon", "wood", "m"));

        assert_eq!(errors.len(), 1);

        Ok(())
    }

    #[test]
    fn available_stock_is_scarcest_variant() -> TestResult {
        let chair = chair()?;

        // black has 8, matte 100, m 50
        assert_eq!(
            available_stock(&chair, &SelectedVariants::new("black", "matte", "m")),
            8
        );
        assert_eq!(
            available_stock(&chair, &SelectedVariants::new("black", "matte", "nope")),
            0
        );

        Ok(())
    }

    #[test]
    fn reservations_are_counted_per_axis() -> TestResult {
        let chair = chair()?;

        let lines = [
            line(SelectedVariants::new("black", "glossy", "s"), 3),
            line(SelectedVariants::new("black", "matte", "l"), 2),
        ];

        // black: 8 - 5 reserved
        assert_eq!(
            available_stock_for_cart(&chair, &SelectedVariants::new("black", "matte", "m"), &lines),
            3
        );

        Ok(())
    }

    #[test]
    fn reservations_ignore_other_products_and_floor_at_zero() -> TestResult {
        let chair = chair()?;
        let selection = SelectedVariants::new("black", "matte", "m");

        let mut other = line(selection.clone(), 50);
        other.product_id = "lamp-002".to_string();

        let lines = [line(selection.clone(), 20), other];

        assert_eq!(available_stock_for_cart(&chair, &selection, &lines), 0);

        Ok(())
    }

    #[test]
    fn sufficient_stock_checks_every_variant() -> TestResult {
        let chair = chair()?;
        let selection = SelectedVariants::new("black", "matte", "m");

        assert!(has_sufficient_stock(&chair, &selection, 8));
        assert!(!has_sufficient_stock(&chair, &selection, 9));
        assert!(!has_sufficient_stock(
            &chair,
            &SelectedVariants::new("mauve", "matte", "m"),
            1
        ));

        Ok(())
    }

    #[test]
    fn incompatible_options_are_flagged_for_colours_and_materials_only() -> TestResult {
        let chair = chair()?;
        let selection = SelectedVariants::new("red", "wood", "m");

        assert!(is_incompatible(&chair, VariantGroup::Colors, "neon", &selection));
        assert!(!is_incompatible(&chair, VariantGroup::Colors, "blue", &selection));

        let selection = SelectedVariants::new("neon", "matte", "m");

        assert!(is_incompatible(&chair, VariantGroup::Materials, "wood", &selection));
        assert!(!is_incompatible(&chair, VariantGroup::Sizes, "m", &selection));
        assert!(!is_incompatible(&chair, VariantGroup::Colors, "ghost", &selection));

        Ok(())
    }

    #[test]
    fn stock_status_thresholds() {
        assert_eq!(stock_status(0), StockStatus::OutOfStock);
        assert_eq!(stock_status(5), StockStatus::LowStock(5));
        assert_eq!(stock_status(6), StockStatus::InStock(6));
    }
}
