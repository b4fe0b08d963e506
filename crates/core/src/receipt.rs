//! Receipt

use std::io;

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use tabled::{
    builder::Builder,
    settings::{Alignment, Style, object::Columns},
};
use thiserror::Error;

use crate::{
    cart::Cart,
    catalog::Catalog,
    pricing::{PriceBreakdown, PricingError, line_price, to_money, unit_price},
    products::{Product, SelectedVariants, VariantGroup},
};

/// Errors that can occur when rendering a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// An amount could not be converted for display.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// IO error
    #[error("IO error")]
    IO,
}

/// One rendered cart line.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptLine {
    /// Product name, or its id if it no longer resolves
    pub product: String,

    /// Selected variant names
    pub options: String,

    /// Quantity
    pub quantity: u32,

    /// Unit price, if the product resolves
    pub unit_price: Option<Decimal>,

    /// Price after quantity discount, if the product resolves
    pub line_price: Option<Decimal>,
}

/// Printable summary of a cart and its pricing.
#[derive(Debug, Clone)]
pub struct Receipt {
    lines: Vec<ReceiptLine>,
    promo_codes: Vec<String>,
    breakdown: PriceBreakdown,
}

impl Receipt {
    /// Build a receipt for a cart priced as `breakdown`.
    pub fn new(cart: &Cart, breakdown: PriceBreakdown, catalog: &dyn Catalog) -> Self {
        let lines = cart
            .items
            .iter()
            .map(|item| match catalog.product(&item.product_id) {
                Some(product) => ReceiptLine {
                    product: product.name.clone(),
                    options: option_names(product, &item.selected_variants),
                    quantity: item.quantity,
                    unit_price: Some(unit_price(product, &item.selected_variants)),
                    line_price: Some(line_price(product, &item.selected_variants, item.quantity)),
                },
                None => ReceiptLine {
                    product: item.product_id.clone(),
                    options: "unavailable".to_string(),
                    quantity: item.quantity,
                    unit_price: None,
                    line_price: None,
                },
            })
            .collect();

        Self {
            lines,
            promo_codes: cart.promo_codes.clone(),
            breakdown,
        }
    }

    /// Rendered lines, in cart order.
    pub fn lines(&self) -> &[ReceiptLine] {
        &self.lines
    }

    /// The priced breakdown.
    pub fn breakdown(&self) -> &PriceBreakdown {
        &self.breakdown
    }

    /// Writes the receipt as a table followed by the summary.
    ///
    /// # Errors
    ///
    /// Returns an error if an amount cannot be displayed or the output cannot be written.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), ReceiptError> {
        let mut builder = Builder::default();

        builder.push_record(["", "Item", "Options", "Qty", "Unit Price", "Line Price"]);

        for (idx, line) in self.lines.iter().enumerate() {
            builder.push_record([
                format!("#{:<3}", idx + 1),
                line.product.clone(),
                line.options.clone(),
                line.quantity.to_string(),
                money_cell(line.unit_price)?,
                money_cell(line.line_price)?,
            ]);
        }

        let mut table = builder.build();

        table.with(Style::modern_rounded());
        table.modify(Columns::new(3..6), Alignment::right());

        writeln!(out, "\n{table}").map_err(|_err| ReceiptError::IO)?;

        self.write_summary(&mut out)
    }

    fn write_summary(&self, out: &mut impl io::Write) -> Result<(), ReceiptError> {
        let b = &self.breakdown;

        let promo_label = if self.promo_codes.is_empty() {
            "Promo discount:".to_string()
        } else {
            format!("Promo ({}):", self.promo_codes.join(", "))
        };

        let mut rows = vec![
            ("Subtotal:", to_money(b.subtotal)?.to_string()),
            (
                "Quantity discount:",
                format!("-{}", to_money(b.quantity_discount)?),
            ),
            (
                "Bundle discount:",
                format!("-{}", to_money(b.bundle_discount)?),
            ),
        ];

        rows.push((
            promo_label.as_str(),
            format!("-{}", to_money(b.promo_discount)?),
        ));
        rows.push(("Tax:", to_money(b.tax)?.to_string()));
        rows.push(("Shipping:", to_money(b.shipping)?.to_string()));
        rows.push(("Total:", to_money(b.total)?.to_string()));
        rows.push((
            "Savings:",
            format!(
                "({:.2}%) {}",
                percent_points(b.savings_percent()),
                to_money(b.savings())?
            ),
        ));

        let label_width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
        let value_width = rows.iter().map(|(_, value)| value.len()).max().unwrap_or(0);

        for (label, value) in &rows {
            writeln!(out, " {label:>label_width$}  {value:>value_width$}")
                .map_err(|_err| ReceiptError::IO)?;
        }

        let until_free = b.amount_until_free_shipping();

        if !until_free.is_zero() {
            writeln!(
                out,
                "\n Add {} more for free shipping",
                to_money(until_free)?
            )
            .map_err(|_err| ReceiptError::IO)?;
        }

        writeln!(out).map_err(|_err| ReceiptError::IO)
    }
}

fn option_names(product: &Product, selection: &SelectedVariants) -> String {
    VariantGroup::ALL
        .iter()
        .map(|group| {
            let id = selection.get(*group);

            product
                .variant(*group, id)
                .map_or_else(|| id.to_string(), |variant| variant.name.clone())
        })
        .collect::<Vec<_>>()
        .join(" / ")
}

fn money_cell(amount: Option<Decimal>) -> Result<String, ReceiptError> {
    Ok(match amount {
        Some(amount) => to_money(amount)?.to_string(),
        None => String::new(),
    })
}

/// Converts a fractional percentage to percent points for display.
fn percent_points(percentage: Percentage) -> Decimal {
    ((percentage * Decimal::ONE) * Decimal::ONE_HUNDRED).round_dp(2)
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use testresult::TestResult;

    use crate::{
        cart::{CartItem, StockPolicy},
        catalog::StaticCatalog,
        pricing::cart_summary,
        promotions::{PromoRegistry, StaticPromoRegistry},
    };

    use super::*;

    #[test]
    fn lines_use_variant_names() -> TestResult {
        let catalog = StaticCatalog::storefront()?;

        let cart = Cart::default().with_item_added(
            &catalog,
            "chair-001",
            SelectedVariants::new("black", "glossy", "s"),
            2,
            StockPolicy::default(),
            Timestamp::UNIX_EPOCH,
        )?;

        let receipt = Receipt::new(&cart, cart_summary(&cart.items, &[], &catalog), &catalog);
        let line = receipt.lines().first().ok_or("missing line")?;

        assert_eq!(line.product, "Custom Designer Chair");
        assert_eq!(line.options, "Matte Black / Glossy Finish / Small");
        assert_eq!(line.unit_price, Some(Decimal::from(319)));
        assert_eq!(line.line_price, Some(Decimal::from(638)));

        Ok(())
    }

    #[test]
    fn unknown_products_are_listed_without_prices() -> TestResult {
        let catalog = StaticCatalog::storefront()?;

        let cart = Cart {
            items: vec![CartItem::new(
                "retired-999",
                SelectedVariants::new("red", "matte", "m"),
                1,
                Timestamp::UNIX_EPOCH,
            )],
            ..Cart::default()
        };

        let receipt = Receipt::new(&cart, PriceBreakdown::default(), &catalog);
        let line = receipt.lines().first().ok_or("missing line")?;

        assert_eq!(line.product, "retired-999");
        assert_eq!(line.line_price, None);

        Ok(())
    }

    #[test]
    fn written_receipt_contains_totals() -> TestResult {
        let catalog = StaticCatalog::storefront()?;

        let cart = Cart::default()
            .with_item_added(
                &catalog,
                "vase-003",
                SelectedVariants::new("cream", "matte", "s"),
                1,
                StockPolicy::default(),
                Timestamp::UNIX_EPOCH,
            )?
            .with_promo_code("welcome10", Timestamp::UNIX_EPOCH)?;

        let registry = StaticPromoRegistry::storefront()?;
        let welcome = registry.lookup("WELCOME10").ok_or("missing WELCOME10")?;

        // 79 - 10% leaves 71.10, under the free shipping threshold: 71.10 + 5.69 tax + 10
        let receipt = Receipt::new(
            &cart,
            cart_summary(&cart.items, &[welcome], &catalog),
            &catalog,
        );

        let mut out = Vec::new();
        receipt.write_to(&mut out)?;
        let text = String::from_utf8(out)?;

        assert!(text.contains("Modern Ceramic Vase"));
        assert!(text.contains("Promo (WELCOME10):"));
        assert!(text.contains("Total:"));
        assert!(text.contains("86.79"));
        assert!(text.contains("for free shipping"));

        Ok(())
    }

    #[test]
    fn percent_points_converts_fraction() {
        assert_eq!(
            percent_points(Percentage::from(Decimal::new(25, 2))),
            Decimal::from(25)
        );
    }
}
