//! Integration tests for cart transitions against the storefront catalog.

use jiff::Timestamp;
use testresult::TestResult;

use tizaraa::{
    cart::{Cart, CartError, CartItemId, StockPolicy},
    catalog::StaticCatalog,
    products::SelectedVariants,
};

fn red_matte_m() -> SelectedVariants {
    SelectedVariants::new("red", "matte", "m")
}

#[test]
fn adding_to_an_empty_cart_creates_one_line() -> TestResult {
    let catalog = StaticCatalog::storefront()?;

    let cart = Cart::default().with_item_added(
        &catalog,
        "chair-001",
        red_matte_m(),
        1,
        StockPolicy::default(),
        Timestamp::now(),
    )?;

    let line = cart.items.first().ok_or("missing line")?;

    assert_eq!(cart.items.len(), 1);
    assert_eq!(line.quantity, 1);
    assert_eq!(line.product_id, "chair-001");

    Ok(())
}

#[test]
fn adding_twice_merges_into_one_line() -> TestResult {
    let catalog = StaticCatalog::storefront()?;
    let policy = StockPolicy::default();

    let cart = Cart::default()
        .with_item_added(&catalog, "chair-001", red_matte_m(), 1, policy, Timestamp::now())?
        .with_item_added(&catalog, "chair-001", red_matte_m(), 2, policy, Timestamp::now())?;

    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items.first().map(|line| line.quantity), Some(3));

    Ok(())
}

#[test]
fn failed_merge_leaves_cart_untouched() -> TestResult {
    let catalog = StaticCatalog::storefront()?;
    let policy = StockPolicy::default();

    // red has 15 units
    let cart = Cart::default()
        .with_item_added(&catalog, "chair-001", red_matte_m(), 10, policy, Timestamp::now())?;
    let before = cart.clone();

    let result =
        cart.with_item_added(&catalog, "chair-001", red_matte_m(), 6, policy, Timestamp::now());

    assert!(matches!(result, Err(CartError::InsufficientStock { .. })));
    assert_eq!(cart, before);

    Ok(())
}

#[test]
fn save_for_later_round_trip_keeps_configuration() -> TestResult {
    let catalog = StaticCatalog::storefront()?;
    let policy = StockPolicy::default();

    let cart = Cart::default()
        .with_item_added(&catalog, "lamp-002", SelectedVariants::new("rose", "brushed", "l"), 2, policy, Timestamp::now())?;
    let id = cart.items.first().ok_or("missing line")?.id.clone();

    let cart = cart
        .with_item_saved(&id, Timestamp::now())?
        .with_saved_item_moved(&catalog, &id, policy, Timestamp::now())?;

    let line = cart.items.first().ok_or("missing line")?;

    assert_eq!(line.product_id, "lamp-002");
    assert_eq!(line.selected_variants, SelectedVariants::new("rose", "brushed", "l"));
    assert_eq!(line.quantity, 2);
    assert!(cart.saved_items.is_empty());

    Ok(())
}

#[test]
fn removing_twice_equals_removing_once() -> TestResult {
    let catalog = StaticCatalog::storefront()?;
    let now = Timestamp::now();

    let cart = Cart::default().with_item_added(
        &catalog,
        "chair-001",
        red_matte_m(),
        1,
        StockPolicy::default(),
        now,
    )?;

    let missing = CartItemId::from("1700000000000-abc123");
    let id = cart.items.first().ok_or("missing line")?.id.clone();

    let once = cart.without_item(&id, now);

    assert_eq!(once.without_item(&id, now), once);
    assert_eq!(cart.without_saved_item(&missing, now), cart);

    Ok(())
}
