//! Several stores sharing one cart record, as browser tabs of one profile.

use std::{sync::Arc, time::Duration};

use testresult::TestResult;
use tizaraa::{
    cart::{Cart, StockPolicy},
    catalog::StaticCatalog,
    products::SelectedVariants,
    promotions::StaticPromoRegistry,
};
use tizaraa_app::{
    context::AppContext,
    domain::carts::{
        CartRepository, CartStore, CartStoreConfig, CartSyncChannel, CartsService,
        InMemoryCartRepository, JsonFileCartRepository,
    },
};
use tokio::time::sleep;

fn context(repository: Arc<dyn CartRepository>) -> TestResult<AppContext> {
    Ok(AppContext::from_parts(
        Arc::new(StaticCatalog::storefront()?),
        Arc::new(StaticPromoRegistry::storefront()?),
        repository,
        CartSyncChannel::default(),
        CartStoreConfig {
            stock_policy: StockPolicy::ReservationAware,
        },
    ))
}

async fn eventually(store: &CartStore, predicate: impl Fn(&Cart) -> bool) -> TestResult<Cart> {
    for _ in 0..100 {
        let cart = store.snapshot().await?;

        if predicate(&cart) {
            return Ok(cart);
        }

        sleep(Duration::from_millis(10)).await;
    }

    Err("cart never reached the expected state".into())
}

#[tokio::test]
async fn changes_in_one_tab_reach_the_other() -> TestResult {
    let ctx = context(Arc::new(InMemoryCartRepository::new()))?;

    let first = ctx.open_store();
    let second = ctx.open_store();

    first.load_from_storage().await?;
    second.load_from_storage().await?;

    let _first_listener = first.listen();
    let _second_listener = second.listen();

    first
        .add_item("chair-001", SelectedVariants::new("red", "matte", "m"), 2)
        .await?;

    let seen = eventually(&second, |cart| cart.item_count() == 2).await?;

    let line = seen.items.first().ok_or("missing cart line")?;

    second.update_quantity(&line.id, 5).await?;

    eventually(&first, |cart| cart.item_count() == 5).await?;

    first.clear_cart().await?;

    eventually(&second, Cart::is_empty).await?;

    Ok(())
}

#[tokio::test]
async fn last_writer_wins_across_tabs() -> TestResult {
    let ctx = context(Arc::new(InMemoryCartRepository::new()))?;

    let first = ctx.open_store();
    let second = ctx.open_store();

    first.load_from_storage().await?;
    second.load_from_storage().await?;

    // Neither tab listens, so each writes from its own stale view.
    first
        .add_item("lamp-002", SelectedVariants::new("gold", "matte", "m"), 1)
        .await?;
    second
        .add_item("vase-003", SelectedVariants::new("cream", "matte", "m"), 1)
        .await?;

    let third = ctx.open_store();
    let stored = third.snapshot().await?;

    assert_eq!(stored.items.len(), 1);
    assert_eq!(
        stored.items.first().map(|line| line.product_id.as_str()),
        Some("vase-003")
    );

    first.sync_from_other_tab().await?;

    assert_eq!(first.snapshot().await?, stored);

    Ok(())
}

#[tokio::test]
async fn file_storage_survives_a_restart() -> TestResult {
    let dir = tempfile::tempdir()?;

    let before = context(Arc::new(JsonFileCartRepository::new(dir.path())))?;

    before
        .carts
        .add_item("ring-004", SelectedVariants::new("black", "matte", "m"), 1)
        .await?;
    before
        .carts
        .redeem_promo_code("freeship", jiff::Timestamp::now())
        .await?;
    before.carts.apply_promo_code("welcome10").await?;

    let expected = before.carts.snapshot().await?;

    let after = context(Arc::new(JsonFileCartRepository::new(dir.path())))?;

    assert_eq!(after.carts.snapshot().await?, expected);
    assert_eq!(expected.promo_codes, ["FREESHIP", "WELCOME10"]);

    Ok(())
}
