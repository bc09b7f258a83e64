//! `shopease cart ...`

use shopease_core::{ItemId, ProductId, Quantity, ResourceId};

use super::{CommandError, Engine, ensure, print_json};

fn line(item: &str) -> ItemId {
    ItemId::from(ResourceId::from(item))
}

fn print_cart(engine: &Engine) -> Result<(), CommandError> {
    print_json(&engine.read().cart)
}

pub fn show(engine: &Engine) -> Result<(), CommandError> {
    print_cart(engine)
}

/// Add `quantity` units of `product`. Unlike `update`, a quantity below 1
/// is rejected rather than corrected.
pub async fn add(engine: &Engine, product: &str, quantity: i64) -> Result<(), CommandError> {
    let quantity = Quantity::new(quantity)?;
    ensure(
        engine.add_to_cart(ProductId::from(product), quantity).await,
        "add_to_cart",
    )?;
    print_cart(engine)
}

pub async fn update(engine: &Engine, item: &str, quantity: i64) -> Result<(), CommandError> {
    ensure(
        engine.update_cart_item(line(item), quantity).await,
        "update_cart_item",
    )?;
    print_cart(engine)
}

pub async fn remove(engine: &Engine, item: &str) -> Result<(), CommandError> {
    ensure(engine.remove_from_cart(line(item)).await, "remove_from_cart")?;
    print_cart(engine)
}

/// Clear the cart. The (now empty) cart is printed even when some removals
/// failed, before reporting the failure.
pub async fn clear(engine: &Engine) -> Result<(), CommandError> {
    let ok = engine.clear_cart().await;
    print_cart(engine)?;
    ensure(ok, "clear_cart")
}
