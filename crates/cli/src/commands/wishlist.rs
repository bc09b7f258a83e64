//! `shopease wishlist ...`

use shopease_core::ProductId;

use super::{CommandError, Engine, ensure, print_json};

pub fn show(engine: &Engine) -> Result<(), CommandError> {
    print_json(&engine.read().wishlist)
}

pub async fn add(engine: &Engine, product: &str) -> Result<(), CommandError> {
    ensure(
        engine.add_to_wishlist(ProductId::from(product)).await,
        "add_to_wishlist",
    )?;
    show(engine)
}

pub async fn remove(engine: &Engine, product: &str) -> Result<(), CommandError> {
    ensure(
        engine.remove_from_wishlist(ProductId::from(product)).await,
        "remove_from_wishlist",
    )?;
    show(engine)
}
