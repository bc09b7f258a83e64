//! `shopease orders ...`

use shopease_core::OrderId;

use super::{CommandError, Engine, ensure, print_json};

/// Print every order, re-read from the server.
pub async fn list(engine: &Engine) -> Result<(), CommandError> {
    ensure(engine.load_orders().await, "load_orders")?;
    print_json(&engine.read().orders)
}

pub async fn show(engine: &Engine, id: &str) -> Result<(), CommandError> {
    let order = engine
        .retrieve_order(&OrderId::from(id))
        .await
        .ok_or(CommandError::Failed("retrieve_order"))?;
    print_json(&order)
}

/// Place an order and print it.
pub async fn place(engine: &Engine, address: &str) -> Result<(), CommandError> {
    let order = engine
        .place_order(address)
        .await
        .ok_or(CommandError::Failed("place_order"))?;
    print_json(&order)
}
