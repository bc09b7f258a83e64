//! Orders.
//!
//! Orders are append-only from the client's perspective: created by
//! checkout, never edited locally, only re-fetched in full.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{OrderId, ProductId};
use super::money::Money;
use super::quantity::Quantity;
use super::status::OrderStatus;

/// A purchased line, priced at the time of purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_ref: ProductId,
    pub quantity: Quantity,
    pub price: Money,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub items: Vec<OrderLine>,
    pub status: OrderStatus,
    pub total: Money,
    pub shipping_address: String,
    /// Creation timestamp, when the server reports one.
    pub created_at: Option<DateTime<Utc>>,
}
