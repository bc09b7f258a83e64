//! Materialized cart.

use serde::{Deserialize, Serialize};

use super::id::{ItemId, ProductId, TempId};
use super::money::Money;
use super::quantity::Quantity;

/// A line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Server-issued or provisional line ID.
    pub id: ItemId,
    /// Product this line refers to.
    pub product_ref: ProductId,
    /// Units of the product.
    pub quantity: Quantity,
    /// True while the line has not been confirmed by the server.
    pub provisional: bool,
}

impl CartItem {
    /// A provisional line standing in for one not yet created remotely.
    #[must_use]
    pub const fn provisional(id: TempId, product_ref: ProductId, quantity: Quantity) -> Self {
        Self {
            id: ItemId::Temp(id),
            product_ref,
            quantity,
            provisional: true,
        }
    }
}

/// The shopping cart.
///
/// When no mutation is in flight every item is confirmed and `total` is the
/// server's value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cart {
    /// Ordered cart lines.
    pub items: Vec<CartItem>,
    /// Cart total as reported by the server.
    pub total: Money,
}

impl Cart {
    /// An empty cart with a zero total.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether any line is still provisional.
    #[must_use]
    pub fn has_provisional(&self) -> bool {
        self.items.iter().any(|item| item.provisional)
    }

    /// Look up a line by ID.
    #[must_use]
    pub fn item(&self, id: &ItemId) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items
            .iter()
            .map(|item| u64::from(item.quantity.get()))
            .sum()
    }

    /// A copy of this cart with `item` appended. The total is left as is.
    #[must_use]
    pub fn with_item(&self, item: CartItem) -> Self {
        let mut next = self.clone();
        next.items.push(item);
        next
    }

    /// A copy of this cart without the line `id`.
    #[must_use]
    pub fn without_item(&self, id: &ItemId) -> Self {
        Self {
            items: self
                .items
                .iter()
                .filter(|item| &item.id != id)
                .cloned()
                .collect(),
            total: self.total,
        }
    }

    /// A copy of this cart with line `id` set to `quantity`.
    #[must_use]
    pub fn with_quantity(&self, id: &ItemId, quantity: Quantity) -> Self {
        Self {
            items: self
                .items
                .iter()
                .map(|item| {
                    if &item.id == id {
                        CartItem {
                            quantity,
                            ..item.clone()
                        }
                    } else {
                        item.clone()
                    }
                })
                .collect(),
            total: self.total,
        }
    }
}
