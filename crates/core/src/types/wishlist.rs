//! Materialized wishlist.

use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// A product saved to the wishlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistEntry {
    /// The saved product.
    pub product_ref: ProductId,
    /// True while the entry has not been confirmed by the server.
    pub provisional: bool,
}

/// The wishlist: at most one entry per product.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Wishlist {
    /// Entries in insertion order.
    pub products: Vec<WishlistEntry>,
}

impl Wishlist {
    /// An empty wishlist.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a confirmed wishlist from server data, dropping duplicates.
    #[must_use]
    pub fn from_products(products: impl IntoIterator<Item = ProductId>) -> Self {
        products.into_iter().fold(Self::empty(), |wishlist, product| {
            wishlist.with_product(product, false)
        })
    }

    /// Whether the product is present, provisional or not.
    #[must_use]
    pub fn contains(&self, product: &ProductId) -> bool {
        self.products.iter().any(|entry| &entry.product_ref == product)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the wishlist has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Whether any entry is still provisional.
    #[must_use]
    pub fn has_provisional(&self) -> bool {
        self.products.iter().any(|entry| entry.provisional)
    }

    /// A copy with `product` added. Adding a present product is a no-op.
    #[must_use]
    pub fn with_product(&self, product: ProductId, provisional: bool) -> Self {
        let mut next = self.clone();
        if !next.contains(&product) {
            next.products.push(WishlistEntry {
                product_ref: product,
                provisional,
            });
        }
        next
    }

    /// A copy with `product` removed.
    #[must_use]
    pub fn without_product(&self, product: &ProductId) -> Self {
        Self {
            products: self
                .products
                .iter()
                .filter(|entry| &entry.product_ref != product)
                .cloned()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_product_is_idempotent() {
        let wishlist = Wishlist::empty()
            .with_product(ProductId::from("p"), false)
            .with_product(ProductId::from("p"), true);
        assert_eq!(wishlist.len(), 1);
        assert!(!wishlist.has_provisional());
    }

    #[test]
    fn test_from_products_dedupes() {
        let wishlist = Wishlist::from_products(["a", "b", "a"].map(ProductId::from));
        assert_eq!(wishlist.len(), 2);
        assert!(wishlist.contains(&ProductId::from("b")));
    }

    #[test]
    fn test_without_product() {
        let wishlist = Wishlist::from_products(["a", "b"].map(ProductId::from));
        let next = wishlist.without_product(&ProductId::from("a"));
        assert!(!next.contains(&ProductId::from("a")));
        assert_eq!(next.len(), 1);
        assert_eq!(wishlist.len(), 2);
    }
}
