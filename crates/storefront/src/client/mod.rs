//! Remote resource access for the cart, wishlist and orders.
//!
//! # Architecture
//!
//! - [`ResourceClient`] is the seam between the engine and the network: one
//!   call per remote operation, each returning a canonical resource or a
//!   [`ClientError`]
//! - [`HttpResourceClient`] talks to the ShopEase REST service with `reqwest`
//! - Response shape ambiguity (list-or-object bodies, numeric or string ids,
//!   paginated order lists) is normalized in [`wire`] and never reaches the
//!   engine
//!
//! The engine treats every `ClientError` variant the same way: the operation
//! failed. The variants exist for diagnostics only.

mod http;
pub(crate) mod wire;

pub use http::HttpResourceClient;

use std::future::Future;

use shopease_core::{Cart, Order, OrderId, ProductId, Quantity, ResourceId, Wishlist};
use thiserror::Error;

/// Errors that can occur when talking to the remote service.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport-level failure (connection refused, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status not covered by a more specific variant.
    #[error("Unexpected status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Truncated response body.
        body: String,
    },

    /// The access token was rejected.
    #[error("Unauthorized")]
    Unauthorized,

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the service.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The payload parsed but does not describe a valid resource.
    #[error("Malformed payload: {0}")]
    Malformed(String),

    /// Request URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Network operations against the authoritative store.
///
/// Implementations must normalize every response into the canonical types
/// of `shopease-core`. Mutating cart calls only acknowledge; the engine
/// re-reads the cart afterwards. Wishlist mutations may return the updated
/// wishlist (`Some`) or a bare acknowledgement (`None`).
pub trait ResourceClient: Send + Sync {
    /// Fetch the full cart.
    fn read_cart(&self) -> impl Future<Output = Result<Cart, ClientError>> + Send;

    /// Create a cart line for `product`.
    fn add_cart_item(
        &self,
        product: &ProductId,
        quantity: Quantity,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;

    /// Change the quantity of an existing line.
    fn update_cart_item(
        &self,
        item: &ResourceId,
        quantity: Quantity,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;

    /// Delete a cart line.
    fn remove_cart_item(
        &self,
        item: &ResourceId,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;

    /// Fetch the wishlist.
    fn read_wishlist(&self) -> impl Future<Output = Result<Wishlist, ClientError>> + Send;

    /// Save `product` to the wishlist.
    fn add_wishlist_product(
        &self,
        product: &ProductId,
    ) -> impl Future<Output = Result<Option<Wishlist>, ClientError>> + Send;

    /// Remove `product` from the wishlist.
    fn remove_wishlist_product(
        &self,
        product: &ProductId,
    ) -> impl Future<Output = Result<Option<Wishlist>, ClientError>> + Send;

    /// Place an order for the current cart.
    fn create_order(
        &self,
        shipping_address: &str,
    ) -> impl Future<Output = Result<Order, ClientError>> + Send;

    /// Fetch every order, newest first as the server orders them.
    fn list_orders(&self) -> impl Future<Output = Result<Vec<Order>, ClientError>> + Send;

    /// Fetch a single order.
    fn retrieve_order(&self, id: &OrderId)
    -> impl Future<Output = Result<Order, ClientError>> + Send;
}
