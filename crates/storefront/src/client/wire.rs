//! Wire representations of the remote service and their normalization.
//!
//! The service is loose about shapes: collection endpoints for singleton
//! resources answer with either an object or a one-element list, ids come
//! back as numbers, and products are sometimes nested objects and sometimes
//! bare ids. Everything here reduces those variants to one canonical value
//! per resource kind.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shopease_core::{
    Cart, CartItem, ItemId, Money, Order, OrderId, OrderLine, OrderStatus, ProductId, Quantity,
    ResourceId, Wishlist,
};

use super::ClientError;

// =============================================================================
// Shape helpers
// =============================================================================

/// A body that is either a single object or a list of them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    /// The object, or the first element of the list.
    fn into_first(self) -> Option<T> {
        match self {
            Self::Many(items) => items.into_iter().next(),
            Self::One(item) => Some(item),
        }
    }
}

/// An id serialized as either a JSON number or a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum WireId {
    Int(i64),
    Str(String),
}

impl WireId {
    fn into_string(self) -> String {
        match self {
            Self::Int(id) => id.to_string(),
            Self::Str(id) => id,
        }
    }
}

/// A product reference: a nested product object or a bare id.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProductRef {
    Object { id: WireId },
    Bare(WireId),
}

impl ProductRef {
    fn into_product_id(self) -> ProductId {
        match self {
            Self::Object { id } | Self::Bare(id) => ProductId::from(id.into_string()),
        }
    }
}

/// Pick the product of a line from either `product` or `product_id`.
fn line_product(
    product: Option<ProductRef>,
    product_id: Option<WireId>,
    context: &str,
) -> Result<ProductId, ClientError> {
    product
        .map(ProductRef::into_product_id)
        .or_else(|| product_id.map(|id| ProductId::from(id.into_string())))
        .ok_or_else(|| ClientError::Malformed(format!("{context} has no product reference")))
}

fn line_quantity(raw: i64, context: &str) -> Result<Quantity, ClientError> {
    Quantity::new(raw).map_err(|e| ClientError::Malformed(format!("{context}: {e}")))
}

// =============================================================================
// Cart
// =============================================================================

#[derive(Debug, Deserialize)]
struct CartDto {
    #[serde(default)]
    items: Vec<CartItemDto>,
    total: Decimal,
}

#[derive(Debug, Deserialize)]
struct CartItemDto {
    id: WireId,
    #[serde(default)]
    product: Option<ProductRef>,
    #[serde(default)]
    product_id: Option<WireId>,
    quantity: i64,
}

fn convert_cart(dto: CartDto) -> Result<Cart, ClientError> {
    let items = dto
        .items
        .into_iter()
        .map(|item| {
            let id = item.id.into_string();
            let context = format!("cart line {id}");
            Ok(CartItem {
                product_ref: line_product(item.product, item.product_id, &context)?,
                quantity: line_quantity(item.quantity, &context)?,
                id: ItemId::Resource(ResourceId::from(id)),
                provisional: false,
            })
        })
        .collect::<Result<Vec<_>, ClientError>>()?;

    Ok(Cart {
        items,
        total: Money::from_decimal(dto.total),
    })
}

/// Parse a cart body. An empty list means the customer has no cart yet.
pub fn parse_cart(body: &str) -> Result<Cart, ClientError> {
    let parsed: OneOrMany<CartDto> = serde_json::from_str(body)?;
    parsed
        .into_first()
        .map_or_else(|| Ok(Cart::empty()), convert_cart)
}

/// Request body for creating a cart line.
#[derive(Debug, Serialize)]
pub struct AddCartItemBody<'a> {
    pub product_id: &'a str,
    pub quantity: u32,
}

/// Request body for updating a cart line.
#[derive(Debug, Serialize)]
pub struct UpdateCartItemBody {
    pub quantity: u32,
}

// =============================================================================
// Wishlist
// =============================================================================

#[derive(Debug, Deserialize)]
struct WishlistDto {
    #[serde(default)]
    products: Option<Vec<ProductRef>>,
}

/// Parse a wishlist body. An empty list means no wishlist exists yet.
pub fn parse_wishlist(body: &str) -> Result<Wishlist, ClientError> {
    Ok(parse_wishlist_ack(body)?.unwrap_or_default())
}

/// Parse the response to a wishlist mutation.
///
/// Returns `None` when the service only acknowledged the call (empty body or
/// an object without `products`), in which case the caller must re-read.
pub fn parse_wishlist_ack(body: &str) -> Result<Option<Wishlist>, ClientError> {
    if body.trim().is_empty() {
        return Ok(None);
    }

    let parsed: OneOrMany<WishlistDto> = serde_json::from_str(body)?;
    match parsed {
        OneOrMany::Many(lists) => Ok(Some(
            lists
                .into_iter()
                .next()
                .and_then(|dto| dto.products)
                .map(convert_products)
                .unwrap_or_default(),
        )),
        OneOrMany::One(dto) => Ok(dto.products.map(convert_products)),
    }
}

fn convert_products(products: Vec<ProductRef>) -> Wishlist {
    Wishlist::from_products(products.into_iter().map(ProductRef::into_product_id))
}

/// Request body for wishlist mutations.
#[derive(Debug, Serialize)]
pub struct WishlistProductBody<'a> {
    pub product_id: &'a str,
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Debug, Deserialize)]
struct OrderDto {
    id: WireId,
    #[serde(default)]
    items: Vec<OrderItemDto>,
    #[serde(alias = "total")]
    total_amount: Decimal,
    #[serde(default)]
    shipping_address: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct OrderItemDto {
    #[serde(default)]
    product: Option<ProductRef>,
    #[serde(default)]
    product_id: Option<WireId>,
    quantity: i64,
    price: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OrderListDto {
    Page { results: Vec<OrderDto> },
    List(Vec<OrderDto>),
}

fn convert_order(dto: OrderDto) -> Result<Order, ClientError> {
    let id = dto.id.into_string();
    let items = dto
        .items
        .into_iter()
        .map(|line| {
            let context = format!("order {id} line");
            Ok(OrderLine {
                product_ref: line_product(line.product, line.product_id, &context)?,
                quantity: line_quantity(line.quantity, &context)?,
                price: Money::from_decimal(line.price),
            })
        })
        .collect::<Result<Vec<_>, ClientError>>()?;

    Ok(Order {
        id: OrderId::from(id),
        items,
        status: dto.status.map(OrderStatus::from).unwrap_or_default(),
        total: Money::from_decimal(dto.total_amount),
        shipping_address: dto.shipping_address,
        created_at: dto.created_at,
    })
}

/// Parse a single order, accepting a one-element list.
pub fn parse_order(body: &str) -> Result<Order, ClientError> {
    let parsed: OneOrMany<OrderDto> = serde_json::from_str(body)?;
    parsed
        .into_first()
        .ok_or_else(|| ClientError::Malformed("empty order payload".to_string()))
        .and_then(convert_order)
}

/// Parse an order list, plain or paginated.
pub fn parse_orders(body: &str) -> Result<Vec<Order>, ClientError> {
    let parsed: OrderListDto = serde_json::from_str(body)?;
    let (OrderListDto::Page { results: orders } | OrderListDto::List(orders)) = parsed;
    orders.into_iter().map(convert_order).collect()
}

/// Request body for placing an order.
#[derive(Debug, Serialize)]
pub struct CreateOrderBody<'a> {
    pub shipping_address: &'a str,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cart_object() {
        let cart = parse_cart(
            r#"{"id": 3, "items": [{"id": 11, "product": {"id": 42, "title": "Mug"}, "quantity": 2}], "total": "19.98"}"#,
        )
        .unwrap();

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].id, ItemId::Resource(ResourceId::from("11")));
        assert_eq!(cart.items[0].product_ref, ProductId::from("42"));
        assert_eq!(cart.items[0].quantity.get(), 2);
        assert!(!cart.items[0].provisional);
        assert_eq!(cart.total.amount, Decimal::new(1998, 2));
    }

    #[test]
    fn test_parse_cart_list_takes_first() {
        let cart = parse_cart(
            r#"[{"items": [{"id": "srv-1", "product_id": "p1", "quantity": 1}], "total": 5}, {"items": [], "total": 0}]"#,
        )
        .unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.total.amount, Decimal::new(5, 0));
    }

    #[test]
    fn test_parse_cart_empty_list_is_empty_cart() {
        assert_eq!(parse_cart("[]").unwrap(), Cart::empty());
    }

    #[test]
    fn test_parse_cart_rejects_zero_quantity() {
        let err = parse_cart(r#"{"items": [{"id": 1, "product_id": 2, "quantity": 0}], "total": "0"}"#)
            .unwrap_err();
        assert!(matches!(err, ClientError::Malformed(_)));
    }

    #[test]
    fn test_parse_cart_rejects_line_without_product() {
        let err = parse_cart(r#"{"items": [{"id": 1, "quantity": 1}], "total": "0"}"#).unwrap_err();
        assert!(matches!(err, ClientError::Malformed(msg) if msg.contains("cart line 1")));
    }

    #[test]
    fn test_parse_cart_garbage_is_parse_error() {
        assert!(matches!(parse_cart("<html>"), Err(ClientError::Parse(_))));
    }

    #[test]
    fn test_parse_wishlist_variants() {
        let wishlist = parse_wishlist(r#"[{"id": 1, "products": [{"id": 7}, {"id": 8}, {"id": 7}]}]"#).unwrap();
        assert_eq!(wishlist.len(), 2);
        assert!(!wishlist.has_provisional());

        let wishlist = parse_wishlist(r#"{"products": [7, "p9"]}"#).unwrap();
        assert!(wishlist.contains(&ProductId::from("p9")));

        assert!(parse_wishlist("[]").unwrap().is_empty());
    }

    #[test]
    fn test_parse_wishlist_ack() {
        assert!(parse_wishlist_ack("").unwrap().is_none());
        assert!(parse_wishlist_ack(r#"{"status": "added"}"#).unwrap().is_none());
        let wishlist = parse_wishlist_ack(r#"{"products": [{"id": 1}]}"#).unwrap().unwrap();
        assert_eq!(wishlist.len(), 1);
    }

    #[test]
    fn test_parse_orders_plain_and_paginated() {
        let body = r#"[{"id": 5, "items": [{"product": {"id": 1}, "quantity": 2, "price": "4.50"}], "total_amount": "9.00", "shipping_address": "1 Main St", "status": "shipped", "created_at": "2026-01-02T03:04:05Z"}]"#;
        let orders = parse_orders(body).unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].id, OrderId::from(5_i64));
        assert_eq!(orders[0].status, OrderStatus::Shipped);
        assert_eq!(orders[0].items[0].price.amount, Decimal::new(450, 2));
        assert!(orders[0].created_at.is_some());

        let paged = parse_orders(r#"{"count": 1, "results": [{"id": "o-1", "total": 3}]}"#).unwrap();
        assert_eq!(paged[0].id, OrderId::from("o-1"));
        assert_eq!(paged[0].status, OrderStatus::Pending);
    }

    #[test]
    fn test_parse_order_requires_payload() {
        assert!(matches!(parse_order("[]"), Err(ClientError::Malformed(_))));
        let order = parse_order(r#"{"id": 9, "total_amount": "1.00", "shipping_address": "x"}"#).unwrap();
        assert_eq!(order.shipping_address, "x");
    }
}
