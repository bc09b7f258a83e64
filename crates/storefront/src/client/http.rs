//! HTTP implementation of [`ResourceClient`] for the ShopEase REST service.
//!
//! Uses `reqwest` with bearer-token auth. Retrieved orders are cached using
//! `moka` (configurable TTL); carts and wishlists are never cached.

use std::sync::Arc;

use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode, header};
use secrecy::{ExposeSecret, SecretString};
use shopease_core::{Cart, Order, OrderId, ProductId, Quantity, ResourceId, Wishlist};
use tracing::{debug, instrument};
use url::Url;

use super::wire::{
    self, AddCartItemBody, CreateOrderBody, UpdateCartItemBody, WishlistProductBody,
};
use super::{ClientError, ResourceClient};
use crate::config::ApiConfig;

/// Longest response excerpt written to logs.
const LOG_BODY_LIMIT: usize = 500;
/// Longest response excerpt carried in an error.
const ERROR_BODY_LIMIT: usize = 200;
const ORDER_CACHE_CAPACITY: u64 = 1000;

// =============================================================================
// HttpResourceClient
// =============================================================================

/// Client for the ShopEase cart, wishlist and order endpoints.
#[derive(Clone)]
pub struct HttpResourceClient {
    inner: Arc<HttpResourceClientInner>,
}

struct HttpResourceClientInner {
    client: reqwest::Client,
    base_url: Url,
    access_token: SecretString,
    order_cache: Cache<OrderId, Order>,
}

impl HttpResourceClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        let order_cache = Cache::builder()
            .max_capacity(ORDER_CACHE_CAPACITY)
            .time_to_live(config.order_cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(HttpResourceClientInner {
                client: builder.build()?,
                base_url: config.base_url.clone(),
                access_token: config.access_token.clone(),
                order_cache,
            }),
        })
    }

    /// Build an authenticated request for `path` relative to the base URL.
    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let url = self.inner.base_url.join(path)?;
        Ok(self
            .inner
            .client
            .request(method, url)
            .bearer_auth(self.inner.access_token.expose_secret())
            .header(header::ACCEPT, "application/json"))
    }

    /// Send a request and return the body of a successful response.
    async fn send(&self, request: RequestBuilder, path: &str) -> Result<String, ClientError> {
        let response = request.send().await?;
        let status = response.status();

        match status {
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get(header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(1);
                return Err(ClientError::RateLimited(retry_after));
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                tracing::warn!(status = %status, path, "Access token rejected");
                return Err(ClientError::Unauthorized);
            }
            StatusCode::NOT_FOUND => return Err(ClientError::NotFound(path.to_string())),
            _ => {}
        }

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                path,
                body = %excerpt(&body, LOG_BODY_LIMIT),
                "Service returned non-success status"
            );
            return Err(ClientError::Status {
                status: status.as_u16(),
                body: excerpt(&body, ERROR_BODY_LIMIT),
            });
        }

        Ok(body)
    }

    /// Decode a body, logging the payload when it does not fit the shape.
    fn decode<T>(
        path: &str,
        body: &str,
        parse: impl FnOnce(&str) -> Result<T, ClientError>,
    ) -> Result<T, ClientError> {
        parse(body).inspect_err(|e| {
            tracing::error!(
                error = %e,
                path,
                body = %excerpt(body, LOG_BODY_LIMIT),
                "Failed to decode service response"
            );
        })
    }

    async fn get(&self, path: &str) -> Result<String, ClientError> {
        let request = self.request(Method::GET, path)?;
        self.send(request, path).await
    }

    async fn post_json(
        &self,
        path: &str,
        body: &impl serde::Serialize,
    ) -> Result<String, ClientError> {
        let request = self.request(Method::POST, path)?.json(body);
        self.send(request, path).await
    }
}

fn excerpt(body: &str, limit: usize) -> String {
    body.chars().take(limit).collect()
}

impl ResourceClient for HttpResourceClient {
    #[instrument(skip(self))]
    async fn read_cart(&self) -> Result<Cart, ClientError> {
        let path = "cart/";
        let body = self.get(path).await?;
        Self::decode(path, &body, wire::parse_cart)
    }

    #[instrument(skip(self), fields(product_id = %product, quantity = %quantity))]
    async fn add_cart_item(
        &self,
        product: &ProductId,
        quantity: Quantity,
    ) -> Result<(), ClientError> {
        let body = AddCartItemBody {
            product_id: product.as_str(),
            quantity: quantity.get(),
        };
        self.post_json("cart-items/", &body).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(item_id = %item, quantity = %quantity))]
    async fn update_cart_item(
        &self,
        item: &ResourceId,
        quantity: Quantity,
    ) -> Result<(), ClientError> {
        let path = format!("cart-items/{item}/");
        let request = self
            .request(Method::PATCH, &path)?
            .json(&UpdateCartItemBody {
                quantity: quantity.get(),
            });
        self.send(request, &path).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(item_id = %item))]
    async fn remove_cart_item(&self, item: &ResourceId) -> Result<(), ClientError> {
        let path = format!("cart-items/{item}/");
        let request = self.request(Method::DELETE, &path)?;
        self.send(request, &path).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn read_wishlist(&self) -> Result<Wishlist, ClientError> {
        let path = "wishlist/";
        let body = self.get(path).await?;
        Self::decode(path, &body, wire::parse_wishlist)
    }

    #[instrument(skip(self), fields(product_id = %product))]
    async fn add_wishlist_product(
        &self,
        product: &ProductId,
    ) -> Result<Option<Wishlist>, ClientError> {
        let path = "wishlist/add_product_current/";
        let body = self
            .post_json(
                path,
                &WishlistProductBody {
                    product_id: product.as_str(),
                },
            )
            .await?;
        Self::decode(path, &body, wire::parse_wishlist_ack)
    }

    #[instrument(skip(self), fields(product_id = %product))]
    async fn remove_wishlist_product(
        &self,
        product: &ProductId,
    ) -> Result<Option<Wishlist>, ClientError> {
        let path = "wishlist/remove_product_current/";
        let body = self
            .post_json(
                path,
                &WishlistProductBody {
                    product_id: product.as_str(),
                },
            )
            .await?;
        Self::decode(path, &body, wire::parse_wishlist_ack)
    }

    #[instrument(skip(self, shipping_address))]
    async fn create_order(&self, shipping_address: &str) -> Result<Order, ClientError> {
        let path = "orders/";
        let body = self
            .post_json(path, &CreateOrderBody { shipping_address })
            .await?;
        let order = Self::decode(path, &body, wire::parse_order)?;
        self.inner
            .order_cache
            .insert(order.id.clone(), order.clone())
            .await;
        Ok(order)
    }

    #[instrument(skip(self))]
    async fn list_orders(&self) -> Result<Vec<Order>, ClientError> {
        let path = "orders/";
        let body = self.get(path).await?;
        let orders = Self::decode(path, &body, wire::parse_orders)?;
        for order in &orders {
            self.inner
                .order_cache
                .insert(order.id.clone(), order.clone())
                .await;
        }
        Ok(orders)
    }

    #[instrument(skip(self), fields(order_id = %id))]
    async fn retrieve_order(&self, id: &OrderId) -> Result<Order, ClientError> {
        if let Some(order) = self.inner.order_cache.get(id).await {
            debug!("Order cache hit");
            return Ok(order);
        }

        let path = format!("orders/{id}/");
        let body = self.get(&path).await?;
        let order = Self::decode(&path, &body, wire::parse_order)?;
        self.inner
            .order_cache
            .insert(order.id.clone(), order.clone())
            .await;
        Ok(order)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::json;
    use shopease_core::ItemId;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const TOKEN: &str = "test-access-token-0123456789";

    fn client_for(server: &MockServer) -> HttpResourceClient {
        let config = ApiConfig::new(
            &format!("{}/api", server.uri()),
            SecretString::from(TOKEN),
        )
        .unwrap();
        HttpResourceClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_read_cart_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/cart/"))
            .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": 1,
                "items": [{"id": 10, "product": {"id": 42}, "quantity": 3}],
                "total": "29.97"
            }])))
            .expect(1)
            .mount(&server)
            .await;

        let cart = client_for(&server).read_cart().await.unwrap();
        assert_eq!(cart.items[0].id, ItemId::Resource(ResourceId::from(10_i64)));
        assert_eq!(cart.total.amount, Decimal::new(2997, 2));
    }

    #[tokio::test]
    async fn test_add_cart_item_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/cart-items/"))
            .and(body_json(json!({"product_id": "42", "quantity": 2})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 10})))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .add_cart_item(&ProductId::from(42_i64), Quantity::clamped(2))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_update_and_remove_cart_item_paths() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/api/cart-items/10/"))
            .and(body_json(json!({"quantity": 1})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 10})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/cart-items/10/"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let item = ResourceId::from(10_i64);
        client.update_cart_item(&item, Quantity::ONE).await.unwrap();
        client.remove_cart_item(&item).await.unwrap();
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/cart-items/404/"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/cart-items/500/"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/cart/"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/wishlist/"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert!(matches!(
            client.remove_cart_item(&ResourceId::from(404_i64)).await,
            Err(ClientError::NotFound(_))
        ));
        assert!(matches!(
            client.remove_cart_item(&ResourceId::from(500_i64)).await,
            Err(ClientError::Status { status: 500, ref body }) if body == "boom"
        ));
        assert!(matches!(
            client.read_cart().await,
            Err(ClientError::RateLimited(7))
        ));
        assert!(matches!(
            client.read_wishlist().await,
            Err(ClientError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_wishlist_ack_without_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/wishlist/add_product_current/"))
            .and(body_json(json!({"product_id": "7"})))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let ack = client_for(&server)
            .add_wishlist_product(&ProductId::from(7_i64))
            .await
            .unwrap();
        assert!(ack.is_none());
    }

    #[tokio::test]
    async fn test_retrieve_order_is_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/orders/5/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 5,
                "items": [],
                "total_amount": "12.00",
                "shipping_address": "1 Main St",
                "status": "processing"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let first = client.retrieve_order(&OrderId::from(5_i64)).await.unwrap();
        let second = client.retrieve_order(&OrderId::from(5_i64)).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_malformed_body_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/orders/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        assert!(matches!(
            client_for(&server).list_orders().await,
            Err(ClientError::Parse(_))
        ));
    }
}
