//! Integration tests for the ShopEase sync engine.
//!
//! Each test starts a `wiremock` server standing in for the REST service
//! and drives a real [`SyncController`] over HTTP.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shopease-integration-tests
//! ```

use secrecy::SecretString;
use serde_json::{Value, json};
use shopease_storefront::{
    ApiConfig, HttpResourceClient, MutationPolicy, SessionState, SyncController,
};
use wiremock::MockServer;

pub use shopease_storefront::Identity;

/// Token accepted by [`ApiConfig`].
pub const TOKEN: &str = "integration-test-token-0123456789";

/// The engine as wired against the mock service.
pub type Engine = SyncController<HttpResourceClient>;

/// A mock REST service and an engine pointed at it.
pub struct TestContext {
    pub server: MockServer,
    pub engine: Engine,
}

impl TestContext {
    /// Start a mock service and a serialized engine.
    ///
    /// # Panics
    ///
    /// Panics if the engine cannot be configured.
    pub async fn new() -> Self {
        Self::with_policy(MutationPolicy::Serialized).await
    }

    /// # Panics
    ///
    /// Panics if the engine cannot be configured.
    pub async fn with_policy(policy: MutationPolicy) -> Self {
        let server = MockServer::start().await;
        let config = ApiConfig::new(
            &format!("{}/api", server.uri()),
            SecretString::from(TOKEN),
        )
        .expect("valid API config");
        let client = HttpResourceClient::new(&config).expect("HTTP client");
        Self {
            server,
            engine: SyncController::new(client, policy),
        }
    }

    /// Sign `identity` in and wait for the initial load.
    pub async fn sign_in(&self, identity: Identity) {
        self.engine
            .handle_session(SessionState::authenticated(identity))
            .await;
    }

    /// Requests the mock service has seen so far.
    pub async fn request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map_or(0, |requests| requests.len())
    }
}

/// A customer for tests that need a session.
#[must_use]
pub fn customer() -> Identity {
    Identity::new("u-1", "ada")
}

/// A cart body as the service renders it.
#[must_use]
pub fn cart_json(lines: &[(&str, &str, u32)], total: &str) -> Value {
    let items: Vec<Value> = lines
        .iter()
        .map(|(id, product, quantity)| {
            json!({"id": id, "product": {"id": product}, "quantity": quantity})
        })
        .collect();
    json!({"items": items, "total": total})
}

/// A wishlist body as the service renders it.
#[must_use]
pub fn wishlist_json(products: &[&str]) -> Value {
    let products: Vec<Value> = products.iter().map(|id| json!({"id": id})).collect();
    json!({"id": 1, "products": products})
}

/// An order body as the service renders it.
#[must_use]
pub fn order_json(id: u64, address: &str, total: &str) -> Value {
    json!({
        "id": id,
        "items": [],
        "status": "pending",
        "total_amount": total,
        "shipping_address": address,
        "created_at": "2026-10-01T12:00:00Z"
    })
}
