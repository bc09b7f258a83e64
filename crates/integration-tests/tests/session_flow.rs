//! Session lifecycle end-to-end over HTTP.

#![allow(clippy::unwrap_used)]

use serde_json::json;
use shopease_core::ProductId;
use shopease_integration_tests::{
    Identity, TestContext, cart_json, customer, order_json, wishlist_json,
};
use shopease_storefront::{SessionState, StoreSnapshot, session};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

async fn mount_account(ctx: &TestContext) {
    Mock::given(method("GET"))
        .and(path("/api/cart/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(cart_json(&[("10", "p1", 1)], "9.99")),
        )
        .mount(&ctx.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/wishlist/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(wishlist_json(&["w1"])))
        .mount(&ctx.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/orders/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([order_json(1, "1 Main St", "9.99")])),
        )
        .mount(&ctx.server)
        .await;
}

#[tokio::test]
async fn test_sign_in_loads_cart_wishlist_and_orders() {
    let ctx = TestContext::new().await;
    mount_account(&ctx).await;

    ctx.sign_in(customer()).await;

    let snapshot = ctx.engine.read();
    assert_eq!(snapshot.cart.items.len(), 1);
    assert!(snapshot.wishlist.contains(&ProductId::from("w1")));
    assert_eq!(snapshot.orders.len(), 1);
    assert!(!snapshot.loading);
    assert_eq!(ctx.request_count().await, 3);
}

#[tokio::test]
async fn test_sign_out_resets_without_requests() {
    let ctx = TestContext::new().await;
    mount_account(&ctx).await;
    ctx.sign_in(customer()).await;
    let requests = ctx.request_count().await;

    ctx.engine.handle_session(SessionState::anonymous()).await;

    assert_eq!(ctx.engine.read(), StoreSnapshot::default());
    assert_eq!(ctx.request_count().await, requests);
}

#[tokio::test]
async fn test_failed_wishlist_load_leaves_other_resources_loaded() {
    let ctx = TestContext::new().await;
    Mock::given(method("GET"))
        .and(path("/api/cart/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(cart_json(&[("10", "p1", 1)], "9.99")),
        )
        .mount(&ctx.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/wishlist/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&ctx.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/orders/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .mount(&ctx.server)
        .await;

    ctx.sign_in(customer()).await;

    let snapshot = ctx.engine.read();
    assert_eq!(snapshot.cart.items.len(), 1);
    assert!(snapshot.wishlist.is_empty());
    assert!(snapshot.orders.is_empty());
}

#[tokio::test]
async fn test_run_follows_session_signal() {
    let ctx = TestContext::new().await;
    mount_account(&ctx).await;
    let (signal, gate) = session::channel(SessionState::pending());
    let mut watcher = ctx.engine.subscribe();

    tokio::join!(ctx.engine.run(gate), async move {
        signal.sign_in(Identity::new("u-7", "grace"));
        loop {
            let snapshot = watcher.read();
            if snapshot.orders.len() == 1 && !snapshot.loading {
                break;
            }
            assert!(watcher.changed().await);
        }
        signal.sign_out();
    });

    assert_eq!(ctx.engine.read(), StoreSnapshot::default());
}
