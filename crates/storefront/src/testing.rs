//! In-memory [`ResourceClient`] for engine tests.
//!
//! Keeps a tiny server model (cart lines priced at 9.99 each, a wishlist
//! and orders), counts every call, and lets tests inject failures or hold
//! a call until released.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use rust_decimal::Decimal;
use shopease_core::{
    Cart, CartItem, ItemId, Money, Order, OrderId, OrderLine, OrderStatus, ProductId, Quantity,
    ResourceId, Wishlist,
};
use tokio::sync::Notify;

use crate::client::{ClientError, ResourceClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Call {
    ReadCart,
    AddCartItem,
    UpdateCartItem,
    RemoveCartItem,
    ReadWishlist,
    AddWishlistProduct,
    RemoveWishlistProduct,
    CreateOrder,
    ListOrders,
    RetrieveOrder,
}

#[derive(Debug, Default)]
struct Server {
    lines: Vec<(ResourceId, ProductId, Quantity)>,
    wishlist: Vec<ProductId>,
    orders: Vec<Order>,
    next_id: u64,
}

impl Server {
    fn issue(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn cart(&self) -> Cart {
        let items = self
            .lines
            .iter()
            .map(|(id, product, quantity)| CartItem {
                id: ItemId::Resource(id.clone()),
                product_ref: product.clone(),
                quantity: *quantity,
                provisional: false,
            })
            .collect();
        let total = self
            .lines
            .iter()
            .map(|(_, _, quantity)| unit_price() * Decimal::from(quantity.get()))
            .sum();
        Cart {
            items,
            total: Money::from_decimal(total),
        }
    }

    fn wishlist(&self) -> Wishlist {
        Wishlist::from_products(self.wishlist.iter().cloned())
    }
}

fn unit_price() -> Decimal {
    Decimal::new(999, 2)
}

fn scripted_failure() -> ClientError {
    ClientError::Status {
        status: 503,
        body: "scripted failure".to_string(),
    }
}

#[derive(Debug, Default)]
pub struct ScriptedClient {
    server: Mutex<Server>,
    calls: Mutex<HashMap<Call, usize>>,
    failing: Mutex<HashSet<Call>>,
    failing_items: Mutex<HashSet<ResourceId>>,
    gates: Mutex<HashMap<Call, Arc<Notify>>>,
    acks_only: AtomicBool,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a confirmed cart line and return its server id.
    pub fn seed_cart_line(&self, product: &str, quantity: u32) -> ResourceId {
        let mut server = self.server.lock().unwrap();
        let id = ResourceId::new(server.issue("srv"));
        server.lines.push((
            id.clone(),
            ProductId::from(product),
            Quantity::clamped(i64::from(quantity)),
        ));
        id
    }

    pub fn seed_wishlist(&self, product: &str) {
        self.server
            .lock()
            .unwrap()
            .wishlist
            .push(ProductId::from(product));
    }

    pub fn seed_order(&self, address: &str) -> OrderId {
        let mut server = self.server.lock().unwrap();
        let id = OrderId::new(server.issue("ord"));
        server.orders.insert(0, order(id.clone(), Vec::new(), address));
        id
    }

    /// Make every subsequent `call` fail until [`Self::recover`].
    pub fn fail(&self, call: Call) {
        self.failing.lock().unwrap().insert(call);
    }

    pub fn recover(&self, call: Call) {
        self.failing.lock().unwrap().remove(&call);
    }

    /// Make removal of one specific line fail.
    pub fn fail_item(&self, id: &ResourceId) {
        self.failing_items.lock().unwrap().insert(id.clone());
    }

    /// Hold every subsequent `call` until the returned gate is notified.
    pub fn hold(&self, call: Call) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates.lock().unwrap().insert(call, Arc::clone(&gate));
        gate
    }

    /// Wishlist mutations answer with an empty acknowledgement.
    pub fn acks_only(&self) {
        self.acks_only.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self, call: Call) -> usize {
        self.calls.lock().unwrap().get(&call).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    /// The server's view of the cart.
    pub fn cart(&self) -> Cart {
        self.server.lock().unwrap().cart()
    }

    async fn enter(&self, call: Call) -> Result<(), ClientError> {
        *self.calls.lock().unwrap().entry(call).or_default() += 1;
        let gate = self.gates.lock().unwrap().get(&call).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.failing.lock().unwrap().contains(&call) {
            return Err(scripted_failure());
        }
        Ok(())
    }

    fn wishlist_reply(&self, server: &Server) -> Option<Wishlist> {
        if self.acks_only.load(Ordering::SeqCst) {
            None
        } else {
            Some(server.wishlist())
        }
    }
}

fn order(id: OrderId, items: Vec<OrderLine>, address: &str) -> Order {
    let total = items
        .iter()
        .map(|line| line.price.amount * Decimal::from(line.quantity.get()))
        .sum();
    Order {
        id,
        items,
        status: OrderStatus::Pending,
        total: Money::from_decimal(total),
        shipping_address: address.to_string(),
        created_at: None,
    }
}

impl ResourceClient for ScriptedClient {
    async fn read_cart(&self) -> Result<Cart, ClientError> {
        self.enter(Call::ReadCart).await?;
        Ok(self.cart())
    }

    async fn add_cart_item(
        &self,
        product: &ProductId,
        quantity: Quantity,
    ) -> Result<(), ClientError> {
        self.enter(Call::AddCartItem).await?;
        let mut server = self.server.lock().unwrap();
        if let Some(line) = server.lines.iter_mut().find(|(_, p, _)| p == product) {
            line.2 = Quantity::clamped(i64::from(line.2.get()) + i64::from(quantity.get()));
        } else {
            let id = ResourceId::new(server.issue("srv"));
            server.lines.push((id, product.clone(), quantity));
        }
        Ok(())
    }

    async fn update_cart_item(
        &self,
        item: &ResourceId,
        quantity: Quantity,
    ) -> Result<(), ClientError> {
        self.enter(Call::UpdateCartItem).await?;
        let mut server = self.server.lock().unwrap();
        let line = server
            .lines
            .iter_mut()
            .find(|(id, _, _)| id == item)
            .ok_or_else(|| ClientError::NotFound(format!("cart-items/{item}/")))?;
        line.2 = quantity;
        Ok(())
    }

    async fn remove_cart_item(&self, item: &ResourceId) -> Result<(), ClientError> {
        self.enter(Call::RemoveCartItem).await?;
        if self.failing_items.lock().unwrap().contains(item) {
            return Err(scripted_failure());
        }
        let mut server = self.server.lock().unwrap();
        let before = server.lines.len();
        server.lines.retain(|(id, _, _)| id != item);
        if server.lines.len() == before {
            return Err(ClientError::NotFound(format!("cart-items/{item}/")));
        }
        Ok(())
    }

    async fn read_wishlist(&self) -> Result<Wishlist, ClientError> {
        self.enter(Call::ReadWishlist).await?;
        Ok(self.server.lock().unwrap().wishlist())
    }

    async fn add_wishlist_product(
        &self,
        product: &ProductId,
    ) -> Result<Option<Wishlist>, ClientError> {
        self.enter(Call::AddWishlistProduct).await?;
        let mut server = self.server.lock().unwrap();
        if !server.wishlist.contains(product) {
            server.wishlist.push(product.clone());
        }
        Ok(self.wishlist_reply(&server))
    }

    async fn remove_wishlist_product(
        &self,
        product: &ProductId,
    ) -> Result<Option<Wishlist>, ClientError> {
        self.enter(Call::RemoveWishlistProduct).await?;
        let mut server = self.server.lock().unwrap();
        server.wishlist.retain(|p| p != product);
        Ok(self.wishlist_reply(&server))
    }

    async fn create_order(&self, shipping_address: &str) -> Result<Order, ClientError> {
        self.enter(Call::CreateOrder).await?;
        let mut server = self.server.lock().unwrap();
        if server.lines.is_empty() {
            return Err(ClientError::Status {
                status: 400,
                body: "cart is empty".to_string(),
            });
        }
        let lines = std::mem::take(&mut server.lines)
            .into_iter()
            .map(|(_, product_ref, quantity)| OrderLine {
                product_ref,
                quantity,
                price: Money::from_decimal(unit_price()),
            })
            .collect();
        let id = OrderId::new(server.issue("ord"));
        let created = order(id, lines, shipping_address);
        server.orders.insert(0, created.clone());
        Ok(created)
    }

    async fn list_orders(&self) -> Result<Vec<Order>, ClientError> {
        self.enter(Call::ListOrders).await?;
        Ok(self.server.lock().unwrap().orders.clone())
    }

    async fn retrieve_order(&self, id: &OrderId) -> Result<Order, ClientError> {
        self.enter(Call::RetrieveOrder).await?;
        self.server
            .lock()
            .unwrap()
            .orders
            .iter()
            .find(|order| &order.id == id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("orders/{id}/")))
    }
}
