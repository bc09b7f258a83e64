//! The engine's operation vocabulary and session lifecycle.
//!
//! [`SyncController`] is the only surface UI layers call. Cart and wishlist
//! edits go through the [`OptimisticMutator`]; checkout and plain reads
//! write only what the server returns. No operation returns an error:
//! failures are reported through [`SyncError::report`] and surface as
//! `false` or `None`.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::join_all;
use shopease_core::{
    Cart, CartItem, ItemId, Order, OrderId, ProductId, Quantity, ResourceId, ResourceKind,
    TempId, Wishlist,
};
use tracing::{debug, info, instrument};

use crate::client::{ClientError, HttpResourceClient, ResourceClient};
use crate::config::StorefrontConfig;
use crate::error::SyncError;
use crate::mutator::{MutationPolicy, OptimisticMutator};
use crate::session::{SessionGate, SessionState};
use crate::store::{MaterializedStore, Resource, StoreSnapshot, StoreWatcher};

/// Cloneable handle to the synchronization engine.
pub struct SyncController<C> {
    inner: Arc<Inner<C>>,
}

struct Inner<C> {
    client: C,
    store: MaterializedStore,
    mutator: OptimisticMutator,
    temp_ids: AtomicU64,
    /// Last session state handled, to react to transitions only.
    session: Mutex<Option<SessionState>>,
}

impl<C> Clone for SyncController<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl SyncController<HttpResourceClient> {
    /// Build an engine talking to the configured REST service.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn from_config(config: &StorefrontConfig) -> Result<Self, ClientError> {
        let client = HttpResourceClient::new(&config.api)?;
        Ok(Self::new(client, config.mutation_policy))
    }
}

impl<C: ResourceClient> SyncController<C> {
    #[must_use]
    pub fn new(client: C, policy: MutationPolicy) -> Self {
        Self::with_store(client, MaterializedStore::new(), policy)
    }

    /// Build an engine writing into an existing store.
    #[must_use]
    pub fn with_store(client: C, store: MaterializedStore, policy: MutationPolicy) -> Self {
        let mutator = OptimisticMutator::new(store.clone(), policy);
        Self {
            inner: Arc::new(Inner {
                client,
                store,
                mutator,
                temp_ids: AtomicU64::new(0),
                session: Mutex::new(None),
            }),
        }
    }

    #[must_use]
    pub fn read(&self) -> StoreSnapshot {
        self.inner.store.read()
    }

    #[must_use]
    pub fn subscribe(&self) -> StoreWatcher {
        self.inner.store.subscribe()
    }

    #[must_use]
    pub fn store(&self) -> &MaterializedStore {
        &self.inner.store
    }

    #[must_use]
    pub fn client(&self) -> &C {
        &self.inner.client
    }

    fn next_temp_id(&self) -> TempId {
        TempId::new(self.inner.temp_ids.fetch_add(1, Ordering::Relaxed) + 1)
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Add `quantity` of `product`, showing a provisional line until the
    /// server's cart replaces it.
    ///
    /// A cart not yet loaded in this session is read first, so the
    /// provisional line joins the real cart.
    #[instrument(skip_all, fields(product_id = %product, quantity = %quantity))]
    pub async fn add_to_cart(&self, product: ProductId, quantity: Quantity) -> bool {
        const OPERATION: &str = "add_to_cart";
        if !self.ensure_loaded(self.inner.client.read_cart()).await {
            debug!("Cart unavailable, adding to the local view anyway");
        }
        let provisional = CartItem::provisional(self.next_temp_id(), product.clone(), quantity);

        self.inner
            .mutator
            .mutate(
                OPERATION,
                |cart: &Cart| Some(cart.with_item(provisional)),
                || {
                    self.write_cart(
                        OPERATION,
                        self.inner.client.add_cart_item(&product, quantity),
                    )
                },
            )
            .await
    }

    /// Set a line's quantity. Values below 1 are corrected to 1.
    #[instrument(skip_all, fields(item_id = %item))]
    pub async fn update_cart_item(&self, item: ItemId, quantity: i64) -> bool {
        const OPERATION: &str = "update_cart_item";
        let quantity = Quantity::clamped(quantity);

        self.inner
            .mutator
            .mutate(
                OPERATION,
                |cart: &Cart| Some(cart.with_quantity(&item, quantity)),
                || async {
                    let line = confirmed_line(OPERATION, &item)?;
                    self.write_cart(
                        OPERATION,
                        self.inner.client.update_cart_item(line, quantity),
                    )
                    .await
                },
            )
            .await
    }

    #[instrument(skip_all, fields(item_id = %item))]
    pub async fn remove_from_cart(&self, item: ItemId) -> bool {
        const OPERATION: &str = "remove_from_cart";

        self.inner
            .mutator
            .mutate(
                OPERATION,
                |cart: &Cart| Some(cart.without_item(&item)),
                || async {
                    let line = confirmed_line(OPERATION, &item)?;
                    self.write_cart(OPERATION, self.inner.client.remove_cart_item(line))
                        .await
                },
            )
            .await
    }

    /// Remove every confirmed line, then show an empty cart.
    ///
    /// The local cart is emptied even if some removals failed, in which
    /// case it no longer matches the server and false is returned.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> bool {
        let loading = self.inner.store.begin();
        let _lane = self.inner.mutator.lane(ResourceKind::Cart).await;

        let epoch = loading.epoch();
        let (cart, current) = self.inner.store.get::<Cart>();
        if current != epoch {
            debug!("Session reset while queued, dropping clear");
            return false;
        }
        let lines: Vec<&ResourceId> = cart
            .items
            .iter()
            .filter_map(|item| item.id.resource())
            .collect();

        let results = join_all(
            lines
                .iter()
                .map(|line| self.inner.client.remove_cart_item(line)),
        )
        .await;

        let mut failed = 0;
        for (line, result) in lines.iter().zip(results) {
            if let Err(err) = result {
                failed += 1;
                debug!(item_id = %line, error = %err, "Cart line removal failed");
            }
        }

        let written = if failed == 0 {
            self.inner.store.confirm(epoch, Cart::empty())
        } else {
            self.inner.store.replace(epoch, Cart::empty())
        };
        if !written {
            debug!("Session reset during clear, discarding result");
        }

        if failed > 0 {
            SyncError::PartialBatch {
                attempted: lines.len(),
                failed,
            }
            .report();
            return false;
        }
        true
    }

    /// Re-read the cart from the server.
    #[instrument(skip(self))]
    pub async fn refresh_cart(&self) -> bool {
        self.refresh(self.inner.client.read_cart()).await
    }

    // =========================================================================
    // Wishlist
    // =========================================================================

    /// Save `product`. Already saved products succeed without a network call.
    ///
    /// Fails if the wishlist has not been loaded this session and cannot be.
    #[instrument(skip_all, fields(product_id = %product))]
    pub async fn add_to_wishlist(&self, product: ProductId) -> bool {
        const OPERATION: &str = "add_to_wishlist";
        if !self.ensure_loaded(self.inner.client.read_wishlist()).await {
            return false;
        }

        self.inner
            .mutator
            .mutate(
                OPERATION,
                |wishlist: &Wishlist| {
                    (!wishlist.contains(&product))
                        .then(|| wishlist.with_product(product.clone(), true))
                },
                || async {
                    let echoed = self
                        .inner
                        .client
                        .add_wishlist_product(&product)
                        .await
                        .map_err(|e| SyncError::speculation(OPERATION, ResourceKind::Wishlist, e))?;
                    self.confirmed_wishlist(echoed).await
                },
            )
            .await
    }

    /// Unsave `product`. Absent products succeed without a network call.
    ///
    /// Fails if the wishlist has not been loaded this session and cannot be.
    #[instrument(skip_all, fields(product_id = %product))]
    pub async fn remove_from_wishlist(&self, product: ProductId) -> bool {
        const OPERATION: &str = "remove_from_wishlist";
        if !self.ensure_loaded(self.inner.client.read_wishlist()).await {
            return false;
        }

        self.inner
            .mutator
            .mutate(
                OPERATION,
                |wishlist: &Wishlist| {
                    wishlist
                        .contains(&product)
                        .then(|| wishlist.without_product(&product))
                },
                || async {
                    let echoed = self
                        .inner
                        .client
                        .remove_wishlist_product(&product)
                        .await
                        .map_err(|e| SyncError::speculation(OPERATION, ResourceKind::Wishlist, e))?;
                    self.confirmed_wishlist(echoed).await
                },
            )
            .await
    }

    #[instrument(skip(self))]
    pub async fn refresh_wishlist(&self) -> bool {
        self.refresh(self.inner.client.read_wishlist()).await
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Check out the server-side cart.
    ///
    /// Nothing is written speculatively. On success the cart and the order
    /// list are re-read and the created order is returned, even if one of
    /// those reads failed.
    #[instrument(skip(self, shipping_address))]
    pub async fn place_order(&self, shipping_address: &str) -> Option<Order> {
        let loading = self.inner.store.begin();
        let _lane = self.inner.mutator.lane(ResourceKind::Cart).await;
        let epoch = loading.epoch();
        if self.inner.store.epoch() != epoch {
            debug!("Session reset while queued, dropping checkout");
            return None;
        }

        let order = match self.inner.client.create_order(shipping_address).await {
            Ok(order) => order,
            Err(err) => {
                SyncError::OrderCreation(err).report();
                return None;
            }
        };
        info!(order_id = %order.id, total = %order.total, "Order placed");

        let (cart, orders) = tokio::join!(
            self.inner.client.read_cart(),
            self.inner.client.list_orders()
        );
        self.settle(epoch, cart);
        self.settle(epoch, orders);

        Some(order)
    }

    /// Re-read the order list.
    #[instrument(skip(self))]
    pub async fn load_orders(&self) -> bool {
        self.refresh(self.inner.client.list_orders()).await
    }

    /// Fetch one order without touching the store.
    #[instrument(skip_all, fields(order_id = %id))]
    pub async fn retrieve_order(&self, id: &OrderId) -> Option<Order> {
        let _loading = self.inner.store.begin();
        match self.inner.client.retrieve_order(id).await {
            Ok(order) => Some(order),
            Err(err) => {
                SyncError::read(ResourceKind::Orders, err).report();
                None
            }
        }
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Follow `gate` until its signal is dropped.
    ///
    /// A new session state interrupts an initial load still in progress.
    pub async fn run(&self, mut gate: SessionGate) {
        let mut state = gate.current();
        loop {
            let handled = self.handle_session(state);
            tokio::pin!(handled);

            let interrupted = tokio::select! {
                () = &mut handled => None,
                next = gate.changed() => Some(next),
            };
            let next = match interrupted {
                None => gate.changed().await,
                Some(None) => {
                    handled.await;
                    None
                }
                Some(next) => next,
            };

            match next {
                Some(next) => state = next,
                None => break,
            }
        }
        debug!("Session gate closed");
    }

    /// React to a session state. Repeats of the last state are ignored.
    ///
    /// Signing out resets the store before this future first yields.
    pub async fn handle_session(&self, state: SessionState) {
        let previous = self
            .inner
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(state.clone());
        if previous.as_ref() == Some(&state) {
            return;
        }
        if !state.ready {
            debug!("Session not ready");
            return;
        }

        let Some(identity) = state.identity else {
            self.inner.store.reset();
            info!("Signed out, store reset");
            return;
        };

        let switched = previous
            .as_ref()
            .and_then(SessionState::active_identity)
            .is_some_and(|prior| prior.user_id != identity.user_id);
        if switched {
            self.inner.store.reset();
            info!(user_id = %identity.user_id, "Identity changed, store reset");
        }

        self.initial_load().await;
    }

    async fn initial_load(&self) {
        let loading = self.inner.store.begin();
        let epoch = loading.epoch();

        let (cart, wishlist, orders) = tokio::join!(
            self.inner.client.read_cart(),
            self.inner.client.read_wishlist(),
            self.inner.client.list_orders()
        );
        let loaded = [
            self.settle(epoch, cart),
            self.settle(epoch, wishlist),
            self.settle(epoch, orders),
        ]
        .into_iter()
        .filter(|ok| *ok)
        .count();

        info!(epoch, loaded, "Initial load finished");
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Run a cart write, then re-read the cart as the authoritative value.
    async fn write_cart(
        &self,
        operation: &'static str,
        write: impl Future<Output = Result<(), ClientError>>,
    ) -> Result<Cart, SyncError> {
        write
            .await
            .map_err(|e| SyncError::speculation(operation, ResourceKind::Cart, e))?;
        self.inner
            .client
            .read_cart()
            .await
            .map_err(|e| SyncError::read(ResourceKind::Cart, e))
    }

    async fn confirmed_wishlist(&self, echoed: Option<Wishlist>) -> Result<Wishlist, SyncError> {
        match echoed {
            Some(wishlist) => Ok(wishlist),
            None => self
                .inner
                .client
                .read_wishlist()
                .await
                .map_err(|e| SyncError::read(ResourceKind::Wishlist, e)),
        }
    }

    async fn refresh<R: Resource>(
        &self,
        read: impl Future<Output = Result<R, ClientError>>,
    ) -> bool {
        let loading = self.inner.store.begin();
        let result = read.await;
        self.settle(loading.epoch(), result)
    }

    /// Read `R` unless it was already confirmed this session.
    async fn ensure_loaded<R: Resource>(
        &self,
        read: impl Future<Output = Result<R, ClientError>>,
    ) -> bool {
        if self.inner.store.is_loaded::<R>() {
            return true;
        }
        self.refresh(read).await
    }

    /// Write a read result, or report it and keep the last good value.
    fn settle<R: Resource>(&self, epoch: u64, result: Result<R, ClientError>) -> bool {
        match result {
            Ok(value) => {
                if !self.inner.store.confirm(epoch, value) {
                    debug!(kind = %R::KIND, "Session reset during read, discarding result");
                }
                true
            }
            Err(err) => {
                SyncError::read(R::KIND, err).report();
                false
            }
        }
    }
}

/// The server id of a cart line, failing for lines the server never saw.
fn confirmed_line<'a>(
    operation: &'static str,
    item: &'a ItemId,
) -> Result<&'a ResourceId, SyncError> {
    item.resource().ok_or_else(|| {
        SyncError::speculation(
            operation,
            ResourceKind::Cart,
            ClientError::NotFound(format!("{item} is not confirmed yet")),
        )
    })
}
