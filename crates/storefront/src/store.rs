//! The materialized view of the customer's cart, wishlist and orders.
//!
//! A single [`MaterializedStore`] is owned by the composition root and
//! shared by handle. Consumers get snapshots ([`MaterializedStore::read`])
//! or change notifications ([`MaterializedStore::subscribe`]); only the
//! engine writes.
//!
//! Every write carries the session epoch it was computed in. A session
//! reset advances the epoch, so work that started under the previous
//! session can finish its network call but cannot write back.

use std::sync::Arc;

use serde::Serialize;
use shopease_core::{Cart, Order, ResourceKind, Wishlist};
use tokio::sync::watch;

/// A resource held by the store.
///
/// Sealed: implemented for [`Cart`], [`Wishlist`] and the order list.
pub trait Resource: sealed::Slot + Clone + PartialEq + Send + Sync + 'static {
    /// Which slot of the store this resource occupies.
    const KIND: ResourceKind;
}

mod sealed {
    use shopease_core::{Cart, Order, Wishlist};

    /// Everything the store holds, including bookkeeping consumers never see.
    #[derive(Debug, Clone, Default)]
    pub struct StoreState {
        pub(super) cart: Cart,
        pub(super) wishlist: Wishlist,
        pub(super) orders: Vec<Order>,
        /// Engine operations currently awaiting the network.
        pub(super) in_flight: usize,
        /// Advances on every session reset.
        pub(super) epoch: u64,
        pub(super) loaded: super::Loaded,
    }

    pub trait Slot {
        fn get(state: &StoreState) -> &Self;
        fn put(state: &mut StoreState, value: Self);
    }
}

use sealed::StoreState;

impl Resource for Cart {
    const KIND: ResourceKind = ResourceKind::Cart;
}

impl sealed::Slot for Cart {
    fn get(state: &StoreState) -> &Self {
        &state.cart
    }

    fn put(state: &mut StoreState, value: Self) {
        state.cart = value;
    }
}

impl Resource for Wishlist {
    const KIND: ResourceKind = ResourceKind::Wishlist;
}

impl sealed::Slot for Wishlist {
    fn get(state: &StoreState) -> &Self {
        &state.wishlist
    }

    fn put(state: &mut StoreState, value: Self) {
        state.wishlist = value;
    }
}

impl Resource for Vec<Order> {
    const KIND: ResourceKind = ResourceKind::Orders;
}

impl sealed::Slot for Vec<Order> {
    fn get(state: &StoreState) -> &Self {
        &state.orders
    }

    fn put(state: &mut StoreState, value: Self) {
        state.orders = value;
    }
}

impl StoreState {
    fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            cart: self.cart.clone(),
            wishlist: self.wishlist.clone(),
            orders: self.orders.clone(),
            loading: self.in_flight > 0,
            loaded: self.loaded,
        }
    }
}

/// Which resources hold a server-confirmed value in the current session.
///
/// An unloaded resource shows its empty default, which says nothing about
/// the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Loaded {
    pub cart: bool,
    pub wishlist: bool,
    pub orders: bool,
}

impl Loaded {
    #[must_use]
    pub const fn get(&self, kind: ResourceKind) -> bool {
        match kind {
            ResourceKind::Cart => self.cart,
            ResourceKind::Wishlist => self.wishlist,
            ResourceKind::Orders => self.orders,
        }
    }

    const fn mark(&mut self, kind: ResourceKind) {
        match kind {
            ResourceKind::Cart => self.cart = true,
            ResourceKind::Wishlist => self.wishlist = true,
            ResourceKind::Orders => self.orders = true,
        }
    }
}

/// A point-in-time copy of the store. May be stale as soon as it is taken.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct StoreSnapshot {
    pub cart: Cart,
    pub wishlist: Wishlist,
    pub orders: Vec<Order>,
    /// True while any engine operation is awaiting the network.
    pub loading: bool,
    pub loaded: Loaded,
}

/// Shared handle to the materialized view.
///
/// Cheaply cloneable; all clones observe and write the same state.
#[derive(Clone)]
pub struct MaterializedStore {
    inner: Arc<watch::Sender<StoreState>>,
}

impl Default for MaterializedStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MaterializedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.borrow();
        f.debug_struct("MaterializedStore")
            .field("cart_items", &state.cart.items.len())
            .field("wishlist_entries", &state.wishlist.len())
            .field("orders", &state.orders.len())
            .field("in_flight", &state.in_flight)
            .field("epoch", &state.epoch)
            .field("loaded", &state.loaded)
            .finish()
    }
}

impl MaterializedStore {
    /// An empty store: empty cart and wishlist, no orders, not loading.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(StoreState::default());
        Self {
            inner: Arc::new(sender),
        }
    }

    /// Synchronous, side-effect free snapshot.
    #[must_use]
    pub fn read(&self) -> StoreSnapshot {
        self.inner.borrow().snapshot()
    }

    /// Watch the store for changes.
    #[must_use]
    pub fn subscribe(&self) -> StoreWatcher {
        StoreWatcher {
            receiver: self.inner.subscribe(),
        }
    }

    /// The current session epoch.
    pub(crate) fn epoch(&self) -> u64 {
        self.inner.borrow().epoch
    }

    /// The current value of `R` and the epoch it belongs to, read together.
    pub(crate) fn get<R: Resource>(&self) -> (R, u64) {
        let state = self.inner.borrow();
        (R::get(&state).clone(), state.epoch)
    }

    /// Whether `R` has been confirmed by the server since the last reset.
    pub(crate) fn is_loaded<R: Resource>(&self) -> bool {
        self.inner.borrow().loaded.get(R::KIND)
    }

    /// Write `value` if the session has not been reset since `epoch`.
    ///
    /// Returns false when the write was discarded as stale. The loaded flag
    /// is left as it was.
    pub(crate) fn replace<R: Resource>(&self, epoch: u64, value: R) -> bool {
        self.write(epoch, value, false)
    }

    /// Like [`replace`](Self::replace), for a value the server just returned.
    /// Marks `R` as loaded.
    pub(crate) fn confirm<R: Resource>(&self, epoch: u64, value: R) -> bool {
        self.write(epoch, value, true)
    }

    fn write<R: Resource>(&self, epoch: u64, value: R, confirmed: bool) -> bool {
        let mut applied = false;
        self.inner.send_if_modified(|state| {
            if state.epoch != epoch {
                return false;
            }
            R::put(state, value);
            if confirmed {
                state.loaded.mark(R::KIND);
            }
            applied = true;
            true
        });
        applied
    }

    /// Drop everything and start a new epoch. Not loading afterwards.
    pub(crate) fn reset(&self) {
        self.inner.send_modify(|state| {
            *state = StoreState {
                epoch: state.epoch.wrapping_add(1),
                ..StoreState::default()
            };
        });
    }

    /// Mark one operation as in flight until the guard drops.
    pub(crate) fn begin(&self) -> LoadingGuard {
        let mut epoch = 0;
        self.inner.send_modify(|state| {
            state.in_flight += 1;
            epoch = state.epoch;
        });
        LoadingGuard {
            store: self.clone(),
            epoch,
        }
    }
}

/// Keeps `loading` set while alive.
///
/// Scoped to the epoch it was taken in: a reset already cleared the count,
/// so dropping a guard from an older epoch changes nothing.
#[must_use = "loading is cleared as soon as the guard is dropped"]
pub(crate) struct LoadingGuard {
    store: MaterializedStore,
    epoch: u64,
}

impl LoadingGuard {
    /// The session epoch the guarded operation was started in.
    pub(crate) const fn epoch(&self) -> u64 {
        self.epoch
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        let epoch = self.epoch;
        self.store.inner.send_if_modified(|state| {
            if state.epoch != epoch {
                return false;
            }
            state.in_flight = state.in_flight.saturating_sub(1);
            state.in_flight == 0
        });
    }
}

/// Change notifications for UI layers.
#[derive(Debug)]
pub struct StoreWatcher {
    receiver: watch::Receiver<StoreState>,
}

impl StoreWatcher {
    /// Wait until the store changes. Returns false once the store is gone.
    pub async fn changed(&mut self) -> bool {
        self.receiver.changed().await.is_ok()
    }

    /// Snapshot of the latest value, marking it as seen.
    pub fn read(&mut self) -> StoreSnapshot {
        self.receiver.borrow_and_update().snapshot()
    }
}
