//! Optimistic mutations: speculate locally, confirm remotely, or restore.
//!
//! Each mutation captures the current value of its resource, writes a
//! speculative successor immediately, and then awaits the remote call. On
//! success the authoritative value replaces the speculation. On failure the
//! captured value is restored verbatim, never recomputed.
//!
//! Under [`MutationPolicy::Serialized`] mutations of the same resource kind
//! run one at a time, so a snapshot is never taken over another mutation's
//! speculation. [`MutationPolicy::Concurrent`] lets them overlap; the last
//! resolver wins, and a rollback can then clobber a newer confirmed value.
//!
//! A mutation belongs to the session it was called in. If the session is
//! reset while it waits for its turn, it is dropped without touching the
//! store or the network.

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use shopease_core::{Cart, ResourceKind, Wishlist};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, instrument};

use crate::error::SyncError;
use crate::store::{MaterializedStore, Resource};

/// How overlapping mutations of one resource kind are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MutationPolicy {
    /// One mutation per resource kind at a time; later callers wait.
    #[default]
    Serialized,
    /// Mutations overlap freely; the last to resolve wins.
    Concurrent,
}

impl MutationPolicy {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Serialized => "serialized",
            Self::Concurrent => "concurrent",
        }
    }
}

impl fmt::Display for MutationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MutationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "serialized" => Ok(Self::Serialized),
            "concurrent" => Ok(Self::Concurrent),
            other => Err(format!(
                "unknown mutation policy '{other}', expected 'serialized' or 'concurrent'"
            )),
        }
    }
}

/// A resource that supports speculative writes.
///
/// The order list is deliberately absent: checkout only mutates after the
/// server confirms.
pub trait Optimistic: Resource {}

impl Optimistic for Cart {}
impl Optimistic for Wishlist {}

/// The value a mutation will restore if its remote call fails.
#[derive(Debug, Clone)]
pub struct MutationSnapshot<R> {
    prior: R,
    epoch: u64,
}

impl<R: Resource> MutationSnapshot<R> {
    /// Capture the current value, or `None` if the store has moved past
    /// `epoch`.
    fn capture(store: &MaterializedStore, epoch: u64) -> Option<Self> {
        let (prior, current) = store.get::<R>();
        (current == epoch).then_some(Self { prior, epoch })
    }

    /// Resource kind the snapshot covers.
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        R::KIND
    }

    /// Value captured before speculation.
    #[must_use]
    pub const fn prior(&self) -> &R {
        &self.prior
    }

    fn speculate(&self, store: &MaterializedStore, value: R) {
        store.replace(self.epoch, value);
    }

    fn commit(self, store: &MaterializedStore, value: R) -> bool {
        store.confirm(self.epoch, value)
    }

    fn rollback(self, store: &MaterializedStore) -> bool {
        store.replace(self.epoch, self.prior)
    }
}

#[derive(Debug, Default)]
struct Lanes {
    cart: Mutex<()>,
    wishlist: Mutex<()>,
    orders: Mutex<()>,
}

impl Lanes {
    const fn get(&self, kind: ResourceKind) -> &Mutex<()> {
        match kind {
            ResourceKind::Cart => &self.cart,
            ResourceKind::Wishlist => &self.wishlist,
            ResourceKind::Orders => &self.orders,
        }
    }
}

/// Runs the snapshot, speculate, confirm-or-restore protocol.
#[derive(Debug)]
pub struct OptimisticMutator {
    store: MaterializedStore,
    policy: MutationPolicy,
    lanes: Lanes,
}

impl OptimisticMutator {
    #[must_use]
    pub fn new(store: MaterializedStore, policy: MutationPolicy) -> Self {
        Self {
            store,
            policy,
            lanes: Lanes::default(),
        }
    }

    #[must_use]
    pub const fn policy(&self) -> MutationPolicy {
        self.policy
    }

    /// Apply `speculative` to the current value of `R` at once, then run
    /// `remote`.
    ///
    /// `speculative` returns `None` when the current value already reflects
    /// the change; the mutation then succeeds without calling `remote`.
    /// `remote` resolves to the authoritative value of `R`. Returns true if
    /// it succeeded. On failure the error is reported, the captured value
    /// is restored and false is returned. If the session was reset in the
    /// meantime neither outcome is written, and a mutation still queued at
    /// the reset returns false without running.
    #[instrument(skip_all, fields(operation = operation, kind = %R::KIND, policy = %self.policy))]
    pub async fn mutate<R, S, F, Fut>(
        &self,
        operation: &'static str,
        speculative: S,
        remote: F,
    ) -> bool
    where
        R: Optimistic,
        S: FnOnce(&R) -> Option<R>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<R, SyncError>>,
    {
        let loading = self.store.begin();
        let _lane = self.lane(R::KIND).await;

        let Some(snapshot) = MutationSnapshot::<R>::capture(&self.store, loading.epoch()) else {
            debug!(operation, "Session reset while queued, dropping mutation");
            return false;
        };
        let Some(value) = speculative(snapshot.prior()) else {
            debug!(operation, "Already applied, nothing to send");
            return true;
        };
        snapshot.speculate(&self.store, value);

        match remote().await {
            Ok(authoritative) => {
                if !snapshot.commit(&self.store, authoritative) {
                    debug!(operation, "Session reset during mutation, discarding result");
                }
                true
            }
            Err(err) => {
                err.report();
                if !snapshot.rollback(&self.store) {
                    debug!(operation, "Session reset during mutation, skipping rollback");
                }
                false
            }
        }
    }

    /// Exclusive access to `kind` under the serialized policy.
    ///
    /// Also taken by non-optimistic writers of the same resource.
    pub(crate) async fn lane(&self, kind: ResourceKind) -> Option<MutexGuard<'_, ()>> {
        match self.policy {
            MutationPolicy::Serialized => Some(self.lanes.get(kind).lock().await),
            MutationPolicy::Concurrent => None,
        }
    }
}
