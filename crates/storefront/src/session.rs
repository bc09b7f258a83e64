//! Session gate: the only input that decides whether the engine is active.
//!
//! The authentication layer holds a [`SessionSignal`] and publishes
//! [`SessionState`] changes; the engine consumes the paired
//! [`SessionGate`].

use serde::{Deserialize, Serialize};
use shopease_core::UserId;
use tokio::sync::watch;

/// The authenticated customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub username: String,
}

impl Identity {
    #[must_use]
    pub fn new(user_id: impl Into<UserId>, username: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
        }
    }
}

/// What the authentication layer currently knows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionState {
    /// False until authentication has finished initializing.
    pub ready: bool,
    /// The signed-in customer, if any.
    pub identity: Option<Identity>,
}

impl SessionState {
    /// Authentication still initializing; the engine stays idle.
    #[must_use]
    pub const fn pending() -> Self {
        Self {
            ready: false,
            identity: None,
        }
    }

    /// Ready with a signed-in customer.
    #[must_use]
    pub const fn authenticated(identity: Identity) -> Self {
        Self {
            ready: true,
            identity: Some(identity),
        }
    }

    /// Ready with nobody signed in.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self {
            ready: true,
            identity: None,
        }
    }

    /// The identity, only once the session is ready.
    #[must_use]
    pub fn active_identity(&self) -> Option<&Identity> {
        if self.ready {
            self.identity.as_ref()
        } else {
            None
        }
    }
}

/// Create a linked signal/gate pair starting at `initial`.
#[must_use]
pub fn channel(initial: SessionState) -> (SessionSignal, SessionGate) {
    let (sender, receiver) = watch::channel(initial);
    (SessionSignal { sender }, SessionGate { receiver })
}

/// Publishing half, held by the authentication layer.
#[derive(Debug)]
pub struct SessionSignal {
    sender: watch::Sender<SessionState>,
}

impl SessionSignal {
    /// Publish a new session state. Repeating the current state is a no-op.
    pub fn set(&self, state: SessionState) {
        self.sender.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            *current = state;
            true
        });
    }

    pub fn sign_in(&self, identity: Identity) {
        self.set(SessionState::authenticated(identity));
    }

    pub fn sign_out(&self) {
        self.set(SessionState::anonymous());
    }

    /// The state last published.
    #[must_use]
    pub fn current(&self) -> SessionState {
        self.sender.borrow().clone()
    }
}

/// Consuming half, driven by [`SyncController::run`](crate::SyncController::run).
#[derive(Debug, Clone)]
pub struct SessionGate {
    receiver: watch::Receiver<SessionState>,
}

impl SessionGate {
    /// The latest state, marking it as seen.
    pub fn current(&mut self) -> SessionState {
        self.receiver.borrow_and_update().clone()
    }

    /// Wait for the next unseen state. `None` once the signal is dropped.
    pub async fn changed(&mut self) -> Option<SessionState> {
        self.receiver.changed().await.ok()?;
        Some(self.current())
    }
}
