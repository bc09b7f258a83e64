//! ShopEase storefront sync engine.
//!
//! Keeps a local, directly readable copy of a customer's cart, wishlist and
//! orders in step with the ShopEase REST service. Cart and wishlist edits
//! are applied optimistically and rolled back if the server rejects them;
//! checkout is never speculated.
//!
//! The composition root builds one [`SyncController`], hands UI layers
//! clones of it, and drives it from a [`SessionGate`]:
//!
//! ```no_run
//! use shopease_storefront::{SyncController, StorefrontConfig, session};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = StorefrontConfig::from_env()?;
//! let controller = SyncController::from_config(&config)?;
//! let (signal, gate) = session::channel(session::SessionState::pending());
//! tokio::spawn({
//!     let controller = controller.clone();
//!     async move { controller.run(gate).await }
//! });
//! # drop(signal);
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod mutator;
pub mod session;
pub mod store;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod testing;

pub use client::{ClientError, HttpResourceClient, ResourceClient};
pub use config::{ApiConfig, ConfigError, StorefrontConfig};
pub use controller::SyncController;
pub use error::SyncError;
pub use mutator::{MutationPolicy, MutationSnapshot, Optimistic, OptimisticMutator};
pub use session::{Identity, SessionGate, SessionSignal, SessionState};
pub use store::{Loaded, MaterializedStore, Resource, StoreSnapshot, StoreWatcher};
