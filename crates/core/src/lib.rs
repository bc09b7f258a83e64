//! ShopEase Core - Shared storefront types.
//!
//! This crate provides the data model synchronized by the storefront engine:
//! - `shopease-storefront` - Optimistic cart/wishlist/order synchronization
//! - `shopease-cli` - Command-line driver for the engine
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no async.
//! Wire formats of the remote service are normalized into these types at the
//! client boundary, so nothing here knows how the server spells a field.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, money, quantities, and the cart/wishlist/order model

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
