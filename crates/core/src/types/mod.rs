//! Core types for ShopEase.
//!
//! This module provides type-safe wrappers and the materialized resource
//! model shared by the engine and its consumers.

pub mod cart;
pub mod id;
pub mod kind;
pub mod money;
pub mod order;
pub mod quantity;
pub mod status;
pub mod wishlist;

pub use cart::{Cart, CartItem};
pub use id::*;
pub use kind::ResourceKind;
pub use money::{CurrencyCode, Money};
pub use order::{Order, OrderLine};
pub use quantity::{Quantity, QuantityError};
pub use status::OrderStatus;
pub use wishlist::{Wishlist, WishlistEntry};
