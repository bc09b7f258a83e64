//! Newtype IDs for type-safe entity references.
//!
//! Server-issued identifiers are opaque strings: the remote service may hand
//! out integers or slugs, and the client normalizes both into the same
//! representation. Locally synthesized identifiers live in a separate space
//! ([`TempId`]) so a provisional entry can never be mistaken for a real one.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Macro to define a type-safe, server-issued ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`
/// - `From<&str>`, `From<String>` and `From<i64>` implementations
///
/// # Example
///
/// ```rust
/// # use shopease_core::define_id;
/// define_id!(CouponId);
/// define_id!(ReviewId);
///
/// let coupon = CouponId::from(7_i64);
/// let review = ReviewId::new("r-7");
/// assert_eq!(coupon.as_str(), "7");
///
/// // These are different types, so this won't compile:
/// // let _: CouponId = review;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id.to_string())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

// Server-issued entity IDs
define_id!(ResourceId);
define_id!(ProductId);
define_id!(OrderId);
define_id!(UserId);

/// A locally generated identifier for a provisional entry.
///
/// Drawn from a per-engine monotonic counter. Never sent to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TempId(u64);

impl TempId {
    /// Create a temporary ID from a raw counter value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the underlying counter value.
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TempId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "temp-{}", self.0)
    }
}

/// Identifier of a cart line: either confirmed by the server or provisional.
///
/// The two spaces are disjoint by construction, so equality between a
/// provisional and a confirmed line is always false.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ItemId {
    /// Issued by the remote service.
    Resource(ResourceId),
    /// Synthesized locally while a mutation is in flight.
    Temp(TempId),
}

impl ItemId {
    /// The server-issued ID, if this line has one.
    #[must_use]
    pub const fn resource(&self) -> Option<&ResourceId> {
        match self {
            Self::Resource(id) => Some(id),
            Self::Temp(_) => None,
        }
    }

    /// Whether this ID was synthesized locally.
    #[must_use]
    pub const fn is_temp(&self) -> bool {
        matches!(self, Self::Temp(_))
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resource(id) => id.fmt(f),
            Self::Temp(id) => id.fmt(f),
        }
    }
}

impl From<ResourceId> for ItemId {
    fn from(id: ResourceId) -> Self {
        Self::Resource(id)
    }
}

impl From<TempId> for ItemId {
    fn from(id: TempId) -> Self {
        Self::Temp(id)
    }
}
