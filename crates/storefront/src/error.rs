//! Failure taxonomy of the synchronization engine.
//!
//! Failures never cross the engine boundary. Every public operation turns a
//! [`SyncError`] into a boolean or `None` after calling
//! [`SyncError::report`], which is the one place diagnostics are logged.

use shopease_core::ResourceKind;
use thiserror::Error;

use crate::client::ClientError;

/// Classified by effect on the materialized store, not by cause.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The remote call behind an optimistic mutation failed; the snapshot
    /// was restored.
    #[error("{operation} on {kind} failed: {source}")]
    Speculation {
        operation: &'static str,
        kind: ResourceKind,
        #[source]
        source: ClientError,
    },

    /// A read that should have refreshed `kind` failed; the last known good
    /// value is kept.
    #[error("refreshing {kind} failed: {source}")]
    Read {
        kind: ResourceKind,
        #[source]
        source: ClientError,
    },

    /// Some removals of a batch clear failed; the local cart was emptied
    /// anyway.
    #[error("{failed} of {attempted} cart line removals failed")]
    PartialBatch { attempted: usize, failed: usize },

    /// Checkout's create call failed; nothing was mutated.
    #[error("order creation failed: {0}")]
    OrderCreation(#[source] ClientError),
}

impl SyncError {
    /// Build a speculation failure for `operation` on `kind`.
    #[must_use]
    pub const fn speculation(
        operation: &'static str,
        kind: ResourceKind,
        source: ClientError,
    ) -> Self {
        Self::Speculation {
            operation,
            kind,
            source,
        }
    }

    /// Build a read failure for `kind`.
    #[must_use]
    pub const fn read(kind: ResourceKind, source: ClientError) -> Self {
        Self::Read { kind, source }
    }

    /// Short name of the failure class, used as a log field.
    #[must_use]
    pub const fn class(&self) -> &'static str {
        match self {
            Self::Speculation { .. } => "speculation_failure",
            Self::Read { .. } => "read_failure",
            Self::PartialBatch { .. } => "partial_batch_failure",
            Self::OrderCreation(_) => "order_creation_failure",
        }
    }

    /// The resource kind the failure left untouched or reverted, if any.
    #[must_use]
    pub const fn kind(&self) -> Option<ResourceKind> {
        match self {
            Self::Speculation { kind, .. } | Self::Read { kind, .. } => Some(*kind),
            Self::PartialBatch { .. } => Some(ResourceKind::Cart),
            Self::OrderCreation(_) => None,
        }
    }

    /// Log the failure for operators.
    ///
    /// Partial batch failures are warnings because the engine chose to
    /// proceed; everything else is an error.
    pub fn report(&self) {
        let kind = self.kind().map(|k| k.as_str());
        match self {
            Self::PartialBatch { .. } => {
                tracing::warn!(
                    failure = self.class(),
                    kind,
                    error = %self,
                    "Sync operation degraded"
                );
            }
            _ => {
                tracing::error!(
                    failure = self.class(),
                    kind,
                    error = %self,
                    "Sync operation failed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_error_display() {
        let err = SyncError::speculation(
            "remove_from_cart",
            ResourceKind::Cart,
            ClientError::NotFound("cart-items/1/".to_string()),
        );
        assert_eq!(
            err.to_string(),
            "remove_from_cart on cart failed: Not found: cart-items/1/"
        );

        let err = SyncError::PartialBatch {
            attempted: 3,
            failed: 1,
        };
        assert_eq!(err.to_string(), "1 of 3 cart line removals failed");
    }

    #[test]
    fn test_sync_error_classes() {
        let err = SyncError::read(ResourceKind::Orders, ClientError::Unauthorized);
        assert_eq!(err.class(), "read_failure");
        assert_eq!(err.kind(), Some(ResourceKind::Orders));

        let err = SyncError::OrderCreation(ClientError::RateLimited(5));
        assert_eq!(err.class(), "order_creation_failure");
        assert_eq!(err.kind(), None);
    }
}
