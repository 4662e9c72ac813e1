//! Cooperative cancellation token.
//!
//! Long-running operations (extraction, analyzer runs, signal evaluation)
//! hold a clone of the token and check it between queries. Cancellation is
//! observed, not preemptive: an individual catalog-sized statement finishes,
//! the next one is never issued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::ProviderError;

/// Cancellation token wrapping an `AtomicBool`, cheap to clone and share
/// across every task of one analysis run.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new token (not cancelled).
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. All clones observe it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Bail out with [`ProviderError::Cancelled`] if cancellation was
    /// requested. Call sites put this between suspension points.
    pub fn check(&self) -> Result<(), ProviderError> {
        if self.is_cancelled() {
            Err(ProviderError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_propagates_to_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();

        assert!(!clone.is_cancelled());
        assert!(clone.check().is_ok());

        token.cancel();

        assert!(clone.is_cancelled());
        assert!(matches!(clone.check(), Err(ProviderError::Cancelled)));
    }
}
