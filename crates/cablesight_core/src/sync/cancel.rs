//! Cooperative cancellation.
//!
//! Cancelling never interrupts work already in progress. It only stops the
//! owner from scheduling more.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One-way cancellation flag shared between the loop and its owner.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a live token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Returns true if this call did the cancelling.
    pub fn cancel(&self) -> bool {
        !self.cancelled.swap(true, Ordering::AcqRel)
    }

    /// Returns true once cancellation has been requested.
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_once() {
        let token = CancelToken::new();
        let observer = token.clone();

        assert!(!observer.is_cancelled());
        assert!(token.cancel());
        assert!(!token.cancel());
        assert!(observer.is_cancelled());
    }
}
