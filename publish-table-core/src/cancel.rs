use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag shared between a caller and a running publish.
///
/// Clones share the same flag. Once cancelled it stays cancelled; the orchestrator
/// polls it at every remote-call boundary and never waits on it.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_observe_cancellation() {
        let token = CancellationToken::new();
        let ui_handle = token.clone();
        assert!(!token.is_cancelled());

        ui_handle.cancel();
        assert!(token.is_cancelled());

        // cancelling twice is harmless and never resets
        ui_handle.cancel();
        assert!(token.is_cancelled());
    }
}
