use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag shared between the signal handler and the
/// consumer loop. Checked only at block-pull boundaries; the capture session's
/// sentinel injection is what actually unblocks a pending pull.
#[derive(Clone, Debug, Default)]
pub struct ShutdownToken {
    flag: Arc<AtomicBool>,
}

impl ShutdownToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        if !self.flag.swap(true, Ordering::SeqCst) {
            tracing::info!("Shutdown requested");
        }
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_untriggered() {
        assert!(!ShutdownToken::new().is_triggered());
    }

    #[test]
    fn trigger_is_visible_to_clones() {
        let token = ShutdownToken::new();
        let observer = token.clone();
        token.trigger();
        assert!(observer.is_triggered());
    }

    #[test]
    fn trigger_is_idempotent() {
        let token = ShutdownToken::new();
        token.trigger();
        token.trigger();
        assert!(token.is_triggered());
    }
}
