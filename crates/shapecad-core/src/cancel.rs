//! Cooperative cancellation flag shared between a caller and a running conversion

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Result, ShapecadError};

/// Cloneable cancellation signal.
///
/// The engine polls it between entities while reading and writing; the
/// caller may set it from any thread.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    flag: Arc<AtomicBool>,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Fail with [`ShapecadError::Cancelled`] once cancellation was requested
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(ShapecadError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let signal = CancelSignal::new();
        let handle = signal.clone();
        assert!(signal.check().is_ok());

        handle.cancel();
        assert!(signal.is_cancelled());
        assert!(matches!(signal.check(), Err(ShapecadError::Cancelled)));
    }

    #[test]
    fn test_cancel_from_other_thread() {
        let signal = CancelSignal::new();
        let handle = signal.clone();
        std::thread::spawn(move || handle.cancel()).join().unwrap();
        assert!(signal.is_cancelled());
    }
}
