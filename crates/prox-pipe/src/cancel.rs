//! Cooperative cancellation shared by every worker of a run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::warn;

/// Cloneable stop flag. Workers check it before starting a table and between
/// the proximity and adjacency phases; in-flight phases run to completion.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// True once [`CancelToken::cancel`] has been called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Cancels the token after `budget` of wall-clock time.
    pub fn cancel_after(&self, budget: Duration) {
        let token = self.clone();
        thread::spawn(move || {
            thread::sleep(budget);
            if !token.is_cancelled() {
                warn!(budget_secs = budget.as_secs_f64(), "time budget exhausted, cancelling");
                token.cancel();
            }
        });
    }
}
