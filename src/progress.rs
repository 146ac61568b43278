//! Step budgets and cancellation for the long-running closure algorithms.
//!
//! Every potentially expensive loop (congruence generation, subuniverse
//! closure, lattice universes, the type finder) accepts an [`Effort`].
//! Exceeding the budget or observing a cancelled token surfaces
//! `UACalcError::Truncated`; callers never see partially built caches.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::{UACalcError, UACalcResult};

/// Cooperative cancellation flag, checked between outer-loop iterations.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// A step budget plus an optional cancellation token.
///
/// `Effort::unbounded()` never truncates; `Effort::with_budget(n)` allows
/// at most `n` ticks of work per algorithm invocation.
#[derive(Debug, Default)]
pub struct Effort {
    budget: Option<u64>,
    steps: AtomicU64,
    token: Option<CancelToken>,
}

impl Effort {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_budget(budget: u64) -> Self {
        Effort { budget: Some(budget), steps: AtomicU64::new(0), token: None }
    }

    pub fn with_token(token: CancelToken) -> Self {
        Effort { budget: None, steps: AtomicU64::new(0), token: Some(token) }
    }

    pub fn with_budget_and_token(budget: u64, token: CancelToken) -> Self {
        Effort { budget: Some(budget), steps: AtomicU64::new(0), token: Some(token) }
    }

    pub fn steps_taken(&self) -> u64 {
        self.steps.load(Ordering::Relaxed)
    }

    /// Record one unit of work for `operation`.
    ///
    /// Errs with `Truncated` when the budget is exhausted or the token was
    /// cancelled.
    pub fn tick(&self, operation: &str) -> UACalcResult<()> {
        if let Some(token) = &self.token {
            if token.is_cancelled() {
                return Err(UACalcError::truncated(operation, self.steps_taken()));
            }
        }
        let taken = self.steps.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(budget) = self.budget {
            if taken > budget {
                return Err(UACalcError::truncated(operation, taken));
            }
        }
        Ok(())
    }
}
