//! Cooperative cancellation.
//!
//! The core polls the installed token before descending into each
//! declaration, statement and call. Once cancelled a token stays cancelled;
//! install a fresh one to resume work.

use crate::error::{ResolveError, ResolveResult};
use std::cell::Cell;
use std::rc::Rc;

#[derive(Debug, Default)]
struct TokenState {
    cancelled: Cell<bool>,
    polls_left: Cell<Option<u32>>,
}

/// Shared cancellation flag. Clones observe the same state.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    state: Rc<TokenState>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that trips on the first liveness check after `polls`
    /// successful ones. Used to cancel at a deterministic point.
    pub fn after_polls(polls: u32) -> Self {
        let token = Self::default();
        token.state.polls_left.set(Some(polls));
        token
    }

    pub fn cancel(&self) {
        self.state.cancelled.set(true);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.get()
    }

    /// Liveness check. Counts towards [`after_polls`](Self::after_polls).
    pub fn check(&self) -> ResolveResult<()> {
        if let Some(left) = self.state.polls_left.get() {
            if left == 0 {
                self.cancel();
            } else {
                self.state.polls_left.set(Some(left - 1));
            }
        }
        if self.is_cancelled() {
            Err(ResolveError::Cancelled)
        } else {
            Ok(())
        }
    }
}
