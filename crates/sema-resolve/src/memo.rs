//! Memoization substrate.
//!
//! Every lazily computed fact of a session lives in a [`MemoTable`]: one
//! slot per key with an explicit state. A computation runs at most once per
//! key; re-entering a key whose computation is still on the stack is a
//! cycle, answered with a sentinel instead of recursing. Cancellation and
//! contract errors roll the slot back to `Unstarted` so a later request
//! recomputes from scratch.

use crate::cancel::CancellationToken;
use crate::error::{ResolveError, ResolveResult};
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::cell::RefCell;
use std::fmt::Debug;
use std::hash::Hash;
use tracing::{debug, trace};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum SlotState {
    Unstarted,
    InProgress,
    Resolved,
    Cyclic,
}

enum Slot<V> {
    InProgress,
    Resolved(V),
    /// The computation re-entered itself; the sentinel is final.
    Cyclic(V),
}

enum Probe<V> {
    Hit(V),
    Reentered,
    Miss,
}

pub struct MemoTable<K, V> {
    name: &'static str,
    slots: RefCell<FxHashMap<K, Slot<V>>>,
}

impl<K, V> MemoTable<K, V>
where
    K: Copy + Eq + Hash + Debug,
    V: Clone,
{
    pub fn new(name: &'static str) -> Self {
        MemoTable {
            name,
            slots: RefCell::new(FxHashMap::default()),
        }
    }

    pub fn state(&self, key: K) -> SlotState {
        match self.slots.borrow().get(&key) {
            None => SlotState::Unstarted,
            Some(Slot::InProgress) => SlotState::InProgress,
            Some(Slot::Resolved(_)) => SlotState::Resolved,
            Some(Slot::Cyclic(_)) => SlotState::Cyclic,
        }
    }

    /// Whether the computation for `key` is currently on the stack.
    pub fn is_computing(&self, key: K) -> bool {
        self.state(key) == SlotState::InProgress
    }

    /// The finished value for `key`, without computing anything.
    pub fn peek(&self, key: K) -> Option<V> {
        match self.slots.borrow().get(&key) {
            Some(Slot::Resolved(v) | Slot::Cyclic(v)) => Some(v.clone()),
            _ => None,
        }
    }

    /// Memoized computation with cycle detection.
    ///
    /// `on_recursion` runs when `key` is requested while its own
    /// computation is in progress. Its value becomes the final answer for
    /// `key`, and the outer computation's result is discarded.
    pub fn get_or_compute(
        &self,
        key: K,
        token: &CancellationToken,
        compute: impl FnOnce() -> ResolveResult<V>,
        on_recursion: impl FnOnce() -> V,
    ) -> ResolveResult<V> {
        self.run(key, token, compute, || (on_recursion(), true))
    }

    /// Collection variant: re-entry yields an empty value, reports nothing
    /// and leaves the in-flight computation in charge of the slot.
    pub fn get_or_default(
        &self,
        key: K,
        token: &CancellationToken,
        compute: impl FnOnce() -> ResolveResult<V>,
    ) -> ResolveResult<V>
    where
        V: Default,
    {
        self.run(key, token, compute, || (V::default(), false))
    }

    fn run(
        &self,
        key: K,
        token: &CancellationToken,
        compute: impl FnOnce() -> ResolveResult<V>,
        on_recursion: impl FnOnce() -> (V, bool),
    ) -> ResolveResult<V> {
        let probe = match self.slots.borrow().get(&key) {
            Some(Slot::Resolved(v) | Slot::Cyclic(v)) => Probe::Hit(v.clone()),
            Some(Slot::InProgress) => Probe::Reentered,
            None => Probe::Miss,
        };

        match probe {
            Probe::Hit(value) => Ok(value),
            Probe::Reentered => {
                let (sentinel, final_answer) = on_recursion();
                debug!(table = self.name, ?key, final_answer, "re-entrant request");
                if final_answer {
                    self.slots
                        .borrow_mut()
                        .insert(key, Slot::Cyclic(sentinel.clone()));
                }
                Ok(sentinel)
            }
            Probe::Miss => {
                token.check()?;
                self.slots.borrow_mut().insert(key, Slot::InProgress);
                trace!(table = self.name, ?key, "computing");

                let result = compute();

                let mut slots = self.slots.borrow_mut();
                match result {
                    Err(err) => {
                        slots.remove(&key);
                        debug!(table = self.name, ?key, %err, "rolled back");
                        Err(err)
                    }
                    Ok(_) if token.is_cancelled() => {
                        slots.remove(&key);
                        debug!(table = self.name, ?key, "rolled back after cancellation");
                        Err(ResolveError::Cancelled)
                    }
                    Ok(value) => {
                        if let Some(Slot::Cyclic(sentinel)) = slots.get(&key) {
                            return Ok(sentinel.clone());
                        }
                        slots.insert(key, Slot::Resolved(value.clone()));
                        Ok(value)
                    }
                }
            }
        }
    }

    /// Forget a finished value. In-flight slots are left alone.
    pub fn invalidate(&self, key: K) {
        let mut slots = self.slots.borrow_mut();
        if !matches!(slots.get(&key), Some(Slot::InProgress)) {
            slots.remove(&key);
        }
    }

    pub fn clear(&self) {
        self.slots
            .borrow_mut()
            .retain(|_, slot| matches!(slot, Slot::InProgress));
    }

    pub fn len(&self) -> usize {
        self.slots.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "../tests/memo_tests.rs"]
mod memo_tests;
