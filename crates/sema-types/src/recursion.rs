//! Recursion guards for structural type computations.
//!
//! Declaration-level recursion (a property whose type depends on itself, a
//! class that inherits from itself) is caught by the memo table's
//! in-progress markers. The guards here bound the structural recursion that
//! happens *inside* one computation: comparing nested generic types,
//! collecting constraints through supertypes, walking nested expressions.
//!
//! [`RecursionGuard`] combines cycle detection over a visiting set with a
//! depth limit and an iteration budget. [`DepthCounter`] is the depth-only
//! variant used where no natural key exists.

use rustc_hash::FxHashSet;
use sema_common::limits;
use std::hash::Hash;

// ---------------------------------------------------------------------------
// RecursionProfile
// ---------------------------------------------------------------------------

/// Named recursion limit presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionProfile {
    /// Subtype checking of nested generic and function types.
    ///
    /// depth = `MAX_SUBTYPE_DEPTH`, iterations = 100,000
    SubtypeCheck,

    /// Constraint collection during call-site inference.
    ///
    /// depth = `MAX_SUBTYPE_DEPTH`, iterations = 100,000
    ConstraintCollection,

    /// Supertype closure walk for common-supertype computation.
    ///
    /// depth = 64, iterations = `MAX_COMMON_SUPERTYPE_CANDIDATES`
    CommonSupertype,

    /// Expression typing.
    ///
    /// depth = `MAX_EXPR_CHECK_DEPTH`, iterations = unbounded
    ExpressionCheck,
}

impl RecursionProfile {
    #[inline]
    pub const fn max_depth(self) -> u32 {
        match self {
            Self::SubtypeCheck | Self::ConstraintCollection => limits::MAX_SUBTYPE_DEPTH,
            Self::CommonSupertype => 64,
            Self::ExpressionCheck => limits::MAX_EXPR_CHECK_DEPTH,
        }
    }

    #[inline]
    pub const fn max_iterations(self) -> u32 {
        match self {
            Self::SubtypeCheck | Self::ConstraintCollection => 100_000,
            Self::CommonSupertype => limits::MAX_COMMON_SUPERTYPE_CANDIDATES as u32,
            Self::ExpressionCheck => u32::MAX,
        }
    }
}

// ---------------------------------------------------------------------------
// RecursionResult
// ---------------------------------------------------------------------------

/// Result of attempting to enter a recursive computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionResult {
    Entered,
    /// This key is already being visited.
    Cycle,
    DepthExceeded,
    IterationExceeded,
}

impl RecursionResult {
    #[inline]
    pub fn is_entered(self) -> bool {
        matches!(self, Self::Entered)
    }

    #[inline]
    pub fn is_cycle(self) -> bool {
        matches!(self, Self::Cycle)
    }

    #[inline]
    pub fn is_exceeded(self) -> bool {
        matches!(self, Self::DepthExceeded | Self::IterationExceeded)
    }
}

// ---------------------------------------------------------------------------
// RecursionGuard
// ---------------------------------------------------------------------------

/// Tracks recursion state for cycle detection, depth limiting, and
/// iteration bounding.
///
/// ```ignore
/// match guard.enter((source, target)) {
///     RecursionResult::Entered => {
///         let result = self.check(source, target);
///         guard.leave((source, target));
///         result
///     }
///     RecursionResult::Cycle => true, // coinductive
///     _ => false,
/// }
/// ```
pub struct RecursionGuard<K: Hash + Eq + Copy> {
    visiting: FxHashSet<K>,
    depth: u32,
    iterations: u32,
    max_depth: u32,
    max_iterations: u32,
    exceeded: bool,
}

impl<K: Hash + Eq + Copy> RecursionGuard<K> {
    pub fn new(max_depth: u32, max_iterations: u32) -> Self {
        Self {
            visiting: FxHashSet::default(),
            depth: 0,
            iterations: 0,
            max_depth,
            max_iterations,
            exceeded: false,
        }
    }

    pub fn with_profile(profile: RecursionProfile) -> Self {
        Self::new(profile.max_depth(), profile.max_iterations())
    }

    /// Try to enter a recursive computation for `key`. On
    /// [`RecursionResult::Entered`] the caller must [`leave`](Self::leave)
    /// with the same key.
    pub fn enter(&mut self, key: K) -> RecursionResult {
        self.iterations = self.iterations.saturating_add(1);

        if self.iterations > self.max_iterations {
            self.exceeded = true;
            return RecursionResult::IterationExceeded;
        }
        if self.depth >= self.max_depth {
            self.exceeded = true;
            return RecursionResult::DepthExceeded;
        }
        if !self.visiting.insert(key) {
            return RecursionResult::Cycle;
        }
        self.depth += 1;
        RecursionResult::Entered
    }

    pub fn leave(&mut self, key: K) {
        let was_present = self.visiting.remove(&key);
        debug_assert!(
            was_present,
            "RecursionGuard::leave() called with a key that is not in the visiting set"
        );
        self.depth = self.depth.saturating_sub(1);
    }

    /// Run `f` inside a guarded scope, or return why entry was denied.
    pub fn scope<T>(&mut self, key: K, f: impl FnOnce() -> T) -> Result<T, RecursionResult> {
        match self.enter(key) {
            RecursionResult::Entered => {
                let result = f();
                self.leave(key);
                Ok(result)
            }
            denied => Err(denied),
        }
    }

    #[inline]
    pub fn is_visiting(&self, key: &K) -> bool {
        self.visiting.contains(key)
    }

    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    #[inline]
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Sticky until [`reset`](Self::reset).
    #[inline]
    pub fn is_exceeded(&self) -> bool {
        self.exceeded
    }

    pub fn reset(&mut self) {
        self.visiting.clear();
        self.depth = 0;
        self.iterations = 0;
        self.exceeded = false;
    }
}

#[cfg(debug_assertions)]
impl<K: Hash + Eq + Copy> Drop for RecursionGuard<K> {
    fn drop(&mut self) {
        if !std::thread::panicking() && !self.visiting.is_empty() {
            panic!(
                "RecursionGuard dropped with {} active entries",
                self.visiting.len()
            );
        }
    }
}

// ---------------------------------------------------------------------------
// DepthCounter
// ---------------------------------------------------------------------------

/// Depth-only guard for recursion without a natural key.
#[derive(Debug)]
pub struct DepthCounter {
    depth: u32,
    max_depth: u32,
    exceeded: bool,
}

impl DepthCounter {
    pub fn new(max_depth: u32) -> Self {
        Self {
            depth: 0,
            max_depth,
            exceeded: false,
        }
    }

    pub fn with_profile(profile: RecursionProfile) -> Self {
        Self::new(profile.max_depth())
    }

    /// Returns `false` once the limit is reached; the depth is then not
    /// incremented and `leave()` must not be called.
    #[inline]
    pub fn enter(&mut self) -> bool {
        if self.depth >= self.max_depth {
            self.exceeded = true;
            return false;
        }
        self.depth += 1;
        true
    }

    #[inline]
    pub fn leave(&mut self) {
        debug_assert!(self.depth > 0, "DepthCounter::leave() called at depth 0");
        self.depth = self.depth.saturating_sub(1);
    }

    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    #[inline]
    pub fn is_exceeded(&self) -> bool {
        self.exceeded
    }
}

#[cfg(test)]
#[path = "../tests/recursion_tests.rs"]
mod recursion_tests;
