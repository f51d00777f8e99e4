//! Centralized limits for the resolution core.
//!
//! Recursion through declarations is caught by the memoization substrate's
//! in-progress markers, not by depth counters. The limits here bound the
//! remaining structural recursion: nested expressions, nested generic types
//! compared by the subtype checker, and alias chains.

/// Maximum nesting depth for expression typing.
///
/// ```text
/// f(f(f(f(f(f(/* ... 500 levels ... */))))))
/// ```
///
/// Deeper expressions are typed as the error type and reported once.
pub const MAX_EXPR_CHECK_DEPTH: u32 = 500;

/// Maximum depth of a single subtype query.
///
/// Generic types such as `class Node<T : Node<T>>` can make a structural
/// comparison recurse through upper bounds; the checker answers `false` past
/// this depth.
pub const MAX_SUBTYPE_DEPTH: u32 = 100;

/// Maximum number of alias expansions performed for one type mention.
///
/// Direct alias cycles are detected by the memo table; this bounds chains of
/// distinct aliases that expand into each other through type arguments.
pub const MAX_ALIAS_EXPANSION_DEPTH: u32 = 50;

/// Maximum number of rounds the call completer spends re-typing lambda
/// arguments while inference variables are still being fixed.
pub const MAX_LAMBDA_INFERENCE_ROUNDS: u32 = 4;

/// Maximum number of supertypes visited while searching for a common
/// supertype.
pub const MAX_COMMON_SUPERTYPE_CANDIDATES: usize = 256;

/// Remaining native stack below which resolution switches to a fresh
/// segment.
///
/// Declarations resolve each other re-entrantly, so a chain such as
/// `fun f0() = f1()`, `fun f1() = f2()`, ... nests one body inside the next
/// with no depth limit of its own.
pub const STACK_RED_ZONE: usize = 256 * 1024;

/// Size of each stack segment allocated once the red zone is reached.
pub const STACK_SEGMENT_SIZE: usize = 2 * 1024 * 1024;
