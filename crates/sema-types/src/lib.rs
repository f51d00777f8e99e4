//! Semantic type model for the sema resolution core.
//!
//! - [`TypeInterner`] deduplicates [`TypeData`] into [`TypeId`] handles
//! - [`SubtypeChecker`] answers subtyping and assignability queries against a
//!   pluggable [`TypeEnvironment`]
//! - [`Substitution`] instantiates generic types
//! - [`ConstraintSystem`] collects bounds for inference variables and
//!   solves them
//! - [`TypeFormatter`] renders types for diagnostics

pub mod env;
pub mod format;
pub mod infer;
pub mod intern;
pub mod lub;
pub mod recursion;
pub mod subst;
pub mod subtype;
pub mod types;

pub use env::TypeEnvironment;
pub use format::TypeFormatter;
pub use infer::{ConstraintSet, ConstraintSystem, InferenceError};
pub use intern::TypeInterner;
pub use lub::common_supertype;
pub use recursion::{DepthCounter, RecursionGuard, RecursionProfile, RecursionResult};
pub use subst::Substitution;
pub use subtype::{Compatibility, SubtypeChecker};
pub use types::{InferenceVar, TypeData, TypeId, TypeList, Variance};

#[cfg(test)]
#[path = "../tests/test_env.rs"]
pub(crate) mod test_env;
