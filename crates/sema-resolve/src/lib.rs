//! Lazy semantic resolution core.
//!
//! Turns the syntax of a [`SourceSet`](sema_syntax::SourceSet) into
//! descriptors, types and bindings on demand:
//! - `memo` - single-flight memo cells with cycle detection and
//!   cancellation rollback
//! - `scope` - lazily built, shadowing-aware lexical scope chains
//! - `type_resolver` - type mentions to semantic types, alias expansion,
//!   flexible and `dynamic` types
//! - `declarations` - descriptors and their lazy cells (supertypes, return
//!   types, property types, bounds, bodies)
//! - `calls` - argument typing, candidate collection and ranking,
//!   inference and completion, call checkers
//! - `expressions` / `statements` / `for_loop` - the expression typing
//!   engine
//! - `trace` - the write-once binding trace with speculation layers
//! - `session` - the façade callers use
//!
//! Semantic problems become [`Diagnostic`](sema_common::Diagnostic)s in the
//! trace; [`ResolveError`] is reserved for contract violations and
//! cancellation.

mod builtins;
pub mod calls;
pub mod cancel;
mod context;
mod declarations;
pub mod descriptors;
mod env;
pub mod error;
mod expressions;
pub mod for_loop;
mod members;
pub mod memo;
pub mod options;
pub mod scope;
pub mod session;
mod statements;
pub mod trace;
mod type_resolver;

pub use calls::checkers::{
    AbstractInstantiationChecker, CallChecker, CallCheckerContext, PlatformReceiverChecker,
    default_call_checkers,
};
pub use cancel::CancellationToken;
pub use descriptors::{
    ClassDescriptor, Descriptor, ErrorDescriptor, FunctionDescriptor, FunctionKind,
    PropertyDescriptor, TypeAliasDescriptor, TypeParameterDescriptor, ValueParameterDescriptor,
};
pub use error::{OptionsError, ResolveError, ResolveResult};
pub use for_loop::ForLoopConventionChecker;
pub use memo::{MemoTable, SlotState};
pub use options::{ResolveOptions, TieBreakPolicy};
pub use scope::{Scope, ScopeKind};
pub use session::{BindingContext, BindingSlice, ResolveSession, ResolveSessionBuilder};
pub use trace::{BindingTrace, CallRole, CallStatus, ResolvedCall};
