//! `sema` bundles the semantic resolution core behind one import.
//!
//! ```no_run
//! use sema::{Origin, ResolveSession, SourceSet};
//!
//! sema::tracing_config::init_tracing();
//! let mut sources = SourceSet::with_builtins().expect("built-ins parse");
//! sources
//!     .add_file("main.sema", "val answer = maxOf(41, 42)\n", Origin::Source)
//!     .expect("fixture parses");
//! let session = ResolveSession::builder(sources).build();
//! session.resolve_all().expect("not cancelled");
//! for diagnostic in session.diagnostics() {
//!     eprintln!("{}: {}", diagnostic.code, diagnostic.message_text);
//! }
//! ```

// Shared leaf types: interner, spans, diagnostics, limits
pub use sema_common as common;
pub use sema_common::{Atom, DefId, Diagnostic, DiagnosticCategory, DiagnosticKind, Interner, Span};

// Syntax: arena, parser, source sets, built-in catalogue
pub use sema_syntax as syntax;
pub use sema_syntax::{NodeArena, NodeIndex, NodeKind, Origin, ParseError, SourceSet};

// Semantic types: interner, subtyping, inference
pub use sema_types as types;
pub use sema_types::{TypeData, TypeId, TypeInterner};

// Resolution core and session façade
pub use sema_resolve as resolve;
pub use sema_resolve::{
    BindingContext, BindingSlice, CallChecker, CallRole, CancellationToken, Descriptor,
    ResolveError, ResolveOptions, ResolveResult, ResolveSession, ResolveSessionBuilder,
    TieBreakPolicy,
};

// Tracing configuration for debugging resolution
pub mod tracing_config;
#[cfg(test)]
#[path = "../tests/tracing_config_tests.rs"]
mod tracing_config_tests;
