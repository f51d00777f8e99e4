//! Common types and utilities for the sema resolution core.
//!
//! This crate provides the foundational types shared by every sema crate:
//! - String interning (`Atom`, `Interner`)
//! - Source locations (`FileId`, `Span`, `LineMap`)
//! - Descriptor identifiers (`DefId`)
//! - Diagnostic records and message templates
//! - Centralized limits

pub mod interner;
pub use interner::{Atom, Interner};

pub mod span;
pub use span::{FileId, LineMap, Position, Span};

pub mod def;
pub use def::DefId;

pub mod diagnostics;
pub use diagnostics::{
    Diagnostic, DiagnosticCategory, DiagnosticKind, DiagnosticRelatedInformation, diagnostic_codes,
    format_message,
};

pub mod limits;
