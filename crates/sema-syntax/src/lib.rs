//! Parse layer for the sema resolver.
//!
//! This crate provides the syntax the resolution core consumes:
//! - `ast` - Arena-allocated immutable syntax tree (`NodeArena`, `NodeIndex`, `NodeKind`)
//! - `scanner` / `parser` - Tokenizer and recursive-descent parser for the surface language
//! - `SourceSet` - Parsed files sharing one arena and interner
//! - `DeclarationProvider` - Container to declaration index used by scope building
//! - `builtins` - Embedded built-ins catalogue

pub mod ast;
pub mod builtins;
pub mod error;
mod parser;
pub mod provider;
pub mod scanner;
pub mod source;

pub use ast::{
    BinaryOp, ClassKind, Modifiers, Node, NodeArena, NodeIndex, NodeKind, Origin, UnaryOp,
    Variance,
};
pub use error::ParseError;
pub use provider::DeclarationProvider;
pub use source::{SourceFile, SourceSet};
