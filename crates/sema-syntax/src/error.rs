//! Parse error types.

use sema_common::LineMap;
use thiserror::Error;

/// Syntax errors reported by the scanner and parser.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Malformed input at a source position.
    #[error("{file}:{line}:{column}: {message}")]
    Syntax {
        file: String,
        line: u32,
        column: u32,
        message: String,
    },
    /// A file with the same name was already added to the source set.
    #[error("duplicate source file: {0}")]
    DuplicateFile(String),
}

impl ParseError {
    pub(crate) fn at(file: &str, text: &str, offset: u32, message: impl Into<String>) -> Self {
        let position = LineMap::new(text).position(offset);
        ParseError::Syntax {
            file: file.to_string(),
            line: position.line,
            column: position.column,
            message: message.into(),
        }
    }
}
