//! Contract errors of the resolution core.
//!
//! Semantic problems in user code are never reported through these types;
//! they become diagnostics in the binding trace. A `ResolveError` means the
//! caller broke the contract (a node from another tree, a node of the wrong
//! kind) or the installed cancellation token fired.

use sema_syntax::NodeIndex;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("resolution was cancelled")]
    Cancelled,
    #[error("node {0:?} does not belong to this source set")]
    UnknownNode(NodeIndex),
    #[error("expected {expected} at node {node:?}, found {found}")]
    UnexpectedNodeKind {
        node: NodeIndex,
        expected: &'static str,
        found: &'static str,
    },
}

pub type ResolveResult<T> = Result<T, ResolveError>;

/// Malformed [`ResolveOptions`](crate::ResolveOptions) input.
#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("invalid resolve options: {0}")]
    Json(#[from] serde_json::Error),
}
