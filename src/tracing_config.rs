//! Tracing configuration for debugging resolution.
//!
//! Three output formats, selected by `SEMA_LOG_FORMAT`:
//!
//! - `text` (default): flat `tracing-subscriber` lines
//! - `tree`: indented span hierarchy via `tracing-tree`, handy for following
//!   one lazy declaration through its dependencies
//! - `json`: one JSON object per span/event
//!
//! ## Quick start
//!
//! ```bash
//! # Which declarations a call pulls in, as a tree
//! SEMA_LOG=debug SEMA_LOG_FORMAT=tree cargo test -p sema-resolve session_tests
//!
//! # Candidate ranking only
//! SEMA_LOG="sema_resolve::calls=trace" cargo test -p sema-resolve overload_tests
//! ```
//!
//! Nothing is installed unless `SEMA_LOG` (or `RUST_LOG`) is set.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt};

/// Tracing output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Standard flat text lines (default).
    Text,
    /// Hierarchical indented tree via `tracing-tree`.
    Tree,
    /// Newline-delimited JSON objects.
    Json,
}

impl LogFormat {
    /// Parse a `SEMA_LOG_FORMAT` value. Unknown values fall back to text.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "tree" => Self::Tree,
            "json" => Self::Json,
            _ => Self::Text,
        }
    }

    fn from_env() -> Self {
        Self::parse(&std::env::var("SEMA_LOG_FORMAT").unwrap_or_default())
    }
}

/// Build an `EnvFilter` from `SEMA_LOG`, falling back to `RUST_LOG`.
///
/// `SEMA_LOG` takes precedence when both are set.
fn build_filter() -> EnvFilter {
    if let Ok(val) = std::env::var("SEMA_LOG") {
        EnvFilter::builder().parse_lossy(val)
    } else {
        EnvFilter::from_default_env()
    }
}

/// Initialise the global tracing subscriber.
///
/// Does nothing when neither `SEMA_LOG` nor `RUST_LOG` is set. Output goes
/// to stderr. Calling it again after a subscriber is installed is a no-op.
pub fn init_tracing() {
    let has_sema_log = std::env::var("SEMA_LOG").is_ok();
    let has_rust_log = std::env::var("RUST_LOG").is_ok();
    if !has_sema_log && !has_rust_log {
        return;
    }

    let filter = build_filter();
    match LogFormat::from_env() {
        LogFormat::Tree => {
            let tree_layer = tracing_tree::HierarchicalLayer::default()
                .with_indent_amount(2)
                .with_indent_lines(true)
                .with_deferred_spans(true)
                .with_span_retrace(true)
                .with_targets(true);

            let _ = Registry::default().with(filter).with(tree_layer).try_init();
        }
        LogFormat::Json => {
            let json_layer = fmt::layer().json().with_writer(std::io::stderr);

            let _ = Registry::default().with(filter).with(json_layer).try_init();
        }
        LogFormat::Text => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .try_init();
        }
    }
}
